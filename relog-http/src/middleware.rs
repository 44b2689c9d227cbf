use crate::access::AccessRecord;
use crate::observe::{AccessFinalizer, ObservedBody};
use axum::body::Body;
use futures_util::FutureExt;
use http::{header, HeaderValue, Request, Response, StatusCode};
use relog_core::{LogContext, Logger};
use std::any::Any;
use std::backtrace::Backtrace;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};

const INTERNAL_ERROR_BODY: &str = "Internal Server Error";

// ── Layer ────────────────────────────────────────────────────────────────

/// Wraps a service with access logging and panic recovery.
///
/// For every request the middleware binds a [`LogContext`] into the request
/// extensions, emits one debug access record when the response body
/// completes, and converts a handler panic into an error record plus a
/// plain `500`.
#[derive(Debug, Clone)]
pub struct RequestLogLayer {
    logger: Logger,
}

impl RequestLogLayer {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    /// Use the logger bound in `ctx`. A context without one gets the
    /// default logger.
    pub fn from_context(ctx: &LogContext) -> Self {
        Self::new(ctx.logger().cloned().unwrap_or_default())
    }
}

impl<S> Layer<S> for RequestLogLayer {
    type Service = RequestLog<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLog {
            inner,
            logger: self.logger.clone(),
        }
    }
}

// ── Service ──────────────────────────────────────────────────────────────

/// The middleware service produced by [`RequestLogLayer`].
#[derive(Debug, Clone)]
pub struct RequestLog<S> {
    inner: S,
    logger: Logger,
}

impl<S> Service<Request<Body>> for RequestLog<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let logger = self.logger.clone();
        let record = AccessRecord::from_request(&req);
        let start = Instant::now();

        // Hand the request context, with this middleware's logger bound, to
        // the inner handler. An already-present context keeps its values.
        let ctx = match req.extensions().get::<LogContext>() {
            Some(existing) => existing.with_logger(logger.clone()),
            None => LogContext::new().with_logger(logger.clone()),
        };
        req.extensions_mut().insert(ctx);

        // Readiness was polled on the stored service; take it and leave the
        // clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        // A handler can panic while building its future, before the first
        // poll.
        let called = catch_unwind(AssertUnwindSafe(move || inner.call(req)));

        Box::pin(async move {
            let outcome = match called {
                Ok(future) => AssertUnwindSafe(future).catch_unwind().await,
                Err(panic) => Err(panic),
            };

            match outcome {
                Ok(Ok(response)) => Ok(observe(response, logger, record, start)),
                Ok(Err(err)) => Err(err),
                Err(panic) => Ok(recovered(panic, logger, record, start)),
            }
        })
    }
}

/// Wrap a normal response so the access record fires when its body is done.
fn observe(
    response: Response<Body>,
    logger: Logger,
    mut record: AccessRecord,
    start: Instant,
) -> Response<Body> {
    record.status = response.status().as_u16();
    let (parts, body) = response.into_parts();
    let finalizer = AccessFinalizer::new(logger, record, start);
    Response::from_parts(parts, Body::new(ObservedBody::new(body, finalizer)))
}

/// Panic path: error record first, then a plain `500` whose observed body
/// still produces the access record.
fn recovered(
    panic: Box<dyn Any + Send>,
    logger: Logger,
    mut record: AccessRecord,
    start: Instant,
) -> Response<Body> {
    emit_panic_record(&logger, panic.as_ref());

    record.status = StatusCode::INTERNAL_SERVER_ERROR.as_u16();
    let finalizer = AccessFinalizer::new(logger, record, start);
    let body = Body::new(ObservedBody::new(Body::from(INTERNAL_ERROR_BODY), finalizer));

    let mut response = Response::new(body);
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

/// Text form of a panic payload. `&str` and `String` payloads pass through;
/// anything else gets a placeholder.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Error-severity record for a recovered panic: payload under the logger's
/// error field, captured backtrace under `stack`.
pub(crate) fn emit_panic_record(logger: &Logger, panic: &(dyn Any + Send)) {
    logger
        .error()
        .field("type", "error")
        .err(panic_message(panic))
        .field("stack", Backtrace::force_capture().to_string())
        .emit("error_request");
}
