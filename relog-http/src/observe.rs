use crate::access::AccessRecord;
use axum::body::Body;
use bytes::Bytes;
use http_body::{Body as HttpBody, Frame, SizeHint};
use relog_core::Logger;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

// ── Finalizer ────────────────────────────────────────────────────────────

/// Fills the response-side access fields and emits the record. Consuming
/// `finish` makes double emission unrepresentable.
pub(crate) struct AccessFinalizer {
    pub(crate) logger: Logger,
    record: AccessRecord,
    start: Instant,
}

impl AccessFinalizer {
    pub(crate) fn new(logger: Logger, record: AccessRecord, start: Instant) -> Self {
        Self {
            logger,
            record,
            start,
        }
    }

    fn finish(mut self, bytes_out: u64) {
        self.record.latency_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        self.record.bytes_out = bytes_out;
        self.record.emit(&self.logger);
    }
}

// ── Observed body ────────────────────────────────────────────────────────

/// Response body wrapper that counts outbound bytes and finalizes the
/// access record once the stream ends, errors, or is dropped — whichever
/// comes first.
pub struct ObservedBody {
    inner: Body,
    bytes_out: u64,
    finalizer: Option<AccessFinalizer>,
}

impl ObservedBody {
    pub(crate) fn new(inner: Body, finalizer: AccessFinalizer) -> Self {
        Self {
            inner,
            bytes_out: 0,
            finalizer: Some(finalizer),
        }
    }

    fn finalize(&mut self) {
        if let Some(finalizer) = self.finalizer.take() {
            finalizer.finish(self.bytes_out);
        }
    }
}

impl HttpBody for ObservedBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        match catch_unwind(AssertUnwindSafe(|| Pin::new(&mut this.inner).poll_frame(cx))) {
            Ok(Poll::Ready(Some(Ok(frame)))) => {
                if let Some(data) = frame.data_ref() {
                    this.bytes_out += data.len() as u64;
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Ok(Poll::Ready(Some(Err(err)))) => {
                this.finalize();
                Poll::Ready(Some(Err(err)))
            }
            Ok(Poll::Ready(None)) => {
                this.finalize();
                Poll::Ready(None)
            }
            Ok(Poll::Pending) => Poll::Pending,
            Err(panic) => {
                // Panic while streaming: the response head is already on the
                // wire, so a 500 is no longer possible. Log the panic, close
                // out the record, and end the stream instead of rethrowing.
                if let Some(finalizer) = this.finalizer.take() {
                    crate::middleware::emit_panic_record(&finalizer.logger, panic.as_ref());
                    finalizer.finish(this.bytes_out);
                }
                Poll::Ready(None)
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for ObservedBody {
    fn drop(&mut self) {
        // Covers clients that disconnect mid-response and responses whose
        // body is never polled: the record still goes out, with the bytes
        // counted so far.
        self.finalize();
    }
}
