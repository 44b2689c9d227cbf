use axum::extract::ConnectInfo;
use http::{header, Request};
use relog_core::Logger;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Field set of one access-log record.
///
/// Request-side fields are captured before the handler runs; `status`,
/// `latency_ms`, and `bytes_out` are filled when the response body
/// completes. Unavailable request data becomes an empty string or zero, so
/// every record carries the full field set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessRecord {
    pub remote_ip: String,
    pub host: String,
    pub url: String,
    pub proto: String,
    pub method: String,
    pub user_agent: String,
    pub status: u16,
    pub latency_ms: f64,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

impl AccessRecord {
    /// Capture the request-side fields. The peer address comes from axum's
    /// `ConnectInfo` extension when the server was built with connect info;
    /// otherwise `remote_ip` stays empty.
    pub fn from_request<B>(req: &Request<B>) -> Self {
        let remote_ip = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.to_string())
            .unwrap_or_default();
        let host = req
            .headers()
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
            .or_else(|| req.uri().authority().map(|authority| authority.to_string()))
            .unwrap_or_default();
        let user_agent = req
            .headers()
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let bytes_in = req
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok())
            .unwrap_or(0);

        Self {
            remote_ip,
            host,
            url: req.uri().path().to_string(),
            proto: format!("{:?}", req.version()),
            method: req.method().to_string(),
            user_agent,
            status: 0,
            latency_ms: 0.0,
            bytes_in,
            bytes_out: 0,
        }
    }

    /// Emit the end-of-request record through `logger` at debug severity.
    pub fn emit(&self, logger: &Logger) {
        logger
            .debug()
            .field("type", "access")
            .field("remote_ip", self.remote_ip.as_str())
            .field("host", self.host.as_str())
            .field("url", self.url.as_str())
            .field("proto", self.proto.as_str())
            .field("method", self.method.as_str())
            .field("user_agent", self.user_agent.as_str())
            .field("status", self.status)
            .field("latency_ms", self.latency_ms)
            .field("bytes_in", self.bytes_in)
            .field("bytes_out", self.bytes_out)
            .emit("incoming_request");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use relog_core::{Level, MemorySink, Sink};

    fn request() -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/widgets")
            .header(header::HOST, "api.example.test")
            .header(header::USER_AGENT, "relog-test/1.0")
            .header(header::CONTENT_LENGTH, "42")
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn captures_request_side_fields() {
        let mut req = request();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 9000))));

        let record = AccessRecord::from_request(&req);

        assert_eq!(record.remote_ip, "127.0.0.1:9000");
        assert_eq!(record.host, "api.example.test");
        assert_eq!(record.url, "/widgets");
        assert_eq!(record.proto, "HTTP/1.1");
        assert_eq!(record.method, "POST");
        assert_eq!(record.user_agent, "relog-test/1.0");
        assert_eq!(record.bytes_in, 42);
        assert_eq!(record.status, 0, "response side starts zeroed");
        assert_eq!(record.bytes_out, 0);
    }

    #[test]
    fn missing_request_data_becomes_empty_or_zero() {
        let req = Request::builder()
            .uri("/bare")
            .body(Body::empty())
            .unwrap();

        let record = AccessRecord::from_request(&req);

        assert_eq!(record.remote_ip, "");
        assert_eq!(record.host, "");
        assert_eq!(record.user_agent, "");
        assert_eq!(record.bytes_in, 0);
        assert_eq!(record.method, "GET");
    }

    #[test]
    fn host_falls_back_to_the_uri_authority() {
        let req = Request::builder()
            .uri("http://gateway.internal:8080/health")
            .body(Body::empty())
            .unwrap();

        let record = AccessRecord::from_request(&req);

        assert_eq!(record.host, "gateway.internal:8080");
        assert_eq!(record.url, "/health", "url is the path only");
    }

    #[test]
    fn unparsable_content_length_counts_as_zero() {
        let req = Request::builder()
            .uri("/")
            .header(header::CONTENT_LENGTH, "not-a-number")
            .body(Body::empty())
            .unwrap();

        assert_eq!(AccessRecord::from_request(&req).bytes_in, 0);
    }

    #[test]
    fn emit_writes_the_full_field_contract_at_debug() {
        let sink = MemorySink::new();
        let logger = Logger::default()
            .with_level(Level::Trace)
            .with_sink(Sink::Memory(sink.clone()));

        let mut record = AccessRecord::from_request(&request());
        record.status = 201;
        record.latency_ms = 3.25;
        record.bytes_out = 7;
        record.emit(&logger);

        let records = sink.records();
        assert_eq!(records.len(), 1);
        let rec = &records[0];
        assert_eq!(rec["level"], "debug");
        assert_eq!(rec["type"], "access");
        assert_eq!(rec["message"], "incoming_request");
        assert_eq!(rec["host"], "api.example.test");
        assert_eq!(rec["url"], "/widgets");
        assert_eq!(rec["proto"], "HTTP/1.1");
        assert_eq!(rec["method"], "POST");
        assert_eq!(rec["user_agent"], "relog-test/1.0");
        assert_eq!(rec["status"], 201);
        assert_eq!(rec["latency_ms"], 3.25);
        assert_eq!(rec["bytes_in"], 42);
        assert_eq!(rec["bytes_out"], 7);
    }

    #[test]
    fn emit_respects_the_logger_threshold() {
        let sink = MemorySink::new();
        let logger = Logger::default()
            .with_level(Level::Info)
            .with_sink(Sink::Memory(sink.clone()));

        AccessRecord::from_request(&request()).emit(&logger);

        assert!(sink.is_empty(), "access records are debug severity");
    }
}
