use std::io::Write;
use std::sync::{Arc, Mutex};

/// Destination for serialized records.
///
/// Writes are best-effort: a sink never reports failure to the caller, so
/// logging cannot become a second source of errors on a request path.
#[derive(Debug, Clone, Default)]
pub enum Sink {
    /// One JSON line per record on the process standard output.
    #[default]
    Stdout,
    /// In-memory capture for tests and callers that assert on records.
    Memory(MemorySink),
}

impl Sink {
    /// Write one serialized record. `line` must not contain a newline.
    pub fn write_line(&self, line: &str) {
        match self {
            Sink::Stdout => {
                let mut out = std::io::stdout().lock();
                let _ = out.write_all(line.as_bytes());
                let _ = out.write_all(b"\n");
            }
            Sink::Memory(sink) => sink.push(line),
        }
    }
}

impl PartialEq for Sink {
    /// Two memory sinks are equal when they share a buffer.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Sink::Stdout, Sink::Stdout) => true,
            (Sink::Memory(a), Sink::Memory(b)) => Arc::ptr_eq(&a.lines, &b.lines),
            _ => false,
        }
    }
}

/// Shared line buffer. Cloning yields another handle onto the same buffer,
/// so a test can keep one handle and hand the other to a logger.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the captured lines, in emission order.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    /// Captured lines parsed as JSON values. Lines that fail to parse are
    /// skipped.
    pub fn records(&self) -> Vec<serde_json::Value> {
        self.lines()
            .iter()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().map(|lines| lines.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discard everything captured so far.
    pub fn clear(&self) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.clear();
        }
    }

    fn push(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_captures_lines_in_order() {
        let sink = MemorySink::new();
        let dest = Sink::Memory(sink.clone());

        dest.write_line("{\"n\":1}");
        dest.write_line("{\"n\":2}");

        assert_eq!(sink.lines(), vec!["{\"n\":1}", "{\"n\":2}"]);
        assert_eq!(sink.len(), 2);
        assert!(!sink.is_empty());
    }

    #[test]
    fn clones_share_one_buffer() {
        let sink = MemorySink::new();
        let handle = sink.clone();

        Sink::Memory(sink.clone()).write_line("{}");

        assert_eq!(handle.len(), 1, "clone should see writes to the original");
    }

    #[test]
    fn records_parses_json_and_skips_garbage() {
        let sink = MemorySink::new();
        let dest = Sink::Memory(sink.clone());

        dest.write_line("{\"ok\":true}");
        dest.write_line("not json");

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["ok"], serde_json::Value::Bool(true));
    }

    #[test]
    fn clear_discards_captured_lines() {
        let sink = MemorySink::new();
        Sink::Memory(sink.clone()).write_line("{}");

        sink.clear();

        assert!(sink.is_empty());
    }

    #[test]
    fn sink_equality_is_buffer_identity() {
        let a = MemorySink::new();
        let b = MemorySink::new();

        assert_eq!(Sink::Stdout, Sink::Stdout);
        assert_eq!(Sink::Memory(a.clone()), Sink::Memory(a.clone()));
        assert_ne!(Sink::Memory(a.clone()), Sink::Memory(b));
        assert_ne!(Sink::Stdout, Sink::Memory(a));
    }
}
