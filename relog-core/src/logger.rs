use crate::config::LoggingConfig;
use crate::level::Level;
use crate::sink::Sink;
use chrono::Utc;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

// ── Logger ───────────────────────────────────────────────────────────────

/// Immutable structured logger.
///
/// A logger is a value: `with_*` return a new logger and leave the receiver
/// untouched, so one logger can be shared across requests while each request
/// derives its own enriched copy. Records are single-line JSON with `level`
/// and `time` first, then the logger's default fields, then per-record
/// fields, then `message` last.
#[derive(Debug, Clone)]
pub struct Logger {
    sink: Sink,
    level: Level,
    fields: Vec<(String, Value)>,
    error_field: String,
}

impl Default for Logger {
    /// Stdout sink, `info` threshold, `error.message` error field.
    fn default() -> Self {
        Self::new(&LoggingConfig::default())
    }
}

impl Logger {
    /// Build a logger from resolved configuration: stdout sink, threshold
    /// normalized from the configured level name, error field from config.
    pub fn new(config: &LoggingConfig) -> Self {
        Self {
            sink: Sink::Stdout,
            level: config.level(),
            fields: Vec::new(),
            error_field: config.error_field.clone(),
        }
    }

    /// Build a logger straight from `LOGGING_*` environment variables.
    pub fn from_env() -> Self {
        Self::new(&LoggingConfig::from_env())
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn sink(&self) -> &Sink {
        &self.sink
    }

    /// Field name used by [`Event::err`].
    pub fn error_field(&self) -> &str {
        &self.error_field
    }

    /// Whether a record at `level` would be written.
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.level
    }

    /// Same logger writing to `sink`.
    pub fn with_sink(mut self, sink: Sink) -> Self {
        self.sink = sink;
        self
    }

    /// Same logger with a different severity threshold.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Derive a logger with one more default field. The receiver is
    /// unchanged; repeated keys are appended, not replaced.
    pub fn with_field(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut derived = self.clone();
        derived.fields.push((key.into(), value.into()));
        derived
    }

    /// Start building a record at `level`.
    pub fn event(&self, level: Level) -> Event<'_> {
        Event {
            logger: self,
            level,
            fields: Vec::new(),
        }
    }

    pub fn trace(&self) -> Event<'_> {
        self.event(Level::Trace)
    }

    pub fn debug(&self) -> Event<'_> {
        self.event(Level::Debug)
    }

    pub fn info(&self) -> Event<'_> {
        self.event(Level::Info)
    }

    pub fn warn(&self) -> Event<'_> {
        self.event(Level::Warn)
    }

    pub fn error(&self) -> Event<'_> {
        self.event(Level::Error)
    }
}

// ── Event ────────────────────────────────────────────────────────────────

/// One record under construction. Dropped without [`emit`](Event::emit), it
/// writes nothing.
#[must_use = "an event does nothing until emit() is called"]
pub struct Event<'a> {
    logger: &'a Logger,
    level: Level,
    fields: Vec<(String, Value)>,
}

impl Event<'_> {
    /// Attach a field. Fields appear in the record in attachment order.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    /// Attach an error payload under the logger's configured error field.
    pub fn err(self, error: impl std::fmt::Display) -> Self {
        let key = self.logger.error_field.clone();
        self.field(key, error.to_string())
    }

    /// Serialize and write the record. Records below the logger's threshold
    /// are discarded here, at emission time, so building an event is always
    /// safe.
    pub fn emit(self, message: &str) {
        if !self.logger.enabled(self.level) {
            return;
        }

        let mut entries: Vec<(&str, Value)> =
            Vec::with_capacity(3 + self.logger.fields.len() + self.fields.len());
        entries.push(("level", Value::from(self.level.as_str())));
        entries.push(("time", Value::from(Utc::now().to_rfc3339())));
        for (key, value) in &self.logger.fields {
            entries.push((key.as_str(), value.clone()));
        }
        for (key, value) in &self.fields {
            entries.push((key.as_str(), value.clone()));
        }
        entries.push(("message", Value::from(message)));

        if let Ok(line) = serde_json::to_string(&RecordFields(&entries)) {
            self.logger.sink.write_line(&line);
        }
    }
}

/// Serializes field pairs as a JSON object, preserving insertion order.
struct RecordFields<'a>(&'a [(&'a str, Value)]);

impl Serialize for RecordFields<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
