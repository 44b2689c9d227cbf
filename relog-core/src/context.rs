use crate::logger::Logger;
use serde_json::Value;
use std::collections::HashMap;

/// Request-scoped carrier for the active logger and named values.
///
/// Like [`Logger`], a context is a value: `with_*` return a derived context
/// and leave the receiver intact, so a parent scope keeps its own view after
/// handing an enriched copy down the call chain. Cheap to clone and safe to
/// store in `http::Extensions`.
#[derive(Debug, Clone, Default)]
pub struct LogContext {
    logger: Option<Logger>,
    values: HashMap<String, Value>,
}

impl LogContext {
    /// Empty context: no logger bound, no values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-startup entry point: a fresh context with an
    /// environment-configured logger bound.
    pub fn from_env() -> Self {
        Self::new().with_logger(Logger::from_env())
    }

    /// Derived context with `logger` bound.
    pub fn with_logger(&self, logger: Logger) -> Self {
        let mut derived = self.clone();
        derived.logger = Some(logger);
        derived
    }

    /// Derived context with a named value attached. An existing value under
    /// the same key is replaced in the derived context only.
    pub fn with_value(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut derived = self.clone();
        derived.values.insert(key.into(), value.into());
        derived
    }

    /// The bound logger, if any.
    pub fn logger(&self) -> Option<&Logger> {
        self.logger.as_ref()
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Named value lookup, restricted to string values.
    pub fn str_value(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// Copy string values for `keys` out of `source` into a logger derived
    /// from the one bound here.
    ///
    /// Every requested key becomes a field on the returned logger. A key
    /// that is missing from `source` (or holds a non-string value) yields an
    /// empty field and a debug note, so downstream records keep a stable
    /// shape. Without a bound logger the defaults apply.
    pub fn merge_keys(&self, source: &LogContext, keys: &[&str]) -> Logger {
        let mut logger = self.logger.clone().unwrap_or_default();
        for &key in keys {
            let value = match source.str_value(key) {
                Some(text) => text.to_string(),
                None => {
                    logger
                        .debug()
                        .field("key", key)
                        .emit("context key missing or not a string");
                    String::new()
                }
            };
            logger = logger.with_field(key, value);
        }
        logger
    }
}
