use crate::level::Level;
use figment::providers::Env;
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Prefix for all logging environment variables.
pub const ENV_PREFIX: &str = "LOGGING_";
/// Level name applied when `LOGGING_LOGLEVEL` is unset.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Field name used for error payloads attached to records.
pub const DEFAULT_ERROR_FIELD: &str = "error.message";
/// `LOGGING_ENVIRONMENT` value that switches on development mode.
pub const DEV_ENVIRONMENT: &str = "dev";

/// Logging configuration, resolved from `LOGGING_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Raw level name from `LOGGING_LOGLEVEL`. Kept unvalidated here;
    /// normalization happens when a logger is constructed.
    #[serde(default = "default_loglevel")]
    pub loglevel: String,
    /// Deployment environment name from `LOGGING_ENVIRONMENT`.
    #[serde(default)]
    pub environment: String,
    /// Field name for error payloads, from `LOGGING_ERROR_FIELD`.
    #[serde(default = "default_error_field")]
    pub error_field: String,
}

fn default_loglevel() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_error_field() -> String {
    DEFAULT_ERROR_FIELD.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            loglevel: default_loglevel(),
            environment: String::new(),
            error_field: default_error_field(),
        }
    }
}

impl LoggingConfig {
    /// Read configuration from the process environment. Missing or
    /// unreadable variables are not an error: defaults apply.
    pub fn from_env() -> Self {
        Figment::new()
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .unwrap_or_default()
    }

    /// Severity threshold. Unrecognized names fall back to `info`.
    pub fn level(&self) -> Level {
        Level::parse_lossy(&self.loglevel)
    }

    /// Development mode: the environment name is exactly `dev`.
    ///
    /// Reserved toggle for console-friendly output; record shape and
    /// routing do not branch on it today.
    pub fn is_dev(&self) -> bool {
        self.environment == DEV_ENVIRONMENT
    }
}
