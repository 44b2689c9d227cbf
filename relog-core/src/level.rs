use thiserror::Error;

/// Record severity, ordered from most to least verbose.
///
/// A [`Logger`](crate::Logger) writes a record when the record's level is at
/// or above the logger's threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

/// Returned by the strict parser when a level name is not recognized.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized log level: {0:?}")]
pub struct ParseLevelError(String);

impl Level {
    /// Canonical lowercase name, as it appears in emitted records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }

    /// All levels, most verbose first.
    pub fn all() -> &'static [Level] {
        &[
            Level::Trace,
            Level::Debug,
            Level::Info,
            Level::Warn,
            Level::Error,
        ]
    }

    /// Strict lookup by name. Accepts the canonical names plus the common
    /// aliases `err`, `warning`, and `information`, case-insensitively.
    pub fn from_name(name: &str) -> Option<Level> {
        match name.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::Trace),
            "debug" => Some(Level::Debug),
            "info" | "information" => Some(Level::Info),
            "warn" | "warning" => Some(Level::Warn),
            "error" | "err" => Some(Level::Error),
            _ => None,
        }
    }

    /// Normalize a configured level name. Anything unrecognized maps to
    /// `Info` so that a typo in configuration degrades verbosity instead of
    /// silencing the process.
    pub fn parse_lossy(name: &str) -> Level {
        Self::from_name(name).unwrap_or(Level::Info)
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ParseLevelError(s.to_string()))
    }
}
