//! Core logging types for Relog: severity levels, the immutable [`Logger`]
//! value, record sinks, environment configuration, and the [`LogContext`]
//! carrier threaded through request handling.

pub mod config;
pub mod context;
pub mod level;
pub mod logger;
pub mod sink;

pub use config::LoggingConfig;
pub use context::LogContext;
pub use level::{Level, ParseLevelError};
pub use logger::{Event, Logger};
pub use sink::{MemorySink, Sink};
