//! Core logger types and traits

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod error_info;
pub mod log_context;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod sink;

pub use config::{parse_size, EnvDefaults, LoggerConfig, PartialLoggerConfig, Retention};
pub use dispatcher::Dispatcher;
pub use error::{stderr_reporter, ErrorReporter, LoggerError, Result};
pub use error_info::ErrorInfo;
pub use log_context::{FieldValue, LogContext};
pub use log_entry::LogEntry;
pub use log_level::{LevelFilter, LogLevel};
pub use logger::{Log, Logger, LoggerBuilder};
pub use metrics::LoggerMetrics;
pub use sink::{DeferredFlush, Sink};
