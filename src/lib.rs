//! # ctxlog
//!
//! Structured, context-carrying logging for services.
//!
//! ## Features
//!
//! - **Context Inheritance**: child loggers merge their fields over the parent's
//! - **Fail-Safe**: sink failures and panics never reach the logging caller
//! - **Rotating Files**: daily and size-based rotation with retention and gzip
//! - **Test Loggers**: console-only loggers that never touch the filesystem
//!
//! ```
//! use ctxlog::prelude::*;
//!
//! let logger = create_test_logger(Some("checkout"), None);
//! let request = logger.child(&LogContext::new().with_field("request_id", "req-123"));
//! request.info("Processing request", None);
//! ```

pub mod core;
pub mod factory;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::core::{
        EnvDefaults, ErrorInfo, ErrorReporter, FieldValue, LevelFilter, Log, LogContext, LogEntry,
        LogLevel, Logger, LoggerBuilder, LoggerConfig, LoggerError, LoggerMetrics,
        PartialLoggerConfig, Result, Retention, Sink,
    };
    pub use crate::factory::{create_logger, create_test_logger, LoggerFactory};
    pub use crate::sinks::{AsyncSink, ConsoleSink, MemorySink, RotatingFileSink, RotationPolicy};
}

pub use crate::core::{
    stderr_reporter, DeferredFlush, EnvDefaults, ErrorInfo, ErrorReporter, FieldValue,
    LevelFilter, Log, LogContext, LogEntry, LogLevel, Logger, LoggerBuilder, LoggerConfig,
    LoggerError, LoggerMetrics, PartialLoggerConfig, Result, Retention, Sink,
};
pub use factory::{create_logger, create_test_logger, LoggerFactory};
pub use sinks::{
    AsyncSink, ConsoleSink, MemorySink, RotatingFileSink, RotationPolicy, DEFAULT_QUEUE_CAPACITY,
    DEFAULT_SHUTDOWN_TIMEOUT,
};
