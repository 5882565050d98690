//! Ready-to-use loggers without manual sink wiring
//!
//! Production loggers write to the console and, through a background worker,
//! to a rotating file. Test loggers write to the console only and never
//! construct a file sink, so nothing touches the filesystem.

use crate::core::{
    stderr_reporter, EnvDefaults, ErrorReporter, LogContext, Logger, LoggerConfig,
    LoggerMetrics, PartialLoggerConfig,
};
use crate::sinks::{AsyncSink, ConsoleSink, RotatingFileSink, DEFAULT_QUEUE_CAPACITY};
use once_cell::sync::Lazy;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Service name used by [`create_test_logger`] when none is given
pub const TEST_SERVICE: &str = "test";

static DEFAULT_FACTORY: Lazy<LoggerFactory> = Lazy::new(LoggerFactory::from_env);

/// Builds loggers from partial configuration plus captured environment
/// defaults.
///
/// # Example
///
/// ```
/// use ctxlog::prelude::*;
///
/// let factory = LoggerFactory::new(EnvDefaults::with_level("warn"));
/// let logger = factory.create_test_logger(None, None);
///
/// assert_eq!(logger.config().service, "test");
/// assert!(!logger.enabled(LogLevel::Info));
/// assert_eq!(logger.sink_names(), vec!["console"]);
/// ```
#[derive(Clone)]
pub struct LoggerFactory {
    env: EnvDefaults,
    reporter: ErrorReporter,
    queue_capacity: usize,
}

impl LoggerFactory {
    pub fn new(env: EnvDefaults) -> Self {
        Self {
            env,
            reporter: stderr_reporter(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    /// Factory whose defaults come from the process environment, read now
    pub fn from_env() -> Self {
        Self::new(EnvDefaults::from_env())
    }

    /// Where sink failures are reported. Defaults to stderr.
    #[must_use = "builder methods return a new value"]
    pub fn on_error(mut self, reporter: ErrorReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Queue length of the background file writer
    #[must_use = "builder methods return a new value"]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn env(&self) -> &EnvDefaults {
        &self.env
    }

    /// Create a logger for `service`.
    ///
    /// `service` always wins over any service set in `config`. A durable
    /// file sink is attached unless `config` sets `test`.
    pub fn create_logger(
        &self,
        service: &str,
        context: Option<LogContext>,
        config: Option<PartialLoggerConfig>,
    ) -> Logger {
        let partial = config.unwrap_or_default().service(service);
        self.build(LoggerConfig::resolve(partial, &self.env), context.unwrap_or_default())
    }

    /// Create a console-only logger; `service` defaults to `"test"`
    pub fn create_test_logger(&self, service: Option<&str>, context: Option<LogContext>) -> Logger {
        let partial = PartialLoggerConfig::new()
            .service(service.unwrap_or(TEST_SERVICE))
            .test(true);
        self.build(LoggerConfig::resolve(partial, &self.env), context.unwrap_or_default())
    }

    /// Wire sinks for an already resolved config
    pub fn build(&self, config: LoggerConfig, context: LogContext) -> Logger {
        let metrics = Arc::new(LoggerMetrics::new());
        let mut builder = Logger::builder()
            .context(context)
            .on_error(self.reporter.clone())
            .metrics(Arc::clone(&metrics))
            .sink(ConsoleSink::new());

        if !config.test {
            let durable = RotatingFileSink::from_config(&config).and_then(|sink| {
                AsyncSink::with_metrics(sink, self.queue_capacity, self.reporter.clone(), metrics)
            });

            match durable {
                Ok(sink) => builder = builder.sink(sink),
                Err(e) => {
                    let _ = catch_unwind(AssertUnwindSafe(|| (self.reporter)("rotating_file", &e)));
                }
            }
        }

        builder.config(config).build()
    }
}

impl Default for LoggerFactory {
    fn default() -> Self {
        Self::new(EnvDefaults::default())
    }
}

impl std::fmt::Debug for LoggerFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerFactory")
            .field("env", &self.env)
            .field("queue_capacity", &self.queue_capacity)
            .finish()
    }
}

/// [`LoggerFactory::create_logger`] on a process-wide factory whose
/// environment defaults are captured once, on first use
pub fn create_logger(
    service: &str,
    context: Option<LogContext>,
    config: Option<PartialLoggerConfig>,
) -> Logger {
    DEFAULT_FACTORY.create_logger(service, context, config)
}

/// [`LoggerFactory::create_test_logger`] on the process-wide factory
pub fn create_test_logger(service: Option<&str>, context: Option<LogContext>) -> Logger {
    DEFAULT_FACTORY.create_test_logger(service, context)
}
