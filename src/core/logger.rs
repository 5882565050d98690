//! Main logger implementation

use super::{
    config::LoggerConfig,
    dispatcher::Dispatcher,
    error::{panic_message, stderr_reporter, ErrorReporter, LoggerError, Result},
    error_info::ErrorInfo,
    log_context::LogContext,
    log_entry::LogEntry,
    log_level::{LevelFilter, LogLevel},
    metrics::LoggerMetrics,
    sink::Sink,
};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// The logging facade.
///
/// None of these methods can fail or panic into the caller. An entry that
/// cannot be written is, at worst, a missing line.
pub trait Log: Send + Sync {
    /// Filter, merge, and dispatch one event
    fn log(
        &self,
        level: LogLevel,
        message: &str,
        error: Option<&ErrorInfo>,
        context: Option<&LogContext>,
    );

    #[inline]
    fn debug(&self, message: &str, context: Option<&LogContext>) {
        self.log(LogLevel::Debug, message, None, context);
    }

    #[inline]
    fn info(&self, message: &str, context: Option<&LogContext>) {
        self.log(LogLevel::Info, message, None, context);
    }

    #[inline]
    fn warn(&self, message: &str, context: Option<&LogContext>) {
        self.log(LogLevel::Warn, message, None, context);
    }

    #[inline]
    fn error(&self, message: &str, error: Option<&ErrorInfo>, context: Option<&LogContext>) {
        self.log(LogLevel::Error, message, error, context);
    }

    /// Derive a logger whose context is this one's merged with `context`
    fn child(&self, context: &LogContext) -> Self
    where
        Self: Sized;
}

/// A logger bound to a context snapshot, a config snapshot, and a shared set
/// of sinks.
///
/// # Example
///
/// ```
/// use ctxlog::prelude::*;
///
/// let sink = MemorySink::new();
/// let logger = Logger::builder()
///     .context(LogContext::new().with_field("service_version", "1.2.0"))
///     .sink(sink.clone())
///     .build();
///
/// let request = logger.child(&LogContext::new().with_field("request_id", "req-123"));
/// request.info("Processing request", None);
///
/// let entry = sink.last().unwrap();
/// assert!(entry.context.contains_key("service_version"));
/// assert!(entry.context.contains_key("request_id"));
/// ```
#[derive(Clone)]
pub struct Logger {
    context: LogContext,
    config: Arc<LoggerConfig>,
    filter: LevelFilter,
    dispatcher: Arc<Dispatcher>,
}

impl Logger {
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// The context every entry from this logger carries
    pub fn context(&self) -> &LogContext {
        &self.context
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    pub fn level_filter(&self) -> LevelFilter {
        self.filter
    }

    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.filter.enabled(level)
    }

    /// Dispatch counters, shared with every logger derived from this one
    pub fn metrics(&self) -> &LoggerMetrics {
        self.dispatcher.metrics()
    }

    /// Names of the sinks this logger writes to
    pub fn sink_names(&self) -> Vec<&str> {
        self.dispatcher.sink_names()
    }

    /// Flush every sink.
    ///
    /// Failures are reported through the error reporter as well as returned.
    pub fn flush(&self) -> Result<()> {
        match self.dispatcher.flush() {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }

    fn build_entry(
        &self,
        level: LogLevel,
        message: &str,
        error: Option<&ErrorInfo>,
        context: Option<&LogContext>,
    ) -> LogEntry {
        let merged = match context {
            Some(ctx) => self.context.merged(ctx),
            None => self.context.clone(),
        };

        let entry = LogEntry::new(level, message, self.config.service.as_str()).with_context(merged);
        match error {
            Some(err) => entry.with_error(err.clone()),
            None => entry,
        }
    }
}

impl Log for Logger {
    fn log(
        &self,
        level: LogLevel,
        message: &str,
        error: Option<&ErrorInfo>,
        context: Option<&LogContext>,
    ) {
        if !self.filter.enabled(level) {
            self.dispatcher.metrics().record_filtered();
            return;
        }

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let entry = self.build_entry(level, message, error, context);
            self.dispatcher.dispatch(&entry);
        }));

        if let Err(payload) = outcome {
            self.dispatcher.report(
                "logger",
                &LoggerError::other(format!(
                    "dropped {} entry: {}",
                    level,
                    panic_message(payload.as_ref())
                )),
            );
        }
    }

    fn child(&self, context: &LogContext) -> Self {
        Self {
            context: self.context.merged(context),
            config: Arc::clone(&self.config),
            filter: self.filter,
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("service", &self.config.service)
            .field("filter", &self.filter)
            .field("context", &self.context)
            .field("sinks", &self.dispatcher.sink_names())
            .finish()
    }
}

/// Builder for constructing Logger with a fluent API
///
/// Sinks are built by the caller and handed in; the logger never constructs
/// one itself.
///
/// # Example
/// ```
/// use ctxlog::prelude::*;
///
/// let config = LoggerConfig::resolve(
///     PartialLoggerConfig::new().service("api").level("debug"),
///     &EnvDefaults::default(),
/// );
/// let logger = Logger::builder()
///     .config(config)
///     .sink(ConsoleSink::new())
///     .build();
/// assert!(logger.enabled(LogLevel::Debug));
/// ```
pub struct LoggerBuilder {
    config: LoggerConfig,
    context: LogContext,
    sinks: Vec<Box<dyn Sink>>,
    reporter: ErrorReporter,
    metrics: Arc<LoggerMetrics>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: LoggerConfig::default(),
            context: LogContext::new(),
            sinks: Vec::new(),
            reporter: stderr_reporter(),
            metrics: Arc::new(LoggerMetrics::new()),
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: LoggerConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn context(mut self, context: LogContext) -> Self {
        self.context = context;
        self
    }

    /// Add a sink
    #[must_use = "builder methods return a new value"]
    pub fn sink<S: Sink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn boxed_sink(mut self, sink: Box<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Where sink failures and configuration warnings go.
    /// Defaults to stderr.
    #[must_use = "builder methods return a new value"]
    pub fn on_error(mut self, reporter: ErrorReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Counters to record into. Pass the same handle to
    /// [`AsyncSink::with_metrics`](crate::AsyncSink::with_metrics) so
    /// failures on its worker thread are counted too.
    #[must_use = "builder methods return a new value"]
    pub fn metrics(mut self, metrics: Arc<LoggerMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Build the Logger
    pub fn build(self) -> Logger {
        let filter = LevelFilter::parse(&self.config.level);
        let dispatcher = Dispatcher::with_metrics(self.sinks, self.reporter, self.metrics);

        if filter == LevelFilter::All {
            dispatcher.report(
                "logger",
                &LoggerError::config(
                    "level",
                    format!(
                        "unrecognized level '{}', all severities enabled",
                        self.config.level
                    ),
                ),
            );
        }

        Logger {
            context: self.context,
            config: Arc::new(self.config),
            filter,
            dispatcher: Arc::new(dispatcher),
        }
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
