//! Logging macros for ergonomic message formatting and context literals.
//!
//! The level macros format their message like `format!`, optionally taking a
//! `ctx = ...` context (and, for [`error!`], an `err = ...` descriptor) ahead
//! of the format string.
//!
//! # Examples
//!
//! ```
//! use ctxlog::prelude::*;
//! use ctxlog::{context, info};
//!
//! let sink = MemorySink::new();
//! let logger = Logger::builder().sink(sink.clone()).build();
//!
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//! info!(logger, ctx = context! { "port" => port }, "Server ready");
//!
//! assert_eq!(sink.len(), 2);
//! assert_eq!(sink.entries()[0].message, "Server listening on port 8080");
//! ```

/// Build a [`LogContext`](crate::LogContext) from `key => value` pairs.
///
/// # Examples
///
/// ```
/// use ctxlog::context;
///
/// let ctx = context! { "user_id" => "usr_456", "attempt" => 3 };
/// assert_eq!(ctx.len(), 2);
///
/// let empty = context! {};
/// assert!(empty.is_empty());
/// ```
#[macro_export]
macro_rules! context {
    () => {
        $crate::LogContext::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut ctx = $crate::LogContext::new();
        $( ctx.insert($key, $value); )+
        ctx
    }};
}

/// Log a message at the given level with automatic formatting.
///
/// # Examples
///
/// ```
/// # use ctxlog::prelude::*;
/// # let logger = Logger::builder().sink(MemorySink::new()).build();
/// use ctxlog::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Warn, "Retry {} of {}", 1, 3);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, ctx = $ctx:expr, $($arg:tt)+) => {{
        use $crate::Log as _;
        $logger.log($level, &format!($($arg)+), None, Some(&$ctx))
    }};
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        use $crate::Log as _;
        $logger.log($level, &format!($($arg)+), None, None)
    }};
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use ctxlog::prelude::*;
/// # let logger = Logger::builder().sink(MemorySink::new()).build();
/// use ctxlog::debug;
/// debug!(logger, "Cache size: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message, optionally with an
/// [`ErrorInfo`](crate::ErrorInfo) and context.
///
/// # Examples
///
/// ```
/// # use ctxlog::prelude::*;
/// # let logger = Logger::builder().sink(MemorySink::new()).build();
/// use ctxlog::{context, error};
/// let failure = ErrorInfo::new("DbError", "connection refused");
///
/// error!(logger, "Error code: {}", 500);
/// error!(logger, err = failure, "Database connection failed");
/// error!(logger, err = failure, ctx = context! { "retries" => 3 }, "Giving up");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, err = $err:expr, ctx = $ctx:expr, $($arg:tt)+) => {{
        use $crate::Log as _;
        $logger.error(&format!($($arg)+), Some(&$err), Some(&$ctx))
    }};
    ($logger:expr, err = $err:expr, $($arg:tt)+) => {{
        use $crate::Log as _;
        $logger.error(&format!($($arg)+), Some(&$err), None)
    }};
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}
