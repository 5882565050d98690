//! Dispatch metrics for observability
//!
//! Counters for monitoring logger health: how many entries reached every
//! sink, how many were partially lost to a failing sink, and how many were
//! suppressed by the level filter.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics shared by a logger and all of its children
///
/// # Example
///
/// ```
/// use ctxlog::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_logged();
/// metrics.record_sink_error();
///
/// assert_eq!(metrics.total_logged(), 1);
/// assert_eq!(metrics.sink_errors(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Entries delivered to every sink
    total_logged: AtomicU64,

    /// Entries at least one sink failed to accept
    dropped_count: AtomicU64,

    /// Individual sink failures (errors and panics), including those on
    /// background workers that share these metrics
    sink_errors: AtomicU64,

    /// Entries suppressed by the level filter
    filtered_count: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            total_logged: AtomicU64::new(0),
            dropped_count: AtomicU64::new(0),
            sink_errors: AtomicU64::new(0),
            filtered_count: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn total_logged(&self) -> u64 {
        self.total_logged.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sink_errors(&self) -> u64 {
        self.sink_errors.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered_count(&self) -> u64 {
        self.filtered_count.load(Ordering::Relaxed)
    }

    /// Record a successfully logged entry
    #[inline]
    pub fn record_logged(&self) -> u64 {
        self.total_logged.fetch_add(1, Ordering::Relaxed)
    }

    /// Record an entry that did not reach every sink
    #[inline]
    pub fn record_dropped(&self) -> u64 {
        self.dropped_count.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_sink_error(&self) -> u64 {
        self.sink_errors.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.filtered_count.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}
