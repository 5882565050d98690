//! Sink trait for log output destinations

use super::{error::Result, log_entry::LogEntry};

/// Flush work a sink hands back to be completed after its lock is released
pub type DeferredFlush = Box<dyn FnOnce() -> Result<()> + Send>;

/// A destination for log entries.
///
/// Sinks own their resources (handles, buffers, worker threads). The logger
/// only hands them entries; failures are returned here and reported by the
/// dispatcher, never surfaced to logging callers.
pub trait Sink: Send {
    fn write(&mut self, entry: &LogEntry) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn name(&self) -> &str;

    /// Start a flush.
    ///
    /// Sinks that write on another thread return the wait as a
    /// [`DeferredFlush`] so the dispatcher can run it without holding the
    /// sink's lock. The default flushes inline.
    fn begin_flush(&mut self) -> Result<Option<DeferredFlush>> {
        self.flush().map(|()| None)
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn write(&mut self, entry: &LogEntry) -> Result<()> {
        (**self).write(entry)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn begin_flush(&mut self) -> Result<Option<DeferredFlush>> {
        (**self).begin_flush()
    }
}
