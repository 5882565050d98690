//! Fan-out of entries to sinks with per-sink failure isolation

use super::{
    error::{panic_message, ErrorReporter, LoggerError},
    log_entry::LogEntry,
    metrics::LoggerMetrics,
    sink::Sink,
};
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

struct SinkSlot {
    name: String,
    sink: Mutex<Box<dyn Sink>>,
}

/// The set of sinks shared by a logger and every child derived from it.
///
/// Each sink sits behind its own lock so one slow or failing sink does not
/// hold up delivery to the others. Nothing here returns an error to the
/// logging caller: failures and panics go to the [`ErrorReporter`].
pub struct Dispatcher {
    sinks: Vec<SinkSlot>,
    metrics: Arc<LoggerMetrics>,
    reporter: ErrorReporter,
}

impl Dispatcher {
    pub fn new(sinks: Vec<Box<dyn Sink>>, reporter: ErrorReporter) -> Self {
        Self::with_metrics(sinks, reporter, Arc::new(LoggerMetrics::new()))
    }

    /// Count into `metrics`, which background sinks may share
    pub fn with_metrics(
        sinks: Vec<Box<dyn Sink>>,
        reporter: ErrorReporter,
        metrics: Arc<LoggerMetrics>,
    ) -> Self {
        let sinks = sinks
            .into_iter()
            .map(|sink| SinkSlot {
                name: sink.name().to_string(),
                sink: Mutex::new(sink),
            })
            .collect();

        Self {
            sinks,
            metrics,
            reporter,
        }
    }

    /// Deliver an entry to every sink
    pub fn dispatch(&self, entry: &LogEntry) {
        let mut has_error = false;

        for slot in &self.sinks {
            let result = catch_unwind(AssertUnwindSafe(|| slot.sink.lock().write(entry)));
            if let Some(err) = Self::failure(&slot.name, result) {
                self.metrics.record_sink_error();
                self.report(&slot.name, &err);
                has_error = true;
            }
        }

        if has_error {
            self.metrics.record_dropped();
        } else {
            self.metrics.record_logged();
        }
    }

    /// Flush every sink, reporting failures.
    ///
    /// A sink's lock is held only while the flush is started; any wait for a
    /// background worker happens after it is released, so concurrent
    /// `dispatch` calls are not held up.
    ///
    /// Returns the first failure so callers that want it can inspect it.
    pub fn flush(&self) -> Option<LoggerError> {
        let mut first = None;

        for slot in &self.sinks {
            let started = catch_unwind(AssertUnwindSafe(|| slot.sink.lock().begin_flush()));
            let result = match started {
                Ok(Ok(Some(deferred))) => catch_unwind(AssertUnwindSafe(deferred)),
                Ok(Ok(None)) => Ok(Ok(())),
                Ok(Err(e)) => Ok(Err(e)),
                Err(payload) => Err(payload),
            };

            if let Some(err) = Self::failure(&slot.name, result) {
                self.metrics.record_sink_error();
                self.report(&slot.name, &err);
                first.get_or_insert(err);
            }
        }

        first
    }

    pub(crate) fn report(&self, component: &str, err: &LoggerError) {
        // a panicking reporter must not escape either
        let _ = catch_unwind(AssertUnwindSafe(|| (self.reporter)(component, err)));
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|slot| slot.name.as_str()).collect()
    }

    fn failure(
        name: &str,
        result: std::thread::Result<super::error::Result<()>>,
    ) -> Option<LoggerError> {
        match result {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(payload) => Some(LoggerError::sink_panicked(name, panic_message(payload.as_ref()))),
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("sinks", &self.sink_names())
            .field("metrics", &self.metrics)
            .finish()
    }
}
