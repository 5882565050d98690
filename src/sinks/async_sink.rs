//! Background-thread wrapper for sinks that do blocking I/O

use crate::core::error::panic_message;
use crate::core::sink::DeferredFlush;
use crate::core::{ErrorReporter, LogEntry, LoggerError, LoggerMetrics, Result, Sink};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default shutdown timeout for draining queued entries (5 seconds)
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// How long `flush` waits for the worker to acknowledge
pub const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

pub const DEFAULT_QUEUE_CAPACITY: usize = 8192;

enum Command {
    Write(Box<LogEntry>),
    Flush(Sender<Result<()>>),
}

/// Runs an inner sink on a dedicated thread.
///
/// `write` only enqueues, so the caller never waits on the inner sink's I/O.
/// A full queue drops the entry and returns [`LoggerError::QueueFull`].
/// Failures inside the worker go to the [`ErrorReporter`] and are counted as
/// sink errors in the [`LoggerMetrics`] given to [`AsyncSink::with_metrics`].
/// Dropping the sink drains the queue, waiting at most
/// [`DEFAULT_SHUTDOWN_TIMEOUT`].
pub struct AsyncSink {
    name: String,
    capacity: usize,
    sender: Option<Sender<Command>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl AsyncSink {
    /// Spawn the worker thread
    ///
    /// # Errors
    ///
    /// Returns error if the thread cannot be spawned
    pub fn new<S: Sink + 'static>(inner: S, capacity: usize, reporter: ErrorReporter) -> Result<Self> {
        Self::with_metrics(inner, capacity, reporter, Arc::new(LoggerMetrics::new()))
    }

    /// Spawn the worker thread, counting its write failures into `metrics`
    ///
    /// # Errors
    ///
    /// Returns error if the thread cannot be spawned
    pub fn with_metrics<S: Sink + 'static>(
        inner: S,
        capacity: usize,
        reporter: ErrorReporter,
        metrics: Arc<LoggerMetrics>,
    ) -> Result<Self> {
        let capacity = capacity.max(1);
        let inner_name = inner.name().to_string();
        let name = format!("async({})", inner_name);
        let (sender, receiver) = bounded(capacity);

        let handle = thread::Builder::new()
            .name(format!("ctxlog-{}", inner_name))
            .spawn(move || Self::run(inner, inner_name, receiver, reporter, metrics))
            .map_err(|e| LoggerError::io_operation("spawn sink worker", name.clone(), e))?;

        Ok(Self {
            name,
            capacity,
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    fn run<S: Sink>(
        mut inner: S,
        name: String,
        receiver: Receiver<Command>,
        reporter: ErrorReporter,
        metrics: Arc<LoggerMetrics>,
    ) {
        let report = |err: &LoggerError| {
            metrics.record_sink_error();
            let _ = catch_unwind(AssertUnwindSafe(|| reporter(&name, err)));
        };

        for command in receiver.iter() {
            match command {
                Command::Write(entry) => {
                    match catch_unwind(AssertUnwindSafe(|| inner.write(&entry))) {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => report(&e),
                        Err(payload) => {
                            report(&LoggerError::sink_panicked(&name, panic_message(payload.as_ref())))
                        }
                    }

                    // flush once the current burst is drained
                    if receiver.is_empty() {
                        if let Ok(Err(e)) = catch_unwind(AssertUnwindSafe(|| inner.flush())) {
                            report(&e);
                        }
                    }
                }
                Command::Flush(ack) => {
                    let result = catch_unwind(AssertUnwindSafe(|| inner.flush())).unwrap_or_else(
                        |payload| Err(LoggerError::sink_panicked(&name, panic_message(payload.as_ref()))),
                    );
                    let _ = ack.send(result);
                }
            }
        }

        if let Ok(Err(e)) = catch_unwind(AssertUnwindSafe(|| inner.flush())) {
            report(&e);
        }
    }

    /// Ask the worker to flush and wait for its answer
    fn flush_through(sender: &Sender<Command>, name: &str) -> Result<()> {
        let (ack_tx, ack_rx) = bounded(1);
        sender
            .send_timeout(Command::Flush(ack_tx), FLUSH_TIMEOUT)
            .map_err(|_| LoggerError::worker_disconnected(name))?;

        ack_rx
            .recv_timeout(FLUSH_TIMEOUT)
            .map_err(|_| LoggerError::worker_disconnected(name))?
    }

    /// Number of entries waiting for the worker
    pub fn queued(&self) -> usize {
        self.sender.as_ref().map_or(0, Sender::len)
    }

    /// Close the queue and wait for the worker to drain it.
    ///
    /// Returns `false` if the worker did not finish within `timeout`.
    pub fn shutdown(&mut self, timeout: Duration) -> bool {
        drop(self.sender.take());

        let Some(handle) = self.handle.take() else {
            return true;
        };

        let start = Instant::now();
        loop {
            if handle.is_finished() {
                if let Err(e) = handle.join() {
                    eprintln!("[ctxlog ERROR] Sink worker panicked during shutdown: {:?}", e);
                    return false;
                }
                return true;
            }

            if start.elapsed() >= timeout {
                eprintln!(
                    "[ctxlog WARN] Sink worker '{}' did not finish within {:?}. Some entries may be lost.",
                    self.name, timeout
                );
                return false;
            }

            thread::sleep(Duration::from_millis(10));
        }
    }
}

impl Sink for AsyncSink {
    fn write(&mut self, entry: &LogEntry) -> Result<()> {
        let Some(ref sender) = self.sender else {
            return Err(LoggerError::worker_disconnected(&self.name));
        };

        match sender.try_send(Command::Write(Box::new(entry.clone()))) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(LoggerError::queue_full(sender.len(), self.capacity)),
            Err(TrySendError::Disconnected(_)) => Err(LoggerError::worker_disconnected(&self.name)),
        }
    }

    fn flush(&mut self) -> Result<()> {
        match self.sender {
            Some(ref sender) => Self::flush_through(sender, &self.name),
            None => Err(LoggerError::worker_disconnected(&self.name)),
        }
    }

    fn begin_flush(&mut self) -> Result<Option<DeferredFlush>> {
        let Some(ref sender) = self.sender else {
            return Err(LoggerError::worker_disconnected(&self.name));
        };

        let sender = sender.clone();
        let name = self.name.clone();
        Ok(Some(Box::new(move || Self::flush_through(&sender, &name))))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for AsyncSink {
    fn drop(&mut self) {
        self.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);
    }
}
