//! Sink implementations

pub mod async_sink;
pub mod console;
pub mod memory;
pub mod rotating_file;

pub use async_sink::{AsyncSink, DEFAULT_QUEUE_CAPACITY, DEFAULT_SHUTDOWN_TIMEOUT};
pub use console::ConsoleSink;
pub use memory::MemorySink;
pub use rotating_file::{RotatingFileSink, RotationPolicy};

pub use crate::core::{DeferredFlush, Sink};
