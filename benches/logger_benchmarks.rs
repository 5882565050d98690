//! Criterion benchmarks for ctxlog

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use ctxlog::prelude::*;
use std::sync::Arc;

/// Discards everything so repeated iterations don't accumulate entries
struct NullSink;

impl Sink for NullSink {
    fn write(&mut self, entry: &LogEntry) -> Result<()> {
        black_box(entry);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}

fn null_logger(level: &str) -> Logger {
    Logger::builder()
        .config(LoggerConfig::resolve(
            PartialLoggerConfig::new().service("bench").level(level),
            &EnvDefaults::default(),
        ))
        .sink(NullSink)
        .on_error(Arc::new(|_, _| {}))
        .build()
}

fn sample_context(size: usize) -> LogContext {
    (0..size).map(|i| (format!("field_{}", i), i as i64)).collect()
}

// ============================================================================
// Context Benchmarks
// ============================================================================

fn bench_context_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("context_merge");
    group.throughput(Throughput::Elements(1));

    for size in [1usize, 8, 32] {
        let base = sample_context(size);
        let overlay = sample_context(size / 2 + 1);
        group.bench_function(format!("fields_{}", size), |b| {
            b.iter(|| black_box(base.merged(black_box(&overlay))));
        });
    }

    group.finish();
}

fn bench_child_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("child_creation");
    group.throughput(Throughput::Elements(1));

    let logger = null_logger("info").child(&sample_context(8));
    let request = LogContext::new().with_field("request_id", "req-123");

    group.bench_function("child", |b| {
        b.iter(|| black_box(logger.child(black_box(&request))));
    });

    group.finish();
}

// ============================================================================
// Dispatch Benchmarks
// ============================================================================

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    group.throughput(Throughput::Elements(1));

    let logger = null_logger("info").child(&sample_context(4));
    let call = LogContext::new().with_field("duration_ms", 12);
    let failure = ErrorInfo::new("Timeout", "upstream timed out");

    group.bench_function("info_no_context", |b| {
        b.iter(|| logger.info(black_box("Request handled"), None));
    });

    group.bench_function("info_with_context", |b| {
        b.iter(|| logger.info(black_box("Request handled"), Some(&call)));
    });

    group.bench_function("error_with_descriptor", |b| {
        b.iter(|| logger.error(black_box("Request failed"), Some(&failure), Some(&call)));
    });

    group.bench_function("filtered_debug", |b| {
        b.iter(|| logger.debug(black_box("Not emitted"), Some(&call)));
    });

    group.finish();
}

fn bench_json_rendering(c: &mut Criterion) {
    let entry = LogEntry::new(LogLevel::Info, "Request handled", "bench")
        .with_context(sample_context(8))
        .with_error(ErrorInfo::new("Timeout", "upstream timed out"));

    c.bench_function("entry_to_json", |b| {
        b.iter(|| black_box(entry.to_json()));
    });
}

criterion_group!(
    benches,
    bench_context_merge,
    bench_child_creation,
    bench_dispatch,
    bench_json_rendering
);
criterion_main!(benches);
