//! Basic logger usage example
//!
//! Demonstrates factory-built loggers, child contexts, error descriptors and
//! level filtering.
//!
//! Run with: cargo run --example basic_usage

use ctxlog::prelude::*;
use ctxlog::{context, info};

#[derive(Debug, thiserror::Error)]
#[error("connection refused by {host}")]
struct ConnectError {
    host: String,
}

fn main() -> Result<()> {
    println!("=== ctxlog - Basic Usage Example ===\n");

    // Console-only logger; nothing is written to disk
    let logger = create_test_logger(
        Some("checkout"),
        Some(context! { "service_version" => "1.2.0" }),
    );

    println!("1. Logging at different levels:");
    logger.debug("This is a debug message (hidden at the default level)", None);
    logger.info("This is an info message", None);
    logger.warn("Rate limit approaching", Some(&context! { "limit" => 100, "current" => 95 }));

    println!("\n2. Child loggers inherit context:");
    let request = logger.child(&context! { "request_id" => "req-123", "user_id" => "usr_456" });
    request.info("Processing request", None);
    info!(request, ctx = context! { "items" => 3 }, "Cart has {} items", 3);

    println!("\n3. Logging errors:");
    let err = ConnectError {
        host: "db.internal".to_string(),
    };
    request.error(
        "Database connection failed",
        Some(&ErrorInfo::from_error(&err)),
        Some(&context! { "retries" => 2 }),
    );

    println!("\n4. Explicit level override:");
    let verbose = LoggerFactory::from_env().create_logger(
        "checkout",
        None,
        Some(PartialLoggerConfig::new().level("debug").test(true)),
    );
    verbose.debug("Debug message (visible)", None);

    logger.flush()?;
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
