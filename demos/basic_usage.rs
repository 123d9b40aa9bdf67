//! Basic logger usage example
//!
//! Demonstrates text output on the console, typed fields and level filtering.
//!
//! Run with: cargo run --example basic_usage

use rust_structured_logger::prelude::*;
use rust_structured_logger::{info, warn};

fn main() -> Result<()> {
    println!("=== Rust Structured Logger - Basic Usage Example ===\n");

    let logger = Logger::builder()
        .min_level(Level::TRACE)
        .writer(TextWriterConfig::new(ConsoleSink::stdout()).with_console_colors())
        .build();

    println!("1. Logging at different levels:");
    logger.trace("This is a trace message").log();
    logger.debug("This is a debug message").log();
    logger.info("This is an info message").log();
    logger.warn("This is a warning message").log();
    logger.error("This is an error message").log();
    logger.fatal("This is a fatal message").log();

    println!("\n2. Typed fields:");
    logger
        .info("request handled")
        .str("method", "GET")
        .int("status", 200)
        .float("duration_ms", 3.75)
        .bool("cached", true)
        .strs("tags", &["api", "v1"])
        .uuid("request_id", uuid::Uuid::new_v4().as_bytes())
        .log();

    let attempts = 3;
    warn!(logger, "retrying after {} attempts", attempts)
        .err(&std::io::Error::new(std::io::ErrorKind::TimedOut, "connection timed out"))
        .log();

    println!("\n3. Raising the minimum level:");
    logger.set_level_filter(LevelThreshold(Level::INFO));
    println!("   Minimum level set to INFO - trace and debug won't show:");
    logger.trace("Trace message (hidden)").log();
    logger.debug("Debug message (hidden)").log();
    info!(logger, "Info message (visible)").log();

    logger.flush_underlying()?;
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
