//! File logging example
//!
//! Demonstrates writing JSON Lines to a file and text to the console at the
//! same time.
//!
//! Run with: cargo run --example file_logging

use rust_structured_logger::prelude::*;

fn main() -> Result<()> {
    println!("=== Rust Structured Logger - File Logging Example ===\n");

    let logger = Logger::builder()
        .min_level(Level::DEBUG)
        .writer(TextWriterConfig::new(ConsoleSink::stdout()))
        .writer(
            JsonWriterConfig::new(FileSink::new("application.jsonl")?)
                .with_timestamp_format(TimestampFormat::UnixMillis)
                .with_level_filter(LevelThreshold(Level::INFO)),
        )
        .attrib(Attrib::string("app", "file_logging"))
        .build();

    println!("1. Logging to both console and file:");
    logger.info("Application started").log();
    logger.debug("Loading configuration...").log();
    logger.warn("Using default settings for some options").log();
    logger.error("Failed to load optional plugin").str("plugin", "metrics").log();

    println!("\n2. Performing some operations:");
    for i in 1..=5 {
        let msg = logger.info("Processing item").int("item", i).int("of", 5);
        if i == 3 {
            msg.uint("elapsed_ms", 1250u32).log();
        } else {
            msg.log();
        }
    }
    logger.info("All operations completed").log();

    // Buffered records reach the file on flush
    logger.flush_underlying()?;

    println!("\n=== Example completed successfully! ===");
    println!("Check 'application.jsonl' for the JSON output");

    Ok(())
}
