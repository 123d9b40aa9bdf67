//! Sub-logger and context example
//!
//! Demonstrates inherited fields across threads: a per-service logger, a
//! per-request sub-logger, and a context passed down the call tree.
//!
//! Run with: cargo run --example sub_loggers

use rust_structured_logger::core::parse_uuid_or_new;
use rust_structured_logger::prelude::*;
use serde::Serialize;
use std::thread;

#[derive(Serialize)]
struct Order {
    id: u64,
    items: Vec<&'static str>,
    total_cents: u64,
    card_number: &'static str,
}

fn charge(logger: &Logger, ctx: &LogContext, order: &Order) {
    logger
        .info_ctx(ctx, "charging card")
        .tagged_struct_fields(order, &["card_number"])
        .log();
}

fn main() -> Result<()> {
    println!("=== Rust Structured Logger - Sub-Logger Example ===\n");

    let root = Logger::builder()
        .writer(JsonWriterConfig::new(ConsoleSink::stdout()))
        .build();
    let service = root.with().str("service", "checkout").sub_logger();

    let handles: Vec<_> = (0..3u64)
        .map(|worker| {
            let service = service.clone();
            thread::spawn(move || {
                // An invalid header value gets a fresh id instead
                let header = if worker == 1 {
                    "not-a-uuid"
                } else {
                    "67e55044-10b1-426f-9247-bb680e5fe0c8"
                };
                let request_id = parse_uuid_or_new(header);

                let (request_log, ctx) = service
                    .with()
                    .uuid("request_id", &request_id)
                    .uint("worker", worker)
                    .sub_logger_context(&LogContext::new());

                request_log.info("request received").log();
                let order = Order {
                    id: 1000 + worker,
                    items: vec!["book", "pen"],
                    total_cents: 2599,
                    card_number: "4111111111111111",
                };
                // The context carries the request fields into code that only has the service logger
                charge(&service, &ctx, &order);
            })
        })
        .collect();

    for handle in handles {
        if handle.join().is_err() {
            eprintln!("worker panicked");
        }
    }

    service.flush_underlying()?;
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
