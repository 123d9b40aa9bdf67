//! # Rust Structured Logger
//!
//! A pooled structured-logging core: a fluent sequence of typed field calls
//! becomes one serialized record (JSON Lines or human-readable text) without
//! per-call heap allocation once the pools are warm.
//!
//! ## Features
//!
//! - **Typed fields**: nil, bool, integers, floats, strings, errors, UUIDs,
//!   raw JSON, any `serde` value, and slices of each
//! - **Pooled**: message state and writers are reused across records
//! - **Inheritance**: sub-loggers and call contexts carry fixed fields
//! - **Multiple writers**: one record fans out to every configured encoding
//!
//! ```
//! use rust_structured_logger::prelude::*;
//!
//! let sink = BufferSink::new();
//! let logger = Logger::builder()
//!     .writer(JsonWriterConfig::new(sink.clone()))
//!     .build();
//!
//! let request_log = logger.with().str("request_id", "r-1").sub_logger();
//! request_log.info("handled").int("status", 200i32).log();
//!
//! let record: serde_json::Value = serde_json::from_str(sink.lines()[0].as_str()).unwrap();
//! assert_eq!(record["request_id"], "r-1");
//! assert_eq!(record["status"], 200);
//! ```

pub mod core;
pub mod macros;
pub mod sinks;
pub mod writers;

pub mod prelude {
    #[cfg(feature = "console")]
    pub use crate::core::ConsoleColorizer;
    pub use crate::core::{
        Attrib, AttribValue, Attribs, Colorizer, FormatConfig, Level, LevelFilter, LevelThreshold,
        Levels, LogContext, Loggable, Logger, LoggerBuilder, LoggerError, Message, NoColorizer,
        Result, TimestampFormat, ValueWriter,
    };
    pub use crate::sinks::{BufferSink, CallbackSink, ConsoleSink, FileSink, Sink};
    pub use crate::writers::{JsonWriterConfig, TextWriterConfig};
}

pub use self::core::{
    Attrib, AttribValue, Attribs, FormatConfig, Level, Levels, LogContext, Logger, LoggerBuilder,
    LoggerError, Message, Result, TimestampFormat,
};
pub use sinks::{BufferSink, CallbackSink, ConsoleSink, FileSink, Sink};
pub use writers::{JsonWriterConfig, TextWriterConfig};
