//! Output encodings
//!
//! Each encoding comes as a [`WriterConfig`](crate::core::WriterConfig)
//! (sink, framing, optional level filter and writer pool) plus the pooled
//! per-record [`Writer`](crate::core::Writer) it hands out.

pub mod json;
pub mod text;

pub use json::{JsonWriter, JsonWriterConfig};
pub use text::{TextWriter, TextWriterConfig};

/// Idle writers kept per configuration.
pub(crate) const WRITER_POOL_CAPACITY: usize = 64;
