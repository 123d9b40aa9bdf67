//! Writer traits shared by every output encoding
//!
//! A [`Writer`] is a per-record serialization session. Between
//! [`Writer::begin_message`] and [`Writer::commit_message`] it receives an
//! ordered stream of key/value calls through [`ValueWriter`]:
//!
//! - scalar field: `write_key` followed by exactly one value call
//! - slice field: `write_slice_key`, one value call per element, `write_slice_end`
//!
//! [`WriterConfig`] owns the sink and the pool the writers come from.

use super::context::LogContext;
use super::error::Result;
use super::level::{Level, Levels};
use super::pool::Reusable;
use chrono::{DateTime, Utc};

/// Key/value half of the writer contract.
///
/// Implemented by the output writers, by the message fan-out and by the
/// attrib recorder, so every field source goes through one code path.
pub trait ValueWriter {
    fn write_key(&mut self, key: &str);
    fn write_slice_key(&mut self, key: &str);
    fn write_slice_end(&mut self);

    fn write_nil(&mut self);
    fn write_bool(&mut self, val: bool);
    fn write_int(&mut self, val: i64);
    fn write_uint(&mut self, val: u64);
    fn write_float(&mut self, val: f64);
    fn write_string(&mut self, val: &str);
    fn write_error(&mut self, val: &str);
    fn write_uuid(&mut self, val: &[u8; 16]);
    /// Raw, pre-encoded JSON. Invalid input is written as an error value.
    fn write_json(&mut self, val: &[u8]);
}

/// Record lifecycle half of the writer contract.
pub trait Writer: ValueWriter + Reusable + Send {
    fn begin_message(
        &mut self,
        timestamp: &DateTime<Utc>,
        levels: &Levels,
        level: Level,
        prefix: &str,
        text: &str,
    );

    /// Finish the record and hand it to the sink.
    fn commit_message(&mut self) -> Result<()>;
}

/// Factory and pool for writers bound to one sink and one encoding.
pub trait WriterConfig: Send + Sync {
    /// Per-writer level filter, checked after the logger's own filter.
    fn is_active(&self, ctx: &LogContext, level: Level) -> bool;

    /// A fresh writer of this configuration, independent of all in-flight ones.
    fn acquire_writer(&self, level: Level) -> Box<dyn Writer>;

    /// Return a writer obtained from [`WriterConfig::acquire_writer`].
    fn release_writer(&self, writer: Box<dyn Writer>);

    /// Force buffered sink data to persist.
    fn flush_underlying(&self) -> Result<()>;
}

/// Write a 16-byte identifier, substituting nil for the all-zero UUID.
pub(crate) fn write_uuid_or_nil<W: ValueWriter + ?Sized>(w: &mut W, val: &[u8; 16]) {
    if *val == [0u8; 16] {
        w.write_nil();
    } else {
        w.write_uuid(val);
    }
}
