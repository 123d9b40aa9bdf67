//! Record destinations
//!
//! A [`Sink`] receives finished, newline-terminated records from writers.
//! Sinks are shared by every writer of a configuration, so implementations
//! synchronize internally.

pub mod buffer;
pub mod callback;
pub mod console;
pub mod file;

pub use buffer::BufferSink;
pub use callback::CallbackSink;
pub use console::ConsoleSink;
pub use file::FileSink;

use crate::core::Result;

pub trait Sink: Send + Sync {
    /// Persist one complete record.
    fn write_record(&self, record: &[u8]) -> Result<()>;

    /// Force buffered records out.
    fn flush(&self) -> Result<()>;

    fn name(&self) -> &str;
}
