//! Closure sink

use super::Sink;
use crate::core::{LoggerError, Result};
use std::fmt::Display;

type RecordCallback = Box<dyn Fn(&[u8]) -> Result<()> + Send + Sync>;

/// Hands every record to a closure.
///
/// The record slice is only valid for the duration of the call.
pub struct CallbackSink {
    callback: RecordCallback,
}

impl CallbackSink {
    pub fn new(callback: impl Fn(&[u8]) + Send + Sync + 'static) -> Self {
        Self {
            callback: Box::new(move |record| {
                callback(record);
                Ok(())
            }),
        }
    }

    /// Closure that can reject a record, for example a closed channel.
    ///
    /// A rejection surfaces as [`LoggerError::SinkError`].
    pub fn fallible<E: Display>(
        callback: impl Fn(&[u8]) -> std::result::Result<(), E> + Send + Sync + 'static,
    ) -> Self {
        Self {
            callback: Box::new(move |record| {
                callback(record).map_err(|e| LoggerError::sink("callback", e.to_string()))
            }),
        }
    }
}

impl Sink for CallbackSink {
    fn write_record(&self, record: &[u8]) -> Result<()> {
        (self.callback)(record)
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "callback"
    }
}

impl std::fmt::Debug for CallbackSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CallbackSink")
    }
}
