//! JSON Lines encoding
//!
//! One compact object per record:
//!
//! ```text
//! {"time":"2006-01-02 15:04:05","level":"INFO","message":"hi","user":"alice","id":7}
//! ```

use super::WRITER_POOL_CAPACITY;
use crate::core::json::JsonEncoder;
use crate::core::{
    FormatConfig, Level, LevelFilter, Levels, LogContext, Pool, Result, Reusable, TimestampFormat,
    ValueWriter, Writer, WriterConfig,
};
use crate::sinks::Sink;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Writer configuration producing JSON Lines.
pub struct JsonWriterConfig {
    sink: Arc<dyn Sink>,
    format: Arc<FormatConfig>,
    filter: Option<Arc<dyn LevelFilter>>,
    pool: Pool<Box<dyn Writer>>,
}

impl JsonWriterConfig {
    pub fn new(sink: impl Sink + 'static) -> Self {
        Self::with_shared_sink(Arc::new(sink))
    }

    pub fn with_shared_sink(sink: Arc<dyn Sink>) -> Self {
        Self {
            sink,
            format: Arc::new(FormatConfig::default()),
            filter: None,
            pool: Pool::new(WRITER_POOL_CAPACITY),
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_format(mut self, format: FormatConfig) -> Self {
        self.format = Arc::new(format);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        Arc::make_mut(&mut self.format).timestamp_format = format;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_custom_timestamp(self, pattern: &str) -> Self {
        self.with_timestamp_format(TimestampFormat::Custom(pattern.to_string()))
    }

    /// Filter applied after the logger's own, for this writer only.
    #[must_use = "builder methods return a new value"]
    pub fn with_level_filter(mut self, filter: impl LevelFilter + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    pub fn format(&self) -> &FormatConfig {
        &self.format
    }

    /// Writers created because the pool was empty.
    pub fn allocated_writers(&self) -> usize {
        self.pool.allocated()
    }
}

impl WriterConfig for JsonWriterConfig {
    fn is_active(&self, ctx: &LogContext, level: Level) -> bool {
        match &self.filter {
            Some(filter) => filter.is_active(ctx, level),
            None => true,
        }
    }

    fn acquire_writer(&self, _level: Level) -> Box<dyn Writer> {
        self.pool.acquire_with(|| {
            Box::new(JsonWriter::new(Arc::clone(&self.sink), Arc::clone(&self.format)))
        })
    }

    fn release_writer(&self, writer: Box<dyn Writer>) {
        self.pool.release(writer);
    }

    fn flush_underlying(&self) -> Result<()> {
        self.sink.flush()
    }
}

impl std::fmt::Debug for JsonWriterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonWriterConfig")
            .field("sink", &self.sink.name())
            .field("format", &self.format)
            .field("pool", &self.pool)
            .finish()
    }
}

/// User field being dropped because its key names a built-in field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Skip {
    None,
    Value,
    Slice,
}

/// Encodes one record at a time into a reusable buffer.
///
/// The timestamp, level and message keys of the [`FormatConfig`] belong to
/// the writer; user fields with those keys are left out of the object.
pub struct JsonWriter {
    enc: JsonEncoder,
    scratch: String,
    skip: Skip,
    sink: Arc<dyn Sink>,
    format: Arc<FormatConfig>,
}

impl JsonWriter {
    pub fn new(sink: Arc<dyn Sink>, format: Arc<FormatConfig>) -> Self {
        Self {
            enc: JsonEncoder::with_buffer(Vec::with_capacity(256)),
            scratch: String::with_capacity(64),
            skip: Skip::None,
            sink,
            format,
        }
    }

    fn write_timestamp(&mut self, timestamp: &DateTime<Utc>) {
        self.enc.write_key(&self.format.timestamp_key);
        let format = &self.format.timestamp_format;
        self.scratch.clear();
        format.write_to(timestamp, &mut self.scratch);
        if format.is_numeric() {
            self.enc.write_raw(self.scratch.as_bytes());
        } else {
            self.enc.write_string(&self.scratch);
        }
    }

    fn is_builtin_key(&self, key: &str) -> bool {
        key == self.format.timestamp_key
            || key == self.format.level_key
            || key == self.format.message_key
    }

    /// Whether the current value belongs to a dropped field.
    #[inline]
    fn skipping(&mut self) -> bool {
        match self.skip {
            Skip::None => false,
            Skip::Value => {
                self.skip = Skip::None;
                true
            }
            Skip::Slice => true,
        }
    }
}

impl Reusable for JsonWriter {
    fn reset(&mut self) {
        self.enc.clear();
        self.scratch.clear();
        self.skip = Skip::None;
    }
}

impl Writer for JsonWriter {
    fn begin_message(
        &mut self,
        timestamp: &DateTime<Utc>,
        levels: &Levels,
        level: Level,
        prefix: &str,
        text: &str,
    ) {
        self.enc.clear();
        self.skip = Skip::None;
        self.enc.buffer_mut().push(b'{');
        self.write_timestamp(timestamp);

        self.enc.write_key(&self.format.level_key);
        self.enc.write_string(&levels.name(level));

        self.enc.write_key(&self.format.message_key);
        if prefix.is_empty() {
            self.enc.write_string(text);
        } else {
            self.scratch.clear();
            self.scratch.push_str(prefix);
            self.scratch.push_str(": ");
            self.scratch.push_str(text);
            self.enc.write_string(&self.scratch);
        }
    }

    fn commit_message(&mut self) -> Result<()> {
        self.enc.close_object();
        self.enc.buffer_mut().push(b'\n');
        let result = self.sink.write_record(self.enc.buffer());
        self.enc.clear();
        result
    }
}

impl ValueWriter for JsonWriter {
    fn write_key(&mut self, key: &str) {
        if self.is_builtin_key(key) {
            self.skip = Skip::Value;
            return;
        }
        self.enc.write_key(key);
    }

    fn write_slice_key(&mut self, key: &str) {
        if self.is_builtin_key(key) {
            self.skip = Skip::Slice;
            return;
        }
        self.enc.write_slice_key(key);
    }

    fn write_slice_end(&mut self) {
        if self.skip == Skip::Slice {
            self.skip = Skip::None;
            return;
        }
        self.enc.write_slice_end();
    }

    fn write_nil(&mut self) {
        if !self.skipping() {
            self.enc.write_nil();
        }
    }

    fn write_bool(&mut self, val: bool) {
        if !self.skipping() {
            self.enc.write_bool(val);
        }
    }

    fn write_int(&mut self, val: i64) {
        if !self.skipping() {
            self.enc.write_int(val);
        }
    }

    fn write_uint(&mut self, val: u64) {
        if !self.skipping() {
            self.enc.write_uint(val);
        }
    }

    fn write_float(&mut self, val: f64) {
        if !self.skipping() {
            self.enc.write_float(val);
        }
    }

    fn write_string(&mut self, val: &str) {
        if !self.skipping() {
            self.enc.write_string(val);
        }
    }

    fn write_error(&mut self, val: &str) {
        if !self.skipping() {
            self.enc.write_error(val);
        }
    }

    fn write_uuid(&mut self, val: &[u8; 16]) {
        if !self.skipping() {
            self.enc.write_uuid(val);
        }
    }

    fn write_json(&mut self, val: &[u8]) {
        if !self.skipping() {
            self.enc.write_json(val);
        }
    }
}
