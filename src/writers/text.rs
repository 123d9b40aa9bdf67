//! Human-readable text encoding
//!
//! ```text
//! 2006-01-02 15:04:05 |INFO| db: connected host="primary" ports=[5432,5433] err=`timeout`
//! ```
//!
//! Every token goes through the configuration's [`Colorizer`].

use super::WRITER_POOL_CAPACITY;
use crate::core::json::{compact_json, is_blank, non_finite_token};
use crate::core::{
    Colorizer, FormatConfig, Level, LevelFilter, Levels, LogContext, NoColorizer, Pool, Result,
    Reusable, TimestampFormat, ValueWriter, Writer, WriterConfig,
};
use crate::sinks::Sink;
use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::fmt::Write as _;
use std::sync::Arc;
use uuid::Uuid;

/// Writer configuration producing one text line per record.
pub struct TextWriterConfig {
    sink: Arc<dyn Sink>,
    format: Arc<FormatConfig>,
    filter: Option<Arc<dyn LevelFilter>>,
    colorizer: Arc<dyn Colorizer>,
    pool: Pool<Box<dyn Writer>>,
}

impl TextWriterConfig {
    pub fn new(sink: impl Sink + 'static) -> Self {
        Self::with_shared_sink(Arc::new(sink))
    }

    pub fn with_shared_sink(sink: Arc<dyn Sink>) -> Self {
        Self {
            sink,
            format: Arc::new(FormatConfig::default()),
            filter: None,
            colorizer: Arc::new(NoColorizer),
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

    #[must_use = "builder methods return a new value"]
    pub fn with_level_filter(mut self, filter: impl LevelFilter + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Install a colorizer and turn colorization on.
    #[must_use = "builder methods return a new value"]
    pub fn with_colorizer(mut self, colorizer: impl Colorizer + 'static) -> Self {
        self.colorizer = Arc::new(colorizer);
        Arc::make_mut(&mut self.format).colorize = true;
        self
    }

    /// Console colors from the `colored` crate.
    #[cfg(feature = "console")]
    #[must_use = "builder methods return a new value"]
    pub fn with_console_colors(self) -> Self {
        self.with_colorizer(crate::core::ConsoleColorizer)
    }

    pub fn format(&self) -> &FormatConfig {
        &self.format
    }

    pub fn allocated_writers(&self) -> usize {
        self.pool.allocated()
    }

    fn active_colorizer(&self) -> Arc<dyn Colorizer> {
        if self.format.colorize {
            Arc::clone(&self.colorizer)
        } else {
            Arc::new(NoColorizer)
        }
    }
}

impl WriterConfig for TextWriterConfig {
    fn is_active(&self, ctx: &LogContext, level: Level) -> bool {
        self.filter
            .as_ref()
            .map_or(true, |filter| filter.is_active(ctx, level))
    }

    fn acquire_writer(&self, _level: Level) -> Box<dyn Writer> {
        self.pool.acquire_with(|| {
            Box::new(TextWriter::new(
                Arc::clone(&self.sink),
                Arc::clone(&self.format),
                self.active_colorizer(),
            ))
        })
    }

    fn release_writer(&self, writer: Box<dyn Writer>) {
        self.pool.release(writer);
    }

    fn flush_underlying(&self) -> Result<()> {
        self.sink.flush()
    }
}

impl std::fmt::Debug for TextWriterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextWriterConfig")
            .field("sink", &self.sink.name())
            .field("format", &self.format)
            .field("pool", &self.pool)
            .finish()
    }
}

#[derive(Clone, Copy)]
enum Token {
    Nil,
    True,
    False,
    Int,
    Uint,
    Float,
    Str,
    Error,
    Uuid,
}

fn colorize<'a>(colorizer: &dyn Colorizer, token: Token, text: &'a str) -> Cow<'a, str> {
    match token {
        Token::Nil => colorizer.colorize_nil(text),
        Token::True => colorizer.colorize_true(text),
        Token::False => colorizer.colorize_false(text),
        Token::Int => colorizer.colorize_int(text),
        Token::Uint => colorizer.colorize_uint(text),
        Token::Float => colorizer.colorize_float(text),
        Token::Str => colorizer.colorize_string(text),
        Token::Error => colorizer.colorize_error(text),
        Token::Uuid => colorizer.colorize_uuid(text),
    }
}

/// Append `val` double-quoted, escaping quotes, backslashes and control characters.
fn push_quoted(out: &mut String, val: &str) {
    out.push('"');
    for c in val.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{{{:04x}}}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Message text and keys stay on one line.
fn push_sanitized(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{{{:04x}}}", c as u32);
            }
            c => out.push(c),
        }
    }
}

/// Renders one record as a line of `key=value` pairs.
pub struct TextWriter {
    line: String,
    scratch: String,
    json: Vec<u8>,
    in_slice: bool,
    slice_len: usize,
    sink: Arc<dyn Sink>,
    format: Arc<FormatConfig>,
    colorizer: Arc<dyn Colorizer>,
}

impl TextWriter {
    pub fn new(sink: Arc<dyn Sink>, format: Arc<FormatConfig>, colorizer: Arc<dyn Colorizer>) -> Self {
        Self {
            line: String::with_capacity(256),
            scratch: String::with_capacity(64),
            json: Vec::new(),
            in_slice: false,
            slice_len: 0,
            sink,
            format,
            colorizer,
        }
    }

    fn push_token(&mut self, token: Token, text: &str) {
        if self.in_slice {
            if self.slice_len > 0 {
                self.line.push(',');
            }
            self.slice_len += 1;
        }
        let colored = colorize(self.colorizer.as_ref(), token, text);
        self.line.push_str(&colored);
    }

    /// Render into the scratch buffer, then append it as one token.
    fn push_rendered(&mut self, token: Token, render: impl FnOnce(&mut String)) {
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.clear();
        render(&mut scratch);
        self.push_token(token, &scratch);
        self.scratch = scratch;
    }
}

impl Reusable for TextWriter {
    fn reset(&mut self) {
        self.line.clear();
        self.scratch.clear();
        self.json.clear();
        self.in_slice = false;
        self.slice_len = 0;
    }
}

impl Writer for TextWriter {
    fn begin_message(
        &mut self,
        timestamp: &DateTime<Utc>,
        levels: &Levels,
        level: Level,
        prefix: &str,
        text: &str,
    ) {
        self.reset();

        self.format.timestamp_format.write_to(timestamp, &mut self.scratch);
        let ts = self.colorizer.colorize_timestamp(&self.scratch);
        self.line.push_str(&ts);

        self.line.push_str(" |");
        let name = levels.name(level);
        let name = self.colorizer.colorize_level(level, &name);
        self.line.push_str(&name);
        self.line.push_str("| ");

        self.scratch.clear();
        if !prefix.is_empty() {
            push_sanitized(&mut self.scratch, prefix);
            self.scratch.push_str(": ");
        }
        push_sanitized(&mut self.scratch, text);
        let msg = self.colorizer.colorize_msg(&self.scratch);
        self.line.push_str(&msg);
    }

    fn commit_message(&mut self) -> Result<()> {
        self.line.push('\n');
        let result = self.sink.write_record(self.line.as_bytes());
        self.line.clear();
        result
    }
}

impl ValueWriter for TextWriter {
    fn write_key(&mut self, key: &str) {
        self.line.push(' ');
        self.scratch.clear();
        push_sanitized(&mut self.scratch, key);
        let key = self.colorizer.colorize_key(&self.scratch);
        self.line.push_str(&key);
        self.line.push('=');
    }

    fn write_slice_key(&mut self, key: &str) {
        self.write_key(key);
        self.line.push('[');
        self.in_slice = true;
        self.slice_len = 0;
    }

    fn write_slice_end(&mut self) {
        self.line.push(']');
        self.in_slice = false;
        self.slice_len = 0;
    }

    fn write_nil(&mut self) {
        self.push_token(Token::Nil, "nil");
    }

    fn write_bool(&mut self, val: bool) {
        if val {
            self.push_token(Token::True, "true");
        } else {
            self.push_token(Token::False, "false");
        }
    }

    fn write_int(&mut self, val: i64) {
        self.push_rendered(Token::Int, |s| {
            let _ = write!(s, "{}", val);
        });
    }

    fn write_uint(&mut self, val: u64) {
        self.push_rendered(Token::Uint, |s| {
            let _ = write!(s, "{}", val);
        });
    }

    fn write_float(&mut self, val: f64) {
        match non_finite_token(val) {
            Some(token) => self.push_token(Token::Float, token),
            None => self.push_rendered(Token::Float, |s| {
                let _ = write!(s, "{}", val);
            }),
        }
    }

    fn write_string(&mut self, val: &str) {
        self.push_rendered(Token::Str, |s| push_quoted(s, val));
    }

    fn write_error(&mut self, val: &str) {
        self.push_rendered(Token::Error, |s| {
            s.push('`');
            push_sanitized(s, val);
            s.push('`');
        });
    }

    fn write_uuid(&mut self, val: &[u8; 16]) {
        let mut encoded = Uuid::encode_buffer();
        let text = Uuid::from_bytes(*val).hyphenated().encode_lower(&mut encoded);
        self.push_token(Token::Uuid, text);
    }

    fn write_json(&mut self, val: &[u8]) {
        if is_blank(val) {
            self.write_nil();
            return;
        }
        let mut compacted = std::mem::take(&mut self.json);
        compacted.clear();
        match compact_json(val, &mut compacted) {
            Ok(()) => {
                let text = String::from_utf8_lossy(&compacted);
                self.push_token(Token::Str, &text);
            }
            Err(_) => self.write_error(&String::from_utf8_lossy(val)),
        }
        self.json = compacted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Logger;
    use crate::sinks::BufferSink;
    use chrono::TimeZone;

    fn fixed_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap()
    }

    fn text_logger(sink: &BufferSink) -> Logger {
        Logger::builder()
            .min_level(Level::TRACE)
            .clock(fixed_clock)
            .writer(TextWriterConfig::new(sink.clone()).with_custom_timestamp("%Y-%m-%d %H:%M:%S"))
            .build()
    }

    #[test]
    fn test_line_layout() {
        let sink = BufferSink::new();
        let logger = text_logger(&sink);

        logger
            .info("connected")
            .str("host", "primary \"db\"")
            .uints("ports", &[5432u16, 5433])
            .error("err", "timeout")
            .nil("none")
            .bool("ok", false)
            .log();

        assert_eq!(
            sink.contents(),
            "2006-01-02 15:04:05 |INFO| connected host=\"primary \\\"db\\\"\" \
             ports=[5432,5433] err=`timeout` none=nil ok=false\n"
        );
    }

    #[test]
    fn test_prefix_and_sanitized_text() {
        let sink = BufferSink::new();
        let logger = text_logger(&sink).with_prefix("db");
        logger.warn("two\nlines").log();
        assert_eq!(sink.contents(), "2006-01-02 15:04:05 |WARN| db: two\\nlines\n");
    }

    #[test]
    fn test_floats_uuids_and_json() {
        let sink = BufferSink::new();
        let logger = text_logger(&sink);
        logger
            .debug("values")
            .floats("f", &[f64::INFINITY, f64::NAN, 0.5])
            .uuid("id", &[0x01; 16])
            .uuid("nil_id", &[0; 16])
            .json("raw", " [1, 2] ")
            .log();

        let line = sink.contents();
        assert!(line.contains(" f=[+Inf,NaN,0.5]"), "{}", line);
        assert!(line.contains(" id=01010101-0101-0101-0101-010101010101"));
        assert!(line.contains(" nil_id=nil"));
        assert!(line.contains(" raw=[1,2]"));
    }

    #[test]
    fn test_keys_stay_on_one_line() {
        let sink = BufferSink::new();
        let logger = text_logger(&sink);
        logger
            .info("ok")
            .str("a\n2006-01-02 15:04:05 |ERROR| forged k", "v")
            .ints("b\r\x1b", &[1])
            .log();

        assert_eq!(
            sink.contents(),
            "2006-01-02 15:04:05 |INFO| ok a\\n2006-01-02 15:04:05 |ERROR| forged k=\"v\" \
             b\\r\\u{001b}=[1]\n"
        );
    }

    #[test]
    fn test_json_buffer_is_reused() {
        let sink = BufferSink::new();
        let mut writer = TextWriter::new(
            Arc::new(sink.clone()),
            Arc::new(FormatConfig::new().with_custom_timestamp("T")),
            Arc::new(NoColorizer),
        );

        writer.begin_message(&fixed_clock(), &Levels::default(), Level::INFO, "", "j");
        writer.write_key("a");
        writer.write_json(b"{ \"x\" : [1, 2] }");
        let buffer = writer.json.as_ptr();
        writer.write_key("b");
        writer.write_json(b"{\"y\":3}");
        assert_eq!(writer.json.as_ptr(), buffer);
        writer.commit_message().unwrap();

        writer.reset();
        assert!(writer.json.is_empty());
        assert_eq!(sink.contents(), "T |INFO| j a={\"x\":[1,2]} b={\"y\":3}\n");
    }

    #[test]
    fn test_empty_slice() {
        let sink = BufferSink::new();
        text_logger(&sink).info("x").strs::<&str>("tags", &[]).log();
        assert!(sink.contents().ends_with(" tags=[]\n"));
    }

    struct Brackets;

    impl Colorizer for Brackets {
        fn colorize_key<'a>(&self, key: &'a str) -> Cow<'a, str> {
            Cow::Owned(format!("<{}>", key))
        }

        fn colorize_int<'a>(&self, val: &'a str) -> Cow<'a, str> {
            Cow::Owned(format!("#{}", val))
        }
    }

    #[test]
    fn test_colorizer_wraps_tokens() {
        let sink = BufferSink::new();
        let logger = Logger::builder()
            .clock(fixed_clock)
            .writer(
                TextWriterConfig::new(sink.clone())
                    .with_custom_timestamp("%H:%M")
                    .with_colorizer(Brackets),
            )
            .build();

        logger.info("n").int("a", 1i32).ints("b", &[2i64, 3]).log();
        assert_eq!(sink.contents(), "15:04 |INFO| n <a>=#1 <b>=[#2,#3]\n");
    }

    #[test]
    fn test_colorize_flag_off_disables_colorizer() {
        let sink = BufferSink::new();
        let format = FormatConfig::new().with_custom_timestamp("%H:%M");
        let logger = Logger::builder()
            .clock(fixed_clock)
            .writer(
                TextWriterConfig::new(sink.clone())
                    .with_colorizer(Brackets)
                    .with_format(format),
            )
            .build();

        logger.info("n").int("a", 1i32).log();
        assert_eq!(sink.contents(), "15:04 |INFO| n a=1\n");
    }
}
