//! Logger and its shared configuration
//!
//! A [`Logger`] is a cheap, clonable handle: a shared [`Config`] plus the
//! fields it passes on to every message. Sub-loggers are new handles, the
//! parent is never mutated.

use super::attrib::Attrib;
use super::attribs::Attribs;
use super::context::LogContext;
use super::error::Result;
use super::level::{Level, Levels};
use super::level_filter::{LevelFilter, LevelThreshold};
use super::message::{self, Message};
use super::writer::{Writer, WriterConfig};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::fmt::{self, Write as _};
use std::sync::{Arc, OnceLock};

/// Invoked with the record text after a record at or above the fatal level
/// has been committed.
pub type FatalHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// Source of record timestamps.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Configuration shared by a logger and all of its sub-loggers.
pub struct Config {
    levels: Levels,
    filter: Mutex<Arc<dyn LevelFilter>>,
    writers: Vec<Arc<dyn WriterConfig>>,
    fatal_level: Option<Level>,
    fatal_handler: FatalHandler,
    clock: Clock,
}

impl Config {
    pub fn levels(&self) -> &Levels {
        &self.levels
    }

    /// Replace the active level filter for every logger sharing this config.
    pub fn set_level_filter(&self, filter: Arc<dyn LevelFilter>) {
        *self.filter.lock() = filter;
    }

    pub fn is_active(&self, ctx: &LogContext, level: Level) -> bool {
        if ctx.is_logging_disabled() {
            return false;
        }
        let filter = Arc::clone(&self.filter.lock());
        filter.is_active(ctx, level)
    }

    pub(crate) fn writer_config(&self, idx: usize) -> Option<&Arc<dyn WriterConfig>> {
        self.writers.get(idx)
    }

    pub(crate) fn fatal_handler_for(&self, level: Level) -> Option<FatalHandler> {
        match self.fatal_level {
            Some(fatal) if level >= fatal => Some(Arc::clone(&self.fatal_handler)),
            _ => None,
        }
    }

    /// Flush every writer configuration, reporting the first failure.
    pub fn flush_underlying(&self) -> Result<()> {
        let mut first_err = None;
        for (idx, writer) in self.writers.iter().enumerate() {
            if let Err(e) = writer.flush_underlying() {
                eprintln!("[LOGGER ERROR] Writer #{} flush failed: {}", idx, e);
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("levels", &self.levels)
            .field("writers", &self.writers.len())
            .field("fatal_level", &self.fatal_level)
            .finish()
    }
}

/// Handle for creating messages.
///
/// `Logger::default()` is the no-op logger: every method returns inert
/// messages or another no-op logger.
#[derive(Clone, Default)]
pub struct Logger {
    config: Option<Arc<Config>>,
    attribs: Arc<Attribs>,
    prefix: Option<Arc<str>>,
}

impl Logger {
    /// Logger that produces nothing.
    pub fn nop() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    pub fn is_nop(&self) -> bool {
        self.config.is_none()
    }

    pub fn config(&self) -> Option<&Arc<Config>> {
        self.config.as_ref()
    }

    /// Level table used by the shorthand methods and the level macros.
    ///
    /// A no-op logger reports the standard table.
    pub fn levels(&self) -> &Levels {
        static STANDARD_LEVELS: OnceLock<Levels> = OnceLock::new();
        match &self.config {
            Some(config) => config.levels(),
            None => STANDARD_LEVELS.get_or_init(Levels::default),
        }
    }

    /// Fields written at the start of every message.
    pub fn attribs(&self) -> &Attribs {
        &self.attribs
    }

    pub(crate) fn attribs_arc(&self) -> &Arc<Attribs> {
        &self.attribs
    }

    pub fn prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or("")
    }

    /// Sub-logger with a different message prefix.
    #[must_use]
    pub fn with_prefix(&self, prefix: &str) -> Logger {
        Logger {
            config: self.config.clone(),
            attribs: Arc::clone(&self.attribs),
            prefix: (!prefix.is_empty()).then(|| Arc::from(prefix)),
        }
    }

    /// Sub-logger carrying `recorded` ahead of this logger's fields.
    pub(crate) fn derive(&self, recorded: Attribs) -> Logger {
        if self.is_nop() || recorded.is_empty() {
            return self.clone();
        }
        let mut merged = recorded;
        merged.merge_unique(&self.attribs);
        Logger {
            config: self.config.clone(),
            attribs: Arc::new(merged),
            prefix: self.prefix.clone(),
        }
    }

    /// Start a recording message whose fields become a sub-logger.
    ///
    /// ```
    /// use rust_structured_logger::prelude::*;
    ///
    /// let sink = BufferSink::new();
    /// let logger = Logger::builder().writer(JsonWriterConfig::new(sink.clone())).build();
    ///
    /// let service_log = logger.with().str("service", "billing").sub_logger();
    /// service_log.info("started").log();
    /// assert!(sink.contents().contains(r#""service":"billing""#));
    /// ```
    pub fn with(&self) -> Message {
        if self.is_nop() {
            return Message::inert();
        }
        Message::from_state(message::acquire_state(self, Level::default(), true))
    }

    pub fn is_active(&self, ctx: &LogContext, level: Level) -> bool {
        match &self.config {
            Some(config) => config.is_active(ctx, level),
            None => false,
        }
    }

    pub fn set_level_filter(&self, filter: impl LevelFilter + 'static) {
        if let Some(config) = &self.config {
            config.set_level_filter(Arc::new(filter));
        }
    }

    pub fn flush_underlying(&self) -> Result<()> {
        match &self.config {
            Some(config) => config.flush_underlying(),
            None => Ok(()),
        }
    }

    fn start(&self, ctx: &LogContext, level: Level, text: impl FnOnce(&mut String)) -> Message {
        let Some(config) = &self.config else {
            return Message::inert();
        };
        if !config.is_active(ctx, level) {
            return Message::inert();
        }

        let writers: Vec<(usize, Box<dyn Writer>)> = config
            .writers
            .iter()
            .enumerate()
            .filter(|(_, writer_config)| writer_config.is_active(ctx, level))
            .map(|(idx, writer_config)| (idx, writer_config.acquire_writer(level)))
            .collect();
        if writers.is_empty() {
            return Message::inert();
        }

        let mut state = message::acquire_state(self, level, false);
        text(message::state_text(&mut state));
        let timestamp = (config.clock)();
        message::begin(&mut state, writers, &timestamp, self.prefix(), ctx);
        Message::from_state(state)
    }

    pub fn new_message(&self, level: Level, text: &str) -> Message {
        self.start(&LogContext::default(), level, |buf| buf.push_str(text))
    }

    pub fn new_message_ctx(&self, ctx: &LogContext, level: Level, text: &str) -> Message {
        self.start(ctx, level, |buf| buf.push_str(text))
    }

    /// Message whose text is formatted only if the level is active.
    pub fn new_message_fmt(&self, level: Level, args: fmt::Arguments<'_>) -> Message {
        self.start(&LogContext::default(), level, |buf| {
            let _ = buf.write_fmt(args);
        })
    }

    pub fn new_message_ctx_fmt(
        &self,
        ctx: &LogContext,
        level: Level,
        args: fmt::Arguments<'_>,
    ) -> Message {
        self.start(ctx, level, |buf| {
            let _ = buf.write_fmt(args);
        })
    }

    #[inline]
    pub fn trace(&self, text: &str) -> Message {
        self.new_message(self.levels().trace, text)
    }

    #[inline]
    pub fn debug(&self, text: &str) -> Message {
        self.new_message(self.levels().debug, text)
    }

    #[inline]
    pub fn info(&self, text: &str) -> Message {
        self.new_message(self.levels().info, text)
    }

    #[inline]
    pub fn warn(&self, text: &str) -> Message {
        self.new_message(self.levels().warn, text)
    }

    #[inline]
    pub fn error(&self, text: &str) -> Message {
        self.new_message(self.levels().error, text)
    }

    #[inline]
    pub fn fatal(&self, text: &str) -> Message {
        self.new_message(self.levels().fatal, text)
    }

    #[inline]
    pub fn trace_ctx(&self, ctx: &LogContext, text: &str) -> Message {
        self.new_message_ctx(ctx, self.levels().trace, text)
    }

    #[inline]
    pub fn debug_ctx(&self, ctx: &LogContext, text: &str) -> Message {
        self.new_message_ctx(ctx, self.levels().debug, text)
    }

    #[inline]
    pub fn info_ctx(&self, ctx: &LogContext, text: &str) -> Message {
        self.new_message_ctx(ctx, self.levels().info, text)
    }

    #[inline]
    pub fn warn_ctx(&self, ctx: &LogContext, text: &str) -> Message {
        self.new_message_ctx(ctx, self.levels().warn, text)
    }

    #[inline]
    pub fn error_ctx(&self, ctx: &LogContext, text: &str) -> Message {
        self.new_message_ctx(ctx, self.levels().error, text)
    }

    #[inline]
    pub fn fatal_ctx(&self, ctx: &LogContext, text: &str) -> Message {
        self.new_message_ctx(ctx, self.levels().fatal, text)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("nop", &self.is_nop())
            .field("attribs", &self.attribs.len())
            .field("prefix", &self.prefix())
            .finish()
    }
}

/// Builder for constructing a [`Logger`] with a fluent API
///
/// # Example
/// ```
/// use rust_structured_logger::prelude::*;
///
/// let logger = Logger::builder()
///     .min_level(Level::DEBUG)
///     .writer(TextWriterConfig::new(ConsoleSink::stdout()))
///     .attrib(Attrib::string("service", "api"))
///     .build();
/// assert!(logger.is_active(&LogContext::new(), Level::DEBUG));
/// ```
pub struct LoggerBuilder {
    levels: Levels,
    filter: Arc<dyn LevelFilter>,
    writers: Vec<Arc<dyn WriterConfig>>,
    fatal_level: Option<Level>,
    fatal_handler: FatalHandler,
    clock: Clock,
    prefix: Option<Arc<str>>,
    attribs: Attribs,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            levels: Levels::default(),
            filter: Arc::new(LevelThreshold(Level::INFO)),
            writers: Vec::new(),
            fatal_level: None,
            fatal_handler: Arc::new(|text: &str| panic!("{}", text)),
            clock: Arc::new(Utc::now),
            prefix: None,
            attribs: Attribs::new(),
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn levels(mut self, levels: Levels) -> Self {
        self.levels = levels;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn level_filter(mut self, filter: impl LevelFilter + 'static) -> Self {
        self.filter = Arc::new(filter);
        self
    }

    /// Shorthand for a [`LevelThreshold`] filter. Defaults to `Level::INFO`.
    #[must_use = "builder methods return a new value"]
    pub fn min_level(self, level: Level) -> Self {
        self.level_filter(LevelThreshold(level))
    }

    /// Add a writer configuration
    #[must_use = "builder methods return a new value"]
    pub fn writer<W: WriterConfig + 'static>(mut self, writer: W) -> Self {
        self.writers.push(Arc::new(writer));
        self
    }

    /// Add a writer configuration that is also used elsewhere.
    #[must_use = "builder methods return a new value"]
    pub fn shared_writer(mut self, writer: Arc<dyn WriterConfig>) -> Self {
        self.writers.push(writer);
        self
    }

    /// Records at or above `level` invoke the fatal handler once committed.
    /// Disabled by default.
    #[must_use = "builder methods return a new value"]
    pub fn fatal_level(mut self, level: Level) -> Self {
        self.fatal_level = Some(level);
        self
    }

    /// Replace the default fatal handler, which panics with the record text.
    #[must_use = "builder methods return a new value"]
    pub fn fatal_handler(mut self, handler: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.fatal_handler = Arc::new(handler);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = (!prefix.is_empty()).then(|| Arc::from(prefix));
        self
    }

    /// Field written into every message of the built logger.
    #[must_use = "builder methods return a new value"]
    pub fn attrib(mut self, attrib: Attrib) -> Self {
        if !self.attribs.has(attrib.key()) {
            self.attribs.push(attrib);
        }
        self
    }

    pub fn build(self) -> Logger {
        let config = Config {
            levels: self.levels,
            filter: Mutex::new(self.filter),
            writers: self.writers,
            fatal_level: self.fatal_level,
            fatal_handler: self.fatal_handler,
            clock: self.clock,
        };
        Logger {
            config: Some(Arc::new(config)),
            attribs: Arc::new(self.attribs),
            prefix: self.prefix,
        }
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
