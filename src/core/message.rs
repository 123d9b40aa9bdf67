//! Fluent per-record message builder
//!
//! A [`Message`] is created by a [`Logger`] and consumed by [`Message::log`].
//! It runs in one of two modes:
//!
//! - **writing**: every field call is forwarded to one pooled writer per
//!   writer configuration; the first write of a key wins and later writes of
//!   the same key are dropped
//! - **recording**: field calls are collected as [`Attrib`]s and become the
//!   inherited fields of a sub-logger (see [`Logger::with`])
//!
//! A message whose level is inactive holds no state at all. Every method on
//! such an inert message is a no-op, so call chains never need to check.
//!
//! Message state is taken from a process-wide pool and returned on every exit
//! path: [`Message::log`], [`Message::log_and_panic`], conversion into a
//! sub-logger, or a plain drop.

use super::any::{self, AttribRecorder, Loggable};
use super::attrib::Attrib;
use super::attribs::Attribs;
use super::context::LogContext;
use super::level::Level;
use super::logger::Logger;
use super::pool::{Pool, Reusable};
use super::writer::{write_uuid_or_nil, ValueWriter, Writer};
use serde::Serialize;
use std::fmt::{self, Write as _};
use std::panic::{catch_unwind, AssertUnwindSafe};

const MESSAGE_POOL_CAPACITY: usize = 1024;

static MESSAGE_POOL: Pool<Box<MessageState>> = Pool::new(MESSAGE_POOL_CAPACITY);

/// Number of message states ever allocated by the process-wide pool.
pub fn message_pool_allocated() -> usize {
    MESSAGE_POOL.allocated()
}

/// Keys written so far in one record.
///
/// Keys are stored back to back in one string so a reused set never allocates.
#[derive(Debug, Default)]
struct KeySet {
    buf: String,
    ends: Vec<usize>,
}

impl KeySet {
    /// Returns `false` if `key` was already present.
    fn insert(&mut self, key: &str) -> bool {
        let mut start = 0;
        for &end in &self.ends {
            if self.buf.get(start..end) == Some(key) {
                return false;
            }
            start = end;
        }
        self.buf.push_str(key);
        self.ends.push(self.buf.len());
        true
    }

    fn clear(&mut self) {
        self.buf.clear();
        self.ends.clear();
    }
}

/// Forwards every call to all writers of the record, minus duplicate keys.
#[derive(Default)]
struct Fanout {
    /// Writer plus the index of the configuration it came from
    writers: Vec<(usize, Box<dyn Writer>)>,
    keys: KeySet,
    skip: bool,
}

impl Fanout {
    #[inline]
    fn each(&mut self, mut f: impl FnMut(&mut dyn Writer)) {
        if self.skip {
            return;
        }
        for (_, writer) in &mut self.writers {
            f(writer.as_mut());
        }
    }
}

impl ValueWriter for Fanout {
    fn write_key(&mut self, key: &str) {
        self.skip = !self.keys.insert(key);
        self.each(|w| w.write_key(key));
    }

    fn write_slice_key(&mut self, key: &str) {
        self.skip = !self.keys.insert(key);
        self.each(|w| w.write_slice_key(key));
    }

    fn write_slice_end(&mut self) {
        self.each(|w| w.write_slice_end());
        self.skip = false;
    }

    fn write_nil(&mut self) {
        self.each(|w| w.write_nil());
    }

    fn write_bool(&mut self, val: bool) {
        self.each(|w| w.write_bool(val));
    }

    fn write_int(&mut self, val: i64) {
        self.each(|w| w.write_int(val));
    }

    fn write_uint(&mut self, val: u64) {
        self.each(|w| w.write_uint(val));
    }

    fn write_float(&mut self, val: f64) {
        self.each(|w| w.write_float(val));
    }

    fn write_string(&mut self, val: &str) {
        self.each(|w| w.write_string(val));
    }

    fn write_error(&mut self, val: &str) {
        self.each(|w| w.write_error(val));
    }

    fn write_uuid(&mut self, val: &[u8; 16]) {
        self.each(|w| w.write_uuid(val));
    }

    fn write_json(&mut self, val: &[u8]) {
        self.each(|w| w.write_json(val));
    }
}

pub(crate) struct MessageState {
    logger: Logger,
    level: Level,
    /// Record text, kept for fatal escalation
    text: String,
    scratch: String,
    recording: bool,
    fanout: Fanout,
    recorder: AttribRecorder,
}

impl MessageState {
    fn new() -> Self {
        Self {
            logger: Logger::nop(),
            level: Level::default(),
            text: String::new(),
            scratch: String::new(),
            recording: false,
            fanout: Fanout::default(),
            recorder: AttribRecorder::default(),
        }
    }

    fn out(&mut self) -> &mut dyn ValueWriter {
        if self.recording {
            &mut self.recorder
        } else {
            &mut self.fanout
        }
    }

    /// Format `val` into the scratch buffer and hand both it and the output to `f`.
    fn with_display(
        &mut self,
        val: &(impl fmt::Display + ?Sized),
        f: impl FnOnce(&mut dyn ValueWriter, &str),
    ) {
        let MessageState {
            scratch,
            fanout,
            recorder,
            recording,
            ..
        } = self;
        scratch.clear();
        let _ = write!(scratch, "{}", val);
        let out: &mut dyn ValueWriter = if *recording { recorder } else { fanout };
        f(out, scratch);
    }
}

impl Reusable for MessageState {
    fn reset(&mut self) {
        self.logger = Logger::nop();
        self.level = Level::default();
        self.text.clear();
        self.scratch.clear();
        self.recording = false;
        // Writers have been handed back to their configurations by now
        self.fanout.writers.clear();
        self.fanout.keys.clear();
        self.fanout.skip = false;
        self.recorder.clear();
    }
}

pub(crate) fn acquire_state(logger: &Logger, level: Level, recording: bool) -> Box<MessageState> {
    let mut state = MESSAGE_POOL.acquire_with(|| Box::new(MessageState::new()));
    state.logger = logger.clone();
    state.level = level;
    state.recording = recording;
    state
}

/// Return every writer to its configuration, then the state to the pool.
pub(crate) fn release_state(mut state: Box<MessageState>) {
    if let Some(config) = state.logger.config().cloned() {
        for (idx, writer) in state.fanout.writers.drain(..) {
            if let Some(writer_config) = config.writer_config(idx) {
                writer_config.release_writer(writer);
            }
        }
    }
    MESSAGE_POOL.release(state);
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// One log record under construction.
///
/// Field methods take and return the message by value so calls chain:
///
/// ```
/// use rust_structured_logger::prelude::*;
///
/// let sink = BufferSink::new();
/// let logger = Logger::builder()
///     .writer(JsonWriterConfig::new(sink.clone()))
///     .build();
///
/// logger.info("user logged in").str("user", "alice").int("attempt", 2).log();
/// assert!(sink.contents().contains(r#""user":"alice","attempt":2"#));
/// ```
#[must_use = "a message does nothing until `log` is called"]
pub struct Message {
    state: Option<Box<MessageState>>,
}

impl Message {
    /// A message that ignores every call.
    pub fn inert() -> Self {
        Self { state: None }
    }

    pub(crate) fn from_state(state: Box<MessageState>) -> Self {
        Self { state: Some(state) }
    }

    /// Whether field calls on this message have any effect.
    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    #[inline]
    fn field(mut self, f: impl FnOnce(&mut dyn ValueWriter)) -> Self {
        if let Some(state) = self.state.as_mut() {
            f(state.out());
        }
        self
    }

    pub fn nil(self, key: &str) -> Self {
        self.field(|w| {
            w.write_key(key);
            w.write_nil();
        })
    }

    pub fn bool(self, key: &str, val: bool) -> Self {
        self.field(|w| {
            w.write_key(key);
            w.write_bool(val);
        })
    }

    pub fn bools(self, key: &str, vals: &[bool]) -> Self {
        self.field(|w| {
            w.write_slice_key(key);
            for val in vals {
                w.write_bool(*val);
            }
            w.write_slice_end();
        })
    }

    /// Signed integer of any width up to 64 bits.
    pub fn int(self, key: &str, val: impl Into<i64>) -> Self {
        let val = val.into();
        self.field(|w| {
            w.write_key(key);
            w.write_int(val);
        })
    }

    pub fn ints<I: Copy + Into<i64>>(self, key: &str, vals: &[I]) -> Self {
        self.field(|w| {
            w.write_slice_key(key);
            for val in vals {
                w.write_int((*val).into());
            }
            w.write_slice_end();
        })
    }

    /// Signed pointer-sized integer.
    pub fn isize(self, key: &str, val: isize) -> Self {
        self.int(key, val as i64)
    }

    pub fn uint(self, key: &str, val: impl Into<u64>) -> Self {
        let val = val.into();
        self.field(|w| {
            w.write_key(key);
            w.write_uint(val);
        })
    }

    pub fn uints<U: Copy + Into<u64>>(self, key: &str, vals: &[U]) -> Self {
        self.field(|w| {
            w.write_slice_key(key);
            for val in vals {
                w.write_uint((*val).into());
            }
            w.write_slice_end();
        })
    }

    pub fn usize(self, key: &str, val: usize) -> Self {
        self.uint(key, val as u64)
    }

    pub fn float(self, key: &str, val: impl Into<f64>) -> Self {
        let val = val.into();
        self.field(|w| {
            w.write_key(key);
            w.write_float(val);
        })
    }

    pub fn floats<F: Copy + Into<f64>>(self, key: &str, vals: &[F]) -> Self {
        self.field(|w| {
            w.write_slice_key(key);
            for val in vals {
                w.write_float((*val).into());
            }
            w.write_slice_end();
        })
    }

    pub fn str(self, key: &str, val: &str) -> Self {
        self.field(|w| {
            w.write_key(key);
            w.write_string(val);
        })
    }

    pub fn strs<S: AsRef<str>>(self, key: &str, vals: &[S]) -> Self {
        self.field(|w| {
            w.write_slice_key(key);
            for val in vals {
                w.write_string(val.as_ref());
            }
            w.write_slice_end();
        })
    }

    /// Error field holding the display text of `err`.
    pub fn error<E: fmt::Display + ?Sized>(mut self, key: &str, err: &E) -> Self {
        if let Some(state) = self.state.as_mut() {
            state.with_display(err, |w, text| {
                w.write_key(key);
                w.write_error(text);
            });
        }
        self
    }

    pub fn errors<E: fmt::Display>(mut self, key: &str, errs: &[E]) -> Self {
        if let Some(state) = self.state.as_mut() {
            state.out().write_slice_key(key);
            for err in errs {
                state.with_display(err, |w, text| w.write_error(text));
            }
            state.out().write_slice_end();
        }
        self
    }

    /// Shorthand for `error("error", err)`.
    pub fn err<E: fmt::Display + ?Sized>(self, err: &E) -> Self {
        self.error("error", err)
    }

    /// UUID field; the all-zero UUID is written as nil.
    pub fn uuid(self, key: &str, val: &[u8; 16]) -> Self {
        self.field(|w| {
            w.write_key(key);
            write_uuid_or_nil(w, val);
        })
    }

    pub fn uuids(self, key: &str, vals: &[[u8; 16]]) -> Self {
        self.field(|w| {
            w.write_slice_key(key);
            for val in vals {
                write_uuid_or_nil(w, val);
            }
            w.write_slice_end();
        })
    }

    /// Pre-encoded JSON, embedded compacted. Invalid JSON is written as an error value.
    pub fn json(self, key: &str, raw: impl AsRef<[u8]>) -> Self {
        self.field(|w| {
            w.write_key(key);
            w.write_json(raw.as_ref());
        })
    }

    /// Any serializable value, classified by its serde shape.
    ///
    /// Scalars map to their primitive field kinds, 16-byte arrays and
    /// `uuid::Uuid` become UUIDs, sequences become slices, and structs or maps
    /// are embedded as JSON.
    pub fn any<T: Serialize + ?Sized>(self, key: &str, val: &T) -> Self {
        self.field(|w| any::write_any(w, key, val))
    }

    pub fn loggable<L: Loggable + ?Sized>(self, key: &str, val: &L) -> Self {
        self.field(|w| val.log_value(key, w))
    }

    pub fn attrib(self, attrib: &Attrib) -> Self {
        self.field(|w| attrib.log(w))
    }

    pub fn attribs(self, attribs: &Attribs) -> Self {
        self.field(|w| attribs.log(w))
    }

    /// Write the attribs carried by `ctx`.
    pub fn ctx_attribs(self, ctx: &LogContext) -> Self {
        self.attribs(ctx.attribs())
    }

    /// One field per member of a struct or map. Flattened members appear as
    /// top-level fields and renamed members use their serde name.
    pub fn struct_fields<T: Serialize + ?Sized>(self, val: &T) -> Self {
        self.field(|w| any::write_struct_fields(w, val, &[]))
    }

    /// Like [`Message::struct_fields`], replacing the values of the members
    /// named in `sensitive` with a placeholder.
    pub fn tagged_struct_fields<T: Serialize + ?Sized>(self, val: &T, sensitive: &[&str]) -> Self {
        self.field(|w| any::write_struct_fields(w, val, sensitive))
    }

    /// Commit the record to every writer and release all pooled resources.
    ///
    /// Sink failures are reported on stderr and never reach the caller. If the
    /// record's level is at or above the logger's fatal level, the fatal
    /// handler runs after release.
    pub fn log(mut self) {
        let Some(mut state) = self.state.take() else {
            return;
        };
        if state.recording {
            release_state(state);
            return;
        }

        for (idx, writer) in state.fanout.writers.iter_mut() {
            let result = catch_unwind(AssertUnwindSafe(|| writer.commit_message()));
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    eprintln!("[LOGGER ERROR] Writer #{} failed to commit: {}", idx, e);
                }
                Err(panic) => {
                    eprintln!(
                        "[LOGGER CRITICAL] Writer #{} panicked: {}. \
                         Other writers continue to function.",
                        idx,
                        panic_message(panic.as_ref())
                    );
                }
            }
        }

        let fatal = state.logger.config().and_then(|config| config.fatal_handler_for(state.level));
        let text = fatal.as_ref().map(|_| state.text.clone());
        release_state(state);

        if let (Some(handler), Some(text)) = (fatal, text) {
            handler(&text);
        }
    }

    /// Commit like [`Message::log`], then panic with the record text.
    pub fn log_and_panic(self) -> ! {
        let text = match &self.state {
            Some(state) => state.text.clone(),
            None => "log_and_panic called on an inactive message".to_string(),
        };
        self.log();
        panic!("{}", text);
    }

    /// Turn the recorded fields into a new logger.
    ///
    /// Recorded fields take priority over same-keyed fields the parent logger
    /// already carries. An inert message yields a no-op logger.
    pub fn sub_logger(mut self) -> Logger {
        let Some(mut state) = self.state.take() else {
            return Logger::nop();
        };
        let recorded = state.recorder.take();
        let logger = state.logger.derive(recorded);
        release_state(state);
        logger
    }

    /// Like [`Message::sub_logger`], also returning a context that carries the
    /// recorded fields on top of `ctx`'s own.
    pub fn sub_logger_context(mut self, ctx: &LogContext) -> (Logger, LogContext) {
        let Some(mut state) = self.state.take() else {
            return (Logger::nop(), ctx.clone());
        };
        let recorded = state.recorder.take();
        let sub_ctx = ctx.with_attribs(&recorded);
        let logger = state.logger.derive(recorded);
        release_state(state);
        (logger, sub_ctx)
    }

    #[cfg(test)]
    pub(crate) fn recorded(&self) -> Option<&Attribs> {
        self.state.as_ref().map(|s| s.recorder.attribs())
    }
}

impl Drop for Message {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            release_state(state);
        }
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            None => f.write_str("Message(inert)"),
            Some(state) => f
                .debug_struct("Message")
                .field("level", &state.level)
                .field("text", &state.text)
                .field("recording", &state.recording)
                .field("writers", &state.fanout.writers.len())
                .finish(),
        }
    }
}

/// Text of a record under construction.
pub(crate) fn state_text(state: &mut MessageState) -> &mut String {
    &mut state.text
}

/// Begin the record on every writer and pre-write the inherited fields.
pub(crate) fn begin(
    state: &mut MessageState,
    writers: Vec<(usize, Box<dyn Writer>)>,
    timestamp: &chrono::DateTime<chrono::Utc>,
    prefix: &str,
    ctx: &LogContext,
) {
    state.fanout.writers.extend(writers);
    if let Some(config) = state.logger.config().cloned() {
        let level = state.level;
        let text = &state.text;
        for (_, writer) in state.fanout.writers.iter_mut() {
            writer.begin_message(timestamp, config.levels(), level, prefix, text);
        }
    }
    let inherited = std::sync::Arc::clone(state.logger.attribs_arc());
    inherited.log(&mut state.fanout);
    ctx.attribs().log(&mut state.fanout);
}
