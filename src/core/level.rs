//! Log level definitions
//!
//! A [`Level`] is a plain signed integer: lower values are more verbose.
//! Display names live in a separate [`Levels`] table so applications can
//! define their own levels between the standard ones.

use super::error::{LoggerError, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Level(pub i8);

impl Level {
    pub const TRACE: Level = Level(-20);
    pub const DEBUG: Level = Level(-10);
    pub const INFO: Level = Level(0);
    pub const WARN: Level = Level(10);
    pub const ERROR: Level = Level(20);
    pub const FATAL: Level = Level(30);

    #[inline]
    pub const fn value(self) -> i8 {
        self.0
    }

    /// Terminal color for this level, picked by the nearest standard level at or below it.
    #[cfg(feature = "console")]
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match *self {
            l if l >= Level::FATAL => BrightRed,
            l if l >= Level::ERROR => Red,
            l if l >= Level::WARN => Yellow,
            l if l >= Level::INFO => Green,
            l if l >= Level::DEBUG => Blue,
            _ => BrightBlack,
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::INFO
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Named thresholds plus a name table used by writers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Levels {
    pub trace: Level,
    pub debug: Level,
    pub info: Level,
    pub warn: Level,
    pub error: Level,
    pub fatal: Level,
    names: Vec<(Level, String)>,
}

impl Default for Levels {
    fn default() -> Self {
        Self {
            trace: Level::TRACE,
            debug: Level::DEBUG,
            info: Level::INFO,
            warn: Level::WARN,
            error: Level::ERROR,
            fatal: Level::FATAL,
            names: vec![
                (Level::TRACE, "TRACE".to_string()),
                (Level::DEBUG, "DEBUG".to_string()),
                (Level::INFO, "INFO".to_string()),
                (Level::WARN, "WARN".to_string()),
                (Level::ERROR, "ERROR".to_string()),
                (Level::FATAL, "FATAL".to_string()),
            ],
        }
    }
}

impl Levels {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or rename a level.
    #[must_use]
    pub fn with_name(mut self, level: Level, name: impl Into<String>) -> Self {
        let name = name.into();
        match self.names.iter_mut().find(|(l, _)| *l == level) {
            Some(entry) => entry.1 = name,
            None => {
                self.names.push((level, name));
                self.names.sort_by_key(|(l, _)| *l);
            }
        }
        self
    }

    /// Display name of `level`, or its decimal value when it has no name.
    pub fn name(&self, level: Level) -> Cow<'_, str> {
        self.names
            .iter()
            .find(|(l, _)| *l == level)
            .map(|(_, name)| Cow::Borrowed(name.as_str()))
            .unwrap_or_else(|| Cow::Owned(level.to_string()))
    }

    /// Case-insensitive reverse lookup; accepts `WARNING` for the warn level
    /// and plain integers for unnamed levels.
    pub fn level_of_name(&self, name: &str) -> Result<Level> {
        let trimmed = name.trim();
        if let Some((level, _)) = self
            .names
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(trimmed))
        {
            return Ok(*level);
        }
        if trimmed.eq_ignore_ascii_case("WARNING") {
            return Ok(self.warn);
        }
        trimmed
            .parse::<i8>()
            .map(Level)
            .map_err(|_| LoggerError::invalid_level(name))
    }

    /// All named levels in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (Level, &str)> {
        self.names.iter().map(|(l, n)| (*l, n.as_str()))
    }
}
