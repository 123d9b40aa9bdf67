//! Timestamp formats and record framing configuration
//!
//! [`TimestampFormat`] covers the formats log aggregation tools expect;
//! [`FormatConfig`] bundles it with the key names JSON writers use for the
//! built-in fields.

use super::error::{LoggerError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// How record timestamps are rendered.
///
/// ```
/// use rust_structured_logger::core::TimestampFormat;
/// use chrono::{TimeZone, Utc};
///
/// let ts = Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap();
/// let format = TimestampFormat::Custom("%Y-%m-%d %H:%M:%S".to_string());
/// assert_eq!(format.format(&ts), "2006-01-02 15:04:05");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// `2025-01-08T10:30:45.123Z`
    #[default]
    Iso8601,
    /// `2025-01-08T10:30:45.123456Z`
    Iso8601Micros,
    /// `2025-01-08T10:30:45+00:00`
    Rfc3339,
    /// Seconds since the epoch
    Unix,
    UnixMillis,
    UnixMicros,
    /// Any strftime pattern accepted by `chrono`
    Custom(String),
}

impl TimestampFormat {
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        let mut out = String::with_capacity(32);
        self.write_to(datetime, &mut out);
        out
    }

    /// Append the formatted timestamp to `out` without an intermediate allocation.
    pub fn write_to(&self, datetime: &DateTime<Utc>, out: &mut String) {
        // Writing into a String only fails on an invalid strftime pattern
        let result = match self {
            TimestampFormat::Iso8601 => write!(out, "{}", datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ")),
            TimestampFormat::Iso8601Micros => {
                write!(out, "{}", datetime.format("%Y-%m-%dT%H:%M:%S%.6fZ"))
            }
            TimestampFormat::Rfc3339 => {
                out.push_str(&datetime.to_rfc3339());
                Ok(())
            }
            TimestampFormat::Unix => write!(out, "{}", datetime.timestamp()),
            TimestampFormat::UnixMillis => write!(out, "{}", datetime.timestamp_millis()),
            TimestampFormat::UnixMicros => write!(out, "{}", datetime.timestamp_micros()),
            TimestampFormat::Custom(pattern) => write!(out, "{}", datetime.format(pattern)),
        };
        if result.is_err() {
            out.push_str(&datetime.to_rfc3339());
        }
    }

    /// Numeric formats are emitted as JSON numbers rather than strings.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TimestampFormat::Unix | TimestampFormat::UnixMillis | TimestampFormat::UnixMicros
        )
    }
}

fn default_timestamp_key() -> String {
    "time".to_string()
}

fn default_level_key() -> String {
    "level".to_string()
}

fn default_message_key() -> String {
    "message".to_string()
}

/// Record framing shared by the writers of one configuration.
///
/// Deserializable so hosts can load it from their own configuration files;
/// missing fields take their defaults.
///
/// ```
/// use rust_structured_logger::core::{FormatConfig, TimestampFormat};
///
/// let config: FormatConfig = serde_json::from_str(r#"{"timestamp_key":"ts"}"#).unwrap();
/// assert_eq!(config.timestamp_key, "ts");
/// assert_eq!(config.level_key, "level");
/// assert_eq!(config.timestamp_format, TimestampFormat::Iso8601);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatConfig {
    #[serde(default)]
    pub timestamp_format: TimestampFormat,
    #[serde(default = "default_timestamp_key")]
    pub timestamp_key: String,
    #[serde(default = "default_level_key")]
    pub level_key: String,
    #[serde(default = "default_message_key")]
    pub message_key: String,
    /// Only honored by text writers with a colorizer installed
    #[serde(default)]
    pub colorize: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            timestamp_format: TimestampFormat::default(),
            timestamp_key: default_timestamp_key(),
            level_key: default_level_key(),
            message_key: default_message_key(),
            colorize: false,
        }
    }
}

impl FormatConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    /// Shorthand for [`TimestampFormat::Custom`].
    #[must_use]
    pub fn with_custom_timestamp(mut self, pattern: &str) -> Self {
        self.timestamp_format = TimestampFormat::Custom(pattern.to_string());
        self
    }

    #[must_use]
    pub fn with_keys(
        mut self,
        timestamp_key: impl Into<String>,
        level_key: impl Into<String>,
        message_key: impl Into<String>,
    ) -> Self {
        self.timestamp_key = timestamp_key.into();
        self.level_key = level_key.into();
        self.message_key = message_key.into();
        self
    }

    #[must_use]
    pub fn with_colorize(mut self, colorize: bool) -> Self {
        self.colorize = colorize;
        self
    }

    /// Parse and validate a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Built-in keys must be non-empty and distinct.
    pub fn validate(&self) -> Result<()> {
        let keys = [
            ("timestamp_key", &self.timestamp_key),
            ("level_key", &self.level_key),
            ("message_key", &self.message_key),
        ];
        for (i, (field, key)) in keys.iter().enumerate() {
            if key.is_empty() {
                return Err(LoggerError::config("FormatConfig", format!("{} is empty", field)));
            }
            if let Some((other, _)) = keys[..i].iter().find(|(_, k)| k == key) {
                return Err(LoggerError::config(
                    "FormatConfig",
                    format!("{} and {} are both '{}'", other, field, key),
                ));
            }
        }
        Ok(())
    }
}
