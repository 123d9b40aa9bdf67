//! Core logger types and traits

pub mod any;
pub mod attrib;
pub mod attribs;
pub mod colorizer;
pub mod context;
pub mod error;
pub(crate) mod json;
pub mod level;
pub mod level_filter;
pub mod logger;
pub mod message;
pub mod pool;
pub mod timestamp;
pub mod writer;

pub use any::{redact, Loggable, REDACTED};
pub use attrib::{parse_uuid, parse_uuid_or_new, Attrib, AttribValue};
pub use attribs::Attribs;
#[cfg(feature = "console")]
pub use colorizer::ConsoleColorizer;
pub use colorizer::{Colorizer, NoColorizer};
pub use context::LogContext;
pub use error::{LoggerError, Result};
pub use level::{Level, Levels};
pub use level_filter::{
    AllLevelsActive, AllLevelsInactive, JoinLevelFilters, LevelFilter, LevelThreshold,
};
pub use logger::{Clock, Config, FatalHandler, Logger, LoggerBuilder};
pub use message::{message_pool_allocated, Message};
pub use pool::{Pool, Reusable};
pub use timestamp::{FormatConfig, TimestampFormat};
pub use writer::{ValueWriter, Writer, WriterConfig};
