//! Logging macros with `format!`-style message text.
//!
//! Each macro returns a [`Message`](crate::core::Message); add fields and
//! finish it with `.log()`. The text is only formatted when the level is
//! active.
//!
//! # Examples
//!
//! ```
//! use rust_structured_logger::prelude::*;
//! use rust_structured_logger::info;
//!
//! let sink = BufferSink::new();
//! let logger = Logger::builder().writer(JsonWriterConfig::new(sink.clone())).build();
//!
//! let port = 8080;
//! info!(logger, "listening on port {}", port).str("host", "0.0.0.0").log();
//! assert!(sink.contents().contains(r#""message":"listening on port 8080""#));
//! ```

/// Start a message at an explicit level.
///
/// ```
/// # use rust_structured_logger::prelude::*;
/// # let logger = Logger::nop();
/// use rust_structured_logger::log;
/// log!(logger, Level::INFO, "simple message").log();
/// log!(logger, Level(5), "custom level {}", 5).log();
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.new_message_fmt($level, format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        {
            let logger = &$logger;
            $crate::log!(logger, logger.levels().trace, $($arg)+)
        }
    };
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        {
            let logger = &$logger;
            $crate::log!(logger, logger.levels().debug, $($arg)+)
        }
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        {
            let logger = &$logger;
            $crate::log!(logger, logger.levels().info, $($arg)+)
        }
    };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        {
            let logger = &$logger;
            $crate::log!(logger, logger.levels().warn, $($arg)+)
        }
    };
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        {
            let logger = &$logger;
            $crate::log!(logger, logger.levels().error, $($arg)+)
        }
    };
}

/// Start a fatal-level message.
///
/// The fatal handler only runs if the logger was built with a fatal level.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        {
            let logger = &$logger;
            $crate::log!(logger, logger.levels().fatal, $($arg)+)
        }
    };
}
