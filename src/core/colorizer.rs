//! Token colorization for text output
//!
//! Text writers pass every rendered token through a [`Colorizer`], one method
//! per semantic class. All methods default to returning the token unchanged,
//! so an implementation only overrides the classes it wants to decorate.

use super::level::Level;
use std::borrow::Cow;

pub trait Colorizer: Send + Sync {
    fn colorize_msg<'a>(&self, msg: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(msg)
    }

    fn colorize_timestamp<'a>(&self, ts: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(ts)
    }

    fn colorize_level<'a>(&self, _level: Level, name: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(name)
    }

    fn colorize_key<'a>(&self, key: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(key)
    }

    fn colorize_nil<'a>(&self, nil: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(nil)
    }

    fn colorize_true<'a>(&self, val: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(val)
    }

    fn colorize_false<'a>(&self, val: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(val)
    }

    fn colorize_int<'a>(&self, val: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(val)
    }

    fn colorize_uint<'a>(&self, val: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(val)
    }

    fn colorize_float<'a>(&self, val: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(val)
    }

    fn colorize_string<'a>(&self, val: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(val)
    }

    fn colorize_error<'a>(&self, val: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(val)
    }

    fn colorize_uuid<'a>(&self, val: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(val)
    }
}

/// Leaves every token unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoColorizer;

impl Colorizer for NoColorizer {}

/// ANSI terminal colors via the `colored` crate.
///
/// Coloring is still subject to `colored`'s global override, so output
/// redirected to a file stays plain when the host disables it.
#[cfg(feature = "console")]
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleColorizer;

#[cfg(feature = "console")]
impl Colorizer for ConsoleColorizer {
    fn colorize_timestamp<'a>(&self, ts: &'a str) -> Cow<'a, str> {
        use colored::Colorize;
        Cow::Owned(ts.dimmed().to_string())
    }

    fn colorize_level<'a>(&self, level: Level, name: &'a str) -> Cow<'a, str> {
        use colored::Colorize;
        Cow::Owned(name.color(level.color_code()).bold().to_string())
    }

    fn colorize_key<'a>(&self, key: &'a str) -> Cow<'a, str> {
        use colored::Colorize;
        Cow::Owned(key.cyan().to_string())
    }

    fn colorize_nil<'a>(&self, nil: &'a str) -> Cow<'a, str> {
        use colored::Colorize;
        Cow::Owned(nil.bright_black().to_string())
    }

    fn colorize_true<'a>(&self, val: &'a str) -> Cow<'a, str> {
        use colored::Colorize;
        Cow::Owned(val.green().to_string())
    }

    fn colorize_false<'a>(&self, val: &'a str) -> Cow<'a, str> {
        use colored::Colorize;
        Cow::Owned(val.yellow().to_string())
    }

    fn colorize_error<'a>(&self, val: &'a str) -> Cow<'a, str> {
        use colored::Colorize;
        Cow::Owned(val.red().to_string())
    }

    fn colorize_uuid<'a>(&self, val: &'a str) -> Cow<'a, str> {
        use colored::Colorize;
        Cow::Owned(val.magenta().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_colorizer_borrows() {
        let c = NoColorizer;
        assert!(matches!(c.colorize_msg("hi"), Cow::Borrowed("hi")));
        assert!(matches!(c.colorize_level(Level::INFO, "INFO"), Cow::Borrowed("INFO")));
        assert!(matches!(c.colorize_uuid("x"), Cow::Borrowed("x")));
    }

    #[cfg(feature = "console")]
    #[test]
    fn test_console_colorizer_keeps_text() {
        colored::control::set_override(true);
        let c = ConsoleColorizer;
        let level = c.colorize_level(Level::ERROR, "ERROR");
        assert!(level.contains("ERROR"));
        assert!(level.contains('\u{1b}'));
        // Classes without a color are passed through
        assert!(matches!(c.colorize_string("s"), Cow::Borrowed("s")));
        colored::control::unset_override();
    }
}
