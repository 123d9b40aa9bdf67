//! Call context carrying inherited fields
//!
//! A [`LogContext`] travels explicitly through a call tree. Messages created
//! with one of the `*_ctx` logger methods pre-write its attribs after the
//! logger's own, and level filters may inspect it.

use super::attrib::Attrib;
use super::attribs::Attribs;
use std::sync::Arc;

/// Immutable, cheaply cloned set of attribs for one call subtree.
#[derive(Debug, Clone, Default)]
pub struct LogContext {
    attribs: Arc<Attribs>,
    logging_disabled: bool,
}

impl LogContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a context that carries `attribs` on top of the current ones.
    ///
    /// Entries in `attribs` take priority over same-keyed entries already in
    /// the context.
    #[must_use]
    pub fn with_attribs(&self, attribs: &Attribs) -> Self {
        if attribs.is_empty() {
            return self.clone();
        }
        Self {
            attribs: Arc::new(attribs.append_unique(&self.attribs)),
            logging_disabled: self.logging_disabled,
        }
    }

    /// Derive a context with one more attrib.
    #[must_use]
    pub fn with_attrib(&self, attrib: Attrib) -> Self {
        self.with_attribs(&Attribs::from(vec![attrib]))
    }

    pub fn attribs(&self) -> &Attribs {
        &self.attribs
    }

    /// Derive a context in which every level is inactive.
    #[must_use]
    pub fn without_logging(&self) -> Self {
        Self {
            attribs: Arc::clone(&self.attribs),
            logging_disabled: true,
        }
    }

    #[inline]
    pub fn is_logging_disabled(&self) -> bool {
        self.logging_disabled
    }
}
