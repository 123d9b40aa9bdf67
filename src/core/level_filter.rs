//! Level filters decide whether a level is active for a call context

use super::context::LogContext;
use super::level::Level;
use std::sync::Arc;

/// Predicate deciding whether messages at `level` are produced.
///
/// Evaluated once per message at creation time, never per field.
pub trait LevelFilter: Send + Sync {
    fn is_active(&self, ctx: &LogContext, level: Level) -> bool;
}

impl<F> LevelFilter for F
where
    F: Fn(&LogContext, Level) -> bool + Send + Sync,
{
    fn is_active(&self, ctx: &LogContext, level: Level) -> bool {
        self(ctx, level)
    }
}

/// Active iff the level is at or above the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelThreshold(pub Level);

impl LevelFilter for LevelThreshold {
    fn is_active(&self, _ctx: &LogContext, level: Level) -> bool {
        level >= self.0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AllLevelsActive;

impl LevelFilter for AllLevelsActive {
    fn is_active(&self, _ctx: &LogContext, _level: Level) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AllLevelsInactive;

impl LevelFilter for AllLevelsInactive {
    fn is_active(&self, _ctx: &LogContext, _level: Level) -> bool {
        false
    }
}

/// Active only if every joined filter agrees. An empty join is always active.
#[derive(Clone, Default)]
pub struct JoinLevelFilters(Vec<Arc<dyn LevelFilter>>);

impl JoinLevelFilters {
    pub fn new(filters: Vec<Arc<dyn LevelFilter>>) -> Self {
        Self(filters)
    }

    #[must_use = "builder methods return a new value"]
    pub fn with(mut self, filter: impl LevelFilter + 'static) -> Self {
        self.0.push(Arc::new(filter));
        self
    }
}

impl LevelFilter for JoinLevelFilters {
    fn is_active(&self, ctx: &LogContext, level: Level) -> bool {
        self.0.iter().all(|f| f.is_active(ctx, level))
    }
}

impl std::fmt::Debug for JoinLevelFilters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("JoinLevelFilters").field(&self.0.len()).finish()
    }
}
