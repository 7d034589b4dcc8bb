//! Runtime counters and span names.
//!
//! Each [`crate::ProgressionStore`] owns one [`ProgressionCounters`]; there
//! is no process-wide registry. Counters are lock-free `AtomicU64`s so they
//! can be read from a dashboard thread while the store is busy.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters for engine events.
#[derive(Debug)]
pub struct ProgressionCounters {
    /// Awards granted (including zero-point awards).
    pub awards_granted: AtomicU64,
    /// Level-ups fired.
    pub level_ups: AtomicU64,
    /// Achievements unlocked.
    pub achievements_unlocked: AtomicU64,
    /// Saves that reached storage.
    pub saves_completed: AtomicU64,
    /// Saves that failed and left only the in-memory state.
    pub save_failures: AtomicU64,
    /// Loads that fell back to the zero-state.
    pub load_failures: AtomicU64,
}

impl ProgressionCounters {
    /// A set of zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            awards_granted: AtomicU64::new(0),
            level_ups: AtomicU64::new(0),
            achievements_unlocked: AtomicU64::new(0),
            saves_completed: AtomicU64::new(0),
            save_failures: AtomicU64::new(0),
            load_failures: AtomicU64::new(0),
        }
    }

    pub(crate) fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    /// Snapshot all counters for export.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            awards_granted: self.awards_granted.load(Ordering::Relaxed),
            level_ups: self.level_ups.load(Ordering::Relaxed),
            achievements_unlocked: self.achievements_unlocked.load(Ordering::Relaxed),
            saves_completed: self.saves_completed.load(Ordering::Relaxed),
            save_failures: self.save_failures.load(Ordering::Relaxed),
            load_failures: self.load_failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for ProgressionCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Counter values at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Awards granted.
    pub awards_granted: u64,
    /// Level-ups fired.
    pub level_ups: u64,
    /// Achievements unlocked.
    pub achievements_unlocked: u64,
    /// Successful saves.
    pub saves_completed: u64,
    /// Failed saves.
    pub save_failures: u64,
    /// Loads that fell back to defaults.
    pub load_failures: u64,
}

impl CounterSnapshot {
    /// Format as Prometheus-compatible text.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        format!(
            "# HELP approb_awards_granted_total Awards granted\n\
             # TYPE approb_awards_granted_total counter\n\
             approb_awards_granted_total {}\n\
             # HELP approb_level_ups_total Level-ups fired\n\
             # TYPE approb_level_ups_total counter\n\
             approb_level_ups_total {}\n\
             # HELP approb_achievements_unlocked_total Achievements unlocked\n\
             # TYPE approb_achievements_unlocked_total counter\n\
             approb_achievements_unlocked_total {}\n\
             # HELP approb_saves_completed_total Saves that reached storage\n\
             # TYPE approb_saves_completed_total counter\n\
             approb_saves_completed_total {}\n\
             # HELP approb_save_failures_total Saves that failed\n\
             # TYPE approb_save_failures_total counter\n\
             approb_save_failures_total {}\n\
             # HELP approb_load_failures_total Loads that fell back to defaults\n\
             # TYPE approb_load_failures_total counter\n\
             approb_load_failures_total {}\n",
            self.awards_granted,
            self.level_ups,
            self.achievements_unlocked,
            self.saves_completed,
            self.save_failures,
            self.load_failures,
        )
    }
}

/// Span names used with `tracing::span!`.
pub mod spans {
    /// Award pipeline.
    pub const AWARD: &str = "approb::award";
    /// Achievement evaluation.
    pub const ACHIEVEMENTS: &str = "approb::achievements";
    /// Daily streak check-in.
    pub const STREAK: &str = "approb::streak";
    /// Quiz aggregation.
    pub const QUIZ: &str = "approb::quiz";
    /// Persistence save.
    pub const PERSIST_SAVE: &str = "approb::persist::save";
    /// Persistence load.
    pub const PERSIST_LOAD: &str = "approb::persist::load";
}
