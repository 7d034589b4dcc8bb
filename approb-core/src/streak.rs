//! Daily streak classification.
//!
//! Streaks count consecutive calendar days with activity. Only dates are
//! compared; time of day never matters.

use chrono::NaiveDate;

/// What a daily check-in does to the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakTransition {
    /// Already checked in today; nothing changes.
    AlreadyCounted,
    /// Last activity was yesterday; the streak grows by one.
    Continued,
    /// No activity was ever recorded; the streak starts at one.
    Started,
    /// A day or more was missed; the streak restarts at one.
    Reset {
        /// Whole days between the last activity and today.
        gap_days: i64,
    },
    /// The stored date lies in the future (clock moved backwards).
    ClockSkew,
}

impl StreakTransition {
    /// Whether the transition grants the daily login award.
    #[must_use]
    pub fn awards_login(self) -> bool {
        matches!(self, Self::Continued | Self::Started | Self::Reset { .. })
    }
}

/// Classify today's check-in relative to the last recorded activity.
#[must_use]
pub fn classify(last_active: Option<NaiveDate>, today: NaiveDate) -> StreakTransition {
    let Some(last) = last_active else {
        return StreakTransition::Started;
    };
    match (today - last).num_days() {
        0 => StreakTransition::AlreadyCounted,
        1 => StreakTransition::Continued,
        gap if gap > 1 => StreakTransition::Reset { gap_days: gap },
        _ => StreakTransition::ClockSkew,
    }
}

/// Streak length after applying `transition` to `current`.
#[must_use]
pub fn next_streak(current: u32, transition: StreakTransition) -> u32 {
    match transition {
        StreakTransition::AlreadyCounted | StreakTransition::ClockSkew => current,
        StreakTransition::Continued => current.saturating_add(1),
        StreakTransition::Started | StreakTransition::Reset { .. } => 1,
    }
}

/// Whether a streak of `days` earns the periodic bonus.
#[must_use]
pub fn earns_bonus(days: u32, interval: u32) -> bool {
    interval > 0 && days > 0 && days % interval == 0
}
