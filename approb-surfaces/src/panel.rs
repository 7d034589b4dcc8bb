//! Progress panel: the level bar and the next milestone.

use approb_core::config::ProgressionConfig;
use approb_core::leveling;
use approb_core::stats::StatisticsView;
use serde::Serialize;

/// Everything the progress panel header renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPanel {
    /// Current level.
    pub level: u32,
    /// Cumulative points.
    pub points: u64,
    /// Fill of the level bar, `[0, 100]`.
    pub progress_percent: f64,
    /// Experience still needed for the next level.
    pub experience_remaining: u64,
    /// Next milestone level above the current one, if any remain.
    pub next_milestone: Option<u32>,
    /// Experience needed to reach `next_milestone` from here.
    pub experience_to_milestone: Option<u64>,
    /// Current streak, shown as the flame counter.
    pub streak_days: u32,
}

impl ProgressPanel {
    /// Build the panel from a stats view and the tuning that produced it.
    #[must_use]
    pub fn from_stats(stats: &StatisticsView, config: &ProgressionConfig) -> Self {
        let next_milestone = config
            .milestone_levels
            .iter()
            .copied()
            .filter(|&m| m > stats.level)
            .min();

        let experience_to_milestone = next_milestone.map(|target| {
            let remaining_here = stats.experience_to_next.saturating_sub(stats.experience);
            (stats.level + 1..target)
                .map(|level| leveling::threshold_for_level(level, config))
                .fold(remaining_here, u64::saturating_add)
        });

        Self {
            level: stats.level,
            points: stats.points,
            progress_percent: stats.experience_progress.clamp(0.0, 100.0),
            experience_remaining: stats.experience_to_next.saturating_sub(stats.experience),
            next_milestone,
            experience_to_milestone,
            streak_days: stats.streak_days,
        }
    }
}
