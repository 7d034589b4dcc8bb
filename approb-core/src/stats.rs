//! Flattened read model for the progress panel, badge shelf and leaderboard.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::state::ProgressionState;

/// Display statistics derived from a [`ProgressionState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsView {
    /// Cumulative points.
    pub points: u64,
    /// Current level.
    pub level: u32,
    /// Experience within the current level.
    pub experience: u64,
    /// Threshold for the next level.
    pub experience_to_next: u64,
    /// `experience / experience_to_next * 100`, for progress bars.
    pub experience_progress: f64,
    /// Number of completed checklist steps.
    pub completed_steps: usize,
    /// Number of completed micro-tasks.
    pub completed_tasks: usize,
    /// Number of unlocked achievements.
    pub achievements: usize,
    /// Current streak length in days.
    pub streak_days: u32,
    /// Date of the last streak-relevant activity.
    pub last_active_date: Option<NaiveDate>,
    /// Quiz attempts recorded.
    pub total_quizzes: u64,
    /// Correct quiz answers recorded.
    pub correct_answers: u64,
    /// Mean quiz score in `[0, 100]`.
    pub average_score: f64,
    /// Recorded study minutes.
    pub time_spent: u64,
    /// Uploaded documents.
    pub documents_uploaded: u64,
    /// AI tutor interactions.
    pub ai_interactions: u64,
}

impl StatisticsView {
    /// Build the view. The threshold is positive by invariant; a zero is
    /// still reported as 0% rather than dividing.
    #[must_use]
    pub fn from_state(state: &ProgressionState) -> Self {
        let experience_progress = if state.experience_to_next == 0 {
            0.0
        } else {
            state.experience as f64 / state.experience_to_next as f64 * 100.0
        };

        Self {
            points: state.points,
            level: state.level,
            experience: state.experience,
            experience_to_next: state.experience_to_next,
            experience_progress,
            completed_steps: state.completed_steps.len(),
            completed_tasks: state.completed_tasks.len(),
            achievements: state.achievements.len(),
            streak_days: state.streak_days,
            last_active_date: state.last_active_date,
            total_quizzes: state.quiz_stats.total_quizzes,
            correct_answers: state.quiz_stats.correct_answers,
            average_score: state.quiz_stats.average_score,
            time_spent: state.time_spent,
            documents_uploaded: state.documents_uploaded,
            ai_interactions: state.ai_interactions,
        }
    }
}

impl From<&ProgressionState> for StatisticsView {
    fn from(state: &ProgressionState) -> Self {
        Self::from_state(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_percentage() {
        let mut state = ProgressionState::default();
        state.experience = 30;
        let view = StatisticsView::from_state(&state);
        assert!((view.experience_progress - 30.0).abs() < 1e-9);
    }

    #[test]
    fn zero_threshold_reports_zero_progress() {
        let mut state = ProgressionState::default();
        state.experience_to_next = 0;
        let view = StatisticsView::from_state(&state);
        assert!(view.experience_progress.abs() < f64::EPSILON);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_string(&StatisticsView::from_state(&ProgressionState::default()))
            .expect("ser");
        assert!(json.contains("\"experienceProgress\":0.0"));
        assert!(json.contains("\"completedTasks\":0"));
    }
}
