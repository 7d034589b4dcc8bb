//! The persisted progression record.
//!
//! One [`ProgressionState`] exists per profile. It is serialised as a single
//! camelCase JSON object under one storage key:
//!
//! ```json
//! {
//!   "schemaVersion": 1,
//!   "points": 135, "level": 2, "experience": 35, "experienceToNext": 120,
//!   "completedSteps": ["anerkennung"], "completedTasks": ["upload-diploma"],
//!   "achievements": ["first_steps", "milestone_reached"],
//!   "streakDays": 3, "lastActiveDate": "2026-03-01",
//!   "quizStats": { "totalQuizzes": 2, "correctAnswers": 15, "averageScore": 75.0 },
//!   "timeSpent": 90, "documentsUploaded": 1, "aiInteractions": 4
//! }
//! ```
//!
//! Records written before versioning carry no `schemaVersion` and are
//! migrated on load. Every load ends with [`ProgressionState::normalize`],
//! so a hand-edited or truncated record still satisfies the invariants.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::achievements::AchievementSet;
use crate::config::ProgressionConfig;
use crate::error::Result;
use crate::leveling;
use crate::quiz::QuizStats;
use crate::types::{StepId, TaskId};

/// Version written by this build.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// All progression data for one profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressionState {
    /// Record layout version; 0 means the record predates versioning.
    #[serde(default)]
    pub schema_version: u32,
    /// Cumulative points. Never decreases.
    pub points: u64,
    /// Current level, starting at 1.
    pub level: u32,
    /// Experience accrued within the current level.
    pub experience: u64,
    /// Experience needed to leave the current level.
    pub experience_to_next: u64,
    /// Completed checklist steps.
    pub completed_steps: BTreeSet<StepId>,
    /// Completed micro-tasks.
    pub completed_tasks: BTreeSet<TaskId>,
    /// Unlocked achievements. Append-only.
    pub achievements: AchievementSet,
    /// Consecutive days with activity.
    pub streak_days: u32,
    /// Calendar date of the last streak-relevant activity.
    pub last_active_date: Option<NaiveDate>,
    /// Quiz aggregates.
    pub quiz_stats: QuizStats,
    /// Recorded study time in minutes.
    pub time_spent: u64,
    /// Number of uploaded documents.
    pub documents_uploaded: u64,
    /// Number of AI tutor interactions.
    pub ai_interactions: u64,
}

impl ProgressionState {
    /// Fresh zero-state for the given curve.
    #[must_use]
    pub fn new(config: &ProgressionConfig) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            points: 0,
            level: 1,
            experience: 0,
            experience_to_next: leveling::threshold_for_level(1, config),
            completed_steps: BTreeSet::new(),
            completed_tasks: BTreeSet::new(),
            achievements: AchievementSet::new(),
            streak_days: 0,
            last_active_date: None,
            quiz_stats: QuizStats::default(),
            time_spent: 0,
            documents_uploaded: 0,
            ai_interactions: 0,
        }
    }

    /// Decode a stored record, migrating and normalising it.
    ///
    /// # Errors
    /// Returns [`crate::ApprobError::Serialization`] if `json` is not a
    /// progression record.
    pub fn from_json(json: &str, config: &ProgressionConfig) -> Result<Self> {
        let mut state: Self = serde_json::from_str(json)?;
        state.migrate();
        state.normalize(config);
        Ok(state)
    }

    /// Encode the record for storage.
    ///
    /// # Errors
    /// Returns [`crate::ApprobError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Bring an older record up to [`CURRENT_SCHEMA_VERSION`].
    pub fn migrate(&mut self) {
        match self.schema_version {
            CURRENT_SCHEMA_VERSION => {}
            0 => {
                // Unversioned records share the v1 layout.
                debug!("Migrating unversioned progression record to v1");
                self.schema_version = CURRENT_SCHEMA_VERSION;
            }
            newer => {
                warn!(
                    stored = newer,
                    supported = CURRENT_SCHEMA_VERSION,
                    "Progression record written by a newer version; it will not be overwritten"
                );
            }
        }
    }

    /// Whether the record was written by a release newer than this one.
    /// Such a record is never written back.
    #[must_use]
    pub fn is_from_newer_version(&self) -> bool {
        self.schema_version > CURRENT_SCHEMA_VERSION
    }

    /// Restore the structural invariants.
    ///
    /// Ensures `level >= 1`, recomputes the threshold from the level, runs
    /// any pending level-ups so that `experience < experience_to_next`, and
    /// clamps the quiz mean into `[0, 100]`.
    pub fn normalize(&mut self, config: &ProgressionConfig) {
        if self.level == 0 {
            warn!("Stored level was 0; resetting to 1");
            self.level = 1;
        }

        let expected = leveling::threshold_for_level(self.level, config);
        if self.experience_to_next != expected {
            debug!(
                stored = self.experience_to_next,
                expected,
                level = self.level,
                "Recomputing experience threshold"
            );
            self.experience_to_next = expected;
        }

        let entered = leveling::apply_level_ups(self, config);
        if !entered.is_empty() {
            warn!(levels = ?entered, "Stored experience exceeded threshold; applied pending level-ups");
        }

        let avg = self.quiz_stats.average_score;
        self.quiz_stats.average_score = if avg.is_finite() { avg.clamp(0.0, 100.0) } else { 0.0 };
    }

    /// Whether `experience < experience_to_next` and the threshold is positive.
    #[must_use]
    pub fn is_normalized(&self) -> bool {
        self.level >= 1 && self.experience_to_next > 0 && self.experience < self.experience_to_next
    }
}

impl Default for ProgressionState {
    fn default() -> Self {
        Self::new(&ProgressionConfig::default())
    }
}
