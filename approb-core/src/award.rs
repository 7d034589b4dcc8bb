//! Award reasons and the result shape returned to callers.
//!
//! Every point grant names a closed [`AwardReason`]. Each reason carries a
//! fixed base amount; callers that already computed a scaled reward (quiz
//! points per correct answer) pass an explicit amount instead.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::achievements::Achievement;
use crate::error::ApprobError;

/// Why points are being granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwardReason {
    /// A micro-task was ticked off.
    CompleteTask,
    /// A whole checklist step was finished.
    CompleteStep,
    /// A document was uploaded.
    UploadDocument,
    /// The user talked to the AI tutor.
    AiInteraction,
    /// Quiz answered with at least one mistake; scaled per correct answer.
    QuizCorrect,
    /// Quiz answered without a single mistake.
    QuizPerfect,
    /// First activity of the calendar day.
    DailyLogin,
    /// The streak reached another multiple of the bonus interval.
    StreakBonus,
    /// A feature was used for the first time.
    FirstTimeAction,
}

impl AwardReason {
    /// Every reason, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::CompleteTask,
        Self::CompleteStep,
        Self::UploadDocument,
        Self::AiInteraction,
        Self::QuizCorrect,
        Self::QuizPerfect,
        Self::DailyLogin,
        Self::StreakBonus,
        Self::FirstTimeAction,
    ];

    /// Points granted when no explicit amount is supplied.
    #[must_use]
    pub const fn base_points(self) -> u64 {
        match self {
            Self::CompleteTask => 10,
            Self::CompleteStep => 50,
            Self::UploadDocument => 15,
            Self::AiInteraction => 5,
            Self::QuizCorrect => 20,
            Self::QuizPerfect => 100,
            Self::DailyLogin => 5,
            Self::StreakBonus => 25,
            Self::FirstTimeAction => 30,
        }
    }

    /// Stable snake_case name, as used by callers and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CompleteTask => "complete_task",
            Self::CompleteStep => "complete_step",
            Self::UploadDocument => "upload_document",
            Self::AiInteraction => "ai_interaction",
            Self::QuizCorrect => "quiz_correct",
            Self::QuizPerfect => "quiz_perfect",
            Self::DailyLogin => "daily_login",
            Self::StreakBonus => "streak_bonus",
            Self::FirstTimeAction => "first_time_action",
        }
    }

    /// Resolve the amount to grant: the explicit override if present,
    /// otherwise the base value.
    #[must_use]
    pub fn resolve(self, explicit_amount: Option<u64>) -> u64 {
        explicit_amount.unwrap_or_else(|| self.base_points())
    }
}

impl fmt::Display for AwardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AwardReason {
    type Err = ApprobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|reason| reason.as_str() == s)
            .ok_or_else(|| ApprobError::UnknownAction(s.to_string()))
    }
}

/// Outcome of a single award, reported back to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardResult {
    /// Amount added to points and experience by this award (bonuses excluded).
    pub points_awarded: u64,
    /// Cumulative points after the award, bonuses included.
    pub total_points: u64,
    /// Level after all level-ups fired.
    pub level: u32,
    /// Experience within the current level.
    pub experience: u64,
    /// Threshold for the next level-up.
    pub experience_to_next: u64,
    /// How many levels were gained by this award.
    pub levels_gained: u32,
    /// Achievements unlocked as a consequence of this award, in unlock order.
    pub unlocked: Vec<Achievement>,
}
