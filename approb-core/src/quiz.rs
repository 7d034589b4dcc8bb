//! Quiz and competition score aggregation.
//!
//! Only aggregates are kept: the number of attempts, the number of correct
//! answers and a running mean of the percentage scores. Individual past
//! scores are never stored, so the mean is updated incrementally.

use serde::{Deserialize, Deserializer, Serialize};

use crate::award::AwardReason;
use crate::error::{ApprobError, Result};

/// Aggregate quiz statistics.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuizStats {
    /// Number of quiz attempts recorded.
    pub total_quizzes: u64,
    /// Correct answers summed over all attempts.
    pub correct_answers: u64,
    /// Running mean of the per-attempt percentage scores, in `[0, 100]`.
    #[serde(deserialize_with = "nullable_score")]
    pub average_score: f64,
}

/// Non-finite means were written as `null` by older clients that divided by
/// a zero question count; read them back as zero.
fn nullable_score<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

impl QuizStats {
    /// Fold one attempt into the aggregates and return its percentage score.
    ///
    /// The new mean is `(old_mean * (n - 1) + score) / n` where `n` counts
    /// the attempt being added.
    ///
    /// # Errors
    /// Returns [`ApprobError::InvalidArgument`] if `total_questions` is zero
    /// or `correct_answers` exceeds it. The aggregates are untouched then.
    pub fn incorporate(&mut self, total_questions: u32, correct_answers: u32) -> Result<f64> {
        let score = attempt_score(total_questions, correct_answers)?;

        let n = self.total_quizzes.saturating_add(1);
        let previous = self.average_score * (n - 1) as f64;
        self.average_score = ((previous + score) / n as f64).clamp(0.0, 100.0);
        self.total_quizzes = n;
        self.correct_answers = self.correct_answers.saturating_add(u64::from(correct_answers));

        Ok(score)
    }
}

/// Percentage score of one attempt.
///
/// # Errors
/// Returns [`ApprobError::InvalidArgument`] on an empty quiz or more correct
/// answers than questions.
pub fn attempt_score(total_questions: u32, correct_answers: u32) -> Result<f64> {
    if total_questions == 0 {
        return Err(ApprobError::invalid(
            "complete_quiz",
            "total_questions must be greater than zero",
        ));
    }
    if correct_answers > total_questions {
        return Err(ApprobError::invalid(
            "complete_quiz",
            format!("correct_answers ({correct_answers}) exceeds total_questions ({total_questions})"),
        ));
    }
    Ok(f64::from(correct_answers) / f64::from(total_questions) * 100.0)
}

/// How a finished quiz is rewarded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuizOutcome {
    /// Percentage score of the attempt.
    pub score: f64,
    /// Award reason to grant.
    pub reason: AwardReason,
    /// Explicit amount, or `None` to use the reason's base value.
    pub amount: Option<u64>,
}

impl QuizOutcome {
    /// Decide the reward for an attempt.
    ///
    /// A flawless attempt earns the flat perfect bonus. Anything else earns
    /// the per-answer quiz value times the raw number of correct answers, so
    /// long quizzes pay more than short ones at equal accuracy.
    ///
    /// # Errors
    /// Same preconditions as [`attempt_score`].
    pub fn evaluate(total_questions: u32, correct_answers: u32) -> Result<Self> {
        let score = attempt_score(total_questions, correct_answers)?;
        if correct_answers == total_questions {
            Ok(Self {
                score,
                reason: AwardReason::QuizPerfect,
                amount: None,
            })
        } else {
            Ok(Self {
                score,
                reason: AwardReason::QuizCorrect,
                amount: Some(AwardReason::QuizCorrect.base_points() * u64::from(correct_answers)),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_mean_of_two_attempts() {
        let mut stats = QuizStats::default();
        assert!((stats.incorporate(10, 5).expect("first") - 50.0).abs() < f64::EPSILON);
        assert!((stats.incorporate(10, 10).expect("second") - 100.0).abs() < f64::EPSILON);

        assert_eq!(stats.total_quizzes, 2);
        assert_eq!(stats.correct_answers, 15);
        assert!((stats.average_score - 75.0).abs() < 1e-9);
    }

    #[test]
    fn running_mean_matches_plain_mean() {
        let attempts = [(4, 1), (5, 5), (8, 6), (3, 0), (12, 9)];
        let mut stats = QuizStats::default();
        let mut sum = 0.0;
        for (total, correct) in attempts {
            sum += stats.incorporate(total, correct).expect("valid");
        }
        let expected = sum / attempts.len() as f64;
        assert!((stats.average_score - expected).abs() < 1e-9);
    }

    #[test]
    fn empty_quiz_is_rejected_without_side_effects() {
        let mut stats = QuizStats::default();
        let err = stats.incorporate(0, 0).unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(stats, QuizStats::default());
    }

    #[test]
    fn too_many_correct_answers_is_rejected() {
        let mut stats = QuizStats::default();
        assert!(stats.incorporate(3, 4).unwrap_err().is_invalid_argument());
        assert_eq!(stats.total_quizzes, 0);
    }

    #[test]
    fn null_average_reads_as_zero() {
        let stats: QuizStats =
            serde_json::from_str(r#"{"totalQuizzes":1,"correctAnswers":0,"averageScore":null}"#)
                .expect("de");
        assert_eq!(stats.total_quizzes, 1);
        assert!(stats.average_score.abs() < f64::EPSILON);
    }

    #[test]
    fn perfect_attempt_uses_flat_bonus() {
        let outcome = QuizOutcome::evaluate(7, 7).expect("valid");
        assert_eq!(outcome.reason, AwardReason::QuizPerfect);
        assert_eq!(outcome.amount, None);
    }

    #[test]
    fn imperfect_attempt_scales_with_correct_count() {
        let outcome = QuizOutcome::evaluate(10, 7).expect("valid");
        assert_eq!(outcome.reason, AwardReason::QuizCorrect);
        assert_eq!(outcome.amount, Some(140));

        let zero = QuizOutcome::evaluate(10, 0).expect("valid");
        assert_eq!(zero.amount, Some(0));
    }
}
