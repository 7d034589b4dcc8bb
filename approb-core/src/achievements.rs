//! Achievement catalog and rule evaluation.
//!
//! The catalog is a fixed, ordered list. Evaluation is exhaustive: every
//! predicate is checked against the current state on every call, because a
//! condition can become true through counters that an unrelated operation
//! mutated earlier. Already-unlocked achievements are skipped, so an
//! achievement is granted at most once even while its predicate stays true.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use crate::state::ProgressionState;

/// A one-time, permanently unlocked badge.
///
/// Declaration order is catalog order; evaluation and listings follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    /// First task completed.
    FirstSteps,
    /// Ten tasks completed.
    TaskMaster,
    /// First checklist step completed.
    MilestoneReached,
    /// Five checklist steps completed.
    HalfwayThere,
    /// First quiz finished.
    QuizRookie,
    /// Ten quizzes with an average of at least 80%.
    QuizMaster,
    /// Five quizzes, every one of them flawless.
    Perfectionist,
    /// Ten conversations with the AI tutor.
    AiExplorer,
    /// Five documents uploaded.
    DocumentPro,
    /// Ten hours of recorded study time.
    DedicatedLearner,
    /// Seven-day streak.
    WeekWarrior,
    /// Thirty-day streak.
    MonthChampion,
    /// Reached level 5.
    #[serde(rename = "level_5")]
    Level5,
    /// Reached level 10.
    #[serde(rename = "level_10")]
    Level10,
    /// Reached level 15.
    #[serde(rename = "level_15")]
    Level15,
    /// Reached level 20.
    #[serde(rename = "level_20")]
    Level20,
    /// A thousand points collected.
    PointCollector,
}

impl Achievement {
    /// The whole catalog, in evaluation order.
    pub const CATALOG: [Self; 17] = [
        Self::FirstSteps,
        Self::TaskMaster,
        Self::MilestoneReached,
        Self::HalfwayThere,
        Self::QuizRookie,
        Self::QuizMaster,
        Self::Perfectionist,
        Self::AiExplorer,
        Self::DocumentPro,
        Self::DedicatedLearner,
        Self::WeekWarrior,
        Self::MonthChampion,
        Self::Level5,
        Self::Level10,
        Self::Level15,
        Self::Level20,
        Self::PointCollector,
    ];

    /// Stable id used in storage and by the UI badge lookup.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::FirstSteps => "first_steps",
            Self::TaskMaster => "task_master",
            Self::MilestoneReached => "milestone_reached",
            Self::HalfwayThere => "halfway_there",
            Self::QuizRookie => "quiz_rookie",
            Self::QuizMaster => "quiz_master",
            Self::Perfectionist => "perfectionist",
            Self::AiExplorer => "ai_explorer",
            Self::DocumentPro => "document_pro",
            Self::DedicatedLearner => "dedicated_learner",
            Self::WeekWarrior => "week_warrior",
            Self::MonthChampion => "month_champion",
            Self::Level5 => "level_5",
            Self::Level10 => "level_10",
            Self::Level15 => "level_15",
            Self::Level20 => "level_20",
            Self::PointCollector => "point_collector",
        }
    }

    /// Look up a catalog entry by its stable id.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::CATALOG.into_iter().find(|a| a.id() == id)
    }

    /// Whether the condition holds for `state`, regardless of whether the
    /// achievement is already unlocked.
    #[must_use]
    pub fn is_satisfied(self, state: &ProgressionState) -> bool {
        let quiz = &state.quiz_stats;
        match self {
            Self::FirstSteps => !state.completed_tasks.is_empty(),
            Self::TaskMaster => state.completed_tasks.len() >= 10,
            Self::MilestoneReached => !state.completed_steps.is_empty(),
            Self::HalfwayThere => state.completed_steps.len() >= 5,
            Self::QuizRookie => quiz.total_quizzes >= 1,
            Self::QuizMaster => quiz.total_quizzes >= 10 && quiz.average_score >= 80.0,
            Self::Perfectionist => quiz.total_quizzes >= 5 && quiz.average_score >= 100.0,
            Self::AiExplorer => state.ai_interactions >= 10,
            Self::DocumentPro => state.documents_uploaded >= 5,
            Self::DedicatedLearner => state.time_spent >= 600,
            Self::WeekWarrior => state.streak_days >= 7,
            Self::MonthChampion => state.streak_days >= 30,
            Self::Level5 => state.level >= 5,
            Self::Level10 => state.level >= 10,
            Self::Level15 => state.level >= 15,
            Self::Level20 => state.level >= 20,
            Self::PointCollector => state.points >= 1000,
        }
    }
}

impl fmt::Display for Achievement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// One row of the badge listing handed to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementStatus {
    /// Which achievement.
    pub id: Achievement,
    /// Whether it has been unlocked.
    pub unlocked: bool,
}

/// The unlocked achievements of one record.
///
/// Stored as a flat list of ids. Ids this build does not know (written by a
/// newer release) are kept aside and written back unchanged, so a record
/// never loses an unlock by passing through an older engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AchievementSet {
    known: BTreeSet<Achievement>,
    unrecognized: BTreeSet<String>,
}

impl AchievementSet {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `achievement` is unlocked.
    #[must_use]
    pub fn contains(&self, achievement: &Achievement) -> bool {
        self.known.contains(achievement)
    }

    /// Unlock `achievement`; returns `false` if it already was.
    pub fn insert(&mut self, achievement: Achievement) -> bool {
        self.known.insert(achievement)
    }

    /// Number of unlocked catalog achievements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.known.len()
    }

    /// Whether no catalog achievement is unlocked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    /// Unlocked catalog achievements in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Achievement> {
        self.known.iter()
    }

    /// Stored ids that are not in this build's catalog.
    pub fn unrecognized(&self) -> impl Iterator<Item = &str> {
        self.unrecognized.iter().map(String::as_str)
    }

    /// Whether every unlock in `other`, known or not, is also in `self`.
    #[must_use]
    pub fn is_superset(&self, other: &Self) -> bool {
        self.known.is_superset(&other.known) && self.unrecognized.is_superset(&other.unrecognized)
    }
}

impl FromIterator<Achievement> for AchievementSet {
    fn from_iter<I: IntoIterator<Item = Achievement>>(iter: I) -> Self {
        Self {
            known: iter.into_iter().collect(),
            unrecognized: BTreeSet::new(),
        }
    }
}

impl<'a> IntoIterator for &'a AchievementSet {
    type Item = &'a Achievement;
    type IntoIter = std::collections::btree_set::Iter<'a, Achievement>;

    fn into_iter(self) -> Self::IntoIter {
        self.known.iter()
    }
}

impl Serialize for AchievementSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.known.iter().map(|a| a.id()).chain(self.unrecognized()))
    }
}

impl<'de> Deserialize<'de> for AchievementSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let ids = Vec::<String>::deserialize(deserializer)?;
        let mut set = Self::new();
        for id in ids {
            match Achievement::from_id(&id) {
                Some(achievement) => {
                    set.known.insert(achievement);
                }
                None => {
                    warn!(id = %id, "Unrecognised achievement id kept as stored");
                    set.unrecognized.insert(id);
                }
            }
        }
        Ok(set)
    }
}

/// Achievements whose predicate holds but which are not unlocked yet, in
/// catalog order. Pure: the caller decides how to grant them.
#[must_use]
pub fn pending(state: &ProgressionState) -> Vec<Achievement> {
    Achievement::CATALOG
        .into_iter()
        .filter(|a| !state.achievements.contains(a) && a.is_satisfied(state))
        .collect()
}

/// Unlock every pending achievement, crediting `bonus` points (not
/// experience) for each, and return the newly unlocked ones.
///
/// Repeats until nothing new qualifies, so a bonus that carries points
/// across a points-based condition unlocks it in the same call. Terminates
/// because each round unlocks at least one of a finite catalog.
pub fn unlock_pending(state: &mut ProgressionState, bonus: u64) -> Vec<Achievement> {
    let mut unlocked = Vec::new();
    loop {
        let round = pending(state);
        if round.is_empty() {
            return unlocked;
        }
        for achievement in round {
            state.achievements.insert(achievement);
            state.points = state.points.saturating_add(bonus);
            unlocked.push(achievement);
        }
    }
}

/// Full catalog with unlocked flags, for badge rendering.
#[must_use]
pub fn statuses(state: &ProgressionState) -> Vec<AchievementStatus> {
    Achievement::CATALOG
        .into_iter()
        .map(|id| AchievementStatus {
            id,
            unlocked: state.achievements.contains(&id),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{StepId, TaskId};

    #[test]
    fn ids_match_serde_names() {
        for achievement in Achievement::CATALOG {
            let json = serde_json::to_string(&achievement).expect("ser");
            assert_eq!(json, format!("\"{}\"", achievement.id()));
        }
    }

    #[test]
    fn catalog_is_in_declaration_order() {
        let mut sorted = Achievement::CATALOG;
        sorted.sort();
        assert_eq!(sorted, Achievement::CATALOG);
    }

    #[test]
    fn fresh_state_has_nothing_pending() {
        assert!(pending(&ProgressionState::default()).is_empty());
    }

    #[test]
    fn first_task_unlocks_first_steps_once() {
        let mut state = ProgressionState::default();
        state.completed_tasks.insert(TaskId::from("t1"));

        let unlocked = unlock_pending(&mut state, 25);
        assert_eq!(unlocked, vec![Achievement::FirstSteps]);
        assert_eq!(state.points, 25);

        let again = unlock_pending(&mut state, 25);
        assert!(again.is_empty());
        assert_eq!(state.points, 25);
    }

    #[test]
    fn bonus_does_not_touch_experience() {
        let mut state = ProgressionState::default();
        state.completed_steps.insert(StepId::from("s1"));
        unlock_pending(&mut state, 25);
        assert_eq!(state.experience, 0);
        assert!(state.achievements.contains(&Achievement::MilestoneReached));
    }

    #[test]
    fn multiple_conditions_unlock_in_catalog_order() {
        let mut state = ProgressionState::default();
        state.level = 10;
        state.streak_days = 7;
        state.ai_interactions = 12;

        let unlocked = unlock_pending(&mut state, 25);
        assert_eq!(
            unlocked,
            vec![
                Achievement::AiExplorer,
                Achievement::WeekWarrior,
                Achievement::Level5,
                Achievement::Level10,
            ]
        );
        assert_eq!(state.points, 100);
    }

    #[test]
    fn bonus_can_cascade_into_point_collector() {
        let mut state = ProgressionState::default();
        state.points = 990;
        state.completed_tasks.insert(TaskId::from("t1"));

        let unlocked = unlock_pending(&mut state, 25);
        assert_eq!(unlocked, vec![Achievement::FirstSteps, Achievement::PointCollector]);
        assert_eq!(state.points, 1040);
    }

    #[test]
    fn quiz_master_needs_volume_and_accuracy() {
        let mut state = ProgressionState::default();
        state.quiz_stats.total_quizzes = 10;
        state.quiz_stats.average_score = 79.9;
        assert!(!Achievement::QuizMaster.is_satisfied(&state));
        state.quiz_stats.average_score = 80.0;
        assert!(Achievement::QuizMaster.is_satisfied(&state));
    }

    #[test]
    fn statuses_cover_full_catalog() {
        let mut state = ProgressionState::default();
        state.achievements.insert(Achievement::QuizRookie);
        let rows = statuses(&state);
        assert_eq!(rows.len(), Achievement::CATALOG.len());
        assert_eq!(rows.iter().filter(|r| r.unlocked).count(), 1);
        assert!(rows.iter().any(|r| r.id == Achievement::QuizRookie && r.unlocked));
    }

    #[test]
    fn from_id_finds_every_catalog_entry() {
        for achievement in Achievement::CATALOG {
            assert_eq!(Achievement::from_id(achievement.id()), Some(achievement));
        }
        assert_eq!(Achievement::from_id("exam_passed"), None);
    }

    #[test]
    fn set_keeps_ids_it_does_not_know() {
        let set: AchievementSet = serde_json::from_str(r#"["first_steps", "exam_passed", "level_5"]"#).expect("de");
        assert_eq!(set.len(), 2);
        assert!(set.contains(&Achievement::FirstSteps));
        assert!(set.contains(&Achievement::Level5));
        assert_eq!(set.unrecognized().collect::<Vec<_>>(), ["exam_passed"]);

        let json = serde_json::to_string(&set).expect("ser");
        assert_eq!(json, r#"["first_steps","level_5","exam_passed"]"#);
    }

    #[test]
    fn superset_counts_unrecognized_ids() {
        let stored: AchievementSet = serde_json::from_str(r#"["exam_passed"]"#).expect("de");
        let mut grown = stored.clone();
        grown.insert(Achievement::QuizRookie);
        assert!(grown.is_superset(&stored));
        assert!(!AchievementSet::new().is_superset(&stored));
    }
}
