//! The progression store: sole owner and mutator of a [`ProgressionState`].
//!
//! Every public operation locks the store once and runs to completion, so
//! operations are atomic with respect to each other even when the host
//! calls from several threads. The record is written back to storage after
//! every mutation.
//!
//! Storage failures never reach the caller. A record that cannot be read
//! or decoded is replaced by the zero-state; a failed save is logged and
//! counted, the in-memory state stays authoritative, and
//! [`ProgressionStore::persistence_health`] reports the failure until the
//! next save succeeds.
//!
//! A record written by a newer release is loaded and used but never saved
//! over; the session's changes stay in memory and the health report says
//! why.
//!
//! Two stores pointed at the same key overwrite each other
//! (last writer wins); there is no merge.

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::achievements::{self, Achievement, AchievementStatus};
use crate::award::{AwardReason, AwardResult};
use crate::clock::Clock;
use crate::config::{ApprobConfig, ProgressionConfig};
use crate::error::Result;
use crate::leveling;
use crate::metrics::{spans, CounterSnapshot, ProgressionCounters};
use crate::quiz::QuizOutcome;
use crate::state::{ProgressionState, CURRENT_SCHEMA_VERSION};
use crate::stats::StatisticsView;
use crate::storage::KeyValueStore;
use crate::streak::{self, StreakTransition};
use crate::types::{StepId, TaskId};

/// Result of [`ProgressionStore::complete_task`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCompletion {
    /// Points granted by this call (0 for a repeat).
    pub points_awarded: u64,
    /// Whether the task was completed for the first time.
    pub is_new_task: bool,
    /// Full award details for a first completion.
    pub award: Option<AwardResult>,
}

/// Result of [`ProgressionStore::complete_step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepCompletion {
    /// Points granted by this call (0 for a repeat).
    pub points_awarded: u64,
    /// Whether the step was completed for the first time.
    pub is_new_step: bool,
    /// Full award details for a first completion.
    pub award: Option<AwardResult>,
}

/// Result of [`ProgressionStore::update_daily_streak`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakUpdate {
    /// How today's check-in was classified.
    pub transition: StreakTransition,
    /// Streak length afterwards.
    pub streak_days: u32,
    /// Awards granted (daily login, then streak bonus if earned).
    pub awards: Vec<AwardResult>,
}

/// Whether progress is currently reaching durable storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceHealth {
    /// `false` while the most recent save attempt failed.
    pub healthy: bool,
    /// Message of the most recent failed save, cleared on success.
    pub last_error: Option<String>,
}

struct Inner {
    state: ProgressionState,
    storage: Box<dyn KeyValueStore>,
    last_save_error: Option<String>,
}

/// Owns the progression record for one profile.
pub struct ProgressionStore {
    inner: Mutex<Inner>,
    config: ProgressionConfig,
    state_key: String,
    clock: Box<dyn Clock>,
    counters: ProgressionCounters,
}

impl std::fmt::Debug for ProgressionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressionStore")
            .field("state_key", &self.state_key)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ProgressionStore {
    /// Load the record stored under `config.persistence.state_key`, or start
    /// from the zero-state if there is none or it is unreadable.
    ///
    /// # Errors
    /// Returns [`crate::ApprobError::Config`] if the progression tuning is
    /// invalid. Storage problems are never returned.
    pub fn open(
        storage: Box<dyn KeyValueStore>,
        config: &ApprobConfig,
        clock: impl Clock + 'static,
    ) -> Result<Self> {
        config.progression.validate()?;
        let progression = config.progression.clone();
        let state_key = config.persistence.state_key.clone();
        let counters = ProgressionCounters::new();

        let state = Self::load_state(storage.as_ref(), &state_key, &progression, &counters);
        let last_save_error = state.is_from_newer_version().then(|| newer_record_message(&state));
        info!(
            key = %state_key,
            backend = storage.backend_name(),
            level = state.level,
            points = state.points,
            "Progression store ready"
        );

        Ok(Self {
            inner: Mutex::new(Inner {
                state,
                storage,
                last_save_error,
            }),
            config: progression,
            state_key,
            clock: Box::new(clock),
            counters,
        })
    }

    fn load_state(
        storage: &dyn KeyValueStore,
        key: &str,
        config: &ProgressionConfig,
        counters: &ProgressionCounters,
    ) -> ProgressionState {
        let _span = tracing::debug_span!(spans::PERSIST_LOAD, key).entered();
        match storage.load(key) {
            Ok(Some(raw)) => match ProgressionState::from_json(&raw, config) {
                Ok(state) => state,
                Err(e) => {
                    warn!(key, error = %e, "Stored progression is corrupt; starting from zero");
                    ProgressionCounters::add(&counters.load_failures, 1);
                    ProgressionState::new(config)
                }
            },
            Ok(None) => {
                debug!(key, "No stored progression; starting from zero");
                ProgressionState::new(config)
            }
            Err(e) => {
                warn!(key, error = %e, "Progression storage unreadable; starting from zero");
                ProgressionCounters::add(&counters.load_failures, 1);
                ProgressionState::new(config)
            }
        }
    }

    // ------------------------------------------------------------------
    // Awards
    // ------------------------------------------------------------------

    /// Grant points for `reason`, using `explicit_amount` instead of the
    /// reason's base value when given.
    ///
    /// The amount is added to points and experience, pending level-ups fire
    /// (each with its bonus, milestone levels with an immediate achievement
    /// check), the whole achievement catalog is re-evaluated, and the record
    /// is saved.
    pub fn award_points(&self, reason: AwardReason, explicit_amount: Option<u64>) -> AwardResult {
        let mut inner = self.inner.lock();
        let result = self.award_locked(&mut inner.state, reason.as_str(), reason.resolve(explicit_amount));
        self.persist(&mut inner);
        result
    }

    /// String-keyed variant of [`Self::award_points`] for callers that hold
    /// action names. An unknown name is logged and treated as a zero-point
    /// award rather than an error.
    pub fn award_points_by_name(&self, action: &str, explicit_amount: Option<u64>) -> AwardResult {
        match action.parse::<AwardReason>() {
            Ok(reason) => self.award_points(reason, explicit_amount),
            Err(e) => {
                warn!(action, error = %e, "Unknown award action; granting nothing");
                let mut inner = self.inner.lock();
                let result = self.award_locked(&mut inner.state, action, 0);
                self.persist(&mut inner);
                result
            }
        }
    }

    fn award_locked(&self, state: &mut ProgressionState, label: &str, amount: u64) -> AwardResult {
        let _span = tracing::debug_span!(spans::AWARD, action = label, amount).entered();

        state.points = state.points.saturating_add(amount);
        state.experience = state.experience.saturating_add(amount);

        let mut levels_gained = 0;
        let mut unlocked = Vec::new();
        while let Some(level) = leveling::level_up_once(state, &self.config) {
            levels_gained += 1;
            if self.config.is_milestone(level) {
                debug!(level, "Milestone level reached");
                unlocked.extend(self.unlock_locked(state));
            }
        }
        unlocked.extend(self.unlock_locked(state));

        ProgressionCounters::add(&self.counters.awards_granted, 1);
        ProgressionCounters::add(&self.counters.level_ups, u64::from(levels_gained));
        debug!(
            action = label,
            amount,
            total_points = state.points,
            level = state.level,
            levels_gained,
            "Award granted"
        );

        AwardResult {
            points_awarded: amount,
            total_points: state.points,
            level: state.level,
            experience: state.experience,
            experience_to_next: state.experience_to_next,
            levels_gained,
            unlocked,
        }
    }

    fn unlock_locked(&self, state: &mut ProgressionState) -> Vec<Achievement> {
        let _span = tracing::trace_span!(spans::ACHIEVEMENTS).entered();
        let unlocked = achievements::unlock_pending(state, self.config.achievement_bonus);
        for achievement in &unlocked {
            info!(achievement = %achievement, points = state.points, "Achievement unlocked");
        }
        ProgressionCounters::add(&self.counters.achievements_unlocked, unlocked.len() as u64);
        unlocked
    }

    // ------------------------------------------------------------------
    // Checklist
    // ------------------------------------------------------------------

    /// Mark a task complete. Repeats are no-ops that award nothing.
    ///
    /// `step_id` is informational; finishing every task of a step does not
    /// complete the step, callers do that explicitly with
    /// [`Self::complete_step`].
    pub fn complete_task(&self, task_id: impl Into<TaskId>, step_id: impl Into<StepId>) -> TaskCompletion {
        let task_id = task_id.into();
        let step_id = step_id.into();
        let mut inner = self.inner.lock();

        if !inner.state.completed_tasks.insert(task_id.clone()) {
            debug!(task = %task_id, step = %step_id, "Task already completed");
            return TaskCompletion {
                points_awarded: 0,
                is_new_task: false,
                award: None,
            };
        }

        debug!(task = %task_id, step = %step_id, "Task completed");
        let reason = AwardReason::CompleteTask;
        let award = self.award_locked(&mut inner.state, reason.as_str(), reason.base_points());
        self.persist(&mut inner);
        TaskCompletion {
            points_awarded: award.points_awarded,
            is_new_task: true,
            award: Some(award),
        }
    }

    /// Mark a checklist step complete. Repeats are no-ops that award nothing.
    pub fn complete_step(&self, step_id: impl Into<StepId>) -> StepCompletion {
        let step_id = step_id.into();
        let mut inner = self.inner.lock();

        if !inner.state.completed_steps.insert(step_id.clone()) {
            debug!(step = %step_id, "Step already completed");
            return StepCompletion {
                points_awarded: 0,
                is_new_step: false,
                award: None,
            };
        }

        debug!(step = %step_id, "Step completed");
        let reason = AwardReason::CompleteStep;
        let award = self.award_locked(&mut inner.state, reason.as_str(), reason.base_points());
        self.persist(&mut inner);
        StepCompletion {
            points_awarded: award.points_awarded,
            is_new_step: true,
            award: Some(award),
        }
    }

    // ------------------------------------------------------------------
    // Quizzes
    // ------------------------------------------------------------------

    /// Record a finished quiz and grant its reward.
    ///
    /// # Errors
    /// Returns [`crate::ApprobError::InvalidArgument`] if `total_questions`
    /// is zero or `correct_answers` exceeds it; nothing is recorded then.
    pub fn complete_quiz(&self, total_questions: u32, correct_answers: u32) -> Result<AwardResult> {
        let _span = tracing::debug_span!(spans::QUIZ, total_questions, correct_answers).entered();
        let outcome = QuizOutcome::evaluate(total_questions, correct_answers)?;

        let mut inner = self.inner.lock();
        inner.state.quiz_stats.incorporate(total_questions, correct_answers)?;
        debug!(
            score = outcome.score,
            average = inner.state.quiz_stats.average_score,
            quizzes = inner.state.quiz_stats.total_quizzes,
            "Quiz recorded"
        );

        let amount = outcome.reason.resolve(outcome.amount);
        let result = self.award_locked(&mut inner.state, outcome.reason.as_str(), amount);
        self.persist(&mut inner);
        Ok(result)
    }

    // ------------------------------------------------------------------
    // Streaks
    // ------------------------------------------------------------------

    /// Count today's activity towards the streak.
    ///
    /// Safe to call any number of times per day: only the first call of a
    /// calendar day changes anything.
    pub fn update_daily_streak(&self) -> StreakUpdate {
        let today = self.clock.today();
        let _span = tracing::debug_span!(spans::STREAK, %today).entered();
        let mut inner = self.inner.lock();

        let transition = streak::classify(inner.state.last_active_date, today);
        let streak_days = streak::next_streak(inner.state.streak_days, transition);

        match transition {
            StreakTransition::AlreadyCounted => {
                return StreakUpdate {
                    transition,
                    streak_days,
                    awards: Vec::new(),
                };
            }
            StreakTransition::ClockSkew => {
                // The future date is kept so a corrected clock resumes the streak.
                warn!(
                    last_active = ?inner.state.last_active_date,
                    %today,
                    "Last activity is in the future; streak left unchanged"
                );
                return StreakUpdate {
                    transition,
                    streak_days,
                    awards: Vec::new(),
                };
            }
            StreakTransition::Reset { gap_days } => {
                info!(previous = inner.state.streak_days, gap_days, "Streak broken");
            }
            StreakTransition::Continued | StreakTransition::Started => {}
        }

        inner.state.streak_days = streak_days;
        inner.state.last_active_date = Some(today);

        let mut awards = Vec::with_capacity(2);
        if transition.awards_login() {
            let reason = AwardReason::DailyLogin;
            awards.push(self.award_locked(&mut inner.state, reason.as_str(), reason.base_points()));
        }
        if transition == StreakTransition::Continued
            && streak::earns_bonus(streak_days, self.config.streak_bonus_interval_days)
        {
            info!(streak_days, "Streak bonus earned");
            let reason = AwardReason::StreakBonus;
            awards.push(self.award_locked(&mut inner.state, reason.as_str(), reason.base_points()));
        }

        self.persist(&mut inner);
        StreakUpdate {
            transition,
            streak_days,
            awards,
        }
    }

    // ------------------------------------------------------------------
    // Achievements
    // ------------------------------------------------------------------

    /// Re-evaluate the whole catalog and unlock anything that now qualifies.
    ///
    /// `trigger_hint` only labels the log line; every predicate is checked.
    pub fn check_achievements(&self, trigger_hint: &str) -> Vec<Achievement> {
        let mut inner = self.inner.lock();
        let unlocked = self.unlock_locked(&mut inner.state);
        debug!(trigger = trigger_hint, unlocked = unlocked.len(), "Achievements checked");
        if !unlocked.is_empty() {
            self.persist(&mut inner);
        }
        unlocked
    }

    /// The whole catalog with unlocked flags, in catalog order.
    #[must_use]
    pub fn get_achievements(&self) -> Vec<AchievementStatus> {
        achievements::statuses(&self.inner.lock().state)
    }

    // ------------------------------------------------------------------
    // Accumulators
    // ------------------------------------------------------------------

    /// Add study minutes. Awards nothing itself but may unlock achievements.
    pub fn record_time_spent(&self, minutes: u64) -> Vec<Achievement> {
        let mut inner = self.inner.lock();
        inner.state.time_spent = inner.state.time_spent.saturating_add(minutes);
        debug!(minutes, total = inner.state.time_spent, "Study time recorded");
        let unlocked = self.unlock_locked(&mut inner.state);
        self.persist(&mut inner);
        unlocked
    }

    /// Count an uploaded document and grant its award.
    pub fn record_document_upload(&self) -> AwardResult {
        let mut inner = self.inner.lock();
        inner.state.documents_uploaded = inner.state.documents_uploaded.saturating_add(1);
        let reason = AwardReason::UploadDocument;
        let result = self.award_locked(&mut inner.state, reason.as_str(), reason.base_points());
        self.persist(&mut inner);
        result
    }

    /// Count an AI tutor interaction and grant its award.
    pub fn record_ai_interaction(&self) -> AwardResult {
        let mut inner = self.inner.lock();
        inner.state.ai_interactions = inner.state.ai_interactions.saturating_add(1);
        let reason = AwardReason::AiInteraction;
        let result = self.award_locked(&mut inner.state, reason.as_str(), reason.base_points());
        self.persist(&mut inner);
        result
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Flattened statistics for display.
    #[must_use]
    pub fn get_user_stats(&self) -> StatisticsView {
        StatisticsView::from_state(&self.inner.lock().state)
    }

    /// A copy of the full record.
    #[must_use]
    pub fn snapshot(&self) -> ProgressionState {
        self.inner.lock().state.clone()
    }

    /// The levelling and bonus tuning in effect.
    #[must_use]
    pub fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    /// Storage key of this store's record.
    #[must_use]
    pub fn state_key(&self) -> &str {
        &self.state_key
    }

    /// Engine counters.
    #[must_use]
    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Whether the last save reached storage.
    #[must_use]
    pub fn persistence_health(&self) -> PersistenceHealth {
        let inner = self.inner.lock();
        PersistenceHealth {
            healthy: inner.last_save_error.is_none(),
            last_error: inner.last_save_error.clone(),
        }
    }

    /// Retry writing the current record; returns whether it succeeded.
    pub fn flush(&self) -> bool {
        let mut inner = self.inner.lock();
        self.persist(&mut inner)
    }

    fn persist(&self, inner: &mut Inner) -> bool {
        let _span = tracing::debug_span!(spans::PERSIST_SAVE, key = %self.state_key).entered();
        if inner.state.is_from_newer_version() {
            debug!(schema_version = inner.state.schema_version, "Skipping save over a newer record");
            return false;
        }
        let outcome = inner
            .state
            .to_json()
            .and_then(|json| inner.storage.save(&self.state_key, &json));

        match outcome {
            Ok(()) => {
                if inner.last_save_error.take().is_some() {
                    info!(key = %self.state_key, "Progression persistence recovered");
                }
                ProgressionCounters::add(&self.counters.saves_completed, 1);
                true
            }
            Err(e) => {
                warn!(
                    key = %self.state_key,
                    backend = inner.storage.backend_name(),
                    error = %e,
                    "Failed to persist progression; keeping in-memory state"
                );
                ProgressionCounters::add(&self.counters.save_failures, 1);
                inner.last_save_error = Some(e.to_string());
                false
            }
        }
    }
}

fn newer_record_message(state: &ProgressionState) -> String {
    format!(
        "stored record has schema version {}, newer than {CURRENT_SCHEMA_VERSION}; not overwriting it",
        state.schema_version
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::ApprobError;
    use crate::storage::MemoryStore;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).expect("date")
    }

    fn store_with(storage: MemoryStore, clock: FixedClock) -> ProgressionStore {
        ProgressionStore::open(Box::new(storage), &ApprobConfig::default(), clock).expect("open")
    }

    fn fresh() -> (ProgressionStore, MemoryStore, FixedClock) {
        let storage = MemoryStore::new();
        let clock = FixedClock::new(day(10));
        (store_with(storage.clone(), clock.clone()), storage, clock)
    }

    /// Storage whose writes always fail.
    #[derive(Debug)]
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn load(&self, _key: &str) -> Result<Option<String>> {
            Err(ApprobError::Io(std::io::Error::other("disk gone")))
        }

        fn save(&self, _key: &str, _value: &str) -> Result<()> {
            Err(ApprobError::Io(std::io::Error::other("disk gone")))
        }

        fn backend_name(&self) -> &'static str {
            "broken"
        }
    }

    #[test]
    fn award_adds_points_and_experience() {
        let (store, _, _) = fresh();
        let result = store.award_points(AwardReason::UploadDocument, None);
        assert_eq!(result.points_awarded, 15);
        assert_eq!(result.total_points, 15);
        assert_eq!(result.experience, 15);
        assert_eq!(result.level, 1);
        assert_eq!(result.experience_to_next, 100);
    }

    #[test]
    fn large_award_crosses_two_levels() {
        let (store, _, _) = fresh();
        let result = store.award_points(AwardReason::CompleteStep, Some(250));
        assert_eq!(result.level, 3);
        assert_eq!(result.experience, 30);
        assert_eq!(result.experience_to_next, 144);
        assert_eq!(result.levels_gained, 2);
        assert_eq!(result.total_points, 250 + 2 * 50);
    }

    #[test]
    fn milestone_level_unlocks_during_the_loop() {
        let (store, _, _) = fresh();
        // Levels 1..=4 need 100 + 120 + 144 + 172 = 536 XP.
        let result = store.award_points(AwardReason::CompleteStep, Some(536));
        assert_eq!(result.level, 5);
        assert_eq!(result.experience, 0);
        assert!(result.unlocked.contains(&Achievement::Level5));
    }

    #[test]
    fn custom_milestones_only_move_the_check() {
        let mut config = ApprobConfig::default();
        config.progression.milestone_levels = vec![3];
        let store = ProgressionStore::open(Box::new(MemoryStore::new()), &config, FixedClock::new(day(10)))
            .expect("open");

        // 100 + 120 = 220 XP reaches level 3; no level achievement exists there.
        let third = store.award_points(AwardReason::CompleteStep, Some(220));
        assert_eq!(third.level, 3);
        assert!(third.unlocked.is_empty());

        // Level 5 is not a configured milestone but still unlocks.
        let fifth = store.award_points(AwardReason::CompleteStep, Some(144 + 172));
        assert_eq!(fifth.level, 5);
        assert!(fifth.unlocked.contains(&Achievement::Level5));
    }

    #[test]
    fn newer_record_is_never_saved_over() {
        let storage = MemoryStore::new();
        let stored = r#"{"schemaVersion":9,"points":300,"level":2}"#;
        storage.insert("progression_state", stored);
        let store = store_with(storage.clone(), FixedClock::new(day(1)));

        store.complete_task("t1", "s1");
        assert_eq!(store.snapshot().completed_tasks.len(), 1);
        assert_eq!(storage.get("progression_state").as_deref(), Some(stored));

        let health = store.persistence_health();
        assert!(!health.healthy);
        assert!(health.last_error.is_some_and(|e| e.contains("schema version 9")));
        assert_eq!(store.counters().save_failures, 0);
    }

    #[test]
    fn unknown_action_is_zero_award() {
        let (store, storage, _) = fresh();
        let result = store.award_points_by_name("complete_tsak", None);
        assert_eq!(result.points_awarded, 0);
        assert_eq!(result.total_points, 0);
        assert!(storage.get("progression_state").is_some());

        let known = store.award_points_by_name("complete_step", None);
        assert_eq!(known.points_awarded, 50);
    }

    #[test]
    fn every_mutation_is_persisted() {
        let (store, storage, _) = fresh();
        store.complete_task("t1", "s1");
        let saved = storage.get("progression_state").expect("saved");
        let state = ProgressionState::from_json(&saved, store.config()).expect("decode");
        assert!(state.completed_tasks.contains(&TaskId::from("t1")));
        assert_eq!(state.points, store.snapshot().points);
    }

    #[test]
    fn complete_task_is_idempotent() {
        let (store, _, _) = fresh();
        let first = store.complete_task("t1", "s1");
        assert!(first.is_new_task);
        assert_eq!(first.points_awarded, 10);

        let points = store.snapshot().points;
        let second = store.complete_task("t1", "s1");
        assert!(!second.is_new_task);
        assert_eq!(second.points_awarded, 0);
        assert!(second.award.is_none());
        assert_eq!(store.snapshot().points, points);
    }

    #[test]
    fn complete_step_is_idempotent() {
        let (store, _, _) = fresh();
        assert!(store.complete_step("s1").is_new_step);
        let again = store.complete_step("s1");
        assert!(!again.is_new_step);
        assert_eq!(again.points_awarded, 0);
        assert_eq!(store.snapshot().completed_steps.len(), 1);
    }

    #[test]
    fn task_completion_does_not_complete_step() {
        let (store, _, _) = fresh();
        store.complete_task("t1", "s1");
        assert!(store.snapshot().completed_steps.is_empty());
    }

    #[test]
    fn quiz_average_and_rewards() {
        let (store, _, _) = fresh();
        let half = store.complete_quiz(10, 5).expect("quiz");
        assert_eq!(half.points_awarded, 100, "5 correct x 20");

        let perfect = store.complete_quiz(10, 10).expect("quiz");
        assert_eq!(perfect.points_awarded, 100, "flat perfect bonus");

        let quiz = store.snapshot().quiz_stats;
        assert_eq!(quiz.total_quizzes, 2);
        assert_eq!(quiz.correct_answers, 15);
        assert!((quiz.average_score - 75.0).abs() < 1e-9);
    }

    #[test]
    fn empty_quiz_is_rejected() {
        let (store, storage, _) = fresh();
        let err = store.complete_quiz(0, 0).unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(store.snapshot().quiz_stats.total_quizzes, 0);
        assert!(storage.is_empty());
    }

    #[test]
    fn first_streak_check_in_starts_at_one() {
        let (store, _, _) = fresh();
        let update = store.update_daily_streak();
        assert_eq!(update.transition, StreakTransition::Started);
        assert_eq!(update.streak_days, 1);
        assert_eq!(update.awards.len(), 1);
        assert_eq!(store.snapshot().last_active_date, Some(day(10)));
    }

    #[test]
    fn same_day_check_in_is_noop() {
        let (store, _, _) = fresh();
        store.update_daily_streak();
        let points = store.snapshot().points;
        let again = store.update_daily_streak();
        assert_eq!(again.transition, StreakTransition::AlreadyCounted);
        assert!(again.awards.is_empty());
        assert_eq!(store.snapshot().points, points);
    }

    #[test]
    fn seventh_day_earns_bonus() {
        let (store, _, clock) = fresh();
        for _ in 0..6 {
            let update = store.update_daily_streak();
            assert_eq!(update.awards.len(), 1);
            clock.advance_days(1);
        }
        let seventh = store.update_daily_streak();
        assert_eq!(seventh.streak_days, 7);
        assert_eq!(seventh.awards.len(), 2);
        assert_eq!(seventh.awards[1].points_awarded, 25);
        assert!(store.snapshot().achievements.contains(&Achievement::WeekWarrior));
    }

    #[test]
    fn gap_resets_streak() {
        let (store, _, clock) = fresh();
        store.update_daily_streak();
        clock.advance_days(1);
        store.update_daily_streak();
        clock.advance_days(2);
        let update = store.update_daily_streak();
        assert_eq!(update.transition, StreakTransition::Reset { gap_days: 2 });
        assert_eq!(update.streak_days, 1);
        assert_eq!(store.snapshot().last_active_date, Some(day(13)));
    }

    #[test]
    fn clock_skew_leaves_streak_alone() {
        let (store, _, clock) = fresh();
        store.update_daily_streak();
        clock.advance_days(-3);
        let update = store.update_daily_streak();
        assert_eq!(update.transition, StreakTransition::ClockSkew);
        assert_eq!(update.streak_days, 1);
        assert_eq!(store.snapshot().last_active_date, Some(day(10)));

        clock.advance_days(4);
        let resumed = store.update_daily_streak();
        assert_eq!(resumed.transition, StreakTransition::Continued);
        assert_eq!(resumed.streak_days, 2);
    }

    #[test]
    fn time_spent_feeds_achievements_without_points() {
        let (store, _, _) = fresh();
        assert!(store.record_time_spent(599).is_empty());
        assert_eq!(store.snapshot().points, 0);
        let unlocked = store.record_time_spent(1);
        assert_eq!(unlocked, vec![Achievement::DedicatedLearner]);
        assert_eq!(store.snapshot().points, 25);
        assert_eq!(store.snapshot().experience, 0);
    }

    #[test]
    fn uploads_and_ai_interactions_count_and_award() {
        let (store, _, _) = fresh();
        for _ in 0..5 {
            store.record_document_upload();
        }
        let state = store.snapshot();
        assert_eq!(state.documents_uploaded, 5);
        assert!(state.achievements.contains(&Achievement::DocumentPro));

        let ai = store.record_ai_interaction();
        assert_eq!(ai.points_awarded, 5);
        assert_eq!(store.snapshot().ai_interactions, 1);
    }

    #[test]
    fn check_achievements_picks_up_external_changes() {
        let (store, _, _) = fresh();
        assert!(store.check_achievements("manual").is_empty());
        store.complete_task("t1", "s1");
        assert!(store.check_achievements("manual").is_empty(), "already unlocked by the award");
    }

    #[test]
    fn stats_view_reflects_state() {
        let (store, _, _) = fresh();
        store.award_points(AwardReason::FirstTimeAction, None);
        let stats = store.get_user_stats();
        assert_eq!(stats.points, 30);
        assert!((stats.experience_progress - 30.0).abs() < 1e-9);
    }

    #[test]
    fn reopening_restores_state() {
        let storage = MemoryStore::new();
        let clock = FixedClock::new(day(1));
        let store = store_with(storage.clone(), clock.clone());
        store.complete_task("t1", "s1");
        store.complete_quiz(4, 3).expect("quiz");
        let before = store.snapshot();
        drop(store);

        let reopened = store_with(storage, clock);
        assert_eq!(reopened.snapshot(), before);
    }

    #[test]
    fn corrupt_record_falls_back_to_zero_state() {
        let storage = MemoryStore::new();
        storage.insert("progression_state", "{{{ not json");
        let store = store_with(storage, FixedClock::new(day(1)));
        assert_eq!(store.snapshot(), ProgressionState::default());
        assert_eq!(store.counters().load_failures, 1);
    }

    #[test]
    fn save_failure_is_absorbed_and_reported() {
        let store = ProgressionStore::open(
            Box::new(BrokenStore),
            &ApprobConfig::default(),
            FixedClock::new(day(1)),
        )
        .expect("open");
        assert_eq!(store.counters().load_failures, 1);

        let result = store.complete_task("t1", "s1");
        assert!(result.is_new_task);
        assert_eq!(store.snapshot().completed_tasks.len(), 1);

        let health = store.persistence_health();
        assert!(!health.healthy);
        assert!(health.last_error.expect("error").contains("disk gone"));
        assert!(!store.flush());
        assert_eq!(store.counters().save_failures, 2);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = ApprobConfig::default();
        config.progression.base_threshold = 0;
        let err = ProgressionStore::open(Box::new(MemoryStore::new()), &config, FixedClock::new(day(1)))
            .unwrap_err();
        assert!(matches!(err, ApprobError::Config(_)));
    }

    #[test]
    fn store_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ProgressionStore>();
    }
}
