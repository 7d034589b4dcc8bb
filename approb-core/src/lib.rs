//! # Approb Core Library
//!
//! Progression and scoring engine for the licensing-journey guide: points,
//! levels, achievements, daily streaks and quiz statistics for a single
//! user profile, persisted locally.
//!
//! The entry point is [`ProgressionStore`], which owns one
//! [`ProgressionState`] and is the only thing that mutates it:
//!
//! - **Awards**: points and experience for checklist work, uploads, AI
//!   tutor conversations and quizzes ([`award`])
//! - **Levels**: geometric thresholds with a bonus per level-up ([`leveling`])
//! - **Achievements**: a fixed catalog evaluated after every change
//!   ([`achievements`])
//! - **Streaks**: consecutive calendar days of activity ([`streak`])
//! - **Quizzes**: running averages over attempts ([`quiz`])
//!
//! State is stored as a single JSON record behind a [`KeyValueStore`];
//! SQLite, flat-file and in-memory backends ship with the crate.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod achievements;
pub mod award;
pub mod clock;
pub mod config;
pub mod error;
pub mod leveling;
pub mod metrics;
pub mod quiz;
pub mod state;
pub mod stats;
pub mod storage;
pub mod store;
pub mod streak;
pub mod types;

pub use achievements::{Achievement, AchievementSet, AchievementStatus};
pub use award::{AwardReason, AwardResult};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ApprobConfig, ProgressionConfig};
pub use error::{ApprobError, Result};
pub use state::ProgressionState;
pub use stats::StatisticsView;
pub use storage::{KeyValueStore, MemoryStore};
pub use store::{PersistenceHealth, ProgressionStore, StepCompletion, StreakUpdate, TaskCompletion};
pub use types::*;
