//! # approb-surfaces: UI adapters for Approb
//!
//! This crate turns the read models of `approb-core` into the shapes the
//! dashboard widgets render. It never mutates progression state.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │               Host UI                     │
//! │  ┌────────────────────────────────────┐  │
//! │  │         approb-surfaces            │  │
//! │  │  ┌────────┐ ┌───────┐ ┌─────────┐ │  │
//! │  │  │ badges │ │ panel │ │ leader- │ │  │
//! │  │  │        │ │       │ │ board   │ │  │
//! │  │  └───┬────┘ └───┬───┘ └────┬────┘ │  │
//! │  │      ▼          ▼          ▼      │  │
//! │  │    ┌────────────────────────┐     │  │
//! │  │    │      approb-core       │     │  │
//! │  │    └────────────────────────┘     │  │
//! │  └────────────────────────────────────┘  │
//! └──────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `badges`: title, description, icon and tier per achievement
//! - `panel`: level progress bar and next milestone
//! - `leaderboard`: ranking of several local profiles

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod badges;
pub mod leaderboard;
pub mod panel;

pub use badges::{badge_info, badge_shelf, Badge, BadgeInfo, BadgeTier};
pub use leaderboard::{Leaderboard, LeaderboardEntry, RankedEntry};
pub use panel::ProgressPanel;
