//! Experience thresholds and the level-up state machine.
//!
//! The threshold to leave level `L` is `floor(base * growth^(L - 1))`, so
//! with the stock curve level 1 needs 100 XP, level 2 needs 120 and level 3
//! needs 144. A level-up consumes the threshold from `experience`, enters
//! the next level and credits a flat bonus to `points` only.

use tracing::debug;

use crate::config::ProgressionConfig;
use crate::state::ProgressionState;

/// Relative tolerance used to snap float products onto the integer they
/// represent before flooring (100 * 1.2^2 evaluates to 143.999...).
const SNAP_TOLERANCE: f64 = 1e-9;

/// Experience required to leave `level`.
///
/// Always at least 1 and saturates at `u64::MAX` for absurd levels.
#[must_use]
pub fn threshold_for_level(level: u32, config: &ProgressionConfig) -> u64 {
    let exponent = i32::try_from(level.saturating_sub(1)).unwrap_or(i32::MAX);
    let raw = config.base_threshold as f64 * config.growth_factor.powi(exponent);
    if !raw.is_finite() || raw >= u64::MAX as f64 {
        return u64::MAX;
    }

    let nearest = raw.round();
    let value = if (raw - nearest).abs() <= SNAP_TOLERANCE * nearest.max(1.0) {
        nearest
    } else {
        raw.floor()
    };
    (value as u64).max(1)
}

/// Fire a single level-up if `experience` has reached the threshold.
///
/// Returns the level just entered, or `None` when no transition applies
/// (including at the level cap, where excess experience is clamped).
pub fn level_up_once(state: &mut ProgressionState, config: &ProgressionConfig) -> Option<u32> {
    if state.experience < state.experience_to_next {
        return None;
    }
    if state.level == u32::MAX {
        state.experience = state.experience_to_next.saturating_sub(1);
        return None;
    }

    state.experience -= state.experience_to_next;
    state.level += 1;
    state.experience_to_next = threshold_for_level(state.level, config);
    state.points = state.points.saturating_add(config.level_up_bonus);

    debug!(
        level = state.level,
        experience = state.experience,
        experience_to_next = state.experience_to_next,
        "Level up"
    );
    Some(state.level)
}

/// Run the level-up loop to completion and return every level entered.
pub fn apply_level_ups(state: &mut ProgressionState, config: &ProgressionConfig) -> Vec<u32> {
    let mut entered = Vec::new();
    while let Some(level) = level_up_once(state, config) {
        entered.push(level);
    }
    entered
}
