//! Configuration for the progression engine.
//!
//! Maps directly to `approb.toml`. Every field has a default, so an empty
//! file (or no file at all) yields the stock tuning.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ApprobError, Result};

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApprobConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Points, levelling and bonus tuning.
    #[serde(default)]
    pub progression: ProgressionConfig,
    /// Persistence / save settings.
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl ApprobConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `ApprobError::Config` if the TOML is invalid or the
    /// progression tuning is out of range.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ApprobError::Config(e.to_string()))?;
        config.progression.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Filter directive for the host's tracing subscriber, e.g. `"info"` or
    /// `"approb_core=debug"`. The libraries only emit events; installing a
    /// subscriber with this filter is up to the application.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Levelling curve and flat bonuses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionConfig {
    /// Experience needed to leave level 1.
    #[serde(default = "default_base_threshold")]
    pub base_threshold: u64,
    /// Multiplier applied to the threshold for every level gained; above 1.0
    /// so that one award can only cross a bounded number of levels.
    #[serde(default = "default_growth_factor")]
    pub growth_factor: f64,
    /// Points (not experience) granted for each level entered.
    #[serde(default = "default_level_up_bonus")]
    pub level_up_bonus: u64,
    /// Points (not experience) granted for each achievement unlocked.
    #[serde(default = "default_achievement_bonus")]
    pub achievement_bonus: u64,
    /// A streak bonus is awarded whenever the streak is a multiple of this.
    #[serde(default = "default_streak_interval")]
    pub streak_bonus_interval_days: u32,
    /// Levels whose crossing triggers an extra achievement check inside the
    /// level-up loop. This only decides when the check runs: the level
    /// achievements themselves stay at levels 5, 10, 15 and 20, and any level
    /// is still caught by the full check that ends every award.
    #[serde(default = "default_milestone_levels")]
    pub milestone_levels: Vec<u32>,
}

impl ProgressionConfig {
    /// Reject tuning that would break the levelling invariants.
    ///
    /// # Errors
    /// Returns `ApprobError::Config` when the threshold could be zero or
    /// shrink between levels.
    pub fn validate(&self) -> Result<()> {
        if self.base_threshold == 0 {
            return Err(ApprobError::Config("base_threshold must be positive".to_string()));
        }
        if !(self.growth_factor > 1.0 && self.growth_factor.is_finite()) {
            return Err(ApprobError::Config(format!(
                "growth_factor must be a finite value above 1.0 (got {})",
                self.growth_factor
            )));
        }
        if self.streak_bonus_interval_days == 0 {
            return Err(ApprobError::Config(
                "streak_bonus_interval_days must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether entering `level` should trigger the milestone check.
    #[must_use]
    pub fn is_milestone(&self, level: u32) -> bool {
        self.milestone_levels.contains(&level)
    }
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            base_threshold: default_base_threshold(),
            growth_factor: default_growth_factor(),
            level_up_bonus: default_level_up_bonus(),
            achievement_bonus: default_achievement_bonus(),
            streak_bonus_interval_days: default_streak_interval(),
            milestone_levels: default_milestone_levels(),
        }
    }
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Single SQLite database.
    #[default]
    Sqlite,
    /// One JSON file per key in a directory (debugging).
    Json,
    /// Process memory only; nothing survives a restart.
    Memory,
}

/// Persistence / save configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Which backend to open.
    #[serde(default)]
    pub backend: StorageBackend,
    /// Database file (sqlite) or directory (json).
    #[serde(default = "default_path")]
    pub path: PathBuf,
    /// Key the progression record is stored under.
    #[serde(default = "default_state_key")]
    pub state_key: String,
    /// Use WAL mode for the SQLite backend.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
    /// Detect save corruption via checksums.
    #[serde(default = "default_true")]
    pub checksum_enabled: bool,
    /// Number of rotating backups to keep.
    #[serde(default = "default_backup_count")]
    pub backup_count: u32,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_path(),
            state_key: default_state_key(),
            wal_mode: true,
            checksum_enabled: true,
            backup_count: default_backup_count(),
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_base_threshold() -> u64 { 100 }
fn default_growth_factor() -> f64 { 1.2 }
fn default_level_up_bonus() -> u64 { 50 }
fn default_achievement_bonus() -> u64 { 25 }
fn default_streak_interval() -> u32 { 7 }
fn default_milestone_levels() -> Vec<u32> { vec![5, 10, 15, 20] }
fn default_path() -> PathBuf { PathBuf::from("approb_progress.db") }
fn default_state_key() -> String { "progression_state".to_string() }
fn default_backup_count() -> u32 { 3 }
