//! Settings loaded from `$HOME/.devpulse/settings.json`.
//!
//! Environment variables take precedence over the `env` map in the file.

use std::collections::{HashMap, HashSet};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analytics::velocity::MAX_TREND_WEEKS;
use crate::error::ConfigError;

/// Environment variable naming the store file.
pub const STORE_ENV_VAR: &str = "DEVPULSE_STORE";

/// Largest accepted `reviews.staleAfterDays`.
pub const MAX_STALE_AFTER_DAYS: i64 = 3650;

/// Top-level settings file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    /// Environment variable fallbacks.
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Velocity trend settings.
    #[serde(default)]
    pub velocity: VelocitySettings,

    /// Review metric settings.
    #[serde(default)]
    pub reviews: ReviewSettings,

    /// Contributor profiles backing identity resolution.
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

/// Velocity trend settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VelocitySettings {
    /// Percent change beyond which a week trends up or down.
    #[serde(default = "default_trend_threshold")]
    pub trend_threshold_pct: f64,

    /// Weeks in a trend when none is requested.
    #[serde(default = "default_weeks")]
    pub default_weeks: usize,
}

impl Default for VelocitySettings {
    fn default() -> Self {
        Self {
            trend_threshold_pct: default_trend_threshold(),
            default_weeks: default_weeks(),
        }
    }
}

fn default_trend_threshold() -> f64 {
    5.0
}

fn default_weeks() -> usize {
    8
}

/// Review metric settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSettings {
    /// Age in days after which an unreviewed open PR is stale.
    #[serde(default = "default_stale_days")]
    pub stale_after_days: i64,

    /// Reviewers listed in per-reviewer stats.
    #[serde(default = "default_top_reviewers")]
    pub top_reviewers: usize,

    /// Reviewers listed as pending.
    #[serde(default = "default_top_pending")]
    pub top_pending: usize,
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            stale_after_days: default_stale_days(),
            top_reviewers: default_top_reviewers(),
            top_pending: default_top_pending(),
        }
    }
}

fn default_stale_days() -> i64 {
    3
}

fn default_top_reviewers() -> usize {
    10
}

fn default_top_pending() -> usize {
    5
}

/// A contributor identity spanning one or more author emails.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Stable profile identifier.
    pub id: String,
    /// Name shown in reports.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Author emails that belong to this person.
    #[serde(default)]
    pub emails: Vec<String>,
    /// Code-host login.
    #[serde(default)]
    pub login: Option<String>,
    /// Avatar URL.
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl Settings {
    /// Loads settings from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let settings_path = Self::get_settings_path()?;
        Self::load_from_path(&settings_path)
    }

    /// Loads settings from a specific path, returning defaults if it does not exist.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let settings: Settings =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Returns the default settings path.
    pub fn get_settings_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::data_dir()?.join("settings.json"))
    }

    /// Returns `$HOME/.devpulse`.
    pub fn data_dir() -> Result<PathBuf, ConfigError> {
        let home_dir = dirs::home_dir().ok_or(ConfigError::HomeDirNotFound)?;
        Ok(home_dir.join(".devpulse"))
    }

    /// Returns an environment variable with fallback to the `env` map.
    pub fn get_env_var(&self, key: &str) -> Option<String> {
        match env::var(key) {
            Ok(value) => Some(value),
            Err(_) => self.env.get(key).cloned(),
        }
    }

    /// Resolves the store path: explicit, then `DEVPULSE_STORE`, then the data dir.
    pub fn store_path(&self, explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }
        if let Some(path) = self.get_env_var(STORE_ENV_VAR) {
            return Ok(PathBuf::from(path));
        }
        Ok(Self::data_dir()?.join("store.json"))
    }

    /// Checks numeric ranges and that profile ids are unique and non-empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0..=MAX_STALE_AFTER_DAYS).contains(&self.reviews.stale_after_days) {
            return Err(ConfigError::InvalidSetting {
                key: "reviews.staleAfterDays",
                reason: format!(
                    "{} is outside 0..={MAX_STALE_AFTER_DAYS}",
                    self.reviews.stale_after_days
                ),
            });
        }
        if self.velocity.default_weeks > MAX_TREND_WEEKS {
            return Err(ConfigError::InvalidSetting {
                key: "velocity.defaultWeeks",
                reason: format!(
                    "{} exceeds {MAX_TREND_WEEKS}",
                    self.velocity.default_weeks
                ),
            });
        }

        let mut seen = HashSet::new();
        for profile in &self.profiles {
            if profile.id.trim().is_empty() {
                return Err(ConfigError::InvalidProfile {
                    id: profile.id.clone(),
                    reason: "id must not be empty".to_string(),
                });
            }
            if !seen.insert(profile.id.as_str()) {
                return Err(ConfigError::InvalidProfile {
                    id: profile.id.clone(),
                    reason: "duplicate id".to_string(),
                });
            }
        }
        Ok(())
    }
}
