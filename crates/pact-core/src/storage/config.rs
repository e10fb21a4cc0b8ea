//! TOML-based engine configuration.
//!
//! Stores the tunable policy of the progression engine:
//! - Default user for the CLI session
//! - XP damping for in-progress goals
//! - Insight thresholds and the output cap
//! - Streak milestones
//! - Login tracking windows
//!
//! Configuration is stored at `~/.config/pact/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::{ConfigError, Result};

/// XP calculation policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionConfig {
    /// Multiplier on step-ratio partial credit for in-progress goals.
    #[serde(default = "default_damping")]
    pub in_progress_damping: f64,
}

/// Insight heuristic thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsConfig {
    #[serde(default = "default_max_insights")]
    pub max_insights: usize,
    #[serde(default = "default_deadline_critical_pct")]
    pub deadline_critical_pct: f64,
    #[serde(default = "default_deadline_warning_pct")]
    pub deadline_warning_pct: f64,
    #[serde(default = "default_stagnation_days")]
    pub stagnation_days: i64,
    /// Fraction of total steps below which an in-progress goal is stagnant.
    #[serde(default = "default_stagnation_step_ratio")]
    pub stagnation_step_ratio: f64,
    #[serde(default = "default_habit_min_checks")]
    pub habit_min_checks: usize,
    #[serde(default = "default_habit_danger_ratio")]
    pub habit_danger_ratio: f64,
    #[serde(default = "default_momentum_completed")]
    pub momentum_completed: usize,
    #[serde(default = "default_focus_success_pct")]
    pub focus_success_pct: u32,
}

/// Check-in streak policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreakConfig {
    #[serde(default = "default_milestones")]
    pub milestones: Vec<u32>,
}

/// Login tracking policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Logins with local hour below this count as midnight logins.
    #[serde(default = "default_midnight_window_end_hour")]
    pub midnight_window_end_hour: u32,
}

/// Engine configuration.
///
/// Serialized to/from TOML at `~/.config/pact/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// User the CLI acts as when `--user` is not given.
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub progression: ProgressionConfig,
    #[serde(default)]
    pub insights: InsightsConfig,
    #[serde(default)]
    pub streak: StreakConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
}

fn default_damping() -> f64 {
    0.5
}
fn default_max_insights() -> usize {
    3
}
fn default_deadline_critical_pct() -> f64 {
    85.0
}
fn default_deadline_warning_pct() -> f64 {
    50.0
}
fn default_stagnation_days() -> i64 {
    10
}
fn default_stagnation_step_ratio() -> f64 {
    0.1
}
fn default_habit_min_checks() -> usize {
    3
}
fn default_habit_danger_ratio() -> f64 {
    0.4
}
fn default_momentum_completed() -> usize {
    3
}
fn default_focus_success_pct() -> u32 {
    70
}
fn default_milestones() -> Vec<u32> {
    vec![7, 30, 100]
}
fn default_midnight_window_end_hour() -> u32 {
    4
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            in_progress_damping: default_damping(),
        }
    }
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            max_insights: default_max_insights(),
            deadline_critical_pct: default_deadline_critical_pct(),
            deadline_warning_pct: default_deadline_warning_pct(),
            stagnation_days: default_stagnation_days(),
            stagnation_step_ratio: default_stagnation_step_ratio(),
            habit_min_checks: default_habit_min_checks(),
            habit_danger_ratio: default_habit_danger_ratio(),
            momentum_completed: default_momentum_completed(),
            focus_success_pct: default_focus_success_pct(),
        }
    }
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            milestones: default_milestones(),
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            midnight_window_end_hour: default_midnight_window_end_hour(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    // `user_id` is the only optional leaf; empty clears it.
                    serde_json::Value::Null if value.is_empty() => serde_json::Value::Null,
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Self::from_toml_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Parse a TOML document; missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.clone(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without persisting.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Set a config value by key and save. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.set_value(key, value)?;
        self.save()
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default config");
            Self::default()
        })
    }
}
