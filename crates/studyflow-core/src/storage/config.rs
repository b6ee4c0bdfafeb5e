//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Phase durations, long-break interval and daily goal
//! - Notification preferences
//!
//! Configuration is stored at `~/.config/studyflow/config.toml`.
//! Raw values are only trusted after [`TimerSettings::try_from`] has
//! validated them; the engine never sees a zero duration.

use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, CoreError, Result};
use crate::timer::{PhaseDurations, TimerPhase, TimerSettings};

/// Timer-specific configuration, in minutes and counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_focus_minutes")]
    pub focus_minutes: u32,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
    #[serde(default = "default_long_break_interval")]
    pub long_break_interval: u32,
    #[serde(default = "default_daily_goal")]
    pub daily_goal: u32,
}

/// Notification configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Ring the terminal bell alongside the message.
    #[serde(default = "default_true")]
    pub bell: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/studyflow/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

fn default_focus_minutes() -> u32 {
    TimerPhase::Focus.default_minutes()
}
fn default_short_break_minutes() -> u32 {
    TimerPhase::ShortBreak.default_minutes()
}
fn default_long_break_minutes() -> u32 {
    TimerPhase::LongBreak.default_minutes()
}
fn default_long_break_interval() -> u32 {
    crate::timer::DEFAULT_LONG_BREAK_INTERVAL
}
fn default_daily_goal() -> u32 {
    crate::timer::DEFAULT_DAILY_GOAL
}
fn default_true() -> bool {
    true
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            focus_minutes: default_focus_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            long_break_interval: default_long_break_interval(),
            daily_goal: default_daily_goal(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bell: true,
        }
    }
}

fn positive(key: &str, value: u32) -> std::result::Result<NonZeroU32, ConfigError> {
    NonZeroU32::new(value).ok_or_else(|| ConfigError::invalid(key, "must be a positive integer"))
}

impl TryFrom<&TimerConfig> for TimerSettings {
    type Error = ConfigError;

    fn try_from(cfg: &TimerConfig) -> std::result::Result<Self, Self::Error> {
        Ok(TimerSettings {
            durations: PhaseDurations {
                focus: positive("timer.focus_minutes", cfg.focus_minutes)?,
                short_break: positive("timer.short_break_minutes", cfg.short_break_minutes)?,
                long_break: positive("timer.long_break_minutes", cfg.long_break_minutes)?,
            },
            daily_goal: positive("timer.daily_goal", cfg.daily_goal)?,
            long_break_interval: positive("timer.long_break_interval", cfg.long_break_interval)?,
        })
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
        key.split('.').try_fold(root, |current, part| current.get(part))
    }

    /// Overwrite the leaf at `key`, parsing `value` as the type already
    /// stored there.
    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> std::result::Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let (parent_path, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(unknown());
        }

        let parent = match parent_path {
            Some(path) => path
                .split('.')
                .try_fold(root, |current, part| current.get_mut(part))
                .ok_or_else(unknown)?,
            None => root,
        };
        let obj = parent.as_object_mut().ok_or_else(unknown)?;
        let existing = obj.get(leaf).ok_or_else(unknown)?;

        let parse_err = |kind: &str| {
            ConfigError::ParseFailed(format!("cannot parse '{value}' as {kind} for '{key}'"))
        };
        let new_value = match existing {
            serde_json::Value::Bool(_) => {
                serde_json::Value::Bool(value.parse::<bool>().map_err(|_| parse_err("bool"))?)
            }
            serde_json::Value::Number(_) => {
                let n = value.parse::<u32>().map_err(|_| parse_err("non-negative integer"))?;
                serde_json::Value::Number(n.into())
            }
            serde_json::Value::String(_) => serde_json::Value::String(value.into()),
            _ => return Err(unknown()),
        };
        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    /// Default config file location.
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults there on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or
    /// parsed, or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                CoreError::Config(ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(CoreError::Config(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| {
            CoreError::Config(ConfigError::SaveFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match Self::get_json_value_by_path(&json, key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key. The change only sticks if the
    /// resulting config still validates; nothing is written to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the new value is out of range.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json)?;
        updated.timer_settings()?;
        *self = updated;
        Ok(())
    }

    /// Validated settings for the engine.
    pub fn timer_settings(&self) -> std::result::Result<TimerSettings, ConfigError> {
        TimerSettings::try_from(&self.timer)
    }
}
