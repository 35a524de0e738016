//! TOML-based application configuration.
//!
//! Stores process-level preferences:
//! - Tick and polling intervals for the runtime loop
//! - Defaults seeded into the store on first run
//! - Badge colors
//! - Log level
//!
//! Configuration is stored at `~/.config/pomogrande/config.toml`. Session
//! settings that other surfaces edit (durations, toggles, volumes) live in the
//! store instead, see [`StorageKey`](super::StorageKey).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;

const ONE_MINUTE_MS: u64 = 60 * 1000;

/// Runtime loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// How often the runtime checks the store and command queue.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Values written to the store the first time the controller runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_work_min")]
    pub work_min: u64,
    #[serde(default = "default_break_min")]
    pub break_min: u64,
    #[serde(default = "default_long_break_min")]
    pub long_break_min: u64,
    #[serde(default = "default_sound")]
    pub sound: String,
    #[serde(default = "default_music")]
    pub music: String,
    #[serde(default = "default_blocked_sites")]
    pub blocked_sites: Vec<String>,
}

/// Badge appearance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgeConfig {
    #[serde(default = "default_work_color")]
    pub work_color: String,
    #[serde(default = "default_break_color")]
    pub break_color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing` filter directive used when `POMOGRANDE_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/pomogrande/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub badge: BadgeConfig,
    #[serde(default)]
    pub log: LogConfig,
}

// Default functions
fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_poll_interval_ms() -> u64 {
    250
}
fn default_work_min() -> u64 {
    25
}
fn default_break_min() -> u64 {
    5
}
fn default_long_break_min() -> u64 {
    15
}
fn default_sound() -> String {
    "bell".into()
}
fn default_music() -> String {
    "rain".into()
}
fn default_blocked_sites() -> Vec<String> {
    [
        "facebook.com",
        "twitter.com",
        "instagram.com",
        "x.com",
        "youtube.com",
        "reddit.com",
        "netflix.com",
        "tiktok.com",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
fn default_work_color() -> String {
    "#40A662".into()
}
fn default_break_color() -> String {
    "#ffccd5".into()
}
fn default_log_level() -> String {
    "info".into()
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            work_min: default_work_min(),
            break_min: default_break_min(),
            long_break_min: default_long_break_min(),
            sound: default_sound(),
            music: default_music(),
            blocked_sites: default_blocked_sites(),
        }
    }
}

impl DefaultsConfig {
    pub fn work_ms(&self) -> u64 {
        self.work_min.saturating_mul(ONE_MINUTE_MS)
    }

    pub fn break_ms(&self) -> u64 {
        self.break_min.saturating_mul(ONE_MINUTE_MS)
    }

    pub fn long_break_ms(&self) -> u64 {
        self.long_break_min.saturating_mul(ONE_MINUTE_MS)
    }
}

impl Default for BadgeConfig {
    fn default() -> Self {
        Self {
            work_color: default_work_color(),
            break_color: default_break_color(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
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
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => {
                    let n = value
                        .parse::<u64>()
                        .map_err(|_| invalid(format!("cannot parse '{value}' as integer")))?;
                    serde_json::Value::Number(n.into())
                }
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk, writing the defaults when no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
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

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Reject values the controller cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("timer.tick_interval_ms", self.timer.tick_interval_ms),
            ("timer.poll_interval_ms", self.timer.poll_interval_ms),
            ("defaults.work_min", self.defaults.work_min),
            ("defaults.break_min", self.defaults.break_min),
            ("defaults.long_break_min", self.defaults.long_break_min),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "must be greater than zero".into(),
                });
            }
        }
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.timer.tick_interval_ms, 1000);
        assert_eq!(parsed.defaults.blocked_sites.len(), 8);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let parsed: Config = toml::from_str("[badge]\nwork_color = \"#000000\"\n").unwrap();
        assert_eq!(parsed.badge.work_color, "#000000");
        assert_eq!(parsed.badge.break_color, "#ffccd5");
        assert_eq!(parsed.defaults.work_min, 25);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("timer.tick_interval_ms").as_deref(), Some("1000"));
        assert_eq!(cfg.get("badge.work_color").as_deref(), Some("#40A662"));
        assert!(cfg.get("timer.missing_key").is_none());
    }

    #[test]
    fn apply_updates_nested_number() {
        let mut cfg = Config::default();
        cfg.apply("defaults.work_min", "50").unwrap();
        assert_eq!(cfg.defaults.work_min, 50);
        assert_eq!(cfg.defaults.work_ms(), 50 * 60 * 1000);
    }

    #[test]
    fn apply_updates_nested_string() {
        let mut cfg = Config::default();
        cfg.apply("log.level", "debug").unwrap();
        assert_eq!(cfg.log.level, "debug");
    }

    #[test]
    fn apply_updates_list_from_json() {
        let mut cfg = Config::default();
        cfg.apply("defaults.blocked_sites", r#"["news.ycombinator.com"]"#)
            .unwrap();
        assert_eq!(cfg.defaults.blocked_sites, vec!["news.ycombinator.com"]);
    }

    #[test]
    fn apply_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.apply("timer.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn apply_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.apply("timer.tick_interval_ms", "fast").is_err());
    }

    #[test]
    fn apply_rejects_zero_durations() {
        let mut cfg = Config::default();
        assert!(cfg.apply("defaults.work_min", "0").is_err());
        assert_eq!(cfg.defaults.work_min, 25);
    }
}
