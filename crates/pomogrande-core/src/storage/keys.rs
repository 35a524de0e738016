//! Persisted field names.
//!
//! Every field the controller reads or writes lives under one of these keys.
//! The wire names are camelCase so that other surfaces sharing the store see
//! the same vocabulary.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorageKey {
    Time,
    WorkTime,
    BreakTime,
    LongBreak,
    IsRunning,
    IsPaused,
    IsBreak,
    IsLongBreak,
    UltraFocusMode,
    IsAutoStartEnabled,
    SelectedSound,
    IsSoundEnabled,
    SoundVolume,
    SelectedMusic,
    IsMusicEnabled,
    MusicVolume,
    IsNotificationEnabled,
    BlockedSites,
    AllowedUrls,
    Todos,
    PomodoroHistory,
    PomodoroCount,
}

/// Shape of the JSON value stored under a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Bool,
    Volume,
    Text,
    TextList,
    Json,
}

impl StorageKey {
    pub const ALL: [StorageKey; 22] = [
        StorageKey::Time,
        StorageKey::WorkTime,
        StorageKey::BreakTime,
        StorageKey::LongBreak,
        StorageKey::IsRunning,
        StorageKey::IsPaused,
        StorageKey::IsBreak,
        StorageKey::IsLongBreak,
        StorageKey::UltraFocusMode,
        StorageKey::IsAutoStartEnabled,
        StorageKey::SelectedSound,
        StorageKey::IsSoundEnabled,
        StorageKey::SoundVolume,
        StorageKey::SelectedMusic,
        StorageKey::IsMusicEnabled,
        StorageKey::MusicVolume,
        StorageKey::IsNotificationEnabled,
        StorageKey::BlockedSites,
        StorageKey::AllowedUrls,
        StorageKey::Todos,
        StorageKey::PomodoroHistory,
        StorageKey::PomodoroCount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::Time => "time",
            StorageKey::WorkTime => "workTime",
            StorageKey::BreakTime => "breakTime",
            StorageKey::LongBreak => "longBreak",
            StorageKey::IsRunning => "isRunning",
            StorageKey::IsPaused => "isPaused",
            StorageKey::IsBreak => "isBreak",
            StorageKey::IsLongBreak => "isLongBreak",
            StorageKey::UltraFocusMode => "ultraFocusMode",
            StorageKey::IsAutoStartEnabled => "isAutoStartEnabled",
            StorageKey::SelectedSound => "selectedSound",
            StorageKey::IsSoundEnabled => "isSoundEnabled",
            StorageKey::SoundVolume => "soundVolume",
            StorageKey::SelectedMusic => "selectedMusic",
            StorageKey::IsMusicEnabled => "isMusicEnabled",
            StorageKey::MusicVolume => "musicVolume",
            StorageKey::IsNotificationEnabled => "isNotificationEnabled",
            StorageKey::BlockedSites => "blockedSites",
            StorageKey::AllowedUrls => "allowedUrls",
            StorageKey::Todos => "todos",
            StorageKey::PomodoroHistory => "pomodoroHistory",
            StorageKey::PomodoroCount => "pomodoroCount",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            StorageKey::Time
            | StorageKey::WorkTime
            | StorageKey::BreakTime
            | StorageKey::LongBreak
            | StorageKey::PomodoroCount => FieldKind::Integer,
            StorageKey::IsRunning
            | StorageKey::IsPaused
            | StorageKey::IsBreak
            | StorageKey::IsLongBreak
            | StorageKey::UltraFocusMode
            | StorageKey::IsAutoStartEnabled
            | StorageKey::IsSoundEnabled
            | StorageKey::IsMusicEnabled
            | StorageKey::IsNotificationEnabled => FieldKind::Bool,
            StorageKey::SoundVolume | StorageKey::MusicVolume => FieldKind::Volume,
            StorageKey::SelectedSound | StorageKey::SelectedMusic => FieldKind::Text,
            StorageKey::BlockedSites | StorageKey::AllowedUrls => FieldKind::TextList,
            StorageKey::Todos | StorageKey::PomodoroHistory => FieldKind::Json,
        }
    }

    /// Fields only the controller may write.
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            StorageKey::Time
                | StorageKey::IsRunning
                | StorageKey::IsPaused
                | StorageKey::IsBreak
                | StorageKey::IsLongBreak
                | StorageKey::PomodoroCount
        )
    }

    /// Period lengths in milliseconds. Never zero.
    pub fn is_duration(&self) -> bool {
        matches!(
            self,
            StorageKey::WorkTime | StorageKey::BreakTime | StorageKey::LongBreak
        )
    }

    /// Fields a settings surface may edit.
    pub fn is_setting(&self) -> bool {
        !self.is_lifecycle()
            && !matches!(
                self,
                StorageKey::Todos
                    | StorageKey::PomodoroHistory
                    | StorageKey::BlockedSites
                    | StorageKey::AllowedUrls
            )
    }

    /// Parse a raw command-line string into the JSON value this field stores.
    pub fn parse_value(&self, raw: &str) -> Result<Value, ValidationError> {
        let invalid = |message: String| ValidationError::InvalidValue {
            field: self.as_str().to_string(),
            message,
        };
        match self.kind() {
            FieldKind::Integer => {
                let n = raw
                    .parse::<u64>()
                    .map_err(|_| invalid(format!("'{raw}' is not a non-negative integer")))?;
                if n == 0 && self.is_duration() {
                    return Err(invalid("duration must be greater than zero".to_string()));
                }
                Ok(Value::from(n))
            }
            FieldKind::Bool => raw
                .parse::<bool>()
                .map(Value::Bool)
                .map_err(|_| invalid(format!("'{raw}' is not true or false"))),
            FieldKind::Volume => {
                let volume = raw
                    .parse::<f64>()
                    .map_err(|_| invalid(format!("'{raw}' is not a number")))?;
                if !(0.0..=1.0).contains(&volume) {
                    return Err(invalid(format!("{volume} is outside [0, 1]")));
                }
                Ok(Value::from(volume))
            }
            FieldKind::Text => Ok(Value::String(raw.to_string())),
            FieldKind::TextList | FieldKind::Json => {
                serde_json::from_str(raw).map_err(|e| invalid(e.to_string()))
            }
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StorageKey::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownField(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for key in StorageKey::ALL {
            assert_eq!(key.as_str().parse::<StorageKey>().unwrap(), key);
        }
    }

    #[test]
    fn unknown_field_is_rejected() {
        assert!("timeLeft".parse::<StorageKey>().is_err());
    }

    #[test]
    fn lifecycle_fields_are_not_settings() {
        assert!(StorageKey::Time.is_lifecycle());
        assert!(!StorageKey::Time.is_setting());
        assert!(StorageKey::WorkTime.is_setting());
        assert!(!StorageKey::Todos.is_setting());
    }

    #[test]
    fn parse_value_checks_field_type() {
        assert_eq!(
            StorageKey::WorkTime.parse_value("1500000").unwrap(),
            Value::from(1_500_000u64)
        );
        assert!(StorageKey::WorkTime.parse_value("-1").is_err());
        assert!(StorageKey::WorkTime.parse_value("0").is_err());
        assert!(StorageKey::LongBreak.parse_value("0").is_err());
        assert!(StorageKey::IsSoundEnabled.parse_value("yes").is_err());
        assert!(StorageKey::SoundVolume.parse_value("1.5").is_err());
        assert_eq!(
            StorageKey::SelectedSound.parse_value("bell").unwrap(),
            Value::String("bell".into())
        );
    }
}
