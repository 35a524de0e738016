use serde::{Deserialize, Serialize};

use crate::storage::DefaultsConfig;

/// Completed Work periods between long breaks.
pub const POMODOROS_PER_LONG_BREAK: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Work,
    Break,
    LongBreak,
}

impl Mode {
    pub fn is_break(&self) -> bool {
        matches!(self, Mode::Break | Mode::LongBreak)
    }

    /// The period that follows this one when it ends naturally.
    ///
    /// `pomodoro_count` is the count after the ending period was tallied.
    pub fn next(&self, pomodoro_count: u32) -> Mode {
        match self {
            Mode::Break | Mode::LongBreak => Mode::Work,
            Mode::Work if pomodoro_count % POMODOROS_PER_LONG_BREAK == 0 => Mode::LongBreak,
            Mode::Work => Mode::Break,
        }
    }
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "mode", rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Running(Mode),
    Paused(Mode),
}

/// User-facing session settings, mirrored from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub work_ms: u64,
    pub break_ms: u64,
    pub long_break_ms: u64,
    pub ultra_focus_mode: bool,
    pub auto_start: bool,
    pub selected_sound: String,
    pub sound_enabled: bool,
    pub sound_volume: f64,
    pub selected_music: String,
    pub music_enabled: bool,
    pub music_volume: f64,
    pub notifications_enabled: bool,
}

impl SessionConfig {
    pub fn from_defaults(defaults: &DefaultsConfig) -> Self {
        Self {
            work_ms: defaults.work_ms(),
            break_ms: defaults.break_ms(),
            long_break_ms: defaults.long_break_ms(),
            ultra_focus_mode: false,
            auto_start: false,
            selected_sound: defaults.sound.clone(),
            sound_enabled: true,
            sound_volume: 0.5,
            selected_music: defaults.music.clone(),
            music_enabled: true,
            music_volume: 0.5,
            notifications_enabled: true,
        }
    }

    pub fn duration_ms(&self, mode: Mode) -> u64 {
        match mode {
            Mode::Work => self.work_ms,
            Mode::Break => self.break_ms,
            Mode::LongBreak => self.long_break_ms,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_defaults(&DefaultsConfig::default())
    }
}

/// Lifecycle fields owned by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub remaining_ms: u64,
    pub mode: Mode,
    pub is_running: bool,
    pub is_paused: bool,
    /// Work periods completed since the last stop.
    pub pomodoro_count: u32,
}

impl SessionState {
    pub fn idle(work_ms: u64) -> Self {
        Self {
            remaining_ms: work_ms,
            mode: Mode::Work,
            is_running: false,
            is_paused: false,
            pomodoro_count: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        match (self.is_running, self.is_paused) {
            (false, _) => Phase::Idle,
            (true, true) => Phase::Paused(self.mode),
            (true, false) => Phase::Running(self.mode),
        }
    }
}
