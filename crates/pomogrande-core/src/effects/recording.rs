//! Adapters that remember every call, for tests and dry runs.

use std::sync::{Arc, Mutex, MutexGuard};

use super::{AudioPlayer, Badge, BlockList, Effects, Notifier, SiteBlocker};
use crate::error::EffectError;

#[derive(Debug, Clone, PartialEq)]
pub enum EffectCall {
    Notify { title: String, message: String },
    PlaySound { sound: String, volume: f64 },
    PlayMusic { track: String, volume: f64, is_running: bool },
    StopMusic,
    BadgeColor(String),
    BadgeText(String),
    EnableBlocking(BlockList),
    DisableBlocking,
}

/// Shared call log. Clones append to the same log.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<EffectCall>>>,
    fail: bool,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A recorder whose adapters log the call and then report failure.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<EffectCall>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push(&self, call: EffectCall) -> Result<(), EffectError> {
        self.lock().push(call);
        if self.fail {
            Err(EffectError::Failed("recorder set to fail".into()))
        } else {
            Ok(())
        }
    }

    /// An [`Effects`] whose four adapters all write to this recorder.
    pub fn effects(&self) -> Effects {
        Effects::new(
            Box::new(self.clone()),
            Box::new(self.clone()),
            Box::new(self.clone()),
            Box::new(self.clone()),
        )
    }

    pub fn calls(&self) -> Vec<EffectCall> {
        self.lock().clone()
    }

    /// Return the calls recorded so far and clear the log.
    pub fn take(&self) -> Vec<EffectCall> {
        std::mem::take(&mut *self.lock())
    }

    pub fn notifications(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                EffectCall::Notify { title, .. } => Some(title.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_badge_color(&self) -> Option<String> {
        self.lock().iter().rev().find_map(|call| match call {
            EffectCall::BadgeColor(color) => Some(color.clone()),
            _ => None,
        })
    }

    pub fn last_badge_text(&self) -> Option<String> {
        self.lock().iter().rev().find_map(|call| match call {
            EffectCall::BadgeText(text) => Some(text.clone()),
            _ => None,
        })
    }

    /// Whether the most recent blocking request was `enable`.
    pub fn blocking_enabled(&self) -> bool {
        self.lock()
            .iter()
            .rev()
            .find_map(|call| match call {
                EffectCall::EnableBlocking(_) => Some(true),
                EffectCall::DisableBlocking => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }
}

impl Notifier for Recorder {
    fn notify(&mut self, title: &str, message: &str) -> Result<(), EffectError> {
        self.push(EffectCall::Notify {
            title: title.to_string(),
            message: message.to_string(),
        })
    }
}

impl AudioPlayer for Recorder {
    fn play_sound(&mut self, sound: &str, volume: f64) -> Result<(), EffectError> {
        self.push(EffectCall::PlaySound {
            sound: sound.to_string(),
            volume,
        })
    }

    fn play_music(
        &mut self,
        track: &str,
        volume: f64,
        is_running: bool,
    ) -> Result<(), EffectError> {
        self.push(EffectCall::PlayMusic {
            track: track.to_string(),
            volume,
            is_running,
        })
    }

    fn stop_music(&mut self) -> Result<(), EffectError> {
        self.push(EffectCall::StopMusic)
    }
}

impl Badge for Recorder {
    fn set_color(&mut self, color: &str) -> Result<(), EffectError> {
        self.push(EffectCall::BadgeColor(color.to_string()))
    }

    fn set_text(&mut self, text: &str) -> Result<(), EffectError> {
        self.push(EffectCall::BadgeText(text.to_string()))
    }
}

impl SiteBlocker for Recorder {
    fn enable(&mut self, list: &BlockList) -> Result<(), EffectError> {
        self.push(EffectCall::EnableBlocking(list.clone()))
    }

    fn disable(&mut self) -> Result<(), EffectError> {
        self.push(EffectCall::DisableBlocking)
    }
}
