//! Side-effect dispatch.
//!
//! The controller talks to four collaborators (notifications, audio, the
//! status badge and site blocking) through [`Effects`]. Every call is
//! fire-and-forget: an adapter failure is logged and dropped so it can never
//! disturb the timer.

mod audio;
mod badge;
mod blocking;
mod notify;
mod recording;

pub use audio::{LazyAudio, PlaybackSurface, TerminalBell};
pub use badge::{format_badge_text, format_clock, FileBadge};
pub use blocking::{BlockList, FileSiteBlocker};
pub use notify::LogNotifier;
pub use recording::{EffectCall, Recorder};

use serde::Serialize;
use std::path::Path;

use crate::error::EffectError;

pub trait Notifier: Send {
    fn notify(&mut self, title: &str, message: &str) -> Result<(), EffectError>;
}

pub trait AudioPlayer: Send {
    fn play_sound(&mut self, sound: &str, volume: f64) -> Result<(), EffectError>;

    fn play_music(&mut self, track: &str, volume: f64, is_running: bool)
        -> Result<(), EffectError>;

    fn stop_music(&mut self) -> Result<(), EffectError>;
}

pub trait Badge: Send {
    fn set_color(&mut self, color: &str) -> Result<(), EffectError>;

    fn set_text(&mut self, text: &str) -> Result<(), EffectError>;
}

/// Requests distraction blocking. Enforcement happens elsewhere.
pub trait SiteBlocker: Send {
    fn enable(&mut self, list: &BlockList) -> Result<(), EffectError>;

    fn disable(&mut self) -> Result<(), EffectError>;
}

/// The set of adapters the controller drives.
pub struct Effects {
    notifier: Box<dyn Notifier>,
    audio: Box<dyn AudioPlayer>,
    badge: Box<dyn Badge>,
    blocker: Box<dyn SiteBlocker>,
}

fn report(adapter: &'static str, result: Result<(), EffectError>) {
    if let Err(e) = result {
        tracing::warn!(adapter, error = %e, "side effect failed");
    }
}

impl Effects {
    pub fn new(
        notifier: Box<dyn Notifier>,
        audio: Box<dyn AudioPlayer>,
        badge: Box<dyn Badge>,
        blocker: Box<dyn SiteBlocker>,
    ) -> Self {
        Self {
            notifier,
            audio,
            badge,
            blocker,
        }
    }

    pub fn notify(&mut self, title: &str, message: &str) {
        report("notification", self.notifier.notify(title, message));
    }

    pub fn play_sound(&mut self, sound: &str, volume: f64) {
        report("audio", self.audio.play_sound(sound, volume));
    }

    pub fn play_music(&mut self, track: &str, volume: f64, is_running: bool) {
        report("audio", self.audio.play_music(track, volume, is_running));
    }

    pub fn stop_music(&mut self) {
        report("audio", self.audio.stop_music());
    }

    pub fn set_badge_color(&mut self, color: &str) {
        report("badge", self.badge.set_color(color));
    }

    pub fn set_badge_text(&mut self, text: &str) {
        report("badge", self.badge.set_text(text));
    }

    pub fn enable_blocking(&mut self, list: &BlockList) {
        report("site-blocking", self.blocker.enable(list));
    }

    pub fn disable_blocking(&mut self) {
        report("site-blocking", self.blocker.disable());
    }
}

/// Write `value` as pretty JSON, replacing the file atomically.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), EffectError> {
    let content = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
