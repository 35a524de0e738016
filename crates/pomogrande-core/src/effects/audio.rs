//! Audio playback.
//!
//! Playback runs on a surface that is expensive to create, so [`LazyAudio`]
//! builds it on first use and keeps it. A failed creation is reported to the
//! caller and attempted again on the next call.

use std::io::Write;

use super::AudioPlayer;
use crate::error::EffectError;

/// Something that can actually make noise.
pub trait PlaybackSurface: Send {
    fn play_sound(&mut self, sound: &str, volume: f64) -> Result<(), EffectError>;

    fn play_music(&mut self, track: &str, volume: f64) -> Result<(), EffectError>;

    fn stop_music(&mut self) -> Result<(), EffectError>;
}

pub struct LazyAudio<S, F> {
    factory: F,
    surface: Option<S>,
}

impl<S, F> LazyAudio<S, F>
where
    S: PlaybackSurface,
    F: FnMut() -> Result<S, EffectError> + Send,
{
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            surface: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.surface.is_some()
    }

    fn surface(&mut self) -> Result<&mut S, EffectError> {
        if self.surface.is_none() {
            let surface = (self.factory)()?;
            tracing::debug!("audio surface created");
            self.surface = Some(surface);
        }
        self.surface
            .as_mut()
            .ok_or_else(|| EffectError::Unavailable("audio surface".into()))
    }
}

impl<S, F> AudioPlayer for LazyAudio<S, F>
where
    S: PlaybackSurface,
    F: FnMut() -> Result<S, EffectError> + Send,
{
    fn play_sound(&mut self, sound: &str, volume: f64) -> Result<(), EffectError> {
        self.surface()?.play_sound(sound, volume)
    }

    fn play_music(
        &mut self,
        track: &str,
        volume: f64,
        is_running: bool,
    ) -> Result<(), EffectError> {
        if !is_running {
            return Ok(());
        }
        self.surface()?.play_music(track, volume)
    }

    fn stop_music(&mut self) -> Result<(), EffectError> {
        // Nothing can be playing on a surface that was never built.
        match self.surface.as_mut() {
            Some(surface) => surface.stop_music(),
            None => Ok(()),
        }
    }
}

/// Rings the terminal bell for end-of-period sounds and logs music changes.
#[derive(Debug, Default)]
pub struct TerminalBell {
    playing: Option<String>,
}

impl TerminalBell {
    pub fn open() -> Result<Self, EffectError> {
        Ok(Self::default())
    }
}

impl PlaybackSurface for TerminalBell {
    fn play_sound(&mut self, sound: &str, volume: f64) -> Result<(), EffectError> {
        let mut err = std::io::stderr();
        err.write_all(b"\x07")?;
        err.flush()?;
        tracing::info!(sound, volume, "sound played");
        Ok(())
    }

    fn play_music(&mut self, track: &str, volume: f64) -> Result<(), EffectError> {
        if self.playing.as_deref() != Some(track) {
            tracing::info!(track, volume, "music started");
            self.playing = Some(track.to_string());
        }
        Ok(())
    }

    fn stop_music(&mut self) -> Result<(), EffectError> {
        if let Some(track) = self.playing.take() {
            tracing::info!(track = %track, "music stopped");
        }
        Ok(())
    }
}
