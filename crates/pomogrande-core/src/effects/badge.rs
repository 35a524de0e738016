use serde::Serialize;
use std::path::PathBuf;

use super::{write_json, Badge};
use crate::error::EffectError;

/// Short badge label: whole minutes (rounded up) from one minute on,
/// seconds below that.
pub fn format_badge_text(remaining_ms: u64) -> String {
    if remaining_ms >= 60_000 {
        format!("{}m", remaining_ms.div_ceil(60_000))
    } else {
        format!("{}s", remaining_ms.div_ceil(1000))
    }
}

/// `MM:SS`, minutes unbounded.
pub fn format_clock(remaining_ms: u64) -> String {
    let secs = remaining_ms.div_ceil(1000);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[derive(Debug, Clone, Default, Serialize)]
struct BadgeState {
    color: String,
    text: String,
}

/// Publishes the badge as `badge.json` for status bars to pick up.
pub struct FileBadge {
    path: PathBuf,
    state: BadgeState,
}

impl FileBadge {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            state: BadgeState::default(),
        }
    }
}

impl Badge for FileBadge {
    fn set_color(&mut self, color: &str) -> Result<(), EffectError> {
        if self.state.color == color {
            return Ok(());
        }
        self.state.color = color.to_string();
        write_json(&self.path, &self.state)
    }

    fn set_text(&mut self, text: &str) -> Result<(), EffectError> {
        if self.state.text == text {
            return Ok(());
        }
        self.state.text = text.to_string();
        write_json(&self.path, &self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn badge_text_rounds_up() {
        assert_eq!(format_badge_text(25 * 60_000), "25m");
        assert_eq!(format_badge_text(24 * 60_000 + 1), "25m");
        assert_eq!(format_badge_text(60_000), "1m");
        assert_eq!(format_badge_text(59_001), "60s");
        assert_eq!(format_badge_text(1), "1s");
        assert_eq!(format_badge_text(0), "0s");
    }

    #[test]
    fn clock_format() {
        assert_eq!(format_clock(25 * 60_000), "25:00");
        assert_eq!(format_clock(61_500), "01:02");
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(120 * 60_000), "120:00");
    }

    #[test]
    fn file_badge_writes_color_and_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("badge.json");
        let mut badge = FileBadge::new(path.clone());
        badge.set_color("#40A662").unwrap();
        badge.set_text("25m").unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(json["color"], "#40A662");
        assert_eq!(json["text"], "25m");
    }
}
