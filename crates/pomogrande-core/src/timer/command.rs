use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Commands other surfaces send to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    #[serde(rename = "start-timer")]
    Start,
    #[serde(rename = "pause-timer")]
    Pause,
    #[serde(rename = "stop-timer")]
    Stop,
    #[serde(rename = "skip-timer")]
    Skip,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Start => "start-timer",
            Command::Pause => "pause-timer",
            Command::Stop => "stop-timer",
            Command::Skip => "skip-timer",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start-timer" => Ok(Command::Start),
            "pause-timer" => Ok(Command::Pause),
            "stop-timer" => Ok(Command::Stop),
            "skip-timer" => Ok(Command::Skip),
            other => Err(ValidationError::UnknownCommand(other.to_string())),
        }
    }
}
