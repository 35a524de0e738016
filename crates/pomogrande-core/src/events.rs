use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stats::HistoryEntry;
use crate::timer::{Mode, Phase};

/// Every state change in the controller produces an Event.
/// The CLI prints them; tests assert on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        mode: Mode,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        mode: Mode,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        mode: Mode,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    /// A period ran out (or was skipped) and the next one began.
    PeriodCompleted {
        ended: Mode,
        next: Mode,
        pomodoro_count: u32,
        skipped: bool,
        at: DateTime<Utc>,
    },
    /// An ultra focus session reached its end.
    SessionCompleted {
        pomodoro_count: u32,
        at: DateTime<Utc>,
    },
    TimerStopped {
        pomodoro_count: u32,
        at: DateTime<Utc>,
    },
    HistoryRecorded {
        entry: HistoryEntry,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        mode: Mode,
        remaining_ms: u64,
        pomodoro_count: u32,
        completed_todos: usize,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::TimerStarted { .. } => "timer_started",
            Event::TimerResumed { .. } => "timer_resumed",
            Event::TimerPaused { .. } => "timer_paused",
            Event::PeriodCompleted { .. } => "period_completed",
            Event::SessionCompleted { .. } => "session_completed",
            Event::TimerStopped { .. } => "timer_stopped",
            Event::HistoryRecorded { .. } => "history_recorded",
            Event::StateSnapshot { .. } => "state_snapshot",
        }
    }
}
