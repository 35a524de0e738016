use clap::Subcommand;
use pomogrande_core::effects::format_clock;
use pomogrande_core::storage::{read_field, CommandQueue, Database, StorageKey};
use pomogrande_core::timer::{Command, Mode, SessionState};
use serde_json::json;

use super::{open_store, print_json, CliResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a session, or resume a paused one
    Start,
    /// Pause the running session
    Pause,
    /// Stop the session and record it in history
    Stop,
    /// End the current period now
    Skip,
    /// Print the stored session state as JSON
    Status,
}

pub fn run(action: TimerAction) -> CliResult {
    let command = match action {
        TimerAction::Start => Command::Start,
        TimerAction::Pause => Command::Pause,
        TimerAction::Stop => Command::Stop,
        TimerAction::Skip => Command::Skip,
        TimerAction::Status => return status(),
    };

    // The running controller picks this up on its next poll.
    CommandQueue::open()?.push(command)?;
    print_json(&json!({ "queued": command.as_str() }))
}

fn read_flag(db: &Database, key: StorageKey) -> Result<bool, Box<dyn std::error::Error>> {
    Ok(read_field::<bool>(db, key)?.unwrap_or(false))
}

fn status() -> CliResult {
    let db = open_store()?;
    let work_ms = read_field::<u64>(&db, StorageKey::WorkTime)?.unwrap_or(25 * 60_000);

    let mode = match (
        read_flag(&db, StorageKey::IsBreak)?,
        read_flag(&db, StorageKey::IsLongBreak)?,
    ) {
        (true, true) => Mode::LongBreak,
        (true, false) => Mode::Break,
        _ => Mode::Work,
    };
    let state = SessionState {
        remaining_ms: read_field::<u64>(&db, StorageKey::Time)?.unwrap_or(work_ms),
        mode,
        is_running: read_flag(&db, StorageKey::IsRunning)?,
        is_paused: read_flag(&db, StorageKey::IsPaused)?,
        pomodoro_count: read_field::<u32>(&db, StorageKey::PomodoroCount)?.unwrap_or(0),
    };

    print_json(&json!({
        "phase": state.phase(),
        "remaining_ms": state.remaining_ms,
        "clock": format_clock(state.remaining_ms),
        "pomodoro_count": state.pomodoro_count,
    }))
}
