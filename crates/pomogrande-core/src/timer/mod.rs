mod command;
mod controller;
mod scheduler;
mod session;

pub use command::Command;
pub use controller::{Controller, ControllerOptions};
pub use scheduler::{IntervalScheduler, ManualScheduler, Tick, TickScheduler};
pub use session::{Mode, Phase, SessionConfig, SessionState, POMODOROS_PER_LONG_BREAK};
