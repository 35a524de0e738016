//! # Pomogrande Core Library
//!
//! This library provides the core logic for the Pomogrande Pomodoro timer.
//! Every surface (the daemon, the command-line tools, anything else sharing
//! the store) talks to the same session controller through persisted fields
//! and queued commands.
//!
//! ## Architecture
//!
//! - **Timer**: The session controller, its lifecycle types, and a tick
//!   scheduler abstraction with a tokio-backed implementation
//! - **Storage**: The persistence gateway (SQLite or in-memory), field keys,
//!   and TOML-based process configuration
//! - **Stats**: The per-day history log and summaries over it
//! - **Effects**: Notifications, audio, badge, and site blocking adapters
//! - **Runtime**: The async loop that feeds the controller one input at a time
//!
//! ## Key Components
//!
//! - [`Controller`]: Session state machine
//! - [`Database`]: Shared field store and command queue
//! - [`HistoryAggregator`]: Merges stopped sessions into the history log
//! - [`Runtime`]: Drives a controller from ticks, commands, and store changes

pub mod effects;
pub mod error;
pub mod events;
pub mod runtime;
pub mod stats;
pub mod storage;
pub mod timer;
pub mod todo;

pub use effects::{BlockList, Effects};
pub use error::{ConfigError, CoreError, EffectError, StorageError, ValidationError};
pub use events::Event;
pub use runtime::{Runtime, RuntimeHandle};
pub use stats::{HistoryAggregator, HistoryEntry, HistoryLog, HistorySummary};
pub use storage::{CommandQueue, Config, Database, MemoryStore, StorageKey, Store};
pub use timer::{Command, Controller, ControllerOptions, Mode, Phase, SessionConfig, SessionState};
pub use todo::Todo;
