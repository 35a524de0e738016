//! Session controller.
//!
//! Owns the session configuration and lifecycle state and reacts to three
//! kinds of input, one at a time: user commands, scheduler ticks, and field
//! changes written to the store by other surfaces.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start--> Running(Work) --period ends--> Running(Break | LongBreak) --> Running(Work) ...
//!        Running(mode) --pause--> Paused(mode) --start--> Running(mode)
//!        Running | Paused --stop--> Idle (history committed when a Pomodoro was completed)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut controller = Controller::new(store, scheduler, effects, options);
//! controller.boot();
//! controller.handle(Command::Start);
//! // For every tick the scheduler delivers:
//! controller.on_tick(tick);
//! ```

use chrono::{Local, NaiveDate, Utc};
use serde_json::Value;

use super::command::Command;
use super::scheduler::{Tick, TickScheduler};
use super::session::{Mode, Phase, SessionConfig, SessionState};
use crate::effects::{format_badge_text, BlockList, Effects};
use crate::events::Event;
use crate::stats::{HistoryAggregator, HistoryEntry, SessionTotals};
use crate::storage::{read_field, Config, DefaultsConfig, StorageChange, StorageKey, Store};
use crate::todo::{Todo, TodoSnapshot};

const SESSION_COMPLETE: (&str, &str) = (
    "Session ended! 🎉",
    "You have completed your ultra focus session!",
);

/// Notification shown when a period of `mode` begins.
fn period_notice(mode: Mode) -> (&'static str, &'static str) {
    match mode {
        Mode::Work => ("Focus time! ⚡", "Let's get to work!"),
        Mode::Break => ("Quick break! ☀️", "Take a break and recharge."),
        Mode::LongBreak => (
            "Long Break! ✨",
            "Fantastic work session! Time for a proper recharge!",
        ),
    }
}

/// Process-level settings the controller needs besides the stored fields.
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub tick_interval_ms: u64,
    pub work_color: String,
    pub break_color: String,
    /// Fallbacks for fields missing from the store.
    pub defaults: DefaultsConfig,
}

impl ControllerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            tick_interval_ms: config.timer.tick_interval_ms,
            work_color: config.badge.work_color.clone(),
            break_color: config.badge.break_color.clone(),
            defaults: config.defaults.clone(),
        }
    }
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

type Clock = Box<dyn Fn() -> NaiveDate + Send>;

pub struct Controller {
    options: ControllerOptions,
    config: SessionConfig,
    state: SessionState,
    block_list: BlockList,
    /// Whether the last blocking request was `enable`.
    blocking_active: bool,
    snapshot: TodoSnapshot,
    completed_todos: Vec<String>,
    store: Box<dyn Store>,
    scheduler: Box<dyn TickScheduler>,
    effects: Effects,
    clock: Clock,
}

impl Controller {
    /// Build a controller and hydrate it from the store.
    ///
    /// Fields that are missing or unreadable fall back to `options.defaults`
    /// one by one.
    pub fn new(
        store: Box<dyn Store>,
        scheduler: Box<dyn TickScheduler>,
        effects: Effects,
        options: ControllerOptions,
    ) -> Self {
        let config = SessionConfig::from_defaults(&options.defaults);
        let block_list = BlockList {
            blocked_sites: options.defaults.blocked_sites.clone(),
            allowed_urls: Vec::new(),
        };
        let mut controller = Self {
            state: SessionState::idle(config.work_ms),
            config,
            block_list,
            blocking_active: false,
            snapshot: TodoSnapshot::default(),
            completed_todos: Vec::new(),
            store,
            scheduler,
            effects,
            options,
            clock: Box::new(|| Local::now().date_naive()),
        };
        controller.hydrate();
        controller
    }

    /// Replace the source of "today" used when recording history.
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDate + Send + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn block_list(&self) -> &BlockList {
        &self.block_list
    }

    pub fn is_blocking(&self) -> bool {
        self.blocking_active
    }

    /// Todos completed since the session started.
    pub fn completed_todos(&self) -> usize {
        self.completed_todos.len()
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            phase: self.state.phase(),
            mode: self.state.mode,
            remaining_ms: self.state.remaining_ms,
            pomodoro_count: self.state.pomodoro_count,
            completed_todos: self.completed_todos.len(),
            at: Utc::now(),
        }
    }

    /// Write install-time defaults for any field not yet in the store.
    pub fn seed_defaults(&mut self) {
        let defaults = [
            (StorageKey::Time, Value::from(self.state.remaining_ms)),
            (StorageKey::WorkTime, Value::from(self.config.work_ms)),
            (StorageKey::BreakTime, Value::from(self.config.break_ms)),
            (StorageKey::LongBreak, Value::from(self.config.long_break_ms)),
            (
                StorageKey::BlockedSites,
                Value::from(self.block_list.blocked_sites.clone()),
            ),
            (
                StorageKey::SelectedSound,
                Value::from(self.config.selected_sound.clone()),
            ),
            (
                StorageKey::SelectedMusic,
                Value::from(self.config.selected_music.clone()),
            ),
        ];

        let mut missing = Vec::new();
        for (key, value) in defaults {
            match self.store.get(key) {
                Ok(None) => missing.push((key, value)),
                Ok(Some(_)) => {}
                Err(e) => tracing::warn!(field = %key, error = %e, "could not check stored field"),
            }
        }
        if !missing.is_empty() {
            self.write(&missing);
            tracing::info!(fields = missing.len(), "seeded default settings");
        }
        self.refresh_badge();
    }

    /// Apply the startup policy to the hydrated state.
    ///
    /// A session that was running when the process went away comes back
    /// paused; auto-start then resumes it (or starts a fresh one when idle).
    /// A restored session compares todos against the list as it is now.
    pub fn boot(&mut self) -> Vec<Event> {
        if self.state.is_running {
            self.capture_todos();
        }
        if let Phase::Running(mode) = self.state.phase() {
            self.state.is_paused = true;
            self.persist();
            tracing::info!(
                ?mode,
                remaining_ms = self.state.remaining_ms,
                "interrupted session restored as paused"
            );
        }
        if self.config.auto_start {
            return self.start();
        }
        self.refresh_badge();
        Vec::new()
    }

    pub fn handle(&mut self, command: Command) -> Vec<Event> {
        tracing::debug!(%command, phase = ?self.state.phase(), "command received");
        match command {
            Command::Start => self.start(),
            Command::Pause => self.pause(),
            Command::Stop => self.stop(),
            Command::Skip => self.skip(),
        }
    }

    /// Count one elapsed interval down. Ticks from a retired timer, or that
    /// arrive while the session is not running, change nothing.
    pub fn on_tick(&mut self, tick: Tick) -> Vec<Event> {
        if !self.scheduler.accepts(&tick) {
            tracing::debug!(generation = tick.generation, "stale tick dropped");
            return Vec::new();
        }
        let Phase::Running(_) = self.state.phase() else {
            tracing::debug!("tick ignored: session not running");
            return Vec::new();
        };

        self.state.remaining_ms = self.state.remaining_ms.saturating_sub(tick.elapsed_ms);
        if self.state.remaining_ms == 0 {
            return self.finish_period(false);
        }

        self.write(&[(StorageKey::Time, Value::from(self.state.remaining_ms))]);
        self.effects
            .set_badge_text(&format_badge_text(self.state.remaining_ms));
        Vec::new()
    }

    /// Pull field changes other surfaces made and apply each one.
    pub fn sync_external(&mut self) -> usize {
        let changes = match self.store.poll_changes() {
            Ok(changes) => changes,
            Err(e) => {
                tracing::warn!(error = %e, "failed to poll store for changes");
                return 0;
            }
        };
        let count = changes.len();
        for change in changes {
            self.apply_change(change);
        }
        count
    }

    /// Reduce one externally written field into the controller.
    pub fn apply_change(&mut self, change: StorageChange) {
        let StorageChange { key, value } = change;
        if key.is_lifecycle() {
            tracing::debug!(field = %key, "external write to lifecycle field ignored");
            return;
        }
        let value = value.unwrap_or(Value::Null);

        match key {
            StorageKey::Todos => self.refresh_completed_todos(&value),
            StorageKey::PomodoroHistory => {}
            StorageKey::WorkTime => {
                if self.assign(key, &value) && self.state.phase() == Phase::Idle {
                    self.state.remaining_ms = self.config.work_ms;
                    self.write(&[(StorageKey::Time, Value::from(self.state.remaining_ms))]);
                    self.effects
                        .set_badge_text(&format_badge_text(self.state.remaining_ms));
                }
            }
            StorageKey::BlockedSites | StorageKey::AllowedUrls => {
                if self.assign(key, &value) && self.blocking_active {
                    self.effects.enable_blocking(&self.block_list);
                }
            }
            _ => {
                self.assign(key, &value);
            }
        }
    }

    fn start(&mut self) -> Vec<Event> {
        match self.state.phase() {
            Phase::Running(mode) => {
                tracing::debug!(?mode, "start while running, re-arming timer");
                self.arm();
                Vec::new()
            }
            Phase::Paused(mode) => {
                self.state.is_paused = false;
                if !mode.is_break() {
                    self.enable_blocking();
                }
                self.start_music();
                self.arm();
                self.persist();
                self.refresh_badge();
                tracing::info!(?mode, remaining_ms = self.state.remaining_ms, "session resumed");
                vec![Event::TimerResumed {
                    mode,
                    remaining_ms: self.state.remaining_ms,
                    at: Utc::now(),
                }]
            }
            Phase::Idle => {
                self.state.mode = Mode::Work;
                self.state.remaining_ms = self.config.work_ms;
                self.capture_todos();
                self.enable_blocking();
                self.state.is_running = true;
                self.state.is_paused = false;
                self.start_music();
                self.arm();
                self.persist();
                self.refresh_badge();
                tracing::info!(remaining_ms = self.state.remaining_ms, "session started");
                vec![Event::TimerStarted {
                    mode: Mode::Work,
                    remaining_ms: self.state.remaining_ms,
                    at: Utc::now(),
                }]
            }
        }
    }

    fn pause(&mut self) -> Vec<Event> {
        self.scheduler.cancel();
        let Phase::Running(mode) = self.state.phase() else {
            tracing::debug!(phase = ?self.state.phase(), "pause ignored: not running");
            return Vec::new();
        };

        self.state.is_paused = true;
        self.effects.stop_music();
        self.persist();
        tracing::info!(?mode, remaining_ms = self.state.remaining_ms, "session paused");
        vec![Event::TimerPaused {
            mode,
            remaining_ms: self.state.remaining_ms,
            at: Utc::now(),
        }]
    }

    fn stop(&mut self) -> Vec<Event> {
        self.scheduler.cancel();
        let was_active = self.state.is_running;
        let pomodoro_count = self.state.pomodoro_count;

        let mut events = Vec::new();
        if was_active && (pomodoro_count >= 1 || self.config.ultra_focus_mode) {
            if let Some(entry) = self.record_history() {
                events.push(Event::HistoryRecorded {
                    entry,
                    at: Utc::now(),
                });
            }
        }

        self.state = SessionState::idle(self.config.work_ms);
        self.snapshot = TodoSnapshot::default();
        self.completed_todos.clear();
        self.effects.stop_music();
        self.disable_blocking();
        self.persist();
        self.refresh_badge();

        if was_active {
            tracing::info!(pomodoro_count, "session stopped");
            events.push(Event::TimerStopped {
                pomodoro_count,
                at: Utc::now(),
            });
        } else {
            tracing::debug!("stop while idle, state reset");
        }
        events
    }

    fn skip(&mut self) -> Vec<Event> {
        match self.state.phase() {
            Phase::Idle => {
                tracing::debug!("skip ignored: session idle");
                Vec::new()
            }
            Phase::Paused(_) => {
                self.state.remaining_ms = 0;
                let mut events = self.start();
                events.extend(self.finish_period(true));
                events
            }
            Phase::Running(_) => {
                self.state.remaining_ms = 0;
                self.finish_period(true)
            }
        }
    }

    fn finish_period(&mut self, skipped: bool) -> Vec<Event> {
        let ended = self.state.mode;
        if self.config.sound_enabled && !self.config.selected_sound.is_empty() {
            self.effects
                .play_sound(&self.config.selected_sound, self.config.sound_volume);
        }

        if self.config.ultra_focus_mode {
            self.state.pomodoro_count += 1;
            let pomodoro_count = self.state.pomodoro_count;
            let mut events = self.stop();
            let (title, message) = SESSION_COMPLETE;
            self.effects.notify(title, message);
            tracing::info!(pomodoro_count, "ultra focus session complete");
            events.push(Event::SessionCompleted {
                pomodoro_count,
                at: Utc::now(),
            });
            return events;
        }

        if ended == Mode::Work {
            self.state.pomodoro_count += 1;
        }
        let next = ended.next(self.state.pomodoro_count);
        self.state.mode = next;
        self.state.is_paused = false;

        if next.is_break() {
            self.disable_blocking();
            self.effects.stop_music();
        } else {
            self.enable_blocking();
            self.start_music();
        }

        self.state.remaining_ms = self.config.duration_ms(next);
        if self.config.notifications_enabled {
            let (title, message) = period_notice(next);
            self.effects.notify(title, message);
        }
        self.refresh_badge();
        self.persist();
        if !self.scheduler.is_armed() {
            self.arm();
        }

        tracing::info!(
            ?ended,
            ?next,
            skipped,
            pomodoro_count = self.state.pomodoro_count,
            "period completed"
        );
        vec![Event::PeriodCompleted {
            ended,
            next,
            pomodoro_count: self.state.pomodoro_count,
            skipped,
            at: Utc::now(),
        }]
    }

    fn record_history(&mut self) -> Option<HistoryEntry> {
        let totals = SessionTotals {
            pomodoros: self.state.pomodoro_count,
            completed_todos: u32::try_from(self.completed_todos.len()).unwrap_or(u32::MAX),
            work_ms: self.config.work_ms,
            remaining_ms: self.state.remaining_ms,
            ultra_focus: self.config.ultra_focus_mode,
        };
        match HistoryAggregator::commit(self.store.as_ref(), totals, (self.clock)()) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "failed to record session history");
                None
            }
        }
    }

    fn arm(&mut self) {
        self.scheduler.start(self.options.tick_interval_ms);
    }

    fn enable_blocking(&mut self) {
        self.blocking_active = true;
        self.effects.enable_blocking(&self.block_list);
    }

    fn disable_blocking(&mut self) {
        self.blocking_active = false;
        self.effects.disable_blocking();
    }

    fn start_music(&mut self) {
        if self.config.music_enabled
            && !self.config.selected_music.is_empty()
            && !self.state.mode.is_break()
        {
            self.effects.play_music(
                &self.config.selected_music,
                self.config.music_volume,
                self.state.is_running,
            );
        }
    }

    fn refresh_badge(&mut self) {
        let color = if self.state.is_running && self.state.mode.is_break() {
            self.options.break_color.as_str()
        } else {
            self.options.work_color.as_str()
        };
        self.effects.set_badge_color(color);
        self.effects
            .set_badge_text(&format_badge_text(self.state.remaining_ms));
    }

    fn capture_todos(&mut self) {
        let todos = match read_field::<Vec<Todo>>(self.store.as_ref(), StorageKey::Todos) {
            Ok(todos) => todos.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "todo list unreadable, starting with an empty snapshot");
                Vec::new()
            }
        };
        self.snapshot = TodoSnapshot::capture(todos);
        self.completed_todos.clear();
    }

    /// Recompute the delta against the session snapshot. The delta is
    /// replaced, not accumulated.
    fn refresh_completed_todos(&mut self, value: &Value) {
        if !self.state.is_running {
            return;
        }
        let todos: Vec<Todo> = if value.is_null() {
            Vec::new()
        } else {
            match serde_json::from_value(value.clone()) {
                Ok(todos) => todos,
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring malformed todo list");
                    return;
                }
            }
        };
        self.completed_todos = self.snapshot.newly_completed(&todos);
        tracing::debug!(completed = self.completed_todos.len(), "todo delta updated");
    }

    fn hydrate(&mut self) {
        let mut stored_time = None;
        let mut is_break = false;
        let mut is_long_break = false;

        for key in StorageKey::ALL {
            let value = match self.store.get(key) {
                Ok(Some(value)) => value,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(field = %key, error = %e, "failed to read field, using default");
                    continue;
                }
            };
            let applied = match key {
                StorageKey::Time => put(&mut stored_time, value.as_u64().map(Some)),
                StorageKey::IsRunning => put(&mut self.state.is_running, value.as_bool()),
                StorageKey::IsPaused => put(&mut self.state.is_paused, value.as_bool()),
                StorageKey::IsBreak => put(&mut is_break, value.as_bool()),
                StorageKey::IsLongBreak => put(&mut is_long_break, value.as_bool()),
                StorageKey::PomodoroCount => put(
                    &mut self.state.pomodoro_count,
                    value.as_u64().and_then(|n| u32::try_from(n).ok()),
                ),
                // Read when a session starts and when history is committed.
                StorageKey::Todos | StorageKey::PomodoroHistory => true,
                _ => self.assign(key, &value),
            };
            if !applied && key.is_lifecycle() {
                tracing::warn!(field = %key, %value, "ignoring stored value that does not fit the field");
            }
        }

        if self.state.is_running {
            self.state.mode = match (is_break, is_long_break) {
                (true, true) => Mode::LongBreak,
                (true, false) => Mode::Break,
                _ => Mode::Work,
            };
            self.state.remaining_ms = stored_time
                .filter(|ms| *ms > 0)
                .unwrap_or_else(|| self.config.duration_ms(self.state.mode));
        } else {
            self.state = SessionState {
                remaining_ms: stored_time.unwrap_or(self.config.work_ms),
                pomodoro_count: self.state.pomodoro_count,
                ..SessionState::idle(self.config.work_ms)
            };
        }
        tracing::debug!(phase = ?self.state.phase(), remaining_ms = self.state.remaining_ms, "state hydrated");
    }

    /// Store a decoded setting or list. Returns false, keeping the previous
    /// value, when the value does not fit the field.
    fn assign(&mut self, key: StorageKey, value: &Value) -> bool {
        let applied = match key {
            StorageKey::WorkTime => put(&mut self.config.work_ms, duration(value)),
            StorageKey::BreakTime => put(&mut self.config.break_ms, duration(value)),
            StorageKey::LongBreak => put(&mut self.config.long_break_ms, duration(value)),
            StorageKey::UltraFocusMode => put(&mut self.config.ultra_focus_mode, value.as_bool()),
            StorageKey::IsAutoStartEnabled => put(&mut self.config.auto_start, value.as_bool()),
            StorageKey::SelectedSound => put(&mut self.config.selected_sound, text(value)),
            StorageKey::IsSoundEnabled => put(&mut self.config.sound_enabled, value.as_bool()),
            StorageKey::SoundVolume => put(&mut self.config.sound_volume, volume(value)),
            StorageKey::SelectedMusic => put(&mut self.config.selected_music, text(value)),
            StorageKey::IsMusicEnabled => put(&mut self.config.music_enabled, value.as_bool()),
            StorageKey::MusicVolume => put(&mut self.config.music_volume, volume(value)),
            StorageKey::IsNotificationEnabled => {
                put(&mut self.config.notifications_enabled, value.as_bool())
            }
            StorageKey::BlockedSites => put(&mut self.block_list.blocked_sites, list(value)),
            StorageKey::AllowedUrls => put(&mut self.block_list.allowed_urls, list(value)),
            _ => false,
        };
        if !applied {
            tracing::warn!(field = %key, %value, "ignoring value that does not fit the field");
        }
        applied
    }

    fn persist(&self) {
        self.write(&[
            (StorageKey::Time, Value::from(self.state.remaining_ms)),
            (StorageKey::IsRunning, Value::Bool(self.state.is_running)),
            (StorageKey::IsPaused, Value::Bool(self.state.is_paused)),
            (StorageKey::IsBreak, Value::Bool(self.state.mode.is_break())),
            (
                StorageKey::IsLongBreak,
                Value::Bool(self.state.mode == Mode::LongBreak),
            ),
            (
                StorageKey::PomodoroCount,
                Value::from(self.state.pomodoro_count),
            ),
        ]);
    }

    /// Fire-and-forget write; the next mutation rewrites current state.
    fn write(&self, entries: &[(StorageKey, Value)]) {
        if let Err(e) = self.store.set_many(entries) {
            tracing::warn!(error = %e, fields = entries.len(), "failed to persist session state");
        }
    }
}

fn put<T>(slot: &mut T, value: Option<T>) -> bool {
    match value {
        Some(value) => {
            *slot = value;
            true
        }
        None => false,
    }
}

fn duration(value: &Value) -> Option<u64> {
    value.as_u64().filter(|ms| *ms > 0)
}

fn volume(value: &Value) -> Option<f64> {
    value.as_f64().map(|v| v.clamp(0.0, 1.0))
}

fn text(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

/// A removed list reads as empty.
fn list(value: &Value) -> Option<Vec<String>> {
    if value.is_null() {
        return Some(Vec::new());
    }
    serde_json::from_value(value.clone()).ok()
}
