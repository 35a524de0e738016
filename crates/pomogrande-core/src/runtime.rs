//! Async driver for the controller.
//!
//! One task owns the [`Controller`] and feeds it, one input at a time, from:
//! - scheduler ticks delivered over the tick channel
//! - commands sent through a [`RuntimeHandle`]
//! - a poll timer that pulls external store changes and queued commands
//! - Ctrl-C, when enabled

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::events::Event;
use crate::storage::CommandQueue;
use crate::timer::{Command, Controller, Tick};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Message {
    Command(Command),
    Shutdown,
}

/// Sends commands to a running [`Runtime`].
#[derive(Debug, Clone)]
pub struct RuntimeHandle {
    tx: mpsc::UnboundedSender<Message>,
}

impl RuntimeHandle {
    /// Returns false once the runtime has exited.
    pub fn send(&self, command: Command) -> bool {
        self.tx.send(Message::Command(command)).is_ok()
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(Message::Shutdown);
    }
}

pub struct Runtime {
    controller: Controller,
    ticks: mpsc::UnboundedReceiver<Tick>,
    messages: mpsc::UnboundedReceiver<Message>,
    queue: Option<CommandQueue>,
    events: Option<mpsc::UnboundedSender<Event>>,
    poll_interval: Duration,
    ctrl_c: bool,
}

impl Runtime {
    /// `ticks` is the receiving end of the channel the controller's scheduler
    /// posts into.
    pub fn new(
        controller: Controller,
        ticks: mpsc::UnboundedReceiver<Tick>,
        poll_interval_ms: u64,
    ) -> (Self, RuntimeHandle) {
        let (tx, messages) = mpsc::unbounded_channel();
        let runtime = Self {
            controller,
            ticks,
            messages,
            queue: None,
            events: None,
            poll_interval: Duration::from_millis(poll_interval_ms.max(1)),
            ctrl_c: false,
        };
        (runtime, RuntimeHandle { tx })
    }

    /// Also execute commands other processes push onto `queue`.
    pub fn with_queue(mut self, queue: CommandQueue) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Stop when the process receives Ctrl-C.
    pub fn with_ctrl_c(mut self) -> Self {
        self.ctrl_c = true;
        self
    }

    /// Receive every event the controller produces from now on.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<Event> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    /// Boot the controller and process inputs until shutdown. Returns the
    /// controller so its final state can be inspected.
    pub async fn run(mut self) -> Controller {
        let events = self.controller.boot();
        self.publish(events);

        let mut poll = tokio::time::interval(self.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let listen = self.ctrl_c;
        let interrupted = async move {
            if listen {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::warn!(error = %e, "cannot listen for Ctrl-C");
                    std::future::pending::<()>().await;
                }
            } else {
                std::future::pending::<()>().await;
            }
        };
        tokio::pin!(interrupted);

        tracing::info!(poll_interval_ms = self.poll_interval.as_millis() as u64, "runtime started");
        loop {
            tokio::select! {
                Some(tick) = self.ticks.recv() => {
                    let events = self.controller.on_tick(tick);
                    self.publish(events);
                }
                message = self.messages.recv() => match message {
                    Some(Message::Command(command)) => {
                        let events = self.controller.handle(command);
                        self.publish(events);
                    }
                    Some(Message::Shutdown) | None => break,
                },
                _ = poll.tick() => self.poll(),
                () = &mut interrupted => {
                    tracing::info!("interrupt received");
                    break;
                }
            }
        }
        tracing::info!(phase = ?self.controller.phase(), "runtime stopped");
        self.controller
    }

    fn poll(&mut self) {
        self.controller.sync_external();

        let Some(queue) = &self.queue else {
            return;
        };
        let commands = match queue.drain() {
            Ok(commands) => commands,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read command queue");
                return;
            }
        };
        for command in commands {
            let events = self.controller.handle(command);
            self.publish(events);
        }
    }

    fn publish(&self, events: Vec<Event>) {
        for event in events {
            tracing::debug!(kind = event.kind(), "event");
            if let Some(tx) = &self.events {
                let _ = tx.send(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::Recorder;
    use crate::storage::{MemoryStore, StorageKey, Store};
    use crate::timer::{ControllerOptions, IntervalScheduler, Mode, Phase};
    use serde_json::json;

    fn runtime(store: &MemoryStore) -> (Runtime, RuntimeHandle) {
        let (scheduler, ticks) = IntervalScheduler::channel();
        let options = ControllerOptions {
            tick_interval_ms: 1000,
            ..ControllerOptions::default()
        };
        let controller = Controller::new(
            Box::new(store.clone()),
            Box::new(scheduler),
            Recorder::new().effects(),
            options,
        );
        Runtime::new(controller, ticks, 250)
    }

    fn short_periods() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .set_many(&[
                (StorageKey::WorkTime, json!(3000)),
                (StorageKey::BreakTime, json!(2000)),
            ])
            .unwrap();
        store
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_drive_period_changes() {
        let store = short_periods();
        let (mut runtime, handle) = runtime(&store);
        let mut events = runtime.subscribe();
        let task = tokio::spawn(runtime.run());

        handle.send(Command::Start);
        loop {
            match events.recv().await.unwrap() {
                Event::PeriodCompleted { next, .. } => {
                    assert_eq!(next, Mode::Break);
                    break;
                }
                _ => continue,
            }
        }

        handle.shutdown();
        let controller = task.await.unwrap();
        assert_eq!(controller.phase(), Phase::Running(Mode::Break));
        assert_eq!(controller.state().pomodoro_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn external_changes_are_polled() {
        let store = MemoryStore::new();
        let (runtime, handle) = runtime(&store);
        let task = tokio::spawn(runtime.run());

        store
            .surface()
            .set(StorageKey::WorkTime, json!(600_000))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;

        handle.shutdown();
        let controller = task.await.unwrap();
        assert_eq!(controller.state().remaining_ms, 600_000);
    }

    #[tokio::test(start_paused = true)]
    async fn queued_commands_are_executed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pomogrande.db");
        let sender = CommandQueue::open_at(&path).unwrap();
        sender.push(Command::Start).unwrap();

        let store = MemoryStore::new();
        let (runtime, handle) = runtime(&store);
        let mut runtime = runtime.with_queue(CommandQueue::open_at(&path).unwrap());
        let mut events = runtime.subscribe();
        let task = tokio::spawn(runtime.run());

        let first = events.recv().await.unwrap();
        assert!(matches!(first, Event::TimerStarted { .. }));

        handle.shutdown();
        let controller = task.await.unwrap();
        assert_eq!(controller.phase(), Phase::Running(Mode::Work));
        assert!(sender.drain().unwrap().is_empty());
    }

    #[tokio::test]
    async fn dropping_the_handle_stops_the_runtime() {
        let store = MemoryStore::new();
        let (runtime, handle) = runtime(&store);
        drop(handle);
        let controller = runtime.run().await;
        assert_eq!(controller.phase(), Phase::Idle);
    }
}
