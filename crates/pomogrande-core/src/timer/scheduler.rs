//! Tick scheduling.
//!
//! At most one repeating timer is armed at a time. Every tick carries the
//! generation of the timer that produced it; once a timer is cancelled or
//! replaced its generation is retired, so ticks already queued behind it are
//! rejected by [`TickScheduler::accepts`] and never reach the controller.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// One elapsed interval of an armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub generation: u64,
    pub elapsed_ms: u64,
}

pub trait TickScheduler: Send {
    /// Arm a repeating timer, cancelling any timer already armed.
    fn start(&mut self, interval_ms: u64);

    /// Disarm the timer. Calling this while nothing is armed is a no-op.
    fn cancel(&mut self);

    fn is_armed(&self) -> bool;

    /// Whether `tick` came from the timer that is armed right now.
    fn accepts(&self, tick: &Tick) -> bool;
}

/// Tokio-backed scheduler that posts ticks into a channel.
pub struct IntervalScheduler {
    tx: mpsc::UnboundedSender<Tick>,
    task: Option<JoinHandle<()>>,
    generation: u64,
}

impl IntervalScheduler {
    pub fn new(tx: mpsc::UnboundedSender<Tick>) -> Self {
        Self {
            tx,
            task: None,
            generation: 0,
        }
    }

    /// Scheduler plus the receiving end of its tick channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Tick>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl TickScheduler for IntervalScheduler {
    fn start(&mut self, interval_ms: u64) {
        self.cancel();

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no async runtime available, timer not armed");
            return;
        };

        self.generation += 1;
        let generation = self.generation;
        let tx = self.tx.clone();
        let period = Duration::from_millis(interval_ms.max(1));

        self.task = Some(handle.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let tick = Tick {
                    generation,
                    elapsed_ms: interval_ms,
                };
                if tx.send(tick).is_err() {
                    break;
                }
            }
        }));
        tracing::debug!(generation, interval_ms, "tick timer armed");
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            // Retire the generation so queued ticks are dropped.
            self.generation += 1;
            tracing::debug!(generation = self.generation, "tick timer cancelled");
        }
    }

    fn is_armed(&self) -> bool {
        self.task.is_some()
    }

    fn accepts(&self, tick: &Tick) -> bool {
        self.task.is_some() && tick.generation == self.generation
    }
}

impl Drop for IntervalScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[derive(Debug, Default)]
struct ManualState {
    interval_ms: Option<u64>,
    generation: u64,
    starts: usize,
    cancels: usize,
}

/// Scheduler driven by hand, for tests and simulations.
///
/// Clones share state, so a test can keep one handle while the controller
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    state: Arc<Mutex<ManualState>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The tick the armed timer would deliver next, if one is armed.
    pub fn next_tick(&self) -> Option<Tick> {
        let state = self.lock();
        state.interval_ms.map(|elapsed_ms| Tick {
            generation: state.generation,
            elapsed_ms,
        })
    }

    pub fn interval_ms(&self) -> Option<u64> {
        self.lock().interval_ms
    }

    pub fn starts(&self) -> usize {
        self.lock().starts
    }

    pub fn cancels(&self) -> usize {
        self.lock().cancels
    }
}

impl TickScheduler for ManualScheduler {
    fn start(&mut self, interval_ms: u64) {
        self.cancel();
        let mut state = self.lock();
        state.generation += 1;
        state.interval_ms = Some(interval_ms);
        state.starts += 1;
    }

    fn cancel(&mut self) {
        let mut state = self.lock();
        if state.interval_ms.take().is_some() {
            state.generation += 1;
            state.cancels += 1;
        }
    }

    fn is_armed(&self) -> bool {
        self.lock().interval_ms.is_some()
    }

    fn accepts(&self, tick: &Tick) -> bool {
        let state = self.lock();
        state.interval_ms.is_some() && tick.generation == state.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_restart_retires_previous_generation() {
        let mut scheduler = ManualScheduler::new();
        scheduler.start(1000);
        let first = scheduler.next_tick().unwrap();
        scheduler.start(1000);
        let second = scheduler.next_tick().unwrap();

        assert!(!scheduler.accepts(&first));
        assert!(scheduler.accepts(&second));
        assert_eq!(scheduler.starts(), 2);
        assert_eq!(scheduler.cancels(), 1);
    }

    #[test]
    fn manual_cancel_is_idempotent() {
        let mut scheduler = ManualScheduler::new();
        scheduler.start(500);
        let tick = scheduler.next_tick().unwrap();
        scheduler.cancel();
        scheduler.cancel();
        assert!(!scheduler.is_armed());
        assert!(!scheduler.accepts(&tick));
        assert_eq!(scheduler.cancels(), 1);
        assert!(scheduler.next_tick().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn interval_scheduler_delivers_ticks() {
        let (mut scheduler, mut rx) = IntervalScheduler::channel();
        scheduler.start(1000);

        tokio::time::advance(Duration::from_millis(1000)).await;
        let tick = rx.recv().await.unwrap();
        assert_eq!(tick.elapsed_ms, 1000);
        assert!(scheduler.accepts(&tick));
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_queued_before_cancel_are_rejected() {
        let (mut scheduler, mut rx) = IntervalScheduler::channel();
        scheduler.start(100);
        tokio::time::advance(Duration::from_millis(100)).await;
        let queued = rx.recv().await.unwrap();

        scheduler.cancel();
        assert!(!scheduler.is_armed());
        assert!(!scheduler.accepts(&queued));
    }

    #[test]
    fn interval_scheduler_outside_runtime_stays_disarmed() {
        let (mut scheduler, _rx) = IntervalScheduler::channel();
        scheduler.start(1000);
        assert!(!scheduler.is_armed());
    }
}
