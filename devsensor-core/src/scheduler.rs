//! Periodic background timers
//!
//! Each timer owns one named thread. A timer is either `Stopped` or
//! `Running`; `start` and `stop` are idempotent. Stopping disconnects the
//! timer's channel, which wakes the thread at once instead of letting it
//! sleep out the rest of its interval.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::SensorConfig;
use crate::error::Result;

/// Which periodic job a timer drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Samples the focused file's size and metrics
    StateChange,
    /// Samples focus switches between files
    BufferTransition,
    /// Runs a delivery cycle
    Autosend,
}

impl TimerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerKind::StateChange => "state-change",
            TimerKind::BufferTransition => "buffer-transition",
            TimerKind::Autosend => "autosend",
        }
    }
}

enum TimerState {
    Stopped,
    Running {
        // Dropping the sender is the stop signal
        _stop: mpsc::Sender<()>,
        handle: JoinHandle<()>,
    },
}

/// A fixed-interval timer running its job on a dedicated thread
pub struct PeriodicTimer {
    kind: TimerKind,
    interval: Duration,
    state: Mutex<TimerState>,
    ticks: Arc<AtomicU64>,
}

impl PeriodicTimer {
    pub fn new(kind: TimerKind, interval: Duration) -> Self {
        Self {
            kind,
            interval,
            state: Mutex::new(TimerState::Stopped),
            ticks: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Start ticking. The first tick fires one interval from now.
    ///
    /// Returns false if the timer was already running.
    pub fn start<F>(&self, job: F) -> Result<bool>
    where
        F: Fn() + Send + 'static,
    {
        let mut state = self.state.lock();
        if matches!(*state, TimerState::Running { .. }) {
            return Ok(false);
        }

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let interval = self.interval;
        let ticks = Arc::clone(&self.ticks);
        let kind = self.kind;

        let handle = thread::Builder::new()
            .name(format!("devsensor-{}", kind.as_str()))
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        ticks.fetch_add(1, Ordering::SeqCst);
                        tracing::trace!(timer = kind.as_str(), "Timer tick");
                        job();
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;

        tracing::debug!(
            timer = self.kind.as_str(),
            interval_secs = self.interval.as_secs_f64(),
            "Timer started"
        );
        *state = TimerState::Running {
            _stop: stop_tx,
            handle,
        };
        Ok(true)
    }

    /// Stop the timer and wait for an in-progress tick to finish
    ///
    /// Returns false if the timer was not running. Safe to call from the
    /// timer's own job; the thread is then left to exit on its own.
    pub fn stop(&self) -> bool {
        let previous = std::mem::replace(&mut *self.state.lock(), TimerState::Stopped);
        match previous {
            TimerState::Stopped => false,
            TimerState::Running { _stop, handle } => {
                drop(_stop);
                if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                    tracing::warn!(timer = self.kind.as_str(), "Timer thread panicked");
                }
                tracing::debug!(timer = self.kind.as_str(), "Timer stopped");
                true
            }
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.state.lock(), TimerState::Running { .. })
    }

    /// Number of ticks fired since creation
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn kind(&self) -> TimerKind {
        self.kind
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Drop for PeriodicTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The sensor's three timers
pub struct Scheduler {
    timers: [PeriodicTimer; 3],
}

impl Scheduler {
    pub fn new(config: &SensorConfig) -> Self {
        Self::with_intervals(
            config.state_change_interval(),
            config.buffer_trans_interval(),
            config.autosend_interval(),
        )
    }

    pub fn with_intervals(
        state_change: Duration,
        buffer_transition: Duration,
        autosend: Duration,
    ) -> Self {
        Self {
            timers: [
                PeriodicTimer::new(TimerKind::StateChange, state_change),
                PeriodicTimer::new(TimerKind::BufferTransition, buffer_transition),
                PeriodicTimer::new(TimerKind::Autosend, autosend),
            ],
        }
    }

    pub fn timer(&self, kind: TimerKind) -> &PeriodicTimer {
        match kind {
            TimerKind::StateChange => &self.timers[0],
            TimerKind::BufferTransition => &self.timers[1],
            TimerKind::Autosend => &self.timers[2],
        }
    }

    pub fn start<F>(&self, kind: TimerKind, job: F) -> Result<bool>
    where
        F: Fn() + Send + 'static,
    {
        self.timer(kind).start(job)
    }

    /// Stop every timer; returns how many were running
    pub fn stop_all(&self) -> usize {
        self.timers.iter().filter(|t| t.stop()).count()
    }

    pub fn is_running(&self, kind: TimerKind) -> bool {
        self.timer(kind).is_running()
    }

    pub fn any_running(&self) -> bool {
        self.timers.iter().any(|t| t.is_running())
    }
}
