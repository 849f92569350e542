//! Shared run control for the world and decision loops.
//!
//! Both loops hold an [`Arc<RunControl>`](std::sync::Arc) and consult it
//! between turns, never mid-turn. A caller outside the runner can use the
//! same handle to pause, resume, retime or stop a run.
//!
//! All mutable fields are atomics so checking them never contends with the
//! scheduling lock.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio::time::Instant;

/// Reason a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunEndReason {
    /// The clock reached `max_ticks`.
    MaxTicksReached,
    /// A stop was requested.
    StopRequested,
}

/// Pause, stop and pacing state shared by both loops.
#[derive(Debug)]
pub struct RunControl {
    /// Whether the loops should park between turns.
    paused: AtomicBool,

    /// Wakes parked loops on resume or stop.
    wake: Notify,

    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Real-time milliseconds per tick (runtime-adjustable).
    tick_interval_ms: AtomicU64,

    /// Tick bound; `None` runs until stopped.
    max_ticks: Option<u64>,
}

impl RunControl {
    /// Create control state for a run.
    pub fn new(tick_interval_ms: u64, max_ticks: Option<u64>) -> Self {
        Self {
            paused: AtomicBool::new(false),
            wake: Notify::new(),
            stop_requested: AtomicBool::new(false),
            tick_interval_ms: AtomicU64::new(tick_interval_ms),
            max_ticks,
        }
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Check whether the run is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Pause both loops at their next turn boundary.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume both loops.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.wake.notify_waiters();
    }

    /// Wait until the run is no longer paused, or a stop is requested.
    pub async fn wait_if_paused(&self) {
        loop {
            let woken = self.wake.notified();
            if !self.is_paused() || self.is_stop_requested() {
                return;
            }
            woken.await;
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Request a clean stop. Parked loops are woken so they can exit.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.wake.notify_waiters();
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Sleep for `duration`, returning early if a stop is requested.
    ///
    /// A zero duration yields to the scheduler once so the other loop gets
    /// a chance at the lock.
    pub async fn sleep(&self, duration: Duration) {
        if duration.is_zero() {
            tokio::task::yield_now().await;
            return;
        }
        let deadline = Instant::now().checked_add(duration);
        loop {
            let woken = self.wake.notified();
            if self.is_stop_requested() {
                return;
            }
            match deadline {
                Some(deadline) => {
                    tokio::select! {
                        () = tokio::time::sleep_until(deadline) => return,
                        () = woken => {}
                    }
                }
                None => woken.await,
            }
        }
    }

    // -----------------------------------------------------------------------
    // Tick Speed
    // -----------------------------------------------------------------------

    /// Current tick interval in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    /// Change the tick interval. Returns the previous interval.
    pub fn set_tick_interval_ms(&self, ms: u64) -> u64 {
        self.tick_interval_ms.swap(ms, Ordering::AcqRel)
    }

    // -----------------------------------------------------------------------
    // Boundaries
    // -----------------------------------------------------------------------

    /// Configured tick bound.
    pub const fn max_ticks(&self) -> Option<u64> {
        self.max_ticks
    }

    /// Whether `tick` has reached the bound.
    pub fn tick_limit_reached(&self, tick: u64) -> bool {
        self.max_ticks.is_some_and(|max| tick >= max)
    }

    /// Whether a loop may take another turn at `tick`.
    pub fn should_continue(&self, tick: u64) -> bool {
        !self.is_stop_requested() && !self.tick_limit_reached(tick)
    }

    /// Why the run ends at `tick`, if it does.
    pub fn end_reason(&self, tick: u64) -> Option<RunEndReason> {
        if self.is_stop_requested() {
            Some(RunEndReason::StopRequested)
        } else if self.tick_limit_reached(tick) {
            Some(RunEndReason::MaxTicksReached)
        } else {
            None
        }
    }
}
