//! Simulation clock.
//!
//! The clock is the single source of truth for simulated time. It only
//! moves forward, one tick at a time, and only when the world loop asks it
//! to. Entities read the tick through their [`TickContext`]; they never
//! advance it.
//!
//! [`TickContext`]: crate::context::TickContext

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,
}

/// Monotonic tick counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimClock {
    /// Current tick number (0-indexed).
    tick: u64,
}

impl SimClock {
    /// Create a clock at tick 0.
    pub const fn new() -> Self {
        Self { tick: 0 }
    }

    /// Create a clock at an arbitrary tick (useful for testing and for
    /// resuming a scenario mid-way).
    pub const fn starting_at(tick: u64) -> Self {
        Self { tick }
    }

    /// Advance the clock by one tick. Returns the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the tick counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.tick)
    }

    /// Return the current tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn clock_starts_at_tick_zero() {
        assert_eq!(SimClock::new().tick(), 0);
    }

    #[test]
    fn clock_advances() {
        let mut clock = SimClock::new();
        assert_eq!(clock.advance().unwrap(), 1);
        assert_eq!(clock.advance().unwrap(), 2);
        assert_eq!(clock.tick(), 2);
    }

    #[test]
    fn starting_at_restores_tick() {
        let mut clock = SimClock::starting_at(500);
        assert_eq!(clock.tick(), 500);
        assert_eq!(clock.advance().unwrap(), 501);
    }

    #[test]
    fn advance_past_max_overflows() {
        let mut clock = SimClock::starting_at(u64::MAX);
        assert!(matches!(clock.advance(), Err(ClockError::TickOverflow)));
        assert_eq!(clock.tick(), u64::MAX);
    }
}
