//! Tick arithmetic shared by the action, event and objective lifecycles.
//!
//! Elapsed time is inclusive of the current tick: an entity started on
//! tick 5 has run for one tick when observed on tick 5.

use crate::error::InvariantViolation;

/// Inclusive ticks elapsed since `tick_started`, or 0 if not started.
///
/// Saturates at 0 when `current` lies before the start tick; use
/// [`has_elapsed_duration`] where running backwards must be reported.
pub const fn ticks_elapsed(tick_started: Option<u64>, current: u64) -> u64 {
    match tick_started {
        Some(started) if current >= started => current.saturating_sub(started).saturating_add(1),
        _ => 0,
    }
}

/// Whether an entity started on `tick_started` has run for `required` ticks
/// by `current`.
///
/// Returns `Ok(false)` when the entity never started.
///
/// # Errors
///
/// Returns [`InvariantViolation`] if `current` is earlier than the start
/// tick, which means simulated time went backwards.
pub fn has_elapsed_duration(
    entity: &'static str,
    name: &str,
    tick_started: Option<u64>,
    required: u64,
    current: u64,
) -> Result<bool, InvariantViolation> {
    let Some(started) = tick_started else {
        return Ok(false);
    };
    if current < started {
        return Err(InvariantViolation::new(
            entity,
            name,
            format!("current tick {current} precedes start tick {started}"),
        ));
    }
    Ok(ticks_elapsed(Some(started), current) >= required)
}
