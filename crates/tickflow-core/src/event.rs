//! Time-scheduled events.
//!
//! Events are fixed at scenario construction and run on their own
//! schedule; the decision-maker cannot trigger or cancel them. Whether it
//! can *see* them is governed by [`EventAwareness`].

use rand::Rng;
use serde::{Deserialize, Serialize};
use tickflow_types::{EventAwareness, EventId, EventStatus, Parameters};

use crate::context::TickContext;
use crate::error::{ConfigurationError, InvariantViolation};
use crate::lifecycle;

/// Per-tick behaviour of one event kind.
pub trait EventKind<S>: Send {
    /// Display name of the event.
    fn name(&self) -> &str;

    /// Human description shown in summaries.
    fn description(&self) -> &str {
        ""
    }

    /// Apply one tick of the event's effect.
    fn step(&mut self, ctx: &mut TickContext<'_, S>);

    /// Kind-specific parameters shown in summaries.
    fn parameters(&self) -> Parameters {
        Parameters::new()
    }
}

/// When an event runs, how long, how visibly, and how reliably.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventSchedule {
    /// First tick on which the event may start.
    pub tick_start: u64,
    /// Ticks the event lasts once started.
    pub tick_duration: u64,
    /// What the decision-maker may see of the event.
    #[serde(default)]
    pub awareness: EventAwareness,
    /// Chance that the effect runs on a given in-progress tick.
    #[serde(default = "default_probability")]
    pub probability: f64,
}

impl EventSchedule {
    /// A present-only schedule whose effect runs on every tick.
    pub const fn new(tick_start: u64, tick_duration: u64) -> Self {
        Self {
            tick_start,
            tick_duration,
            awareness: EventAwareness::PresentOnly,
            probability: 1.0,
        }
    }

    /// Set the awareness level.
    #[must_use]
    pub const fn with_awareness(mut self, awareness: EventAwareness) -> Self {
        self.awareness = awareness;
        self
    }

    /// Set the per-tick effect probability.
    #[must_use]
    pub const fn with_probability(mut self, probability: f64) -> Self {
        self.probability = probability;
        self
    }

    fn validate(&self, name: &str) -> Result<(), ConfigurationError> {
        if self.tick_duration == 0 {
            return Err(ConfigurationError::InvalidEventSchedule {
                name: name.to_owned(),
                reason: String::from("tick_duration must be at least 1"),
            });
        }
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(ConfigurationError::InvalidEventSchedule {
                name: name.to_owned(),
                reason: format!("probability {} is outside [0, 1]", self.probability),
            });
        }
        Ok(())
    }
}

const fn default_probability() -> f64 {
    1.0
}

/// One scheduled event instance.
pub struct Event<S> {
    id: EventId,
    schedule: EventSchedule,
    status: EventStatus,
    tick_started: Option<u64>,
    tick_completed: Option<u64>,
    kind: Box<dyn EventKind<S>>,
}

impl<S> core::fmt::Debug for Event<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Event")
            .field("id", &self.id)
            .field("name", &self.kind.name())
            .field("schedule", &self.schedule)
            .field("status", &self.status)
            .field("tick_started", &self.tick_started)
            .field("tick_completed", &self.tick_completed)
            .finish_non_exhaustive()
    }
}

impl<S> Event<S> {
    /// Schedule `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidEventSchedule`] for a zero
    /// duration or a probability outside `[0, 1]`.
    pub fn new(schedule: EventSchedule, kind: Box<dyn EventKind<S>>) -> Result<Self, ConfigurationError> {
        schedule.validate(kind.name())?;
        Ok(Self {
            id: EventId::new(),
            schedule,
            status: EventStatus::NotStarted,
            tick_started: None,
            tick_completed: None,
            kind,
        })
    }

    /// Event identifier.
    pub const fn id(&self) -> EventId {
        self.id
    }

    /// Display name of the kind.
    pub fn name(&self) -> &str {
        self.kind.name()
    }

    /// Human description of the kind.
    pub fn description(&self) -> &str {
        self.kind.description()
    }

    /// Kind-specific parameters.
    pub fn parameters(&self) -> Parameters {
        self.kind.parameters()
    }

    /// The schedule the event was built with.
    pub const fn schedule(&self) -> &EventSchedule {
        &self.schedule
    }

    /// Current lifecycle status.
    pub const fn status(&self) -> EventStatus {
        self.status
    }

    /// Tick on which the event started.
    pub const fn tick_started(&self) -> Option<u64> {
        self.tick_started
    }

    /// Tick on which the event completed.
    pub const fn tick_completed(&self) -> Option<u64> {
        self.tick_completed
    }

    /// Whether a not-yet-started event may start on `tick`.
    pub fn is_due(&self, tick: u64) -> bool {
        self.status == EventStatus::NotStarted && tick >= self.schedule.tick_start
    }

    /// Whether the decision-maker may see the event right now.
    pub fn is_observable(&self) -> bool {
        match self.schedule.awareness {
            EventAwareness::Omniscient => self.status != EventStatus::Completed,
            EventAwareness::PresentOnly => self.status == EventStatus::InProgress,
        }
    }

    /// Enter `InProgress`. No-op unless `NotStarted`.
    pub fn start(&mut self, tick: u64) -> bool {
        if self.status != EventStatus::NotStarted {
            return false;
        }
        self.status = EventStatus::InProgress;
        self.tick_started = Some(tick);
        true
    }

    /// Apply one tick of the effect, subject to the probability gate.
    /// No-op unless `InProgress`.
    pub fn step(&mut self, ctx: &mut TickContext<'_, S>) {
        if self.status != EventStatus::InProgress {
            return;
        }
        if self.schedule.probability < 1.0 && !ctx.rng().random_bool(self.schedule.probability) {
            return;
        }
        self.kind.step(ctx);
    }

    /// Enter `Completed`. No-op unless `InProgress`.
    pub fn complete(&mut self, tick: u64) -> bool {
        if self.status != EventStatus::InProgress {
            return false;
        }
        self.status = EventStatus::Completed;
        self.tick_completed = Some(tick);
        true
    }

    /// Whether the event has run for its full duration by `current`.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantViolation`] if `current` precedes the start tick.
    pub fn has_elapsed_duration(&self, current: u64) -> Result<bool, InvariantViolation> {
        lifecycle::has_elapsed_duration(
            "event",
            self.kind.name(),
            self.tick_started,
            self.schedule.tick_duration,
            current,
        )
    }
}
