//! Goal tracking against domain state.

use rand::Rng;
use tickflow_types::{ObjectiveId, ObjectiveStatus, Parameters};

use crate::context::TickContext;
use crate::error::ConfigurationError;

/// Predicates deciding whether a goal has been met or missed.
///
/// Both predicates must be free of side effects: they may be evaluated on
/// any tick the objective is in progress. Anything an objective does to the
/// world belongs in [`step`](Self::step).
pub trait ObjectiveKind<S>: Send {
    /// Display name of the objective.
    fn name(&self) -> &str;

    /// Human description shown in summaries.
    fn description(&self) -> &str {
        ""
    }

    /// Per-tick work, run just before the predicates are evaluated.
    fn step(&mut self, _ctx: &mut TickContext<'_, S>) {}

    /// Whether the goal is met on `tick`.
    fn is_completed(&self, world: &S, tick: u64) -> bool;

    /// Whether the goal can no longer be met. Only consulted when
    /// [`is_completed`](Self::is_completed) is false.
    fn is_failed(&self, _world: &S, _tick: u64) -> bool {
        false
    }

    /// Kind-specific parameters shown in summaries.
    fn parameters(&self) -> Parameters {
        Parameters::new()
    }
}

/// One tracked objective.
pub struct Objective<S> {
    id: ObjectiveId,
    tick_start: u64,
    probability: f64,
    status: ObjectiveStatus,
    tick_done: Option<u64>,
    kind: Box<dyn ObjectiveKind<S>>,
}

impl<S> core::fmt::Debug for Objective<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Objective")
            .field("id", &self.id)
            .field("name", &self.kind.name())
            .field("tick_start", &self.tick_start)
            .field("probability", &self.probability)
            .field("status", &self.status)
            .field("tick_done", &self.tick_done)
            .finish_non_exhaustive()
    }
}

impl<S> Objective<S> {
    /// Track `kind` from `tick_start` on.
    pub fn new(tick_start: u64, kind: Box<dyn ObjectiveKind<S>>) -> Self {
        Self {
            id: ObjectiveId::new(),
            tick_start,
            probability: 1.0,
            status: ObjectiveStatus::NotStarted,
            tick_done: None,
            kind,
        }
    }

    /// Gate the kind's [`step`](ObjectiveKind::step) so it runs on a given
    /// in-progress tick with chance `probability`. Evaluation is not gated.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidObjective`] for a probability
    /// outside `[0, 1]`.
    pub fn with_probability(mut self, probability: f64) -> Result<Self, ConfigurationError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(ConfigurationError::InvalidObjective {
                name: self.kind.name().to_owned(),
                reason: format!("probability {probability} is outside [0, 1]"),
            });
        }
        self.probability = probability;
        Ok(self)
    }

    /// Objective identifier.
    pub const fn id(&self) -> ObjectiveId {
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

    /// Tick from which the objective is evaluated.
    pub const fn tick_start(&self) -> u64 {
        self.tick_start
    }

    /// Chance that the kind's step runs on a given tick.
    pub const fn probability(&self) -> f64 {
        self.probability
    }

    /// Current lifecycle status.
    pub const fn status(&self) -> ObjectiveStatus {
        self.status
    }

    /// Tick on which the objective completed or failed.
    pub const fn tick_done(&self) -> Option<u64> {
        self.tick_done
    }

    /// Whether a not-yet-started objective may start on `tick`.
    pub fn is_due(&self, tick: u64) -> bool {
        self.status == ObjectiveStatus::NotStarted && tick >= self.tick_start
    }

    /// Enter `InProgress`. No-op unless `NotStarted`.
    pub fn start(&mut self) -> bool {
        if self.status != ObjectiveStatus::NotStarted {
            return false;
        }
        self.status = ObjectiveStatus::InProgress;
        true
    }

    /// Run the kind's per-tick work, subject to the probability gate.
    /// No-op unless `InProgress`.
    pub fn step(&mut self, ctx: &mut TickContext<'_, S>) {
        if self.status != ObjectiveStatus::InProgress {
            return;
        }
        if self.probability < 1.0 && !ctx.rng().random_bool(self.probability) {
            return;
        }
        self.kind.step(ctx);
    }

    /// Evaluate the predicates and settle the objective if one holds.
    ///
    /// Completion wins over failure on the same tick. Does nothing unless
    /// the objective is in progress, so a settled status never changes.
    pub fn check_completion(&mut self, world: &S, tick: u64) -> ObjectiveStatus {
        if self.status != ObjectiveStatus::InProgress {
            return self.status;
        }
        if self.kind.is_completed(world, tick) {
            self.status = ObjectiveStatus::Completed;
            self.tick_done = Some(tick);
        } else if self.kind.is_failed(world, tick) {
            self.status = ObjectiveStatus::Failed;
            self.tick_done = Some(tick);
        }
        self.status
    }
}
