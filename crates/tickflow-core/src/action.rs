//! Agent-directed actions and their lifecycle.
//!
//! An [`Action`] pairs framework-owned lifecycle bookkeeping with a boxed
//! [`ActionKind`] supplied by the scenario. Kinds only implement per-tick
//! work and optional hooks; status transitions and the tick fields are
//! private to [`Action`] so a kind can never corrupt them.
//!
//! ```text
//! NotStarted --start--> InProgress --complete--> Completed
//!                            |
//!                            +------stop-------> Stopped
//! ```

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tickflow_types::{ActionId, ActionSpec, ActionStatus, Parameters};

use crate::context::TickContext;
use crate::error::InvariantViolation;
use crate::lifecycle;

/// Per-tick behaviour of one action kind.
pub trait ActionKind<S>: Send {
    /// Do one tick of work. Called on every tick the action is in progress,
    /// including the tick it starts and the tick it completes.
    fn step(&mut self, ctx: &mut TickContext<'_, S>);

    /// Called once when the action enters `InProgress`.
    fn on_start(&mut self, _ctx: &mut TickContext<'_, S>) {}

    /// Called once when the action is preempted.
    fn on_stop(&mut self, _ctx: &mut TickContext<'_, S>) {}

    /// Called once when the action completes.
    fn on_complete(&mut self, _ctx: &mut TickContext<'_, S>) {}

    /// Kind-specific parameters shown in summaries.
    fn parameters(&self) -> Parameters {
        Parameters::new()
    }
}

/// An action kind that can be offered to the decision-maker as a tool.
///
/// Instances are built from the flat argument mapping of a
/// [`ToolCall`](tickflow_types::ToolCall) through `serde`, and their
/// serialized form doubles as the summary parameters.
pub trait ActionTool<S>: ActionKind<S> + Serialize + DeserializeOwned + 'static {
    /// Static tool metadata: name, description, schema and scheduling.
    fn spec() -> ActionSpec;
}

/// Adapter that reports a tool's serialized fields as its parameters.
pub(crate) struct Registered<A>(pub(crate) A);

impl<S, A: ActionTool<S>> ActionKind<S> for Registered<A> {
    fn step(&mut self, ctx: &mut TickContext<'_, S>) {
        self.0.step(ctx);
    }

    fn on_start(&mut self, ctx: &mut TickContext<'_, S>) {
        self.0.on_start(ctx);
    }

    fn on_stop(&mut self, ctx: &mut TickContext<'_, S>) {
        self.0.on_stop(ctx);
    }

    fn on_complete(&mut self, ctx: &mut TickContext<'_, S>) {
        self.0.on_complete(ctx);
    }

    fn parameters(&self) -> Parameters {
        match serde_json::to_value(&self.0) {
            Ok(serde_json::Value::Object(fields)) => fields.into_iter().collect(),
            _ => self.0.parameters(),
        }
    }
}

/// One admitted action instance.
pub struct Action<S> {
    id: ActionId,
    spec: Arc<ActionSpec>,
    status: ActionStatus,
    tick_started: Option<u64>,
    tick_completed: Option<u64>,
    tick_stopped: Option<u64>,
    arguments: Parameters,
    kind: Box<dyn ActionKind<S>>,
}

impl<S> core::fmt::Debug for Action<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Action")
            .field("id", &self.id)
            .field("name", &self.spec.name)
            .field("status", &self.status)
            .field("tick_started", &self.tick_started)
            .field("tick_completed", &self.tick_completed)
            .field("tick_stopped", &self.tick_stopped)
            .finish_non_exhaustive()
    }
}

impl<S> Action<S> {
    /// Wrap a kind instance in a fresh `NotStarted` action.
    pub fn new(spec: Arc<ActionSpec>, arguments: Parameters, kind: Box<dyn ActionKind<S>>) -> Self {
        Self {
            id: ActionId::new(),
            spec,
            status: ActionStatus::NotStarted,
            tick_started: None,
            tick_completed: None,
            tick_stopped: None,
            arguments,
            kind,
        }
    }

    /// Instance identifier.
    pub const fn id(&self) -> ActionId {
        self.id
    }

    /// Tool name of the kind.
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Static metadata of the kind.
    pub fn spec(&self) -> &ActionSpec {
        &self.spec
    }

    /// Admission priority.
    pub fn priority(&self) -> i64 {
        self.spec.priority
    }

    /// Concurrency tag, if any.
    pub fn concurrency_tag(&self) -> Option<&str> {
        self.spec.concurrency_tag.as_deref()
    }

    /// Ticks needed to complete.
    pub fn ticks_required(&self) -> u64 {
        self.spec.ticks_required
    }

    /// Current lifecycle status.
    pub const fn status(&self) -> ActionStatus {
        self.status
    }

    /// Whether the action is in progress.
    pub fn is_running(&self) -> bool {
        self.status == ActionStatus::InProgress
    }

    /// Tick on which the action started.
    pub const fn tick_started(&self) -> Option<u64> {
        self.tick_started
    }

    /// Tick on which the action completed.
    pub const fn tick_completed(&self) -> Option<u64> {
        self.tick_completed
    }

    /// Tick on which the action was stopped.
    pub const fn tick_stopped(&self) -> Option<u64> {
        self.tick_stopped
    }

    /// Arguments the action was requested with.
    pub const fn arguments(&self) -> &Parameters {
        &self.arguments
    }

    /// Kind-specific parameters for summaries.
    pub fn parameters(&self) -> Parameters {
        self.kind.parameters()
    }

    /// Enter `InProgress`. No-op unless `NotStarted`; returns whether the
    /// transition happened.
    pub fn start(&mut self, ctx: &mut TickContext<'_, S>) -> bool {
        if self.status != ActionStatus::NotStarted {
            return false;
        }
        self.status = ActionStatus::InProgress;
        self.tick_started = Some(ctx.tick());
        self.kind.on_start(ctx);
        true
    }

    /// Run one tick of the kind's work. No-op unless `InProgress`.
    pub fn step(&mut self, ctx: &mut TickContext<'_, S>) {
        if self.status != ActionStatus::InProgress {
            return;
        }
        self.kind.step(ctx);
    }

    /// Enter `Completed`. No-op unless `InProgress`.
    pub fn complete(&mut self, ctx: &mut TickContext<'_, S>) -> bool {
        if self.status != ActionStatus::InProgress {
            return false;
        }
        self.status = ActionStatus::Completed;
        self.tick_completed = Some(ctx.tick());
        self.kind.on_complete(ctx);
        true
    }

    /// Enter `Stopped`. No-op unless `InProgress`.
    pub fn stop(&mut self, ctx: &mut TickContext<'_, S>) -> bool {
        if self.status != ActionStatus::InProgress {
            return false;
        }
        self.status = ActionStatus::Stopped;
        self.tick_stopped = Some(ctx.tick());
        self.kind.on_stop(ctx);
        true
    }

    /// Whether the action has run for `ticks_required` ticks by `current`.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantViolation`] if `current` precedes the start tick.
    pub fn has_elapsed_duration(&self, current: u64) -> Result<bool, InvariantViolation> {
        lifecycle::has_elapsed_duration(
            "action",
            &self.spec.name,
            self.tick_started,
            self.spec.ticks_required,
            current,
        )
    }

    /// Verify that the tick fields agree with the status.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantViolation`] describing the first broken rule.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let broken = |reason: &str| -> Result<(), InvariantViolation> {
            Err(InvariantViolation::new("action", self.name(), reason))
        };
        match self.status {
            ActionStatus::NotStarted => {
                if self.tick_started.is_some()
                    || self.tick_completed.is_some()
                    || self.tick_stopped.is_some()
                {
                    return broken("not started but carries lifecycle ticks");
                }
            }
            ActionStatus::InProgress => {
                if self.tick_started.is_none() {
                    return broken("in progress without a start tick");
                }
                if self.tick_completed.is_some() || self.tick_stopped.is_some() {
                    return broken("in progress but carries a terminal tick");
                }
            }
            ActionStatus::Completed => {
                if self.tick_stopped.is_some() {
                    return broken("both completed and stopped");
                }
                let (Some(started), Some(completed)) = (self.tick_started, self.tick_completed)
                else {
                    return broken("completed without start and completion ticks");
                };
                if lifecycle::ticks_elapsed(Some(started), completed) < self.spec.ticks_required {
                    return broken("completed before ticks_required elapsed");
                }
            }
            ActionStatus::Stopped => {
                if self.tick_completed.is_some() {
                    return broken("both stopped and completed");
                }
                if self.tick_stopped.is_none() {
                    return broken("stopped without a stop tick");
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde::Deserialize;

    use super::*;

    #[derive(Serialize, Deserialize)]
    struct Dig {
        depth: f64,
    }

    impl ActionKind<f64> for Dig {
        fn step(&mut self, ctx: &mut TickContext<'_, f64>) {
            *ctx.world_mut() += self.depth;
        }
    }

    impl ActionTool<f64> for Dig {
        fn spec() -> ActionSpec {
            ActionSpec::new("dig", "Dig a hole.").with_ticks_required(2)
        }
    }

    fn dig() -> Action<f64> {
        Action::new(
            Arc::new(Dig::spec()),
            Parameters::new(),
            Box::new(Registered(Dig { depth: 1.5 })),
        )
    }

    #[test]
    fn lifecycle_runs_to_completion() {
        let mut world = 0.0;
        let mut rng = StdRng::seed_from_u64(0);
        let mut action = dig();

        let mut ctx = TickContext::new(3, &mut world, &mut rng);
        assert!(action.start(&mut ctx));
        action.step(&mut ctx);
        assert!(!action.has_elapsed_duration(3).unwrap());

        let mut ctx = TickContext::new(4, &mut world, &mut rng);
        action.step(&mut ctx);
        assert!(action.has_elapsed_duration(4).unwrap());
        assert!(action.complete(&mut ctx));

        assert_eq!(action.status(), ActionStatus::Completed);
        assert_eq!(action.tick_started(), Some(3));
        assert_eq!(action.tick_completed(), Some(4));
        assert!((world - 3.0).abs() < f64::EPSILON);
        action.check_invariants().unwrap();
    }

    #[test]
    fn terminal_transitions_are_exclusive() {
        let mut world = 0.0;
        let mut rng = StdRng::seed_from_u64(0);
        let mut action = dig();
        let mut ctx = TickContext::new(1, &mut world, &mut rng);

        assert!(!action.stop(&mut ctx), "cannot stop before starting");
        action.start(&mut ctx);
        assert!(action.stop(&mut ctx));
        assert!(!action.complete(&mut ctx));
        assert!(!action.start(&mut ctx));
        action.step(&mut ctx);

        assert_eq!(action.status(), ActionStatus::Stopped);
        assert_eq!(action.tick_completed(), None);
        assert!((world - 0.0).abs() < f64::EPSILON);
        action.check_invariants().unwrap();
    }

    #[test]
    fn registered_tool_reports_serialized_fields() {
        let action = dig();
        let params = action.parameters();
        assert_eq!(params.get("depth"), Some(&serde_json::json!(1.5)));
    }

    #[test]
    fn early_completion_breaks_invariants() {
        let mut world = 0.0;
        let mut rng = StdRng::seed_from_u64(0);
        let mut action = dig();
        let mut ctx = TickContext::new(1, &mut world, &mut rng);
        action.start(&mut ctx);
        action.complete(&mut ctx);
        assert!(action.check_invariants().is_err());
    }
}
