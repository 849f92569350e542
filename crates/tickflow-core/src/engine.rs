//! The tick scheduler.
//!
//! [`Engine`] owns the world state, the environment, every action, event
//! and objective, and the agent-facing [`SystemState`]. Two operations
//! mutate it and they must never interleave:
//!
//! - [`Engine::step`] runs one tick in a fixed order: environment, actions,
//!   events, objectives, snapshot.
//! - [`Engine::execute_action`] admits (or rejects) a decision-maker
//!   request, preempting lower-priority conflicting actions.
//!
//! The clock is advanced separately through [`Engine::advance_clock`] so
//! the world loop decides when time moves.

use rand::SeedableRng;
use rand::rngs::StdRng;
use tickflow_types::{
    ActionFeedback, ActionStatus, AdmissionReason, EventStatus, ObjectiveStatus, Observation,
    Parameters, SystemState,
};
use tracing::{debug, info};

use crate::action::Action;
use crate::clock::{ClockError, SimClock};
use crate::context::TickContext;
use crate::environment::Environment;
use crate::error::{ConfigurationError, InvariantViolation};
use crate::event::Event;
use crate::objective::Objective;
use crate::observation::{ObservationError, ObservationPolicy};
use crate::registry::ActionRegistry;
use crate::snapshot;

/// Errors raised while stepping the engine or admitting an action.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A request named an unknown tool or carried malformed arguments.
    #[error("configuration error: {source}")]
    Configuration {
        /// The underlying configuration error.
        #[from]
        source: ConfigurationError,
    },

    /// An entity broke a lifecycle invariant.
    #[error("state invariant violation: {source}")]
    StateInvariantViolation {
        /// The broken invariant.
        #[from]
        source: InvariantViolation,
    },

    /// The clock could not advance.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// Scheduler state for one simulation run.
pub struct Engine<S> {
    clock: SimClock,
    world: S,
    rng: StdRng,
    environment: Box<dyn Environment<S>>,
    registry: ActionRegistry<S>,
    actions: Vec<Action<S>>,
    events: Vec<Event<S>>,
    objectives: Vec<Objective<S>>,
    system_state: SystemState,
}

impl<S: core::fmt::Debug> core::fmt::Debug for Engine<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Engine")
            .field("tick", &self.clock.tick())
            .field("world", &self.world)
            .field("registry", &self.registry)
            .field("actions", &self.actions)
            .field("events", &self.events)
            .field("objectives", &self.objectives)
            .finish_non_exhaustive()
    }
}

impl<S> Engine<S> {
    /// Create an engine at tick 0 with no events or objectives.
    pub fn new(
        world: S,
        environment: Box<dyn Environment<S>>,
        registry: ActionRegistry<S>,
        seed: u64,
    ) -> Self {
        Self {
            clock: SimClock::new(),
            world,
            rng: StdRng::seed_from_u64(seed),
            environment,
            registry,
            actions: Vec::new(),
            events: Vec::new(),
            objectives: Vec::new(),
            system_state: SystemState::default(),
        }
    }

    /// Add a scheduled event. Events run in insertion order.
    pub fn add_event(&mut self, event: Event<S>) {
        self.events.push(event);
        self.refresh_system_state();
    }

    /// Add an objective. Objectives are evaluated in insertion order.
    pub fn add_objective(&mut self, objective: Objective<S>) {
        self.objectives.push(objective);
        self.refresh_system_state();
    }

    /// Current tick.
    pub const fn tick(&self) -> u64 {
        self.clock.tick()
    }

    /// The domain world state.
    pub const fn world(&self) -> &S {
        &self.world
    }

    /// Mutable access to the domain world state, for setup and tests.
    pub const fn world_mut(&mut self) -> &mut S {
        &mut self.world
    }

    /// The tools the decision-maker may call.
    pub const fn registry(&self) -> &ActionRegistry<S> {
        &self.registry
    }

    /// Every admitted action, finished ones included until pruned.
    pub fn actions(&self) -> &[Action<S>] {
        &self.actions
    }

    /// Every scheduled event.
    pub fn events(&self) -> &[Event<S>] {
        &self.events
    }

    /// Every objective.
    pub fn objectives(&self) -> &[Objective<S>] {
        &self.objectives
    }

    /// The agent-facing snapshot as of the last step or admission.
    pub const fn system_state(&self) -> &SystemState {
        &self.system_state
    }

    /// Move the clock forward one tick.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] at `u64::MAX`.
    pub fn advance_clock(&mut self) -> Result<u64, ClockError> {
        self.clock.advance()
    }

    /// Put the clock at `tick`, for resuming a saved run.
    ///
    /// Entities keep their lifecycle ticks. A tick earlier than a running
    /// entity's start makes the next [`step`](Self::step) fail with
    /// [`EngineError::StateInvariantViolation`].
    pub const fn restore_clock(&mut self, tick: u64) {
        self.clock = SimClock::starting_at(tick);
    }

    /// Build an observation of the current tick through `policy`.
    ///
    /// # Errors
    ///
    /// Returns whatever the policy reports.
    pub fn observe(&self, policy: &dyn ObservationPolicy<S>) -> Result<Observation, ObservationError> {
        policy.build(self.clock.tick(), &self.world, &self.system_state)
    }

    /// Run one tick.
    ///
    /// Each entity moves at most one lifecycle phase per tick: an action or
    /// objective that starts on this tick is first stepped or evaluated on
    /// the next one.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::StateInvariantViolation`] if an entity's
    /// lifecycle fields disagree with its status, or if the clock reads
    /// earlier than a start tick.
    pub fn step(&mut self) -> Result<(), EngineError> {
        let tick = self.clock.tick();
        let Self {
            world,
            rng,
            environment,
            actions,
            events,
            objectives,
            ..
        } = self;

        environment.step(&mut TickContext::new(tick, world, rng));

        for action in actions.iter_mut() {
            let mut ctx = TickContext::new(tick, world, rng);
            match action.status() {
                ActionStatus::NotStarted => {
                    action.start(&mut ctx);
                }
                ActionStatus::InProgress => {
                    action.step(&mut ctx);
                    if action.is_running() && action.has_elapsed_duration(tick)? {
                        action.complete(&mut ctx);
                    }
                }
                ActionStatus::Completed | ActionStatus::Stopped => {}
            }
            debug!(
                tick,
                action = action.name(),
                status = %action.status(),
                started = ?action.tick_started(),
                completed = ?action.tick_completed(),
                stopped = ?action.tick_stopped(),
                priority = action.priority(),
                tag = ?action.concurrency_tag(),
                "Action status"
            );
        }
        for action in actions.iter() {
            action.check_invariants()?;
        }

        for event in events.iter_mut() {
            if event.is_due(tick) {
                event.start(tick);
            }
            if event.status() == EventStatus::InProgress {
                event.step(&mut TickContext::new(tick, world, rng));
                if event.has_elapsed_duration(tick)? {
                    event.complete(tick);
                }
            }
            debug!(
                tick,
                event = event.name(),
                status = %event.status(),
                started = ?event.tick_started(),
                completed = ?event.tick_completed(),
                "Event status"
            );
        }

        for objective in objectives.iter_mut() {
            match objective.status() {
                ObjectiveStatus::InProgress => {
                    objective.step(&mut TickContext::new(tick, world, rng));
                    let status = objective.check_completion(world, tick);
                    if status.is_terminal() {
                        info!(tick, objective = objective.name(), ?status, "Objective settled");
                    }
                }
                ObjectiveStatus::NotStarted if objective.is_due(tick) => {
                    objective.start();
                }
                ObjectiveStatus::NotStarted
                | ObjectiveStatus::Completed
                | ObjectiveStatus::Failed => {}
            }
        }

        self.refresh_system_state();
        Ok(())
    }

    /// Admit, preempt for, or reject a decision-maker request.
    ///
    /// The new action only conflicts with running actions that carry the
    /// same concurrency tag. Ties go to the running action. Rejection is a
    /// normal outcome reported in the returned feedback.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Configuration`] for an unknown tool or
    /// arguments the tool cannot be built from.
    pub fn execute_action(
        &mut self,
        tool_name: &str,
        arguments: &Parameters,
    ) -> Result<ActionFeedback, EngineError> {
        let tick = self.clock.tick();
        let action = self.registry.instantiate(tool_name, arguments)?;
        let tag = action.concurrency_tag().map(str::to_owned);
        let conflicts_with = |running: &Action<S>| {
            running.status() == ActionStatus::InProgress
                && tag.is_some()
                && running.concurrency_tag() == tag.as_deref()
        };

        let conflicts: Vec<_> = self
            .actions
            .iter()
            .filter(|running| conflicts_with(running))
            .map(|running| snapshot::action_summary(running, tick))
            .collect();
        let highest = conflicts.iter().map(|summary| summary.priority).max();
        let conflict_names: Vec<&str> = conflicts.iter().map(|s| s.name.as_str()).collect();
        debug!(
            tick,
            requested = tool_name,
            conflicts = ?conflict_names,
            highest = ?highest,
            incoming = action.priority(),
            "Admission check"
        );

        let feedback = match highest {
            None => {
                let started = snapshot::action_summary(&action, tick);
                self.actions.push(action);
                ActionFeedback {
                    requested_action: tool_name.to_owned(),
                    arguments: arguments.clone(),
                    accepted: true,
                    reason: AdmissionReason::AcceptedNoConflict,
                    tick,
                    conflicts,
                    preempted: Vec::new(),
                    started_action: Some(started),
                }
            }
            Some(highest) if highest >= action.priority() => ActionFeedback {
                requested_action: tool_name.to_owned(),
                arguments: arguments.clone(),
                accepted: false,
                reason: AdmissionReason::RejectedHigherOrEqualPriorityConflict,
                tick,
                conflicts,
                preempted: Vec::new(),
                started_action: None,
            },
            Some(_) => {
                let Self {
                    world,
                    rng,
                    actions,
                    ..
                } = self;
                let mut ctx = TickContext::new(tick, world, rng);
                let mut preempted = Vec::new();
                for running in actions.iter_mut().filter(|running| conflicts_with(running)) {
                    running.stop(&mut ctx);
                    preempted.push(snapshot::action_summary(running, tick));
                }
                let started = snapshot::action_summary(&action, tick);
                actions.push(action);
                ActionFeedback {
                    requested_action: tool_name.to_owned(),
                    arguments: arguments.clone(),
                    accepted: true,
                    reason: AdmissionReason::AcceptedPreemptedLowerPriority,
                    tick,
                    conflicts,
                    preempted,
                    started_action: Some(started),
                }
            }
        };

        info!(
            tick,
            action = tool_name,
            accepted = feedback.accepted,
            reason = %feedback.reason,
            preempted = feedback.preempted.len(),
            "Action request handled"
        );
        self.system_state.last_action_feedback = Some(feedback.clone());
        self.refresh_system_state();
        Ok(feedback)
    }

    /// Drop stopped and completed actions. Returns how many were removed.
    pub fn prune_finished_actions(&mut self) -> usize {
        let before = self.actions.len();
        self.actions.retain(|action| !action.status().is_terminal());
        let removed = before.saturating_sub(self.actions.len());
        if removed > 0 {
            self.refresh_system_state();
        }
        removed
    }

    /// Rebuild the agent-facing snapshot from current entity state.
    pub fn refresh_system_state(&mut self) {
        let feedback = self.system_state.last_action_feedback.take();
        self.system_state = snapshot::system_state(
            self.clock.tick(),
            &self.actions,
            &self.events,
            &self.objectives,
            feedback,
        );
    }
}
