//! Scenario assembly.
//!
//! A [`Scenario`] bundles everything a run needs: identity, the initial
//! world state, the environment, the tool registry, scheduled events,
//! objectives and optionally a custom observation policy.

use tickflow_types::Briefing;

use crate::action::ActionTool;
use crate::engine::Engine;
use crate::environment::Environment;
use crate::error::ConfigurationError;
use crate::event::{Event, EventKind, EventSchedule};
use crate::objective::{Objective, ObjectiveKind};
use crate::observation::ObservationPolicy;
use crate::registry::ActionRegistry;

/// A complete, runnable scenario.
pub struct Scenario<S> {
    name: String,
    description: String,
    world: S,
    environment: Box<dyn Environment<S>>,
    registry: ActionRegistry<S>,
    events: Vec<Event<S>>,
    objectives: Vec<Objective<S>>,
    observation_policy: Option<Box<dyn ObservationPolicy<S>>>,
}

impl<S> core::fmt::Debug for Scenario<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("registry", &self.registry)
            .field("events", &self.events)
            .field("objectives", &self.objectives)
            .finish_non_exhaustive()
    }
}

impl<S: 'static> Scenario<S> {
    /// Start a scenario with no tools beyond `do_nothing`.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        world: S,
        environment: impl Environment<S> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            world,
            environment: Box::new(environment),
            registry: ActionRegistry::new(),
            events: Vec::new(),
            objectives: Vec::new(),
            observation_policy: None,
        }
    }

    /// Offer tool `A` to the decision-maker.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if the tool name is already taken or
    /// its spec is invalid.
    pub fn with_action<A: ActionTool<S>>(mut self) -> Result<Self, ConfigurationError> {
        self.registry.register::<A>()?;
        Ok(self)
    }

    /// Schedule an event.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidEventSchedule`] for an invalid
    /// schedule.
    pub fn with_event(
        mut self,
        schedule: EventSchedule,
        kind: impl EventKind<S> + 'static,
    ) -> Result<Self, ConfigurationError> {
        self.events.push(Event::new(schedule, Box::new(kind))?);
        Ok(self)
    }

    /// Track an objective from `tick_start` on.
    #[must_use]
    pub fn with_objective(mut self, tick_start: u64, kind: impl ObjectiveKind<S> + 'static) -> Self {
        self.objectives.push(Objective::new(tick_start, Box::new(kind)));
        self
    }

    /// Track an objective whose per-tick step runs with chance
    /// `probability`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidObjective`] for a probability
    /// outside `[0, 1]`.
    pub fn with_stochastic_objective(
        mut self,
        tick_start: u64,
        probability: f64,
        kind: impl ObjectiveKind<S> + 'static,
    ) -> Result<Self, ConfigurationError> {
        self.objectives
            .push(Objective::new(tick_start, Box::new(kind)).with_probability(probability)?);
        Ok(self)
    }

    /// Replace the default observation policy.
    #[must_use]
    pub fn with_observation_policy(mut self, policy: impl ObservationPolicy<S> + 'static) -> Self {
        self.observation_policy = Some(Box::new(policy));
        self
    }
}

impl<S> Scenario<S> {
    /// Scenario name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scenario description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The tool registry.
    pub const fn registry(&self) -> &ActionRegistry<S> {
        &self.registry
    }

    /// Mutable registry access, for tools with hand-written constructors.
    pub const fn registry_mut(&mut self) -> &mut ActionRegistry<S> {
        &mut self.registry
    }

    /// What the decision-maker is told before the run.
    pub fn briefing(&self) -> Briefing {
        Briefing {
            scenario: self.name.clone(),
            description: self.description.clone(),
            tools: self.registry.specs(),
        }
    }

    /// Build the engine, returning it with the scenario's own observation
    /// policy if one was set.
    pub fn into_engine(self, seed: u64) -> (Engine<S>, Option<Box<dyn ObservationPolicy<S>>>) {
        let mut engine = Engine::new(self.world, self.environment, self.registry, seed);
        for event in self.events {
            engine.add_event(event);
        }
        for objective in self.objectives {
            engine.add_objective(objective);
        }
        (engine, self.observation_policy)
    }
}
