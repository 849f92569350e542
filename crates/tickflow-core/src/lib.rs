//! Tick-scheduling engine and dual-loop runner for the Tickflow harness.
//!
//! This crate owns the discrete-time core: the simulation clock, the
//! action, event and objective state machines, admission and preemption
//! of requested actions, observation building, and the runner that drives
//! a world loop and a decision loop against one shared engine.
//!
//! # Modules
//!
//! - [`clock`] -- Monotonic tick counter.
//! - [`context`] -- Per-tick view handed to entity hooks.
//! - [`lifecycle`] -- Shared elapsed-tick arithmetic.
//! - [`action`] -- [`ActionKind`] behavior and the [`Action`] state machine.
//! - [`registry`] -- Tool registry and instantiation from named arguments.
//! - [`event`] -- Scheduled, optionally probabilistic [`Event`]s.
//! - [`objective`] -- Success/failure predicates over the world.
//! - [`environment`] -- Per-tick world dynamics.
//! - [`snapshot`] -- Agent-facing summaries and the system-state snapshot.
//! - [`engine`] -- The [`Engine`]: `step()` and `execute_action()`.
//! - [`observation`] -- Observation policies and field filtering.
//! - [`decision`] -- [`DecisionSource`] trait and simple sources.
//! - [`control`] -- Pause, resume, stop and pacing shared by both loops.
//! - [`scenario`] -- Scenario assembly.
//! - [`runner`] -- The dual-loop [`ScenarioRunner`].
//! - [`config`] -- `tickflow-config.yaml` loading.
//! - [`error`] -- Configuration and invariant errors.

pub mod action;
pub mod clock;
pub mod config;
pub mod context;
pub mod control;
pub mod decision;
pub mod engine;
pub mod environment;
pub mod error;
pub mod event;
pub mod lifecycle;
pub mod objective;
pub mod observation;
pub mod registry;
pub mod runner;
pub mod scenario;
pub mod snapshot;

pub use action::{Action, ActionKind, ActionTool};
pub use clock::{ClockError, SimClock};
pub use config::{ConfigError, SimulationConfig};
pub use context::TickContext;
pub use control::{RunControl, RunEndReason};
pub use decision::{DecisionError, DecisionSource, IdleDecisionSource, ScriptedDecisionSource};
pub use engine::{Engine, EngineError};
pub use environment::{Environment, StaticEnvironment};
pub use error::{ConfigurationError, InvariantViolation};
pub use event::{Event, EventKind, EventSchedule};
pub use objective::{Objective, ObjectiveKind};
pub use observation::{FieldFilterPolicy, ObservationError, ObservationPolicy};
pub use registry::{ActionRegistry, DO_NOTHING, DoNothing};
pub use runner::{RunOutcome, RunReport, RunnerConfig, RunnerError, ScenarioRunner};
pub use scenario::Scenario;
