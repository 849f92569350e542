//! Shared agent-facing type definitions for the Tickflow harness.
//!
//! This crate is the single source of truth for everything that crosses
//! the boundary between the scheduler and the decision-maker: statuses,
//! summaries, admission feedback, the system-state snapshot, observations
//! and tool calls. Types flow downstream to `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for entity instances
//! - [`enums`] -- Lifecycle statuses, awareness, admission reasons
//! - [`structs`] -- Entity summaries, feedback and [`SystemState`]
//! - [`tools`] -- Tool metadata, tool calls and the pre-run briefing
//! - [`observation`] -- Observation payload delivered each decision turn

pub mod enums;
pub mod ids;
pub mod observation;
pub mod structs;
pub mod tools;

// Re-export all public types at crate root for convenience.
pub use enums::{ActionStatus, AdmissionReason, EventAwareness, EventStatus, ObjectiveStatus};
pub use ids::{ActionId, EventId, ObjectiveId};
pub use observation::Observation;
pub use structs::{
    ActionFeedback, ActionSummary, EventScheduleView, EventSummary, ObjectiveSummary, SystemState,
};
pub use tools::{ActionSpec, Briefing, ParameterSpec, Parameters, ToolCall};
