//! Agent-facing summaries and the system-state snapshot.
//!
//! These structs are what the scheduler publishes after every tick and
//! every admission. They are derived views: the engine rebuilds them from
//! entity state and never reads them back.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ActionStatus, AdmissionReason, EventAwareness, EventStatus, ObjectiveStatus};
use crate::ids::{ActionId, EventId, ObjectiveId};
use crate::tools::Parameters;

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Snapshot of one action instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ActionSummary {
    /// Instance identifier.
    pub id: ActionId,
    /// Tool name of the action kind.
    pub name: String,
    /// Current lifecycle status.
    pub status: ActionStatus,
    /// Concurrency tag, if any.
    pub concurrency_tag: Option<String>,
    /// Admission priority.
    pub priority: i64,
    /// Tick on which the action entered `InProgress`.
    pub tick_started: Option<u64>,
    /// Ticks the action needs to complete.
    pub ticks_required: u64,
    /// Ticks elapsed since start, inclusive of the current tick (0 if not started).
    pub ticks_elapsed: u64,
    /// Ticks left before completion (never negative).
    pub ticks_remaining: u64,
    /// Tick on which the action completed.
    pub tick_completed: Option<u64>,
    /// Tick on which the action was stopped.
    pub tick_stopped: Option<u64>,
    /// Kind-specific parameters.
    pub parameters: Parameters,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Schedule details of an event, only exposed for omniscient events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EventScheduleView {
    /// First tick on which the event may start.
    pub tick_start: u64,
    /// Number of ticks the event lasts once started.
    pub tick_duration: u64,
    /// Tick on which the event completed.
    pub tick_completed: Option<u64>,
    /// Ticks left before completion.
    pub ticks_remaining: u64,
}

/// Snapshot of one observable event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EventSummary {
    /// Event identifier.
    pub id: EventId,
    /// Display name of the event kind.
    pub name: String,
    /// Human description.
    pub description: String,
    /// Current lifecycle status.
    pub status: EventStatus,
    /// Awareness level that decided what is shown here.
    pub awareness: EventAwareness,
    /// Tick on which the event started.
    pub tick_started: Option<u64>,
    /// Ticks elapsed since start, inclusive of the current tick.
    pub ticks_elapsed: u64,
    /// Schedule details; `None` for present-only events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<EventScheduleView>,
    /// Kind-specific parameters.
    pub parameters: Parameters,
}

// ---------------------------------------------------------------------------
// Objectives
// ---------------------------------------------------------------------------

/// Snapshot of one objective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ObjectiveSummary {
    /// Objective identifier.
    pub id: ObjectiveId,
    /// Display name of the objective kind.
    pub name: String,
    /// Human description.
    pub description: String,
    /// Current lifecycle status.
    pub status: ObjectiveStatus,
    /// Tick from which the objective is evaluated.
    pub tick_start: u64,
    /// Tick on which the objective completed or failed.
    pub tick_done: Option<u64>,
    /// Ticks elapsed since `tick_start`, inclusive (0 before it).
    pub ticks_elapsed: u64,
    /// Kind-specific parameters.
    pub parameters: Parameters,
}

// ---------------------------------------------------------------------------
// Admission feedback
// ---------------------------------------------------------------------------

/// Outcome of the most recent action request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ActionFeedback {
    /// Tool name that was requested.
    pub requested_action: String,
    /// Arguments the request carried.
    pub arguments: Parameters,
    /// Whether the action was admitted.
    pub accepted: bool,
    /// Why it was admitted or rejected.
    pub reason: AdmissionReason,
    /// Tick at which the request was handled.
    pub tick: u64,
    /// Running actions that shared the requested tag (as they were before admission).
    pub conflicts: Vec<ActionSummary>,
    /// Actions stopped to make room for the new one.
    pub preempted: Vec<ActionSummary>,
    /// The newly admitted action, if accepted.
    pub started_action: Option<ActionSummary>,
}

// ---------------------------------------------------------------------------
// System state
// ---------------------------------------------------------------------------

/// Agent-facing view of the scheduler, rebuilt after every tick and admission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SystemState {
    /// Every action currently in progress.
    pub running_actions: Vec<ActionSummary>,
    /// Events the decision-maker is allowed to see.
    pub events: Vec<EventSummary>,
    /// Every objective, whatever its status.
    pub objectives: Vec<ObjectiveSummary>,
    /// Feedback about the most recent action request.
    pub last_action_feedback: Option<ActionFeedback>,
}
