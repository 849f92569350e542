//! Enumeration types for the Tickflow harness.
//!
//! Lifecycle statuses for the three entity families (actions, events,
//! objectives), event awareness, and the admission outcome reasons reported
//! back to the decision-maker. All of them serialize in `snake_case` so the
//! observation JSON reads the same as the feedback strings the agent is
//! told about.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Action lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle status of an action.
///
/// `Stopped` and `Completed` are terminal and mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ActionStatus {
    /// Admitted but not yet picked up by a tick.
    NotStarted,
    /// Running; `step` is invoked once per tick.
    InProgress,
    /// Preempted by a higher-priority action with the same concurrency tag.
    Stopped,
    /// Ran for its full `ticks_required`.
    Completed,
}

impl ActionStatus {
    /// Whether the status is terminal (`Stopped` or `Completed`).
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Completed)
    }

    /// The `snake_case` wire name of the status.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Stopped => "stopped",
            Self::Completed => "completed",
        }
    }
}

impl core::fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Event lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle status of a scheduled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EventStatus {
    /// Waiting for its `tick_start`.
    NotStarted,
    /// Active; `step` is invoked once per tick.
    InProgress,
    /// Ran for its full `tick_duration`.
    Completed,
}

impl EventStatus {
    /// The `snake_case` wire name of the status.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl core::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much of an event the decision-maker is allowed to see.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EventAwareness {
    /// Visible only while the event is in progress, without its schedule.
    #[default]
    PresentOnly,
    /// Visible from creation until completion, including its schedule.
    Omniscient,
}

// ---------------------------------------------------------------------------
// Objective lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle status of an objective.
///
/// `Completed` and `Failed` are terminal: the status is frozen afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ObjectiveStatus {
    /// Waiting for its `tick_start`.
    NotStarted,
    /// Being evaluated every tick.
    InProgress,
    /// The completion predicate held.
    Completed,
    /// The failure predicate held (and completion did not).
    Failed,
}

impl ObjectiveStatus {
    /// Whether the status is terminal (`Completed` or `Failed`).
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

// ---------------------------------------------------------------------------
// Admission
// ---------------------------------------------------------------------------

/// Why an action request was accepted or rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum AdmissionReason {
    /// No running action shares the requested concurrency tag.
    AcceptedNoConflict,
    /// A running action with the same tag has higher or equal priority.
    RejectedHigherOrEqualPriorityConflict,
    /// Every conflicting action had lower priority and was stopped.
    AcceptedPreemptedLowerPriority,
}

impl AdmissionReason {
    /// Whether this reason corresponds to an accepted request.
    pub const fn is_accepted(self) -> bool {
        !matches!(self, Self::RejectedHigherOrEqualPriorityConflict)
    }

    /// The `snake_case` wire name of the reason.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AcceptedNoConflict => "accepted_no_conflict",
            Self::RejectedHigherOrEqualPriorityConflict => {
                "rejected_higher_or_equal_priority_conflict"
            }
            Self::AcceptedPreemptedLowerPriority => "accepted_preempted_lower_priority",
        }
    }
}

impl core::fmt::Display for AdmissionReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
