//! Error kinds shared by the entity, registry and scenario modules.
//!
//! Admission rejection is not an error: a request that loses to a running
//! action is reported through
//! [`ActionFeedback`](tickflow_types::ActionFeedback).

/// A scenario or request refers to something that does not exist or is
/// malformed. Fatal: never recovered automatically.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// The requested tool name is not in the action registry.
    #[error("unknown action: {name}")]
    UnknownAction {
        /// The name that was looked up.
        name: String,
    },

    /// Two action kinds were registered under the same tool name.
    #[error("action {name} is already registered")]
    DuplicateAction {
        /// The conflicting tool name.
        name: String,
    },

    /// The argument mapping could not be turned into an action instance.
    #[error("malformed arguments for action {name}: {source}")]
    MalformedArguments {
        /// The tool whose constructor rejected the arguments.
        name: String,
        /// The underlying deserialization error.
        source: serde_json::Error,
    },

    /// An action spec violates a scheduling constraint.
    #[error("invalid spec for action {name}: {reason}")]
    InvalidActionSpec {
        /// The offending tool name.
        name: String,
        /// Explanation of what is wrong.
        reason: String,
    },

    /// An event schedule violates a scheduling constraint.
    #[error("invalid schedule for event {name}: {reason}")]
    InvalidEventSchedule {
        /// Display name of the event kind.
        name: String,
        /// Explanation of what is wrong.
        reason: String,
    },

    /// An objective was configured with an out-of-range value.
    #[error("invalid objective {name}: {reason}")]
    InvalidObjective {
        /// Display name of the objective kind.
        name: String,
        /// Explanation of what is wrong.
        reason: String,
    },
}

/// A lifecycle invariant was broken.
///
/// This is a programming error in a supplied entity or in code driving the
/// engine with inconsistent ticks; the engine fails fast instead of trying
/// to repair the state.
#[derive(Debug, thiserror::Error)]
#[error("{entity} {name}: {reason}")]
pub struct InvariantViolation {
    /// Entity family (`action`, `event`, `objective`).
    pub entity: &'static str,
    /// Display name of the offending instance.
    pub name: String,
    /// Which invariant was broken.
    pub reason: String,
}

impl InvariantViolation {
    /// Create a violation report.
    pub fn new(entity: &'static str, name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            entity,
            name: name.into(),
            reason: reason.into(),
        }
    }
}
