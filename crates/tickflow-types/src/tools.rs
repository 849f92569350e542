//! Tool metadata and tool-call types for decision-maker communication.
//!
//! The decision-maker sees every registered action as a *tool*: a name, a
//! description, a parameter schema and its scheduling metadata. It answers
//! with a [`ToolCall`] naming one of those tools and a flat argument
//! mapping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A flat parameter mapping (`name -> JSON value`).
///
/// Used for tool-call arguments and for the kind-specific parameters shown
/// in entity summaries. `BTreeMap` keeps key order stable when serialized.
pub type Parameters = BTreeMap<String, serde_json::Value>;

/// Schema entry for a single tool parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ParameterSpec {
    /// Type name shown to the decision-maker (e.g. `float`, `string`).
    #[serde(rename = "type")]
    pub ty: String,
    /// Human description of the parameter.
    pub description: String,
}

impl ParameterSpec {
    /// Create a parameter schema entry.
    pub fn new(ty: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            description: description.into(),
        }
    }
}

/// Static metadata of an action kind, exposed to the decision-maker as a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ActionSpec {
    /// Tool name used in [`ToolCall::tool_name`].
    pub name: String,
    /// Human description of what the action does.
    pub description: String,
    /// Parameter schema, keyed by parameter name.
    pub parameters: BTreeMap<String, ParameterSpec>,
    /// Admission priority; higher preempts lower.
    pub priority: i64,
    /// Actions sharing a tag are mutually exclusive while running.
    pub concurrency_tag: Option<String>,
    /// Number of ticks the action runs before completing (at least 1).
    pub ticks_required: u64,
}

impl ActionSpec {
    /// Create a spec with no parameters, priority 0, no tag and one tick.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: BTreeMap::new(),
            priority: 0,
            concurrency_tag: None,
            ticks_required: 1,
        }
    }

    /// Set the admission priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Set the concurrency tag.
    #[must_use]
    pub fn with_concurrency_tag(mut self, tag: impl Into<String>) -> Self {
        self.concurrency_tag = Some(tag.into());
        self
    }

    /// Set the number of ticks the action needs.
    #[must_use]
    pub const fn with_ticks_required(mut self, ticks: u64) -> Self {
        self.ticks_required = ticks;
        self
    }

    /// Add a parameter to the schema.
    #[must_use]
    pub fn with_parameter(
        mut self,
        name: impl Into<String>,
        ty: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.parameters
            .insert(name.into(), ParameterSpec::new(ty, description));
        self
    }
}

/// A decision returned by the decision-maker: one tool and its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ToolCall {
    /// Name of the requested tool.
    pub tool_name: String,
    /// Flat argument mapping passed to the action constructor.
    #[serde(default)]
    pub arguments: Parameters,
}

impl ToolCall {
    /// Create a tool call without arguments.
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments: Parameters::new(),
        }
    }

    /// Add an argument.
    #[must_use]
    pub fn with_argument(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.arguments.insert(name.into(), value);
        self
    }
}

/// What the decision-maker is told once, before the first observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Briefing {
    /// Scenario name.
    pub scenario: String,
    /// Scenario description.
    pub description: String,
    /// Every tool the decision-maker may call, sorted by name.
    pub tools: Vec<ActionSpec>,
}
