//! Observation payload delivered to the decision-maker.
//!
//! The observation is the **only** information the decision-maker receives
//! about the simulation. It carries the tick plus filtered views of the
//! domain world state and of the scheduler's [`SystemState`], each as a
//! field-name keyed map.
//!
//! [`SystemState`]: crate::structs::SystemState

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::tools::Parameters;

/// Agent-facing view of world and system state for one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Observation {
    /// Tick the observation was built for.
    pub tick: u64,
    /// Exposed fields of the domain world state.
    #[serde(default)]
    pub world_state: Parameters,
    /// Exposed fields of the scheduler's system state.
    #[serde(default)]
    pub system_state: Parameters,
    /// Policy-specific additions.
    #[serde(default)]
    pub extras: Parameters,
}

impl Observation {
    /// Render the observation as compact JSON with sorted keys.
    ///
    /// The payload goes through [`serde_json::Value`] first so the
    /// top-level keys are sorted as well as the nested maps. Two
    /// observations with equal content always render to the same string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let value = serde_json::to_value(self)?;
        serde_json::to_string(&value)
    }
}
