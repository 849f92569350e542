//! Observation policies: what the decision-maker gets to see.
//!
//! A policy turns the tick, the domain world state and the scheduler's
//! [`SystemState`] into an [`Observation`]. Policies are pure: building an
//! observation never touches the engine.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tickflow_types::{Observation, Parameters, SystemState};

/// Errors that can occur while building an observation.
#[derive(Debug, thiserror::Error)]
pub enum ObservationError {
    /// A state could not be serialized.
    #[error("failed to serialize {part}: {source}")]
    Serialize {
        /// Which side failed (`world_state` or `system_state`).
        part: &'static str,
        /// The underlying serialization error.
        source: serde_json::Error,
    },

    /// A state serialized to something other than a field map.
    #[error("{part} must serialize to a map of named fields")]
    NotAMap {
        /// Which side failed (`world_state` or `system_state`).
        part: &'static str,
    },
}

/// Builds the decision-maker's view of one tick.
pub trait ObservationPolicy<S>: Send {
    /// Build the observation for `tick`.
    ///
    /// # Errors
    ///
    /// Returns [`ObservationError`] if a state cannot be rendered.
    fn build(&self, tick: u64, world: &S, system: &SystemState) -> Result<Observation, ObservationError>;
}

/// Default policy: expose every field unless an allow-list is given.
///
/// A `None` list means full exposure; `Some` keeps only the named
/// top-level fields (an empty set hides that side entirely).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFilterPolicy {
    /// Allowed world-state field names.
    #[serde(default)]
    pub world_fields: Option<BTreeSet<String>>,
    /// Allowed system-state field names.
    #[serde(default)]
    pub system_fields: Option<BTreeSet<String>>,
}

impl FieldFilterPolicy {
    /// A policy that exposes everything.
    pub const fn full() -> Self {
        Self {
            world_fields: None,
            system_fields: None,
        }
    }

    /// Restrict the world-state fields.
    #[must_use]
    pub fn with_world_fields<I, F>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        self.world_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Restrict the system-state fields.
    #[must_use]
    pub fn with_system_fields<I, F>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        self.system_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }
}

impl<S: Serialize> ObservationPolicy<S> for FieldFilterPolicy {
    fn build(&self, tick: u64, world: &S, system: &SystemState) -> Result<Observation, ObservationError> {
        Ok(Observation {
            tick,
            world_state: filtered_fields("world_state", world, self.world_fields.as_ref())?,
            system_state: filtered_fields("system_state", system, self.system_fields.as_ref())?,
            extras: Parameters::new(),
        })
    }
}

fn filtered_fields<T: Serialize>(
    part: &'static str,
    value: &T,
    allowed: Option<&BTreeSet<String>>,
) -> Result<Parameters, ObservationError> {
    let rendered =
        serde_json::to_value(value).map_err(|source| ObservationError::Serialize { part, source })?;
    let serde_json::Value::Object(fields) = rendered else {
        return Err(ObservationError::NotAMap { part });
    };
    Ok(fields
        .into_iter()
        .filter(|(name, _)| allowed.is_none_or(|keep| keep.contains(name)))
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Serialize)]
    struct Garden {
        tree_growth: f64,
        secret_seed: u64,
    }

    fn garden() -> Garden {
        Garden {
            tree_growth: 2.5,
            secret_seed: 99,
        }
    }

    #[test]
    fn full_policy_exposes_everything() {
        let observation = FieldFilterPolicy::full()
            .build(4, &garden(), &SystemState::default())
            .unwrap();
        assert_eq!(observation.tick, 4);
        assert_eq!(observation.world_state.get("secret_seed"), Some(&json!(99)));
        assert!(observation.system_state.contains_key("running_actions"));
        assert!(observation.system_state.contains_key("last_action_feedback"));
    }

    #[test]
    fn allow_lists_filter_each_side() {
        let policy = FieldFilterPolicy::default()
            .with_world_fields(["tree_growth"])
            .with_system_fields(["objectives"]);
        let observation = policy.build(0, &garden(), &SystemState::default()).unwrap();
        assert_eq!(observation.world_state.len(), 1);
        assert!(observation.world_state.contains_key("tree_growth"));
        assert_eq!(
            observation.system_state.keys().collect::<Vec<_>>(),
            vec!["objectives"]
        );
    }

    #[test]
    fn scalar_world_state_is_rejected() {
        let err = FieldFilterPolicy::full()
            .build(0, &42_u32, &SystemState::default())
            .unwrap_err();
        assert!(matches!(err, ObservationError::NotAMap { part: "world_state" }));
    }

    #[test]
    fn building_is_pure() {
        let policy = FieldFilterPolicy::full();
        let system = SystemState::default();
        let first = policy.build(1, &garden(), &system).unwrap();
        let second = policy.build(1, &garden(), &system).unwrap();
        assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    }
}
