//! Tool-name to constructor mapping for action kinds.
//!
//! The registry is the only way an action enters the engine: a tool call
//! names an entry and supplies a flat argument mapping, and the entry's
//! constructor turns that mapping into a boxed [`ActionKind`].

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tickflow_types::{ActionSpec, Parameters};

use crate::action::{Action, ActionKind, ActionTool, Registered};
use crate::context::TickContext;
use crate::error::ConfigurationError;

/// Name of the built-in no-operation tool.
pub const DO_NOTHING: &str = "do_nothing";

/// Constructor turning an argument mapping into a kind instance.
pub type ActionFactory<S> =
    Box<dyn Fn(&Parameters) -> Result<Box<dyn ActionKind<S>>, ConfigurationError> + Send + Sync>;

struct Entry<S> {
    spec: Arc<ActionSpec>,
    factory: ActionFactory<S>,
}

/// The set of tools a scenario offers, keyed by tool name.
pub struct ActionRegistry<S> {
    entries: BTreeMap<String, Entry<S>>,
}

impl<S> core::fmt::Debug for ActionRegistry<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("tools", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<S: 'static> Default for ActionRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: 'static> ActionRegistry<S> {
    /// Create a registry holding only the built-in `do_nothing` tool.
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        let spec = <DoNothing as ActionTool<S>>::spec();
        entries.insert(
            spec.name.clone(),
            Entry {
                spec: Arc::new(spec),
                factory: serde_factory::<S, DoNothing>(),
            },
        );
        Self { entries }
    }

    /// Register a tool whose instances are deserialized from the arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if the name is taken or the spec asks
    /// for zero ticks.
    pub fn register<A: ActionTool<S>>(&mut self) -> Result<&mut Self, ConfigurationError> {
        self.register_with(<A as ActionTool<S>>::spec(), serde_factory::<S, A>())
    }
}

impl<S> ActionRegistry<S> {
    /// Register a tool with a hand-written constructor.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if the name is taken or the spec asks
    /// for zero ticks.
    pub fn register_with(
        &mut self,
        spec: ActionSpec,
        factory: ActionFactory<S>,
    ) -> Result<&mut Self, ConfigurationError> {
        if spec.ticks_required == 0 {
            return Err(ConfigurationError::InvalidActionSpec {
                name: spec.name,
                reason: String::from("ticks_required must be at least 1"),
            });
        }
        if self.entries.contains_key(&spec.name) {
            return Err(ConfigurationError::DuplicateAction { name: spec.name });
        }
        self.entries.insert(
            spec.name.clone(),
            Entry {
                spec: Arc::new(spec),
                factory,
            },
        );
        Ok(self)
    }

    /// Metadata of a registered tool.
    pub fn spec(&self, name: &str) -> Option<&ActionSpec> {
        self.entries.get(name).map(|entry| entry.spec.as_ref())
    }

    /// Whether a tool is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Every registered tool's metadata, sorted by name.
    pub fn specs(&self) -> Vec<ActionSpec> {
        self.entries
            .values()
            .map(|entry| entry.spec.as_ref().clone())
            .collect()
    }

    /// Number of registered tools, `do_nothing` included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false: the built-in tool is always present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build a `NotStarted` action for `tool_name` from `arguments`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownAction`] for unregistered names
    /// and whatever the constructor reports for bad arguments.
    pub fn instantiate(
        &self,
        tool_name: &str,
        arguments: &Parameters,
    ) -> Result<Action<S>, ConfigurationError> {
        let entry = self
            .entries
            .get(tool_name)
            .ok_or_else(|| ConfigurationError::UnknownAction {
                name: tool_name.to_owned(),
            })?;
        let kind = (entry.factory)(arguments)?;
        Ok(Action::new(Arc::clone(&entry.spec), arguments.clone(), kind))
    }
}

fn serde_factory<S: 'static, A: ActionTool<S>>() -> ActionFactory<S> {
    Box::new(|arguments: &Parameters| {
        let object: serde_json::Map<String, serde_json::Value> = arguments
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let tool = serde_json::from_value::<A>(serde_json::Value::Object(object)).map_err(
            |source| ConfigurationError::MalformedArguments {
                name: <A as ActionTool<S>>::spec().name,
                source,
            },
        )?;
        Ok(Box::new(Registered(tool)) as Box<dyn ActionKind<S>>)
    })
}

/// The built-in tool: occupies one tick and changes nothing.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DoNothing {}

impl<S> ActionKind<S> for DoNothing {
    fn step(&mut self, _ctx: &mut TickContext<'_, S>) {}
}

impl<S> ActionTool<S> for DoNothing {
    fn spec() -> ActionSpec {
        ActionSpec::new(DO_NOTHING, "A no-operation tool that does nothing.")
    }
}
