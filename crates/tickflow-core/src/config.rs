//! Configuration loading and typed config structures for a Tickflow run.
//!
//! The canonical configuration lives in `tickflow-config.yaml`. Every
//! section and field has a default, so an empty document (or no file at
//! all) yields a runnable configuration.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;

use crate::observation::FieldFilterPolicy;
use crate::runner::RunnerConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override held an unparseable value.
    #[error("invalid value for {variable}: {value:?}")]
    InvalidOverride {
        /// The environment variable name.
        variable: &'static str,
        /// The raw value found.
        value: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level run configuration, mirroring `tickflow-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// World identity and seed.
    #[serde(default)]
    pub world: WorldConfig,

    /// Loop bounds and pacing.
    #[serde(default)]
    pub runner: RunnerSection,

    /// Observation allow-lists.
    #[serde(default)]
    pub observation: ObservationConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file and apply environment overrides.
    ///
    /// Recognized overrides:
    /// - `TICKFLOW_MAX_TICKS` overrides `runner.max_ticks`
    /// - `TICKFLOW_TICK_INTERVAL_MS` overrides `runner.tick_interval_ms`
    /// - `TICKFLOW_SEED` overrides `world.seed`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::InvalidOverride`] for a malformed override.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string. No overrides are applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Apply `TICKFLOW_*` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] if a variable is set but is
    /// not a non-negative integer.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = env_u64("TICKFLOW_MAX_TICKS")? {
            self.runner.max_ticks = value;
        }
        if let Some(value) = env_u64("TICKFLOW_TICK_INTERVAL_MS")? {
            self.runner.tick_interval_ms = value;
        }
        if let Some(value) = env_u64("TICKFLOW_SEED")? {
            self.world.seed = value;
        }
        Ok(())
    }

    /// Runner settings derived from the `runner` section.
    pub const fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            max_ticks: if self.runner.max_ticks == 0 {
                None
            } else {
                Some(self.runner.max_ticks)
            },
            agent_delay_ticks: self.runner.agent_delay_ticks,
            agent_tick_interval: self.runner.agent_tick_interval,
            tick_interval_ms: self.runner.tick_interval_ms,
            seed: self.world.seed,
        }
    }

    /// The default observation policy described by the `observation` section.
    pub fn observation_policy(&self) -> FieldFilterPolicy {
        FieldFilterPolicy {
            world_fields: self.observation.world_fields.clone(),
            system_fields: self.observation.system_fields.clone(),
        }
    }
}

fn env_u64(variable: &'static str) -> Result<Option<u64>, ConfigError> {
    let Ok(value) = std::env::var(variable) else {
        return Ok(None);
    };
    value
        .trim()
        .parse::<u64>()
        .map(Some)
        .map_err(|_parse| ConfigError::InvalidOverride { variable, value })
}

/// World identity and seed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable run name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Seed for the engine's random number generator.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
        }
    }
}

/// Loop bounds and pacing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunnerSection {
    /// Tick bound (0 = unbounded).
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    /// Tick intervals the decision loop waits before its first turn.
    #[serde(default)]
    pub agent_delay_ticks: u64,

    /// Tick intervals between decision turns.
    #[serde(default = "default_agent_tick_interval")]
    pub agent_tick_interval: u64,

    /// Real-time milliseconds per tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            max_ticks: default_max_ticks(),
            agent_delay_ticks: 0,
            agent_tick_interval: default_agent_tick_interval(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

/// Observation allow-lists. Absent lists expose every field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ObservationConfig {
    /// World-state fields the decision-maker may see.
    #[serde(default)]
    pub world_fields: Option<BTreeSet<String>>,

    /// System-state fields the decision-maker may see.
    #[serde(default)]
    pub system_fields: Option<BTreeSet<String>>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    String::from("Tickflow")
}

const fn default_seed() -> u64 {
    42
}

const fn default_max_ticks() -> u64 {
    1000
}

const fn default_agent_tick_interval() -> u64 {
    5
}

const fn default_tick_interval_ms() -> u64 {
    100
}

fn default_log_level() -> String {
    String::from("info")
}
