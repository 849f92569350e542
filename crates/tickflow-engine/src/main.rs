//! Demonstration binary for the Tickflow harness.
//!
//! Wires configuration, logging, the orchard scenario and a scripted
//! decision source together and runs them through the dual-loop runner.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `tickflow-config.yaml` (or `TICKFLOW_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Build the orchard scenario
//! 4. Run it with the scripted decision source
//! 5. Log the report

mod error;
mod orchard;

use std::path::PathBuf;

use tickflow_core::config::SimulationConfig;
use tickflow_core::decision::ScriptedDecisionSource;
use tickflow_core::runner::{self, ScenarioRunner};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "tickflow-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, scenario assembly or the run fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is not up yet, so report afterwards.
    let (config, config_source) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging.level)?;
    info!(
        source = %config_source,
        world_name = config.world.name,
        seed = config.world.seed,
        max_ticks = config.runner.max_ticks,
        tick_interval_ms = config.runner.tick_interval_ms,
        "Configuration loaded"
    );

    // 3. Build the scenario.
    let scenario = orchard::scenario().map_err(EngineError::from)?;
    info!(
        scenario = scenario.name(),
        tools = scenario.registry().len(),
        "Scenario assembled"
    );

    // 4. Run it.
    let runner = ScenarioRunner::new(config.runner_config())
        .with_default_policy(config.observation_policy());
    let decision = ScriptedDecisionSource::new(orchard::script());
    let outcome = runner
        .run(scenario, decision)
        .await
        .map_err(EngineError::from)?;

    // 5. Log results.
    runner::log_run_end(&outcome.report);
    for objective in outcome.engine.objectives() {
        info!(
            objective = objective.name(),
            status = ?objective.status(),
            tick_done = ?objective.tick_done(),
            "Objective result"
        );
    }
    info!(
        tree_growth = outcome.engine.world().tree_growth,
        report = %serde_json::to_string(&outcome.report)?,
        "tickflow-engine shutdown complete"
    );

    Ok(())
}

/// Install the `fmt` subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(level: &str) -> Result<(), EngineError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| EngineError::Logging {
            message: format!("invalid log filter {level:?}: {e}"),
        })?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| EngineError::Logging {
            message: format!("{e}"),
        })
}

/// Load the run configuration.
///
/// Reads `TICKFLOW_CONFIG` if set, otherwise `tickflow-config.yaml` in the
/// working directory. A missing file means defaults, with environment
/// overrides still applied. Returns the config and where it came from.
fn load_config() -> Result<(SimulationConfig, String), EngineError> {
    let config_path = std::env::var_os("TICKFLOW_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if config_path.exists() {
        let config = SimulationConfig::from_file(&config_path)?;
        Ok((config, config_path.display().to_string()))
    } else {
        let mut config = SimulationConfig::default();
        config.apply_env_overrides()?;
        Ok((config, String::from("defaults")))
    }
}
