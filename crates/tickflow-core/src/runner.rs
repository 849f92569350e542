//! Dual-loop scenario runner.
//!
//! [`ScenarioRunner::run`] drives a scenario with two tokio tasks that
//! share one [`Mutex`] around the [`Engine`]:
//!
//! - **World loop**: lock, check the stop condition, `step()`, advance the
//!   clock, unlock, sleep one tick interval.
//! - **Decision loop**: after `agent_delay_ticks` intervals, lock, check
//!   the stop condition, build an observation, ask the decision source,
//!   submit its request through `execute_action()`, unlock, sleep
//!   `agent_tick_interval` intervals.
//!
//! Stepping and admission therefore never interleave. The decision source
//! is consulted while the lock is held, so a slow `decide` stalls the
//! world clock for as long as it takes. Both loops also consult the shared
//! [`RunControl`] for pause, resume and stop between turns.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clock::ClockError;
use crate::control::{RunControl, RunEndReason};
use crate::decision::{DecisionError, DecisionSource};
use crate::engine::{Engine, EngineError};
use crate::observation::{FieldFilterPolicy, ObservationError, ObservationPolicy};
use crate::scenario::Scenario;

/// Errors that end a run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Stepping or admission failed.
    #[error("engine error: {source}")]
    Engine {
        /// The underlying engine error.
        #[from]
        source: EngineError,
    },

    /// The clock could not advance.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// The observation could not be built.
    #[error("observation error: {source}")]
    Observation {
        /// The underlying observation error.
        #[from]
        source: ObservationError,
    },

    /// The decision source failed.
    #[error("decision error: {source}")]
    Decision {
        /// The underlying decision error.
        #[from]
        source: DecisionError,
    },

    /// A loop task panicked or was cancelled.
    #[error("loop task failed: {source}")]
    Join {
        /// The underlying join error.
        #[from]
        source: tokio::task::JoinError,
    },

    /// The engine was still shared after both loops finished.
    #[error("engine still shared after both loops exited")]
    EngineShared,
}

/// Loop bounds and pacing for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Tick bound; `None` runs until stopped.
    pub max_ticks: Option<u64>,
    /// Tick intervals the decision loop waits before its first turn.
    pub agent_delay_ticks: u64,
    /// Tick intervals between decision turns (0 = every scheduling slot).
    pub agent_tick_interval: u64,
    /// Real-time milliseconds per tick.
    pub tick_interval_ms: u64,
    /// Seed for the engine's random number generator.
    pub seed: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_ticks: Some(1000),
            agent_delay_ticks: 0,
            agent_tick_interval: 5,
            tick_interval_ms: 100,
            seed: 42,
        }
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Why the run ended.
    pub end_reason: RunEndReason,
    /// Clock value when the loops exited.
    pub final_tick: u64,
    /// Number of `step()` calls made by the world loop.
    pub ticks_executed: u64,
    /// Number of times the decision source was consulted.
    pub decision_turns: u64,
    /// Requests admitted.
    pub actions_accepted: u64,
    /// Requests rejected by a conflicting action.
    pub actions_rejected: u64,
    /// Wall-clock start of the run.
    pub started_at: DateTime<Utc>,
    /// Wall-clock end of the run.
    pub finished_at: DateTime<Utc>,
}

/// A finished run: its report and the engine in its final state.
#[derive(Debug)]
pub struct RunOutcome<S> {
    /// Run summary.
    pub report: RunReport,
    /// Final engine state, for inspection.
    pub engine: Engine<S>,
}

#[derive(Debug, Default, Clone, Copy)]
struct DecisionStats {
    turns: u64,
    accepted: u64,
    rejected: u64,
}

/// Runs scenarios with the dual-loop protocol.
#[derive(Debug)]
pub struct ScenarioRunner {
    config: RunnerConfig,
    control: Arc<RunControl>,
    default_policy: FieldFilterPolicy,
}

impl ScenarioRunner {
    /// Create a runner. The policy defaults to full exposure.
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            control: Arc::new(RunControl::new(config.tick_interval_ms, config.max_ticks)),
            config,
            default_policy: FieldFilterPolicy::full(),
        }
    }

    /// Use `policy` for scenarios that do not bring their own.
    #[must_use]
    pub fn with_default_policy(mut self, policy: FieldFilterPolicy) -> Self {
        self.default_policy = policy;
        self
    }

    /// Loop configuration.
    pub const fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Handle for pausing, resuming, retiming or stopping the run.
    pub fn control(&self) -> Arc<RunControl> {
        Arc::clone(&self.control)
    }

    /// Run `scenario` until the tick bound or a stop request.
    ///
    /// The decision source receives the scenario briefing before either
    /// loop starts.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error from either loop. The other loop is
    /// asked to stop and is joined before returning.
    pub async fn run<S, D>(&self, scenario: Scenario<S>, mut decision: D) -> Result<RunOutcome<S>, RunnerError>
    where
        S: Serialize + Send + 'static,
        D: DecisionSource + 'static,
    {
        let started_at = Utc::now();
        let briefing = scenario.briefing();
        decision.on_start(&briefing);

        let (engine, policy) = scenario.into_engine(self.config.seed);
        let policy: Box<dyn ObservationPolicy<S>> =
            policy.unwrap_or_else(|| Box::new(self.default_policy.clone()));
        let engine = Arc::new(Mutex::new(engine));

        info!(
            scenario = %briefing.scenario,
            tools = briefing.tools.len(),
            max_ticks = ?self.config.max_ticks,
            tick_interval_ms = self.control.tick_interval_ms(),
            agent_delay_ticks = self.config.agent_delay_ticks,
            agent_tick_interval = self.config.agent_tick_interval,
            "Run starting"
        );

        let world = tokio::spawn(world_loop(Arc::clone(&engine), Arc::clone(&self.control)));
        let agent = tokio::spawn(decision_loop(
            Arc::clone(&engine),
            Arc::clone(&self.control),
            policy,
            decision,
            self.config.agent_delay_ticks,
            self.config.agent_tick_interval,
        ));
        let (world, agent) = tokio::join!(world, agent);

        let ticks_executed = world.map_err(RunnerError::from).and_then(|result| result);
        let stats = agent.map_err(RunnerError::from).and_then(|result| result);
        let ticks_executed = ticks_executed?;
        let stats = stats?;

        let engine = Arc::try_unwrap(engine)
            .map_err(|_shared| RunnerError::EngineShared)?
            .into_inner();
        let final_tick = engine.tick();
        let report = RunReport {
            end_reason: self
                .control
                .end_reason(final_tick)
                .unwrap_or(RunEndReason::StopRequested),
            final_tick,
            ticks_executed,
            decision_turns: stats.turns,
            actions_accepted: stats.accepted,
            actions_rejected: stats.rejected,
            started_at,
            finished_at: Utc::now(),
        };
        log_run_end(&report);
        Ok(RunOutcome { report, engine })
    }
}

async fn world_loop<S>(engine: Arc<Mutex<Engine<S>>>, control: Arc<RunControl>) -> Result<u64, RunnerError> {
    let mut ticks_executed: u64 = 0;
    loop {
        control.wait_if_paused().await;
        {
            let mut engine = engine.lock().await;
            if !control.should_continue(engine.tick()) {
                break;
            }
            if let Err(err) = world_turn(&mut engine) {
                warn!(tick = engine.tick(), %err, "World loop failed");
                control.request_stop();
                return Err(err);
            }
        }
        ticks_executed = ticks_executed.saturating_add(1);
        control
            .sleep(Duration::from_millis(control.tick_interval_ms()))
            .await;
    }
    debug!(ticks_executed, "World loop exited");
    Ok(ticks_executed)
}

fn world_turn<S>(engine: &mut Engine<S>) -> Result<(), RunnerError> {
    engine.step()?;
    engine.advance_clock()?;
    Ok(())
}

async fn decision_loop<S, D>(
    engine: Arc<Mutex<Engine<S>>>,
    control: Arc<RunControl>,
    policy: Box<dyn ObservationPolicy<S>>,
    mut decision: D,
    agent_delay_ticks: u64,
    agent_tick_interval: u64,
) -> Result<DecisionStats, RunnerError>
where
    D: DecisionSource,
{
    let mut stats = DecisionStats::default();
    control
        .sleep(intervals(&control, agent_delay_ticks))
        .await;
    loop {
        control.wait_if_paused().await;
        {
            let mut engine = engine.lock().await;
            if !control.should_continue(engine.tick()) {
                break;
            }
            if let Err(err) = decision_turn(&mut engine, policy.as_ref(), &mut decision, &mut stats) {
                warn!(tick = engine.tick(), %err, "Decision loop failed");
                control.request_stop();
                return Err(err);
            }
        }
        control
            .sleep(intervals(&control, agent_tick_interval))
            .await;
    }
    debug!(turns = stats.turns, "Decision loop exited");
    Ok(stats)
}

fn decision_turn<S, D: DecisionSource>(
    engine: &mut Engine<S>,
    policy: &dyn ObservationPolicy<S>,
    decision: &mut D,
    stats: &mut DecisionStats,
) -> Result<(), RunnerError> {
    let tick = engine.tick();
    let observation = engine.observe(policy)?;
    if let Ok(rendered) = observation.to_json() {
        debug!(tick, observation = %rendered, "Observation built");
    }

    stats.turns = stats.turns.saturating_add(1);
    let Some(call) = decision.decide(&observation)? else {
        debug!(tick, "Decision source passed");
        return Ok(());
    };
    debug!(tick, tool = %call.tool_name, "Decision received");
    let feedback = engine.execute_action(&call.tool_name, &call.arguments)?;
    if feedback.accepted {
        stats.accepted = stats.accepted.saturating_add(1);
    } else {
        stats.rejected = stats.rejected.saturating_add(1);
    }
    Ok(())
}

fn intervals(control: &RunControl, count: u64) -> Duration {
    Duration::from_millis(control.tick_interval_ms().saturating_mul(count))
}

/// Log the end of a run.
pub fn log_run_end(report: &RunReport) {
    let elapsed_ms = report
        .finished_at
        .signed_duration_since(report.started_at)
        .num_milliseconds();
    info!(
        reason = ?report.end_reason,
        final_tick = report.final_tick,
        ticks_executed = report.ticks_executed,
        decision_turns = report.decision_turns,
        accepted = report.actions_accepted,
        rejected = report.actions_rejected,
        elapsed_ms,
        "Run ended"
    );
}
