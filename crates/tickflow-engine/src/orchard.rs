//! The orchard demonstration scenario.
//!
//! Trees grow one unit per tick on their own. Good weather early on speeds
//! them up, a short spell of bad weather sets them back, and the
//! decision-maker can fertilize or water to help. Both tools share the
//! `plant_care` tag, so watering (priority 2) preempts fertilizing
//! (priority 1) and fertilizing is refused while watering runs.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tickflow_core::{
    ActionKind, ActionTool, ConfigurationError, Environment, EventKind, EventSchedule,
    ObjectiveKind, Scenario, TickContext,
};
use tickflow_types::{ActionSpec, Parameters, ToolCall};

/// Tag shared by every plant-care tool.
pub const PLANT_CARE: &str = "plant_care";

const FERTILIZE_TICKS: u32 = 10;
const WATER_TICKS: u32 = 10;

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// Orchard world state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Orchard {
    /// Accumulated tree growth.
    pub tree_growth: f64,
}

/// Steady growth applied before anything else each tick.
#[derive(Debug, Clone, Copy)]
pub struct SteadyGrowth {
    /// Growth added per tick.
    pub rate: f64,
}

impl Default for SteadyGrowth {
    fn default() -> Self {
        Self { rate: 1.0 }
    }
}

impl Environment<Orchard> for SteadyGrowth {
    fn step(&mut self, ctx: &mut TickContext<'_, Orchard>) {
        ctx.world_mut().tree_growth += self.rate;
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Bad weather slows the trees down.
#[derive(Debug, Clone, Copy)]
pub struct BadWeather {
    /// Growth lost per tick.
    pub severity: f64,
}

impl EventKind<Orchard> for BadWeather {
    fn name(&self) -> &str {
        "BadWeather"
    }

    fn description(&self) -> &str {
        "Bad weather reduces tree growth."
    }

    fn step(&mut self, ctx: &mut TickContext<'_, Orchard>) {
        ctx.world_mut().tree_growth -= self.severity;
    }

    fn parameters(&self) -> Parameters {
        Parameters::from([(String::from("severity"), json!(self.severity))])
    }
}

/// Good weather speeds the trees up.
#[derive(Debug, Clone, Copy)]
pub struct GoodWeather {
    /// Growth gained per tick.
    pub boost: f64,
}

impl EventKind<Orchard> for GoodWeather {
    fn name(&self) -> &str {
        "GoodWeather"
    }

    fn description(&self) -> &str {
        "Good weather increases tree growth."
    }

    fn step(&mut self, ctx: &mut TickContext<'_, Orchard>) {
        ctx.world_mut().tree_growth += self.boost;
    }

    fn parameters(&self) -> Parameters {
        Parameters::from([(String::from("boost"), json!(self.boost))])
    }
}

// ---------------------------------------------------------------------------
// Objectives
// ---------------------------------------------------------------------------

/// Reach a growth level, eventually.
#[derive(Debug, Clone, Copy)]
pub struct GrowTrees {
    /// Growth to reach.
    pub target_growth: f64,
}

impl ObjectiveKind<Orchard> for GrowTrees {
    fn name(&self) -> &str {
        "GrowTrees"
    }

    fn description(&self) -> &str {
        "Grow trees to the target growth level."
    }

    fn is_completed(&self, world: &Orchard, _tick: u64) -> bool {
        world.tree_growth >= self.target_growth
    }

    fn parameters(&self) -> Parameters {
        Parameters::from([(String::from("target_growth"), json!(self.target_growth))])
    }
}

/// Reach a growth level before a deadline.
#[derive(Debug, Clone, Copy)]
pub struct GrowTreesQuickly {
    /// Growth to reach.
    pub target_growth: f64,
    /// Last tick on which reaching the target still counts.
    pub max_ticks: u64,
}

impl ObjectiveKind<Orchard> for GrowTreesQuickly {
    fn name(&self) -> &str {
        "GrowTreesQuickly"
    }

    fn description(&self) -> &str {
        "Grow trees to the target growth level quickly."
    }

    fn is_completed(&self, world: &Orchard, _tick: u64) -> bool {
        world.tree_growth >= self.target_growth
    }

    fn is_failed(&self, world: &Orchard, tick: u64) -> bool {
        tick > self.max_ticks && world.tree_growth < self.target_growth
    }

    fn parameters(&self) -> Parameters {
        Parameters::from([
            (String::from("target_growth"), json!(self.target_growth)),
            (String::from("max_ticks"), json!(self.max_ticks)),
        ])
    }
}

// ---------------------------------------------------------------------------
// Tools
// ---------------------------------------------------------------------------

/// Spread fertilizer. Each step delivers a tenth of `boost`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fertilize {
    /// Growth spread across the action's ticks.
    #[serde(default = "default_boost")]
    pub boost: f64,
}

const fn default_boost() -> f64 {
    5.0
}

impl ActionKind<Orchard> for Fertilize {
    fn step(&mut self, ctx: &mut TickContext<'_, Orchard>) {
        ctx.world_mut().tree_growth += self.boost / f64::from(FERTILIZE_TICKS);
    }
}

impl ActionTool<Orchard> for Fertilize {
    fn spec() -> ActionSpec {
        ActionSpec::new("fertilize", "Fertilize trees to boost growth.")
            .with_concurrency_tag(PLANT_CARE)
            .with_priority(1)
            .with_ticks_required(u64::from(FERTILIZE_TICKS))
            .with_parameter("boost", "float", "The amount to boost tree growth.")
    }
}

/// Water the trees. Each step delivers a tenth of `water_bonus`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterTrees {
    /// Growth spread across the action's ticks.
    #[serde(default = "default_water_bonus")]
    pub water_bonus: f64,
}

const fn default_water_bonus() -> f64 {
    3.0
}

impl ActionKind<Orchard> for WaterTrees {
    fn step(&mut self, ctx: &mut TickContext<'_, Orchard>) {
        ctx.world_mut().tree_growth += self.water_bonus / f64::from(WATER_TICKS);
    }
}

impl ActionTool<Orchard> for WaterTrees {
    fn spec() -> ActionSpec {
        ActionSpec::new("water_trees", "Water trees to help them grow quickly.")
            .with_concurrency_tag(PLANT_CARE)
            .with_priority(2)
            .with_ticks_required(u64::from(WATER_TICKS))
            .with_parameter(
                "water_bonus",
                "float",
                "How much watering boosts tree growth.",
            )
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Build the orchard scenario.
///
/// # Errors
///
/// Returns [`ConfigurationError`] if a tool or event is misconfigured.
pub fn scenario() -> Result<Scenario<Orchard>, ConfigurationError> {
    let scenario = Scenario::new(
        "Orchard",
        "Grow an orchard. Trees grow on their own; fertilizing and watering help. \
         Both use the plant_care slot and watering takes precedence.",
        Orchard::default(),
        SteadyGrowth::default(),
    )
    .with_action::<Fertilize>()?
    .with_action::<WaterTrees>()?
    .with_event(EventSchedule::new(5, 3), BadWeather { severity: 2.0 })?
    .with_event(EventSchedule::new(1, 2), GoodWeather { boost: 3.0 })?
    .with_objective(
        2,
        GrowTrees {
            target_growth: 10.0,
        },
    )
    .with_objective(
        1,
        GrowTreesQuickly {
            target_growth: 15.0,
            max_ticks: 20,
        },
    );
    Ok(scenario)
}

/// The demonstration script: fertilize first, then water even though
/// fertilizing is still running.
pub fn script() -> Vec<Option<ToolCall>> {
    vec![
        Some(ToolCall::new("fertilize")),
        Some(ToolCall::new("water_trees")),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use tickflow_core::Engine;
    use tickflow_types::{ActionStatus, AdmissionReason, ObjectiveStatus};

    use super::*;

    fn engine() -> Engine<Orchard> {
        scenario().unwrap().into_engine(42).0
    }

    fn run_ticks(engine: &mut Engine<Orchard>, count: u64) {
        for _ in 0..count {
            engine.step().unwrap();
            engine.advance_clock().unwrap();
        }
    }

    fn assert_growth(engine: &Engine<Orchard>, expected: f64) {
        let growth = engine.world().tree_growth;
        assert!(
            (growth - expected).abs() < 1e-9,
            "growth {growth}, expected {expected}"
        );
    }

    #[test]
    fn briefing_lists_plant_care_tools() {
        let briefing = scenario().unwrap().briefing();
        let names: Vec<&str> = briefing.tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["do_nothing", "fertilize", "water_trees"]);
    }

    #[test]
    fn weather_shapes_unattended_growth() {
        let mut engine = engine();
        run_ticks(&mut engine, 3);
        // Two ticks of good weather.
        assert_growth(&engine, 9.0);
        run_ticks(&mut engine, 5);
        // Three ticks of bad weather.
        assert_growth(&engine, 8.0);
    }

    #[test]
    fn objectives_settle_on_schedule() {
        let mut engine = engine();
        run_ticks(&mut engine, 16);
        let grow = &engine.objectives()[0];
        assert_eq!(grow.status(), ObjectiveStatus::Completed);
        assert_eq!(grow.tick_done(), Some(3));
        let quickly = &engine.objectives()[1];
        assert_eq!(quickly.status(), ObjectiveStatus::Completed);
        assert_eq!(quickly.tick_done(), Some(14));
    }

    #[test]
    fn quick_objective_fails_after_deadline() {
        let objective = GrowTreesQuickly {
            target_growth: 15.0,
            max_ticks: 20,
        };
        let world = Orchard { tree_growth: 12.0 };
        assert!(!objective.is_failed(&world, 20));
        assert!(objective.is_failed(&world, 21));
    }

    #[test]
    fn fertilizer_steps_after_its_start_tick() {
        let mut engine = engine();
        engine.execute_action("fertilize", &Parameters::new()).unwrap();
        run_ticks(&mut engine, 10);
        let fertilize = &engine.actions()[0];
        assert_eq!(fertilize.status(), ActionStatus::Completed);
        assert_eq!(fertilize.tick_started(), Some(0));
        assert_eq!(fertilize.tick_completed(), Some(9));
        // Nine of the ten half-unit doses, on ticks 1 to 9.
        assert_growth(&engine, 14.5);
    }

    #[test]
    fn watering_preempts_fertilizing() {
        let mut engine = engine();
        engine.execute_action("fertilize", &Parameters::new()).unwrap();
        run_ticks(&mut engine, 1);
        let feedback = engine.execute_action("water_trees", &Parameters::new()).unwrap();
        assert_eq!(feedback.reason, AdmissionReason::AcceptedPreemptedLowerPriority);
        assert_eq!(feedback.preempted[0].name, "fertilize");

        run_ticks(&mut engine, 1);
        let refused = engine.execute_action("fertilize", &Parameters::new()).unwrap();
        assert!(!refused.accepted);
    }

    #[test]
    fn tool_arguments_override_defaults() {
        let mut engine = engine();
        let call = ToolCall::new("fertilize").with_argument("boost", json!(8.0));
        let feedback = engine.execute_action(&call.tool_name, &call.arguments).unwrap();
        let started = feedback.started_action.unwrap();
        assert_eq!(started.parameters.get("boost"), Some(&json!(8.0)));
    }
}
