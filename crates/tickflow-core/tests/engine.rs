//! Integration tests for tick scheduling and action admission.
//!
//! Everything here drives a bare [`Engine`] by hand: `step()`, then
//! `advance_clock()`, with admission requests slotted in between, the same
//! order the runner's two loops produce.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::missing_panics_doc
)]

use serde::{Deserialize, Serialize};
use tickflow_core::{
    ActionKind, ActionRegistry, ActionTool, Engine, EngineError, Event, EventKind, EventSchedule,
    Objective, ObjectiveKind, StaticEnvironment, TickContext,
};
use tickflow_types::{
    ActionSpec, ActionStatus, AdmissionReason, EventAwareness, EventStatus, ObjectiveStatus,
    Parameters,
};

// =============================================================================
// Fixture world and tools
// =============================================================================

#[derive(Debug, Default, Serialize)]
struct Yard {
    grass: u32,
    leaves: u32,
    storm_hits: u32,
}

/// Cuts one unit of grass per tick. Tag `yard`, priority 1, three ticks.
#[derive(Serialize, Deserialize)]
struct Trim {}

impl ActionKind<Yard> for Trim {
    fn step(&mut self, ctx: &mut TickContext<'_, Yard>) {
        ctx.world_mut().grass = ctx.world().grass.saturating_sub(1);
    }
}

impl ActionTool<Yard> for Trim {
    fn spec() -> ActionSpec {
        ActionSpec::new("trim", "Trim the grass.")
            .with_concurrency_tag("yard")
            .with_priority(1)
            .with_ticks_required(3)
    }
}

/// Same tag and priority as `trim`.
#[derive(Serialize, Deserialize)]
struct Rake {}

impl ActionKind<Yard> for Rake {
    fn step(&mut self, ctx: &mut TickContext<'_, Yard>) {
        ctx.world_mut().leaves = ctx.world().leaves.saturating_sub(1);
    }
}

impl ActionTool<Yard> for Rake {
    fn spec() -> ActionSpec {
        ActionSpec::new("rake", "Rake the leaves.")
            .with_concurrency_tag("yard")
            .with_priority(1)
            .with_ticks_required(2)
    }
}

/// Higher-priority yard work.
#[derive(Serialize, Deserialize)]
struct Mulch {}

impl ActionKind<Yard> for Mulch {
    fn step(&mut self, _ctx: &mut TickContext<'_, Yard>) {}
}

impl ActionTool<Yard> for Mulch {
    fn spec() -> ActionSpec {
        ActionSpec::new("mulch", "Spread mulch.")
            .with_concurrency_tag("yard")
            .with_priority(5)
            .with_ticks_required(2)
    }
}

/// Untagged, lowest priority.
#[derive(Serialize, Deserialize)]
struct Whistle {}

impl ActionKind<Yard> for Whistle {
    fn step(&mut self, _ctx: &mut TickContext<'_, Yard>) {}
}

impl ActionTool<Yard> for Whistle {
    fn spec() -> ActionSpec {
        ActionSpec::new("whistle", "Whistle a tune.")
    }
}

struct Storm;

impl EventKind<Yard> for Storm {
    fn name(&self) -> &str {
        "Storm"
    }

    fn step(&mut self, ctx: &mut TickContext<'_, Yard>) {
        let yard = ctx.world_mut();
        yard.storm_hits = yard.storm_hits.saturating_add(1);
        yard.leaves = yard.leaves.saturating_add(2);
    }
}

struct ShortGrass {
    below: u32,
}

impl ObjectiveKind<Yard> for ShortGrass {
    fn name(&self) -> &str {
        "ShortGrass"
    }

    fn is_completed(&self, world: &Yard, _tick: u64) -> bool {
        world.grass < self.below
    }
}

struct Deadline {
    tick: u64,
}

impl ObjectiveKind<Yard> for Deadline {
    fn name(&self) -> &str {
        "Deadline"
    }

    fn is_completed(&self, world: &Yard, _tick: u64) -> bool {
        world.grass == 0
    }

    fn is_failed(&self, _world: &Yard, tick: u64) -> bool {
        tick > self.tick
    }
}

/// Grows grass back while in progress. Never settles.
struct Regrow;

impl ObjectiveKind<Yard> for Regrow {
    fn name(&self) -> &str {
        "Regrow"
    }

    fn step(&mut self, ctx: &mut TickContext<'_, Yard>) {
        let yard = ctx.world_mut();
        yard.grass = yard.grass.saturating_add(1);
    }

    fn is_completed(&self, _world: &Yard, _tick: u64) -> bool {
        false
    }
}

fn yard_engine(grass: u32) -> Engine<Yard> {
    seeded_yard_engine(grass, 11)
}

fn seeded_yard_engine(grass: u32, seed: u64) -> Engine<Yard> {
    let mut registry = ActionRegistry::<Yard>::new();
    registry
        .register::<Trim>()
        .unwrap()
        .register::<Rake>()
        .unwrap()
        .register::<Mulch>()
        .unwrap()
        .register::<Whistle>()
        .unwrap();
    Engine::new(
        Yard {
            grass,
            leaves: 10,
            storm_hits: 0,
        },
        Box::new(StaticEnvironment),
        registry,
        seed,
    )
}

fn request(engine: &mut Engine<Yard>, tool: &str) -> tickflow_types::ActionFeedback {
    engine.execute_action(tool, &Parameters::new()).unwrap()
}

/// One world-loop turn.
fn tick(engine: &mut Engine<Yard>) {
    engine.step().unwrap();
    engine.advance_clock().unwrap();
}

fn status_of(engine: &Engine<Yard>, name: &str) -> ActionStatus {
    engine
        .actions()
        .iter()
        .find(|action| action.name() == name)
        .map(tickflow_core::Action::status)
        .unwrap()
}

// =============================================================================
// Admission
// =============================================================================

#[test]
fn equal_priority_conflict_is_rejected_and_incumbent_keeps_running() {
    let mut engine = yard_engine(10);
    request(&mut engine, "trim");
    tick(&mut engine);
    assert_eq!(status_of(&engine, "trim"), ActionStatus::InProgress);

    let feedback = request(&mut engine, "rake");
    assert!(!feedback.accepted);
    assert_eq!(
        feedback.reason,
        AdmissionReason::RejectedHigherOrEqualPriorityConflict
    );
    assert_eq!(feedback.conflicts.len(), 1);
    assert_eq!(feedback.conflicts[0].name, "trim");
    assert!(feedback.preempted.is_empty());
    assert!(feedback.started_action.is_none());

    assert_eq!(engine.actions().len(), 1);
    assert_eq!(status_of(&engine, "trim"), ActionStatus::InProgress);
    assert_eq!(engine.world().leaves, 10);
}

#[test]
fn higher_priority_preempts_in_the_same_call() {
    let mut engine = yard_engine(10);
    request(&mut engine, "trim");
    tick(&mut engine);

    let feedback = request(&mut engine, "mulch");
    assert!(feedback.accepted);
    assert_eq!(
        feedback.reason,
        AdmissionReason::AcceptedPreemptedLowerPriority
    );
    assert_eq!(feedback.tick, 1);
    assert_eq!(feedback.preempted.len(), 1);
    let preempted = &feedback.preempted[0];
    assert_eq!(preempted.name, "trim");
    assert_eq!(preempted.status, ActionStatus::Stopped);
    assert_eq!(preempted.tick_stopped, Some(1));

    // Stopped before any further step runs.
    assert_eq!(status_of(&engine, "trim"), ActionStatus::Stopped);
    assert_eq!(status_of(&engine, "mulch"), ActionStatus::NotStarted);

    tick(&mut engine);
    assert_eq!(status_of(&engine, "mulch"), ActionStatus::InProgress);
    assert_eq!(status_of(&engine, "trim"), ActionStatus::Stopped);
    // Trim started on tick 0 and was stopped before its first step.
    assert_eq!(engine.world().grass, 10);
}

#[test]
fn untagged_actions_never_conflict() {
    let mut engine = yard_engine(10);
    request(&mut engine, "trim");
    request(&mut engine, "whistle");
    tick(&mut engine);

    let feedback = request(&mut engine, "whistle");
    assert!(feedback.accepted);
    assert_eq!(feedback.reason, AdmissionReason::AcceptedNoConflict);
    assert!(feedback.conflicts.is_empty());
    assert_eq!(status_of(&engine, "trim"), ActionStatus::InProgress);
}

#[test]
fn pending_actions_are_not_conflicts() {
    let mut engine = yard_engine(10);
    assert!(request(&mut engine, "trim").accepted);
    assert!(request(&mut engine, "rake").accepted);
    tick(&mut engine);
    assert_eq!(status_of(&engine, "trim"), ActionStatus::InProgress);
    assert_eq!(status_of(&engine, "rake"), ActionStatus::InProgress);
}

#[test]
fn finished_actions_are_not_conflicts() {
    let mut engine = yard_engine(10);
    request(&mut engine, "rake");
    tick(&mut engine);
    tick(&mut engine);
    assert_eq!(status_of(&engine, "rake"), ActionStatus::Completed);

    let feedback = request(&mut engine, "trim");
    assert_eq!(feedback.reason, AdmissionReason::AcceptedNoConflict);
}

#[test]
fn unknown_tool_aborts_with_configuration_error() {
    let mut engine = yard_engine(10);
    let err = engine
        .execute_action("leaf_blower", &Parameters::new())
        .unwrap_err();
    assert!(matches!(err, EngineError::Configuration { .. }));
    assert!(engine.actions().is_empty());
}

// =============================================================================
// Lifecycles
// =============================================================================

#[test]
fn completed_action_ran_for_its_full_duration() {
    let mut engine = yard_engine(10);
    request(&mut engine, "trim");
    for _ in 0..5 {
        tick(&mut engine);
    }
    let trim = &engine.actions()[0];
    assert_eq!(trim.status(), ActionStatus::Completed);
    let started = trim.tick_started().unwrap();
    let completed = trim.tick_completed().unwrap();
    assert_eq!((started, completed), (0, 2));
    assert!(completed - started + 1 >= trim.ticks_required());
    // Started on tick 0, stepped on ticks 1 and 2.
    assert_eq!(engine.world().grass, 8);
}

#[test]
fn event_follows_its_schedule() {
    let mut engine = yard_engine(10);
    engine.add_event(
        Event::new(
            EventSchedule::new(5, 3).with_awareness(EventAwareness::Omniscient),
            Box::new(Storm),
        )
        .unwrap(),
    );

    for expected_before_step in 0..=9_u64 {
        assert_eq!(engine.tick(), expected_before_step);
        engine.step().unwrap();
        let storm = &engine.events()[0];
        match engine.tick() {
            0..=4 => assert_eq!(storm.status(), EventStatus::NotStarted),
            5 | 6 => assert_eq!(storm.status(), EventStatus::InProgress),
            _ => {
                assert_eq!(storm.status(), EventStatus::Completed);
                assert_eq!(storm.tick_started(), Some(5));
                assert_eq!(storm.tick_completed(), Some(7));
            }
        }
        engine.advance_clock().unwrap();
    }
    assert_eq!(engine.world().storm_hits, 3);
    assert!(engine.system_state().events.is_empty());
}

#[test]
fn present_only_event_is_visible_only_while_running() {
    let mut engine = yard_engine(10);
    engine.add_event(Event::new(EventSchedule::new(1, 1), Box::new(Storm)).unwrap());

    engine.step().unwrap();
    assert!(engine.system_state().events.is_empty());
    engine.advance_clock().unwrap();

    engine.step().unwrap();
    // Started and finished on tick 1.
    assert!(engine.system_state().events.is_empty());
    assert_eq!(engine.events()[0].tick_completed(), Some(1));
}

#[test]
fn objective_settles_on_first_satisfying_tick() {
    let mut engine = yard_engine(10);
    engine.add_objective(Objective::new(1, Box::new(ShortGrass { below: 9 })));
    request(&mut engine, "trim");

    tick(&mut engine);
    assert_eq!(engine.objectives()[0].status(), ObjectiveStatus::NotStarted);

    tick(&mut engine);
    // Started on tick 1 with grass at 9.
    assert_eq!(engine.world().grass, 9);
    assert_eq!(engine.objectives()[0].status(), ObjectiveStatus::InProgress);

    tick(&mut engine);
    let objective = &engine.objectives()[0];
    assert_eq!(objective.status(), ObjectiveStatus::Completed);
    assert_eq!(objective.tick_done(), Some(2));
}

#[test]
fn objective_is_first_evaluated_the_tick_after_it_starts() {
    let mut engine = yard_engine(10);
    engine.add_objective(Objective::new(2, Box::new(ShortGrass { below: 100 })));

    for _ in 0..3 {
        tick(&mut engine);
    }
    // Due on tick 2 and already satisfied, but only started.
    assert_eq!(engine.objectives()[0].status(), ObjectiveStatus::InProgress);
    assert_eq!(engine.objectives()[0].tick_done(), None);

    tick(&mut engine);
    assert_eq!(engine.objectives()[0].status(), ObjectiveStatus::Completed);
    assert_eq!(engine.objectives()[0].tick_done(), Some(3));
}

#[test]
fn objective_steps_while_in_progress() {
    let mut engine = yard_engine(10);
    engine.add_objective(Objective::new(1, Box::new(Regrow)));
    for _ in 0..5 {
        tick(&mut engine);
    }
    // Started on tick 1, stepped on ticks 2 to 4.
    assert_eq!(engine.world().grass, 13);
}

#[test]
fn objective_fails_after_deadline() {
    let mut engine = yard_engine(10);
    engine.add_objective(Objective::new(0, Box::new(Deadline { tick: 1 })));
    for _ in 0..4 {
        tick(&mut engine);
    }
    let objective = &engine.objectives()[0];
    assert_eq!(objective.status(), ObjectiveStatus::Failed);
    assert_eq!(objective.tick_done(), Some(2));
    assert_eq!(
        engine.system_state().objectives[0].status,
        ObjectiveStatus::Failed
    );
}

#[test]
fn finished_entities_are_inert() {
    let mut engine = yard_engine(10);
    engine.add_event(Event::new(EventSchedule::new(0, 1), Box::new(Storm)).unwrap());
    request(&mut engine, "whistle");
    tick(&mut engine);
    let hits = engine.world().storm_hits;

    for _ in 0..3 {
        tick(&mut engine);
    }
    assert_eq!(engine.world().storm_hits, hits);
    assert_eq!(status_of(&engine, "whistle"), ActionStatus::Completed);
    assert_eq!(engine.actions()[0].tick_completed(), Some(1));
    assert_eq!(engine.events()[0].tick_completed(), Some(0));
}

#[test]
fn snapshot_tracks_running_actions_and_feedback() {
    let mut engine = yard_engine(10);
    let feedback = request(&mut engine, "trim");
    assert_eq!(
        engine.system_state().last_action_feedback.as_ref(),
        Some(&feedback)
    );

    tick(&mut engine);
    let running = &engine.system_state().running_actions;
    assert_eq!(running.len(), 1);
    assert_eq!(running[0].ticks_elapsed, 1);
    assert_eq!(running[0].ticks_remaining, 2);
    // Feedback survives the step.
    assert_eq!(
        engine.system_state().last_action_feedback.as_ref(),
        Some(&feedback)
    );
}

// =============================================================================
// Invariants and reproducibility
// =============================================================================

#[test]
fn clock_behind_a_start_tick_fails_the_step() {
    let mut engine = yard_engine(10);
    for _ in 0..3 {
        tick(&mut engine);
    }
    request(&mut engine, "trim");
    tick(&mut engine);
    assert_eq!(engine.actions()[0].tick_started(), Some(3));

    engine.restore_clock(1);
    match engine.step().unwrap_err() {
        EngineError::StateInvariantViolation { source } => {
            assert_eq!(source.entity, "action");
            assert_eq!(source.name, "trim");
            assert!(source.reason.contains("precedes"));
        }
        other => panic!("expected an invariant violation, got {other:?}"),
    }
}

/// Runs a yard with a coin-flip storm and a coin-flip regrowth objective,
/// returning `(storm_hits, grass)` after every tick.
fn coin_flip_trace(seed: u64) -> Vec<(u32, u32)> {
    let mut engine = seeded_yard_engine(10, seed);
    engine.add_event(
        Event::new(EventSchedule::new(0, 20).with_probability(0.5), Box::new(Storm)).unwrap(),
    );
    engine.add_objective(
        Objective::new(0, Box::new(Regrow))
            .with_probability(0.5)
            .unwrap(),
    );
    (0..20)
        .map(|_| {
            tick(&mut engine);
            (engine.world().storm_hits, engine.world().grass)
        })
        .collect()
}

#[test]
fn same_seed_replays_probability_gated_effects() {
    let first = coin_flip_trace(99);
    let second = coin_flip_trace(99);
    assert_eq!(first, second);

    let (hits, grass) = first[19];
    assert!((1..20).contains(&hits), "storm hit {hits} of 20 ticks");
    // Regrow is stepped on ticks 1 to 19 at most.
    assert!((10..=29).contains(&grass));
}
