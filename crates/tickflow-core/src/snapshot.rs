//! Agent-facing summaries built from live entities.
//!
//! Everything here is a pure function of entity state and the current
//! tick. The engine calls [`system_state`] after every step and every
//! admission; nothing reads the result back into the scheduler.

use tickflow_types::{
    ActionFeedback, ActionStatus, ActionSummary, EventAwareness, EventScheduleView, EventSummary,
    ObjectiveSummary, SystemState,
};

use crate::action::Action;
use crate::event::Event;
use crate::lifecycle::ticks_elapsed;
use crate::objective::Objective;

/// Summarize one action as of `tick`.
pub fn action_summary<S>(action: &Action<S>, tick: u64) -> ActionSummary {
    let elapsed = ticks_elapsed(action.tick_started(), tick);
    ActionSummary {
        id: action.id(),
        name: action.name().to_owned(),
        status: action.status(),
        concurrency_tag: action.concurrency_tag().map(str::to_owned),
        priority: action.priority(),
        tick_started: action.tick_started(),
        ticks_required: action.ticks_required(),
        ticks_elapsed: elapsed,
        ticks_remaining: action.ticks_required().saturating_sub(elapsed),
        tick_completed: action.tick_completed(),
        tick_stopped: action.tick_stopped(),
        parameters: action.parameters(),
    }
}

/// Summarize one event as of `tick`. The schedule is only included for
/// omniscient events.
pub fn event_summary<S>(event: &Event<S>, tick: u64) -> EventSummary {
    let schedule = event.schedule();
    let elapsed = ticks_elapsed(event.tick_started(), tick);
    let view = match schedule.awareness {
        EventAwareness::Omniscient => Some(EventScheduleView {
            tick_start: schedule.tick_start,
            tick_duration: schedule.tick_duration,
            tick_completed: event.tick_completed(),
            ticks_remaining: schedule.tick_duration.saturating_sub(elapsed),
        }),
        EventAwareness::PresentOnly => None,
    };
    EventSummary {
        id: event.id(),
        name: event.name().to_owned(),
        description: event.description().trim().to_owned(),
        status: event.status(),
        awareness: schedule.awareness,
        tick_started: event.tick_started(),
        ticks_elapsed: elapsed,
        schedule: view,
        parameters: event.parameters(),
    }
}

/// Summarize one objective as of `tick`.
pub fn objective_summary<S>(objective: &Objective<S>, tick: u64) -> ObjectiveSummary {
    ObjectiveSummary {
        id: objective.id(),
        name: objective.name().to_owned(),
        description: objective.description().trim().to_owned(),
        status: objective.status(),
        tick_start: objective.tick_start(),
        tick_done: objective.tick_done(),
        ticks_elapsed: ticks_elapsed(Some(objective.tick_start()), tick),
        parameters: objective.parameters(),
    }
}

/// Rebuild the full snapshot: running actions, observable events, every
/// objective, and the latest admission feedback.
pub fn system_state<S>(
    tick: u64,
    actions: &[Action<S>],
    events: &[Event<S>],
    objectives: &[Objective<S>],
    last_action_feedback: Option<ActionFeedback>,
) -> SystemState {
    SystemState {
        running_actions: actions
            .iter()
            .filter(|action| action.status() == ActionStatus::InProgress)
            .map(|action| action_summary(action, tick))
            .collect(),
        events: events
            .iter()
            .filter(|event| event.is_observable())
            .map(|event| event_summary(event, tick))
            .collect(),
        objectives: objectives
            .iter()
            .map(|objective| objective_summary(objective, tick))
            .collect(),
        last_action_feedback,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tickflow_types::{ActionSpec, EventStatus, Parameters};

    use super::*;
    use crate::context::TickContext;
    use crate::event::{EventKind, EventSchedule};
    use crate::objective::ObjectiveKind;
    use crate::registry::DoNothing;

    struct Frost;

    impl EventKind<()> for Frost {
        fn name(&self) -> &str {
            "Frost"
        }

        fn description(&self) -> &str {
            "  Cold snap.  "
        }

        fn step(&mut self, _ctx: &mut TickContext<'_, ()>) {}
    }

    struct Never;

    impl ObjectiveKind<()> for Never {
        fn name(&self) -> &str {
            "Never"
        }

        fn is_completed(&self, _world: &(), _tick: u64) -> bool {
            false
        }
    }

    fn long_action() -> Action<()> {
        let spec = ActionSpec::new("rest", "Rest.").with_ticks_required(4);
        Action::new(Arc::new(spec), Parameters::new(), Box::new(DoNothing {}))
    }

    #[test]
    fn action_elapsed_and_remaining() {
        let mut action = long_action();
        let summary = action_summary(&action, 9);
        assert_eq!(summary.ticks_elapsed, 0);
        assert_eq!(summary.ticks_remaining, 4);

        let mut rng = StdRng::seed_from_u64(0);
        action.start(&mut TickContext::new(3, &mut (), &mut rng));
        let summary = action_summary(&action, 4);
        assert_eq!(summary.ticks_elapsed, 2);
        assert_eq!(summary.ticks_remaining, 2);

        let summary = action_summary(&action, 20);
        assert_eq!(summary.ticks_remaining, 0);
    }

    #[test]
    fn omniscient_event_exposes_schedule() {
        let schedule = EventSchedule::new(5, 3).with_awareness(EventAwareness::Omniscient);
        let mut event = Event::new(schedule, Box::new(Frost)).unwrap();
        event.start(5);

        let summary = event_summary(&event, 6);
        assert_eq!(summary.status, EventStatus::InProgress);
        assert_eq!(summary.description, "Cold snap.");
        let view = summary.schedule.unwrap();
        assert_eq!(view.tick_start, 5);
        assert_eq!(view.ticks_remaining, 1);
    }

    #[test]
    fn objective_elapsed_counts_from_tick_start() {
        let objective = Objective::new(2, Box::new(Never));
        assert_eq!(objective_summary(&objective, 1).ticks_elapsed, 0);
        assert_eq!(objective_summary(&objective, 2).ticks_elapsed, 1);
        assert_eq!(objective_summary(&objective, 6).ticks_elapsed, 5);
    }

    #[test]
    fn system_state_filters_events_and_actions() {
        let hidden = Event::new(EventSchedule::new(5, 3), Box::new(Frost)).unwrap();
        let actions = vec![long_action()];
        let state = system_state(0, &actions, &[hidden], &[Objective::new(0, Box::new(Never))], None);
        assert!(state.running_actions.is_empty());
        assert!(state.events.is_empty());
        assert_eq!(state.objectives.len(), 1);
    }
}
