//! Decision source trait and simple implementations.
//!
//! On each of its turns the decision loop hands the decision-maker an
//! [`Observation`] and gets back at most one [`ToolCall`]. The
//! [`DecisionSource`] trait abstracts how that answer is produced: a
//! language model behind some transport, a scripted bot, a human at a
//! prompt, or a test stub.

use std::collections::VecDeque;

use tickflow_types::{Briefing, Observation, ToolCall};

/// Errors a decision source can report. The runner treats all of them as
/// fatal.
#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    /// The decision source failed internally.
    #[error("decision source error: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },

    /// The decision-maker produced output that could not be understood.
    #[error("unparseable decision: {message}")]
    Unparseable {
        /// What was wrong with the output.
        message: String,
    },
}

/// A source of decisions for the decision loop.
///
/// `decide` is called while the runner holds the scheduling lock, so the
/// world does not advance until it returns.
pub trait DecisionSource: Send {
    /// Receive the scenario briefing once, before the first turn.
    fn on_start(&mut self, _briefing: &Briefing) {}

    /// Choose at most one tool call for this turn.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError`] if no decision could be produced.
    fn decide(&mut self, observation: &Observation) -> Result<Option<ToolCall>, DecisionError>;
}

impl<F> DecisionSource for F
where
    F: FnMut(&Observation) -> Result<Option<ToolCall>, DecisionError> + Send,
{
    fn decide(&mut self, observation: &Observation) -> Result<Option<ToolCall>, DecisionError> {
        self(observation)
    }
}

/// A decision source that never acts.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleDecisionSource;

impl IdleDecisionSource {
    /// Create a new idle source.
    pub const fn new() -> Self {
        Self
    }
}

impl DecisionSource for IdleDecisionSource {
    fn decide(&mut self, _observation: &Observation) -> Result<Option<ToolCall>, DecisionError> {
        Ok(None)
    }
}

/// Replays a fixed queue of turns, then stays idle.
///
/// Each entry is one turn: `Some(call)` submits a request, `None` passes.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDecisionSource {
    turns: VecDeque<Option<ToolCall>>,
    briefing: Option<Briefing>,
}

impl ScriptedDecisionSource {
    /// Create a source from the given turns.
    pub fn new(turns: impl IntoIterator<Item = Option<ToolCall>>) -> Self {
        Self {
            turns: turns.into_iter().collect(),
            briefing: None,
        }
    }

    /// Turns not yet replayed.
    pub fn remaining(&self) -> usize {
        self.turns.len()
    }

    /// The briefing received at start, if any.
    pub const fn briefing(&self) -> Option<&Briefing> {
        self.briefing.as_ref()
    }
}

impl DecisionSource for ScriptedDecisionSource {
    fn on_start(&mut self, briefing: &Briefing) {
        self.briefing = Some(briefing.clone());
    }

    fn decide(&mut self, _observation: &Observation) -> Result<Option<ToolCall>, DecisionError> {
        Ok(self.turns.pop_front().flatten())
    }
}
