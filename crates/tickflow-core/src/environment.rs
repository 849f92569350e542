//! The per-tick world hook.

use crate::context::TickContext;

/// Ambient world dynamics, applied once per tick before any action runs.
pub trait Environment<S>: Send {
    /// Advance the world by one tick.
    fn step(&mut self, ctx: &mut TickContext<'_, S>);
}

/// An environment in which nothing happens on its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticEnvironment;

impl<S> Environment<S> for StaticEnvironment {
    fn step(&mut self, _ctx: &mut TickContext<'_, S>) {}
}

impl<S, F> Environment<S> for F
where
    F: FnMut(&mut TickContext<'_, S>) + Send,
{
    fn step(&mut self, ctx: &mut TickContext<'_, S>) {
        self(ctx);
    }
}
