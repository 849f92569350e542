//! Per-tick execution context lent to environments and entity kinds.

use rand::rngs::StdRng;

/// Everything a kind may touch while doing its per-tick work.
///
/// The engine builds one context per callback, so a kind never holds on to
/// world state between ticks and never sees the clock itself.
#[derive(Debug)]
pub struct TickContext<'a, S> {
    tick: u64,
    world: &'a mut S,
    rng: &'a mut StdRng,
}

impl<'a, S> TickContext<'a, S> {
    /// Create a context for `tick`.
    pub const fn new(tick: u64, world: &'a mut S, rng: &'a mut StdRng) -> Self {
        Self { tick, world, rng }
    }

    /// The tick being executed.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Read-only access to the domain world state.
    pub const fn world(&self) -> &S {
        self.world
    }

    /// Mutable access to the domain world state.
    pub const fn world_mut(&mut self) -> &mut S {
        self.world
    }

    /// The engine's seeded random number generator.
    pub const fn rng(&mut self) -> &mut StdRng {
        self.rng
    }
}
