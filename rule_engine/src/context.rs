//! Rule context - everything one evaluation reads from.

use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use std::cell::RefCell;

use world_model::{Entity, GraphView};

use crate::config::EngineConfig;
use crate::resolver::{Binding, ContextResolver, EntityResolver};

/// Source of uniform draws in `[0, 1)`.
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;
}

/// Adapts any `rand` generator.
pub struct RngSource<R>(R);

impl<R: RngCore> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self(rng)
    }
}

impl RngSource<SmallRng> {
    /// Deterministic source for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self(SmallRng::seed_from_u64(seed))
    }
}

impl<R: RngCore> RandomSource for RngSource<R> {
    fn next_unit(&mut self) -> f64 {
        self.0.random::<f64>()
    }
}

/// Replays a fixed list of draws, cycling when exhausted.
///
/// Useful for replaying a recorded run or pinning a boundary value.
#[derive(Debug, Clone)]
pub struct FixedSequence {
    draws: Vec<f64>,
    next: usize,
}

impl FixedSequence {
    pub fn new(draws: impl Into<Vec<f64>>) -> Self {
        Self {
            draws: draws.into(),
            next: 0,
        }
    }
}

impl RandomSource for FixedSequence {
    fn next_unit(&mut self) -> f64 {
        if self.draws.is_empty() {
            return 0.0;
        }
        let draw = self.draws[self.next % self.draws.len()];
        self.next += 1;
        draw
    }
}

/// Ties together the tick, the resolver (and through it the graph, the
/// self entity and bound variables), the random source and the config.
///
/// Built fresh for each top-level evaluation and never persisted. The
/// resolver's path-set scratch lives exactly as long as the context.
pub struct RuleContext<'g> {
    tick: u64,
    resolver: Box<dyn EntityResolver<'g> + 'g>,
    random: RefCell<Box<dyn RandomSource + 'g>>,
    config: EngineConfig,
}

impl<'g> RuleContext<'g> {
    /// Create a context around a resolver. The tick is read from the graph.
    pub fn new(resolver: impl EntityResolver<'g> + 'g) -> Self {
        Self {
            tick: resolver.graph().tick(),
            resolver: Box::new(resolver),
            random: RefCell::new(Box::new(RngSource::new(rand::rng()))),
            config: EngineConfig::default(),
        }
    }

    /// Context with no self entity and no bindings.
    pub fn for_graph(graph: &'g dyn GraphView) -> Self {
        Self::new(ContextResolver::new(graph))
    }

    pub fn with_tick(mut self, tick: u64) -> Self {
        self.tick = tick;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_random(mut self, source: impl RandomSource + 'g) -> Self {
        self.random = RefCell::new(Box::new(source));
        self
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn graph(&self) -> &'g dyn GraphView {
        self.resolver.graph()
    }

    pub fn resolver(&self) -> &(dyn EntityResolver<'g> + 'g) {
        self.resolver.as_ref()
    }

    pub fn self_entity(&self) -> Option<&'g Entity> {
        self.resolver.self_entity()
    }

    pub fn resolve(&self, reference: &str) -> Option<&'g Entity> {
        self.resolver.resolve(reference)
    }

    pub fn variable(&self, name: &str) -> Option<Binding<'g>> {
        self.resolver.variable(name.trim_start_matches('$'))
    }

    /// One uniform draw in `[0, 1)`.
    pub fn draw(&self) -> f64 {
        self.random.borrow_mut().next_unit()
    }

    /// Uniform index into a collection of `len` items. `len` must be non-zero.
    pub fn draw_index(&self, len: usize) -> usize {
        let index = (self.draw() * len as f64) as usize;
        index.min(len.saturating_sub(1))
    }

    /// Drop any path sets captured so far.
    pub fn reset_scratch(&self) {
        self.resolver.clear_path_sets();
    }
}
