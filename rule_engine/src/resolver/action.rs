//! Resolver bound to an action's fixed participants.

use world_model::{Entity, GraphView};

use super::{Binding, EntityResolver, PathSets};
use crate::context::RuleContext;

/// Resolves the fixed variable set an action runs with: `$actor` (also
/// `$self`), `$instigator`, `$target` and `$target2`.
pub struct ActionResolver<'g> {
    graph: &'g dyn GraphView,
    actor: &'g Entity,
    instigator: Option<&'g Entity>,
    target: Option<&'g Entity>,
    target2: Option<&'g Entity>,
    path_sets: PathSets,
}

impl<'g> ActionResolver<'g> {
    pub fn new(graph: &'g dyn GraphView, actor: &'g Entity) -> Self {
        Self {
            graph,
            actor,
            instigator: None,
            target: None,
            target2: None,
            path_sets: PathSets::new(),
        }
    }

    pub fn with_instigator(mut self, entity: &'g Entity) -> Self {
        self.instigator = Some(entity);
        self
    }

    pub fn with_target(mut self, entity: &'g Entity) -> Self {
        self.target = Some(entity);
        self
    }

    pub fn with_second_target(mut self, entity: &'g Entity) -> Self {
        self.target2 = Some(entity);
        self
    }

    pub fn actor(&self) -> &'g Entity {
        self.actor
    }

    /// Wrap this resolver in a fresh evaluation context.
    pub fn into_context(self) -> RuleContext<'g> {
        RuleContext::new(self)
    }
}

impl<'g> EntityResolver<'g> for ActionResolver<'g> {
    fn graph(&self) -> &'g dyn GraphView {
        self.graph
    }

    fn self_entity(&self) -> Option<&'g Entity> {
        Some(self.actor)
    }

    fn variable(&self, name: &str) -> Option<Binding<'g>> {
        let entity = match name {
            "actor" => Some(self.actor),
            "instigator" => self.instigator,
            "target" => self.target,
            "target2" => self.target2,
            _ => None,
        };
        entity.map(Binding::Entity)
    }

    fn path_sets(&self) -> &PathSets {
        &self.path_sets
    }
}
