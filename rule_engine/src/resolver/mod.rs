//! Entity resolution - turning symbolic references into entities.
//!
//! A reference is one of:
//! - `$self`: the entity the evaluation is about
//! - `$name`: a bound variable
//! - anything else: a raw entity ID looked up in the graph
//!
//! Unresolved references are a soft failure; callers get `None` and decide
//! what that means for their rule.

mod action;

pub use action::*;

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use world_model::{Entity, EntityId, GraphView};

use crate::context::RuleContext;

/// Sentinel reference for the evaluated entity.
pub const SELF_REFERENCE: &str = "$self";

/// Value bound to a variable name.
#[derive(Debug, Clone)]
pub enum Binding<'g> {
    Entity(&'g Entity),
    Value(serde_json::Value),
}

impl<'g> Binding<'g> {
    pub fn as_entity(&self) -> Option<&'g Entity> {
        match self {
            Binding::Entity(entity) => Some(*entity),
            Binding::Value(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Binding::Value(value) => value.as_f64(),
            Binding::Entity(_) => None,
        }
    }
}

/// Scratch storage for ID sets captured during graph-path traversal.
///
/// Scoped to one top-level evaluation; clear it (or build a fresh context)
/// before evaluating an unrelated entity.
#[derive(Debug, Default)]
pub struct PathSets {
    sets: RefCell<HashMap<String, HashSet<EntityId>>>,
}

impl PathSets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, name: &str, ids: HashSet<EntityId>) {
        self.sets.borrow_mut().insert(name.to_string(), ids);
    }

    pub fn get(&self, name: &str) -> Option<HashSet<EntityId>> {
        self.sets.borrow().get(name).cloned()
    }

    pub fn contains(&self, name: &str, id: EntityId) -> Option<bool> {
        self.sets.borrow().get(name).map(|set| set.contains(&id))
    }

    pub fn clear(&self) {
        self.sets.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.sets.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolves references and exposes the read facade plus path-set scratch.
pub trait EntityResolver<'g> {
    /// The graph being read.
    fn graph(&self) -> &'g dyn GraphView;

    /// The entity `$self` refers to.
    fn self_entity(&self) -> Option<&'g Entity>;

    /// Look up a bound variable by name (without the `$` sigil).
    fn variable(&self, name: &str) -> Option<Binding<'g>>;

    fn path_sets(&self) -> &PathSets;

    /// Resolve a reference to an entity, or `None` if it cannot be found.
    fn resolve(&self, reference: &str) -> Option<&'g Entity> {
        let reference = reference.trim();
        if reference == SELF_REFERENCE {
            return self.self_entity();
        }
        if let Some(name) = reference.strip_prefix('$') {
            return self.variable(name).and_then(|binding| binding.as_entity());
        }
        EntityId::parse(reference).and_then(|id| self.graph().entity(id))
    }

    fn set_path_set(&self, name: &str, ids: HashSet<EntityId>) {
        self.path_sets().set(name, ids);
    }

    fn path_set(&self, name: &str) -> Option<HashSet<EntityId>> {
        self.path_sets().get(name)
    }

    fn clear_path_sets(&self) {
        self.path_sets().clear();
    }
}

/// The general-purpose resolver: an optional self entity plus any number of
/// named bindings.
pub struct ContextResolver<'g> {
    graph: &'g dyn GraphView,
    self_entity: Option<&'g Entity>,
    variables: HashMap<String, Binding<'g>>,
    path_sets: PathSets,
}

impl<'g> ContextResolver<'g> {
    pub fn new(graph: &'g dyn GraphView) -> Self {
        Self {
            graph,
            self_entity: None,
            variables: HashMap::new(),
            path_sets: PathSets::new(),
        }
    }

    pub fn with_self(mut self, entity: &'g Entity) -> Self {
        self.self_entity = Some(entity);
        self
    }

    /// Bind a variable to an entity. The name may include the `$` sigil.
    pub fn bind(mut self, name: &str, entity: &'g Entity) -> Self {
        self.variables
            .insert(name.trim_start_matches('$').to_string(), Binding::Entity(entity));
        self
    }

    /// Bind a variable to a scalar value.
    pub fn bind_value(mut self, name: &str, value: impl Into<serde_json::Value>) -> Self {
        self.variables
            .insert(name.trim_start_matches('$').to_string(), Binding::Value(value.into()));
        self
    }

    /// Wrap this resolver in a fresh evaluation context.
    pub fn into_context(self) -> RuleContext<'g> {
        RuleContext::new(self)
    }
}

impl<'g> EntityResolver<'g> for ContextResolver<'g> {
    fn graph(&self) -> &'g dyn GraphView {
        self.graph
    }

    fn self_entity(&self) -> Option<&'g Entity> {
        self.self_entity
    }

    fn variable(&self, name: &str) -> Option<Binding<'g>> {
        self.variables.get(name).cloned()
    }

    fn path_sets(&self) -> &PathSets {
        &self.path_sets
    }
}
