//! Graph Path Evaluator - multi-hop traversal with captured sets.
//!
//! # Algorithm
//!
//! 1. Start with the frontier `{start}`
//! 2. For each step, expand every frontier entity along the step's
//!    relationship kind and direction, keep targets that pass the step's
//!    kind/subtype/status filters, and union the results into the new frontier
//! 3. If the step names a capture, store the new frontier's IDs as a path set
//! 4. Filter the final frontier through the `where` constraints
//! 5. Apply the check (exists / not_exists / count_min / count_max)
//!
//! Traversal depth is exactly the number of declared steps.

mod types;

pub use types::*;

use std::collections::HashSet;
use tracing::trace;

use world_model::{Entity, GraphView};

use crate::resolver::{EntityResolver, SELF_REFERENCE};

/// Whether `assertion` holds when traversal starts at `start`.
///
/// Path sets left over from earlier evaluations are cleared first, so a
/// constraint can only see sets captured by this traversal.
pub fn evaluate_graph_path<'g>(
    start: &'g Entity,
    assertion: &GraphPathAssertion,
    resolver: &dyn EntityResolver<'g>,
) -> bool {
    resolver.clear_path_sets();
    let reached = traverse(start, assertion, resolver);
    let passed = check_frontier(assertion, reached.len());

    trace!(
        start = %start.id,
        steps = assertion.path.len(),
        reached = reached.len(),
        passed,
        "Evaluated graph path"
    );
    passed
}

/// Run the traversal and constraints, returning the surviving frontier.
///
/// Captured sets are written to the resolver as a side effect.
pub fn traverse<'g>(
    start: &'g Entity,
    assertion: &GraphPathAssertion,
    resolver: &dyn EntityResolver<'g>,
) -> Vec<&'g Entity> {
    let graph = resolver.graph();
    let mut frontier = vec![start];

    for step in &assertion.path {
        frontier = expand(&frontier, step, graph);
        if let Some(name) = &step.capture_as {
            resolver.set_path_set(name, frontier.iter().map(|e| e.id).collect());
        }
    }

    frontier
        .into_iter()
        .filter(|candidate| {
            assertion
                .constraints
                .iter()
                .all(|constraint| satisfies(candidate, start, constraint, resolver))
        })
        .collect()
}

/// Apply the assertion's final check to a frontier size.
pub fn check_frontier(assertion: &GraphPathAssertion, size: usize) -> bool {
    match assertion.check {
        PathCheck::Exists => size > 0,
        PathCheck::NotExists => size == 0,
        PathCheck::CountMin => size >= assertion.count.unwrap_or(1),
        PathCheck::CountMax => size <= assertion.count.unwrap_or(0),
    }
}

fn expand<'g>(frontier: &[&'g Entity], step: &PathStep, graph: &'g dyn GraphView) -> Vec<&'g Entity> {
    let mut seen = HashSet::new();
    let mut next = Vec::new();

    for entity in frontier {
        for neighbor in graph.neighbors(entity.id, Some(step.via.as_str()), step.direction) {
            if step.accepts(neighbor) && seen.insert(neighbor.id) {
                next.push(neighbor);
            }
        }
    }
    next
}

fn satisfies<'g>(
    candidate: &Entity,
    start: &'g Entity,
    constraint: &PathConstraint,
    resolver: &dyn EntityResolver<'g>,
) -> bool {
    let partner = |with: &str| -> Option<&'g Entity> {
        if with.trim() == SELF_REFERENCE {
            Some(start)
        } else {
            resolver.resolve(with)
        }
    };

    match constraint {
        PathConstraint::NotIn { set } => resolver
            .path_sets()
            .contains(set, candidate.id)
            .map_or(true, |present| !present),
        PathConstraint::In { set } => resolver
            .path_sets()
            .contains(set, candidate.id)
            .unwrap_or(false),
        PathConstraint::NotSelf => candidate.id != start.id,
        PathConstraint::HasRelationship {
            kind,
            with,
            direction,
        } => partner(with).map_or(false, |other| {
            resolver
                .graph()
                .has_relationship(candidate.id, Some(kind.as_str()), Some(other.id), *direction)
        }),
        PathConstraint::LacksRelationship {
            kind,
            with,
            direction,
        } => partner(with).map_or(true, |other| {
            !resolver
                .graph()
                .has_relationship(candidate.id, Some(kind.as_str()), Some(other.id), *direction)
        }),
        PathConstraint::KindEquals { kind } => &candidate.kind == kind,
        PathConstraint::SubtypeEquals { subtype } => &candidate.subtype == subtype,
        PathConstraint::Unrecognized { .. } => false,
    }
}
