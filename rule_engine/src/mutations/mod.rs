//! Mutation preparation.
//!
//! Preparing a mutation resolves its references against the context and
//! turns it into a `ChangeSet`. Nothing is written to the graph here; the
//! caller commits the result through a `MutationSink`.

mod types;

pub use types::*;

use tracing::{debug, warn};
use world_model::{
    ChangeSet, Entity, EntityChange, PressureChange, Relationship, RelationshipKey, StrengthChange,
};

use crate::context::RuleContext;

/// Prepare a single mutation.
pub fn prepare_mutation(mutation: &Mutation, ctx: &RuleContext<'_>) -> MutationResult {
    let result = prepare(mutation, ctx);
    if !result.skipped.is_empty() {
        debug!(mutation = mutation.type_name(), reason = %result.diagnostic, "Mutation skipped");
    }
    result
}

/// Prepare mutations in order and merge their change sets. A mutation that
/// cannot be prepared is recorded in `skipped`; the rest still apply.
pub fn prepare_mutations(mutations: &[Mutation], ctx: &RuleContext<'_>) -> MutationResult {
    let mut changes = ChangeSet::new();
    let mut skipped = Vec::new();

    for mutation in mutations {
        let result = prepare_mutation(mutation, ctx);
        changes.merge(result.changes);
        skipped.extend(result.skipped);
    }

    let prepared = mutations.len() - skipped.len();
    let mut result = MutationResult::prepared(
        format!("prepared {} of {} mutation(s)", prepared, mutations.len()),
        changes,
    );
    result.skipped = skipped;
    result
}

fn prepare(mutation: &Mutation, ctx: &RuleContext<'_>) -> MutationResult {
    let mut changes = ChangeSet::new();

    match mutation {
        Mutation::SetTag { entity, tag, value } => {
            let Some(found) = ctx.resolve(entity) else {
                return unresolved(mutation, entity);
            };
            changes.entity_changes.push(EntityChange::SetTag {
                entity: found.id,
                tag: tag.clone(),
                value: value.clone(),
            });
            MutationResult::prepared(format!("set tag '{}' on {}", tag, found.name), changes)
        }

        Mutation::RemoveTag { entity, tag } => {
            let Some(found) = ctx.resolve(entity) else {
                return unresolved(mutation, entity);
            };
            changes.entity_changes.push(EntityChange::RemoveTag {
                entity: found.id,
                tag: tag.clone(),
            });
            MutationResult::prepared(format!("remove tag '{}' from {}", tag, found.name), changes)
        }

        Mutation::ChangeStatus { entity, new_status } => {
            let Some(found) = ctx.resolve(entity) else {
                return unresolved(mutation, entity);
            };
            changes.entity_changes.push(EntityChange::SetStatus {
                entity: found.id,
                status: new_status.clone(),
            });
            MutationResult::prepared(
                format!("{}: {} -> {}", found.name, found.status, new_status),
                changes,
            )
        }

        Mutation::AdjustProminence { entity, delta } => {
            let Some(found) = ctx.resolve(entity) else {
                return unresolved(mutation, entity);
            };
            changes.entity_changes.push(EntityChange::ShiftProminence {
                entity: found.id,
                steps: *delta,
            });
            MutationResult::prepared(
                format!(
                    "{}: {} -> {}",
                    found.name,
                    found.prominence,
                    found.prominence.shifted(*delta)
                ),
                changes,
            )
        }

        Mutation::CreateRelationship {
            kind,
            src,
            dst,
            strength,
            category,
            bidirectional,
        } => {
            let Some(from) = ctx.resolve(src) else {
                return unresolved(mutation, src);
            };
            let Some(to) = ctx.resolve(dst) else {
                return unresolved(mutation, dst);
            };
            let catalyst = ctx.self_entity();

            changes.new_relationships.push(edge(kind, from, to, *strength, category, catalyst));
            if *bidirectional {
                changes.new_relationships.push(edge(kind, to, from, *strength, category, catalyst));
            }
            let arrow = if *bidirectional { "<->" } else { "->" };
            MutationResult::prepared(
                format!("{} {} {} {}", from.name, kind, arrow, to.name),
                changes,
            )
        }

        Mutation::ArchiveRelationship {
            entity,
            with,
            kind,
            direction,
        } => {
            let Some(found) = ctx.resolve(entity) else {
                return unresolved(mutation, entity);
            };
            let Some(other) = ctx.resolve(with) else {
                return unresolved(mutation, with);
            };
            changes.archived_relationships.push(RelationshipKey {
                kind: kind.clone(),
                entity: found.id,
                other: other.id,
                direction: *direction,
            });
            MutationResult::prepared(
                format!("archive {} between {} and {}", kind, found.name, other.name),
                changes,
            )
        }

        Mutation::AdjustRelationshipStrength {
            src,
            dst,
            kind,
            delta,
        } => {
            let Some(from) = ctx.resolve(src) else {
                return unresolved(mutation, src);
            };
            let Some(to) = ctx.resolve(dst) else {
                return unresolved(mutation, dst);
            };
            changes.strength_changes.push(StrengthChange {
                key: RelationshipKey {
                    kind: kind.clone(),
                    entity: from.id,
                    other: to.id,
                    direction: world_model::Direction::Src,
                },
                delta: *delta,
            });
            MutationResult::prepared(
                format!("{} {} -> {} strength {:+}", from.name, kind, to.name, delta),
                changes,
            )
        }

        Mutation::ModifyPressure { pressure_id, delta } => {
            changes.pressure_changes.push(PressureChange {
                pressure_id: pressure_id.clone(),
                delta: *delta,
            });
            MutationResult::prepared(format!("pressure '{}' {:+}", pressure_id, delta), changes)
        }

        Mutation::Unrecognized { type_name } => {
            warn!(mutation = %type_name, "Unrecognized mutation type; skipping");
            MutationResult::skipped(format!("unrecognized mutation type '{type_name}'"))
        }
    }
}

fn edge(
    kind: &str,
    from: &Entity,
    to: &Entity,
    strength: Option<f64>,
    category: &Option<String>,
    catalyst: Option<&Entity>,
) -> Relationship {
    let mut relationship = Relationship::new(kind, from.id, to.id);
    if let Some(strength) = strength {
        relationship = relationship.with_strength(strength.clamp(0.0, 1.0));
    }
    if let Some(category) = category {
        relationship = relationship.with_category(category.clone());
    }
    if let Some(catalyst) = catalyst {
        relationship = relationship.with_catalyst(catalyst.id);
    }
    relationship
}

fn unresolved(mutation: &Mutation, reference: &str) -> MutationResult {
    MutationResult::skipped(format!(
        "{}: cannot resolve '{}'",
        mutation.type_name(),
        reference
    ))
}
