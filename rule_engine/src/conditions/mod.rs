//! Condition Evaluator - boolean rules with diagnostics.
//!
//! Every branch returns a [`ConditionResult`]; nothing here fails hard.
//! Unresolved references, a missing entity and unknown rule types all
//! degrade to `passed = false` (or a documented vacuous pass) with a
//! diagnostic saying why.

mod types;

pub use types::*;

use serde_json::json;
use tracing::{debug, warn};

use world_model::{Direction, Entity, EntityQuery, GraphView, Prominence, Relationship};

use crate::context::RuleContext;
use crate::graph_path::evaluate_graph_path;

/// Evaluate one condition. `entity` defaults to the context's self entity.
pub fn evaluate_condition<'g>(
    condition: &Condition,
    ctx: &RuleContext<'g>,
    entity: Option<&'g Entity>,
) -> ConditionResult {
    let entity = entity.or_else(|| ctx.self_entity());
    let result = dispatch(condition, ctx, entity);

    if !result.passed {
        debug!(
            condition = condition.type_name(),
            entity = ?entity.map(|e| e.id),
            diagnostic = %result.diagnostic,
            "Condition failed"
        );
    }
    result
}

/// Evaluate a list as an implicit AND. Every member is evaluated.
pub fn evaluate_conditions<'g>(
    conditions: &[Condition],
    ctx: &RuleContext<'g>,
    entity: Option<&'g Entity>,
) -> ConditionResult {
    combine(conditions, ctx, entity, true)
}

fn dispatch<'g>(
    condition: &Condition,
    ctx: &RuleContext<'g>,
    entity: Option<&'g Entity>,
) -> ConditionResult {
    let graph = ctx.graph();

    match condition {
        Condition::Pressure {
            pressure_id,
            min,
            max,
        } => {
            let value = graph.pressure(pressure_id);
            let passed = min.map_or(true, |lo| value >= lo) && max.map_or(true, |hi| value <= hi);
            ConditionResult::new(
                passed,
                format!(
                    "pressure {pressure_id} = {value} (range {} to {})",
                    bound(*min),
                    bound(*max)
                ),
            )
            .with_details(json!({ "pressure": pressure_id, "value": value, "min": min, "max": max }))
        }

        Condition::PressureCompare {
            pressure_a,
            pressure_b,
            operator,
        } => {
            let a = graph.pressure(pressure_a);
            let b = graph.pressure(pressure_b);
            let passed = operator.compare(a, b);
            ConditionResult::new(
                passed,
                format!("{pressure_a} ({a}) {} {pressure_b} ({b})", operator.symbol()),
            )
            .with_details(json!({ "a": a, "b": b, "operator": operator.symbol() }))
        }

        Condition::PressureAnyAbove {
            pressure_ids,
            threshold,
        } => {
            let above: Vec<&String> = pressure_ids
                .iter()
                .filter(|id| graph.pressure(id) > *threshold)
                .collect();
            ConditionResult::new(
                !above.is_empty(),
                format!("{} of {} pressure(s) above {threshold}", above.len(), pressure_ids.len()),
            )
            .with_details(json!({ "above": above, "threshold": threshold }))
        }

        Condition::EntityCount {
            kind,
            subtype,
            status,
            min,
            max,
            overshoot_factor,
        } => {
            let mut query = EntityQuery::new().kind(kind.as_str());
            query.subtype = subtype.clone();
            query.status = status.clone();
            let count = graph.find_entities(&query).len();

            let factor = overshoot_factor.unwrap_or(ctx.config().overshoot_factor);
            let ceiling = max.map(|hi| (hi as f64 * factor).floor() as usize);
            let passed = min.map_or(true, |lo| count >= lo) && ceiling.map_or(true, |c| count < c);

            ConditionResult::new(
                passed,
                format!(
                    "{count} {kind} entit(ies); min {}, overshoot ceiling {}",
                    bound(*min),
                    bound(ceiling)
                ),
            )
            .with_details(json!({ "count": count, "min": min, "max": max, "ceiling": ceiling }))
        }

        Condition::RelationshipCount {
            relationship_kind,
            direction,
            min,
            max,
            with,
            target_kind,
            target_subtype,
            target_status,
        } => {
            let Some(entity) = entity else {
                return no_entity("relationship_count");
            };
            let scope = Scope {
                with: with.as_deref(),
                target_kind: target_kind.as_deref(),
                target_subtype: target_subtype.as_deref(),
                target_status: target_status.as_deref(),
            };
            let count = incident(ctx, entity, relationship_kind.as_deref(), *direction, &scope);
            let passed = min.map_or(true, |lo| count >= lo) && max.map_or(true, |hi| count <= hi);
            ConditionResult::new(
                passed,
                format!(
                    "{} has {count} {} relationship(s) (range {} to {})",
                    entity.name,
                    relationship_kind.as_deref().unwrap_or("any"),
                    bound(*min),
                    bound(*max)
                ),
            )
            .with_details(json!({ "count": count, "min": min, "max": max }))
        }

        Condition::RelationshipExists {
            relationship_kind,
            direction,
            with,
            target_kind,
            target_subtype,
            target_status,
        } => {
            let Some(entity) = entity else {
                return no_entity("relationship_exists");
            };
            let scope = Scope {
                with: with.as_deref(),
                target_kind: target_kind.as_deref(),
                target_subtype: target_subtype.as_deref(),
                target_status: target_status.as_deref(),
            };
            let count = incident(ctx, entity, relationship_kind.as_deref(), *direction, &scope);
            ConditionResult::new(
                count > 0,
                format!(
                    "{} has {count} matching {} relationship(s)",
                    entity.name,
                    relationship_kind.as_deref().unwrap_or("any")
                ),
            )
        }

        Condition::TagExists {
            entity: reference,
            tag,
            value,
        } => match subject(ctx, reference.as_deref(), entity) {
            Some(target) => ConditionResult::new(
                target.has_tag_value(tag, value.as_ref()),
                match value {
                    Some(v) => format!("{} tag {tag} = {v}?", target.name),
                    None => format!("{} has tag {tag}?", target.name),
                },
            )
            .with_details(json!({ "actual": target.tag(tag) })),
            None => ConditionResult::fail(format!("tag_exists: entity {} not resolved", describe_ref(reference))),
        },

        Condition::TagAbsent {
            entity: reference,
            tag,
        } => match subject(ctx, reference.as_deref(), entity) {
            Some(target) => ConditionResult::new(
                !target.has_tag(tag),
                format!("{} lacks tag {tag}?", target.name),
            ),
            None => ConditionResult::pass(format!(
                "tag_absent: entity {} not resolved; vacuously true",
                describe_ref(reference)
            )),
        },

        Condition::Status { status, not } => {
            let Some(entity) = entity else {
                return no_entity("status");
            };
            let equal = &entity.status == status;
            ConditionResult::new(
                equal != *not,
                format!(
                    "{} status '{}' {} '{status}'",
                    entity.name,
                    entity.status,
                    if *not { "!=" } else { "==" }
                ),
            )
        }

        Condition::Prominence { min, max } => {
            let Some(entity) = entity else {
                return no_entity("prominence");
            };
            let lo = min.unwrap_or(Prominence::MIN);
            let hi = max.unwrap_or(Prominence::MAX);
            ConditionResult::new(
                entity.prominence >= lo && entity.prominence <= hi,
                format!("{} is {} (range {lo} to {hi})", entity.name, entity.prominence),
            )
        }

        Condition::TimeElapsed { min_ticks, since } => {
            let Some(entity) = entity else {
                return no_entity("time_elapsed");
            };
            let stamp = match since {
                TimeAnchor::Created => entity.created_at,
                TimeAnchor::Updated => entity.updated_at,
            };
            let elapsed = ctx.tick().saturating_sub(stamp);
            ConditionResult::new(
                elapsed >= *min_ticks,
                format!("{elapsed} tick(s) since {since:?}, need {min_ticks}"),
            )
            .with_details(json!({ "elapsed": elapsed, "min_ticks": min_ticks }))
        }

        Condition::CooldownElapsed { cooldown_ticks } => match graph.rate_limits().last_creation_tick {
            None => ConditionResult::pass("no creation recorded yet"),
            Some(last) => {
                let elapsed = ctx.tick().saturating_sub(last);
                ConditionResult::new(
                    elapsed >= *cooldown_ticks,
                    format!("{elapsed} tick(s) since last creation, cooldown {cooldown_ticks}"),
                )
            }
        },

        Condition::CreationsPerEpoch { max_per_epoch } => {
            let created = graph.rate_limits().creations_this_epoch;
            ConditionResult::new(
                created < *max_per_epoch,
                format!("{created} creation(s) this epoch, max {max_per_epoch}"),
            )
        }

        Condition::EraMatch { eras } => match graph.era() {
            Some(era) => ConditionResult::new(
                eras.iter().any(|e| e == era),
                format!("era '{era}' in [{}]?", eras.join(", ")),
            ),
            None => ConditionResult::fail("no current era"),
        },

        Condition::RandomChance { chance } => {
            let draw = ctx.draw();
            ConditionResult::new(draw < *chance, format!("draw {draw:.4} < {chance}?"))
                .with_details(json!({ "draw": draw, "chance": chance }))
        }

        Condition::GraphPath { assertion } => {
            let Some(entity) = entity else {
                return no_entity("graph_path");
            };
            let passed = evaluate_graph_path(entity, assertion, ctx.resolver());
            ConditionResult::new(
                passed,
                format!("graph path ({} step(s)) from {}", assertion.path.len(), entity.name),
            )
        }

        Condition::EntityExists { entity: reference } => match ctx.resolve(reference) {
            Some(found) => ConditionResult::pass(format!("{reference} resolved to {}", found.name)),
            None => ConditionResult::fail(format!("{reference} not resolved")),
        },

        Condition::EntityHasRelationship {
            entity: reference,
            relationship_kind,
            direction,
        } => match ctx.resolve(reference) {
            Some(found) => ConditionResult::new(
                graph.has_relationship(found.id, Some(relationship_kind.as_str()), None, *direction),
                format!("{} has {relationship_kind} ({direction:?})?", found.name),
            ),
            None => ConditionResult::fail(format!("{reference} not resolved")),
        },

        Condition::And { conditions } => combine(conditions, ctx, entity, true),
        Condition::Or { conditions } => combine(conditions, ctx, entity, false),
        Condition::Always => ConditionResult::pass("always"),

        Condition::Unrecognized { type_name } => {
            warn!(condition = %type_name, "Unrecognized condition type; failing closed");
            ConditionResult::fail(format!("unrecognized condition type '{type_name}'"))
        }
    }
}

/// Eager AND (`all = true`) or OR over sub-conditions.
fn combine<'g>(
    conditions: &[Condition],
    ctx: &RuleContext<'g>,
    entity: Option<&'g Entity>,
    all: bool,
) -> ConditionResult {
    let children: Vec<ConditionResult> = conditions
        .iter()
        .map(|c| evaluate_condition(c, ctx, entity))
        .collect();
    let passing = children.iter().filter(|c| c.passed).count();
    let passed = if all {
        passing == children.len()
    } else {
        passing > 0
    };

    ConditionResult::new(
        passed,
        format!(
            "{}: {passing} of {} passed",
            if all { "and" } else { "or" },
            children.len()
        ),
    )
    .with_children(children)
}

struct Scope<'a> {
    with: Option<&'a str>,
    target_kind: Option<&'a str>,
    target_subtype: Option<&'a str>,
    target_status: Option<&'a str>,
}

/// Count active relationships incident to `entity` that pass `scope`.
/// A declared but unresolved `with` matches nothing.
fn incident<'g>(
    ctx: &RuleContext<'g>,
    entity: &Entity,
    kind: Option<&str>,
    direction: Direction,
    scope: &Scope<'_>,
) -> usize {
    let graph = ctx.graph();
    let partner = match scope.with {
        Some(reference) => match ctx.resolve(reference) {
            Some(other) => Some(other.id),
            None => return 0,
        },
        None => None,
    };

    graph
        .relationships_of(entity.id, kind, direction)
        .into_iter()
        .filter(|rel| partner.map_or(true, |other| rel.connects(entity.id, other, direction)))
        .filter(|rel| counterpart_matches(graph, entity, rel, scope))
        .count()
}

fn counterpart_matches(graph: &dyn GraphView, entity: &Entity, rel: &Relationship, scope: &Scope<'_>) -> bool {
    if scope.target_kind.is_none() && scope.target_subtype.is_none() && scope.target_status.is_none() {
        return true;
    }
    let Some(other) = graph.entity(rel.other_end(entity.id)) else {
        return false;
    };
    scope.target_kind.map_or(true, |k| other.kind == k)
        && scope.target_subtype.map_or(true, |s| other.subtype == s)
        && scope.target_status.map_or(true, |s| other.status == s)
}

/// An explicit reference wins over the evaluated entity.
fn subject<'g>(ctx: &RuleContext<'g>, reference: Option<&str>, entity: Option<&'g Entity>) -> Option<&'g Entity> {
    match reference {
        Some(reference) => ctx.resolve(reference),
        None => entity,
    }
}

fn no_entity(rule: &str) -> ConditionResult {
    ConditionResult::fail(format!("{rule}: no entity to evaluate"))
}

fn describe_ref(reference: &Option<String>) -> &str {
    reference.as_deref().unwrap_or("$self")
}

fn bound<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "unbounded".to_string(), |v| v.to_string())
}
