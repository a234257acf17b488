//! Metric Evaluator - numeric rules that drive probabilities and magnitudes.

mod types;

pub use types::*;

use serde_json::json;
use std::collections::HashSet;
use tracing::warn;

use world_model::{Direction, Entity, EntityId, EntityQuery, GraphView, Relationship};

use crate::context::RuleContext;
use crate::resolver::SELF_REFERENCE;

/// Evaluate a metric, then apply its coefficient and cap.
pub fn evaluate_metric(metric: &Metric, ctx: &RuleContext<'_>) -> MetricResult {
    let base = base_value(metric, ctx);
    let scale = metric.scale();
    if scale == Scale::default() {
        return base;
    }
    let value = scale.apply(base.value);
    MetricResult {
        value,
        diagnostic: format!("{} (scaled to {value})", base.diagnostic),
        details: base.details,
    }
}

fn base_value(metric: &Metric, ctx: &RuleContext<'_>) -> MetricResult {
    let graph = ctx.graph();

    match metric {
        Metric::EntityCount {
            kind,
            subtype,
            status,
            ..
        } => {
            let count = count_entities(graph, kind, subtype, status);
            MetricResult::new(count as f64, format!("{count} {kind} entit(ies)"))
        }

        Metric::RelationshipCount {
            entity,
            relationship_kinds,
            direction,
            min_strength,
            ..
        } => match entity {
            None => {
                let count = graph
                    .relationships()
                    .into_iter()
                    .filter(|rel| kind_and_strength(rel, relationship_kinds, *min_strength))
                    .count();
                MetricResult::new(count as f64, format!("{count} relationship(s) in the world"))
            }
            Some(reference) => match ctx.resolve(reference) {
                Some(found) => {
                    let count = incident(graph, found.id, relationship_kinds, *direction, *min_strength).len();
                    MetricResult::new(count as f64, format!("{} has {count} relationship(s)", found.name))
                }
                None => MetricResult::new(0.0, format!("{reference} not resolved")),
            },
        },

        Metric::TagCount { tag, .. } => {
            let count = graph.entities().into_iter().filter(|e| e.has_tag(tag)).count();
            MetricResult::new(count as f64, format!("{count} entit(ies) tagged {tag}"))
        }

        Metric::TotalEntities { .. } => {
            let count = graph.entity_count();
            MetricResult::new(count as f64, format!("{count} entit(ies) total"))
        }

        Metric::Constant { value, .. } => MetricResult::new(*value, "constant"),

        Metric::ConnectionCount {
            entity,
            relationship_kinds,
            direction,
            min_strength,
            ..
        } => match subject(ctx, entity) {
            Some(found) => {
                let count = incident(graph, found.id, relationship_kinds, *direction, *min_strength).len();
                MetricResult::new(count as f64, format!("{} has {count} connection(s)", found.name))
            }
            None => MetricResult::new(0.0, "no entity to count connections for"),
        },

        Metric::Ratio {
            numerator,
            denominator,
            fallback_value,
            ..
        } => {
            let top = count_value(numerator, graph);
            let bottom = count_value(denominator, graph);
            let result = if bottom == 0.0 {
                MetricResult::new(*fallback_value, format!("{top} / 0, using fallback {fallback_value}"))
            } else {
                MetricResult::new(top / bottom, format!("{top} / {bottom}"))
            };
            result.with_details(json!({ "numerator": top, "denominator": bottom }))
        }

        Metric::StatusRatio {
            kind,
            subtype,
            alive_status,
            ..
        } => {
            let mut query = EntityQuery::new().kind(kind.as_str());
            query.subtype = subtype.clone();
            let matching = graph.find_entities(&query);
            let alive = matching.iter().filter(|e| &e.status == alive_status).count();
            if matching.is_empty() {
                MetricResult::new(0.0, format!("no {kind} entities"))
            } else {
                MetricResult::new(
                    alive as f64 / matching.len() as f64,
                    format!("{alive} of {} {kind} entit(ies) are {alive_status}", matching.len()),
                )
            }
        }

        Metric::CrossCultureRatio {
            relationship_kinds, ..
        } => {
            let relationships: Vec<&Relationship> = graph
                .relationships()
                .into_iter()
                .filter(|rel| kind_and_strength(rel, relationship_kinds, None))
                .collect();
            let crossing = relationships
                .iter()
                .filter(|rel| match (graph.entity(rel.src), graph.entity(rel.dst)) {
                    (Some(a), Some(b)) => a.culture != b.culture,
                    _ => false,
                })
                .count();
            if relationships.is_empty() {
                MetricResult::new(0.0, "no matching relationships")
            } else {
                MetricResult::new(
                    crossing as f64 / relationships.len() as f64,
                    format!("{crossing} of {} relationship(s) cross cultures", relationships.len()),
                )
            }
        }

        Metric::SharedRelationship {
            shared_relationship_kind,
            shared_direction,
            min_strength,
            entity,
            with,
            ..
        } => {
            let Some(me) = subject(ctx, entity) else {
                return MetricResult::new(0.0, "no entity to compare against");
            };
            let kinds = std::slice::from_ref(shared_relationship_kind);
            let targets = |id: EntityId| -> HashSet<EntityId> {
                incident(graph, id, kinds, *shared_direction, *min_strength)
                    .into_iter()
                    .map(|rel| rel.other_end(id))
                    .collect()
            };
            let mine = targets(me.id);

            match with {
                Some(reference) => match ctx.resolve(reference) {
                    Some(other) => {
                        let shared = mine.intersection(&targets(other.id)).count();
                        MetricResult::new(
                            shared as f64,
                            format!(
                                "{} and {} share {shared} {shared_relationship_kind} target(s)",
                                me.name, other.name
                            ),
                        )
                    }
                    None => MetricResult::new(0.0, format!("{reference} not resolved")),
                },
                None => {
                    let sharing = graph
                        .entities()
                        .into_iter()
                        .filter(|e| e.id != me.id && !targets(e.id).is_disjoint(&mine))
                        .count();
                    MetricResult::new(
                        sharing as f64,
                        format!("{sharing} other entit(ies) share a {shared_relationship_kind} target with {}", me.name),
                    )
                }
            }
        }

        Metric::CatalyzedEvents { entity, .. } => match subject(ctx, entity) {
            Some(found) => {
                let count = found.catalyzed_events.len();
                MetricResult::new(count as f64, format!("{} catalyzed {count} event(s)", found.name))
            }
            None => MetricResult::new(0.0, "no entity"),
        },

        Metric::ProminenceMultiplier { entity, mode, .. } => match subject(ctx, entity) {
            Some(found) => {
                let value = mode.multiplier(found.prominence);
                MetricResult::new(value, format!("{} is {} ({mode:?})", found.name, found.prominence))
            }
            None => MetricResult::new(1.0, "no entity; neutral multiplier"),
        },

        Metric::DecayRate { rate, .. } => MetricResult::new(rate.coefficient(), format!("{rate:?} decay")),

        Metric::Falloff {
            falloff_type,
            distance,
            max_distance,
            ..
        } => {
            let reach = max_distance.unwrap_or(ctx.config().falloff_max_distance);
            let value = falloff_type.attenuate(*distance, reach);
            MetricResult::new(value, format!("{falloff_type:?} falloff at {distance} of {reach}"))
                .with_details(json!({ "distance": distance, "max_distance": reach }))
        }

        Metric::Variable { name, .. } => match ctx.variable(name).and_then(|b| b.as_number()) {
            Some(value) => MetricResult::new(value, format!("${} = {value}", name.trim_start_matches('$'))),
            None => MetricResult::new(0.0, format!("{name} is not a numeric binding")),
        },

        Metric::Unrecognized { type_name } => {
            warn!(metric = %type_name, "Unrecognized metric type; evaluating to 0");
            MetricResult::new(0.0, format!("unrecognized metric type '{type_name}'"))
        }
    }
}

/// Value of a plain count operand.
pub fn count_value(metric: &CountMetric, graph: &dyn GraphView) -> f64 {
    match metric {
        CountMetric::EntityCount {
            kind,
            subtype,
            status,
        } => count_entities(graph, kind, subtype, status) as f64,
        CountMetric::RelationshipCount {
            relationship_kinds,
            min_strength,
        } => graph
            .relationships()
            .into_iter()
            .filter(|rel| kind_and_strength(rel, relationship_kinds, *min_strength))
            .count() as f64,
        CountMetric::TagCount { tag } => {
            graph.entities().into_iter().filter(|e| e.has_tag(tag)).count() as f64
        }
        CountMetric::TotalEntities => graph.entity_count() as f64,
        CountMetric::Constant { value } => *value,
    }
}

fn count_entities(
    graph: &dyn GraphView,
    kind: &str,
    subtype: &Option<String>,
    status: &Option<String>,
) -> usize {
    let mut query = EntityQuery::new().kind(kind);
    query.subtype = subtype.clone();
    query.status = status.clone();
    graph.find_entities(&query).len()
}

fn kind_and_strength(rel: &Relationship, kinds: &[String], min_strength: Option<f64>) -> bool {
    (kinds.is_empty() || kinds.iter().any(|k| k == &rel.kind))
        && min_strength.map_or(true, |floor| rel.strength() >= floor)
}

fn incident<'g>(
    graph: &'g dyn GraphView,
    id: EntityId,
    kinds: &[String],
    direction: Direction,
    min_strength: Option<f64>,
) -> Vec<&'g Relationship> {
    graph
        .relationships_of(id, None, direction)
        .into_iter()
        .filter(|rel| kind_and_strength(rel, kinds, min_strength))
        .collect()
}

fn subject<'g>(ctx: &RuleContext<'g>, reference: &Option<String>) -> Option<&'g Entity> {
    ctx.resolve(reference.as_deref().unwrap_or(SELF_REFERENCE))
}
