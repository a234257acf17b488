//! Selection Engine - strategy, narrowing, saturation, pick.
//!
//! # Pipeline
//!
//! 1. Pool: every entity of the requested kind(s), or every entity
//! 2. Strategy narrows the pool
//! 3. Subtype include/exclude lists, then status filters
//! 4. The selection filter chain
//! 5. Saturation limits
//! 6. Pick strategy reduces to the final result
//!
//! Each step can be recorded in a [`SelectionTrace`].

mod sampling;
mod trace;
mod types;

pub use sampling::*;
pub use trace::*;
pub use types::*;

use world_model::{Entity, GraphView};

use crate::context::RuleContext;
use crate::filters::{apply_filter, apply_filters};

/// Resolve a free selection to its final entity list.
pub fn select_entities<'g>(
    rule: &SelectionRule,
    ctx: &RuleContext<'g>,
    mut trace: Option<&mut SelectionTrace>,
) -> Vec<&'g Entity> {
    let graph = ctx.graph();
    let mut record = |description: String, remaining: usize| {
        if let Some(trace) = trace.as_deref_mut() {
            trace.record(description, remaining);
        }
    };

    let kinds = kind_set(&rule.kind, &rule.kinds);
    let pool = pool_of_kinds(graph.entities(), &kinds);
    record(format!("pool of kind(s) [{}]", kinds.join(", ")), pool.len());

    let candidates = apply_strategy(pool, &rule.strategy, ctx);
    record(format!("strategy {}", strategy_name(&rule.strategy)), candidates.len());

    let candidates = narrow_subtypes(candidates, &rule.subtypes, &rule.exclude_subtypes);
    record("subtype lists".to_string(), candidates.len());

    let candidates = narrow_status(candidates, &rule.status, &rule.statuses, &rule.not_status);
    record("status filters".to_string(), candidates.len());

    let mut candidates = candidates;
    for filter in &rule.filters {
        candidates = apply_filter(candidates, filter, ctx.resolver());
        record(format!("filter {}", filter.describe()), candidates.len());
    }

    for limit in &rule.saturation_limits {
        candidates.retain(|e| !saturated(graph, e, limit));
        record(
            format!(
                "saturation {} < {} ({:?})",
                limit.relationship_kind, limit.max_count, limit.direction
            ),
            candidates.len(),
        );
    }

    let picked = pick(candidates, rule.pick_strategy, rule.max_results, ctx);
    record(format!("pick {:?}", rule.pick_strategy), picked.len());
    picked
}

/// Resolve the candidates for a named variable.
pub fn select_variable_entities<'g>(rule: &VariableSelectionRule, ctx: &RuleContext<'g>) -> Vec<&'g Entity> {
    let graph = ctx.graph();

    let pool = match &rule.from {
        VariableSource::Graph => graph.entities(),
        VariableSource::Related {
            related_to,
            relationship_kind,
            direction,
        } => match ctx.resolve(related_to) {
            Some(anchor) => graph.neighbors(anchor.id, Some(relationship_kind.as_str()), *direction),
            None => return Vec::new(),
        },
    };

    let kinds = kind_set(&rule.kind, &rule.kinds);
    let candidates = pool_of_kinds(pool, &kinds);
    let candidates = narrow_subtypes(candidates, &rule.subtypes, &[]);
    let candidates = narrow_status(candidates, &rule.status, &rule.statuses, &rule.not_status);
    let candidates = apply_filters(candidates, &rule.filters, ctx.resolver());

    let candidates = if rule.prefer_filters.is_empty() {
        candidates
    } else {
        let preferred = apply_filters(candidates.clone(), &rule.prefer_filters, ctx.resolver());
        if preferred.is_empty() {
            candidates
        } else {
            preferred
        }
    };

    pick(candidates, rule.pick_strategy, rule.max_results, ctx)
}

fn apply_strategy<'g>(pool: Vec<&'g Entity>, strategy: &SelectionStrategy, ctx: &RuleContext<'g>) -> Vec<&'g Entity> {
    let graph = ctx.graph();

    match strategy {
        SelectionStrategy::ByKind => pool,
        SelectionStrategy::ByPreferenceOrder {
            subtype_preferences,
        } => {
            let preferred = subtype_preferences.iter().find_map(|subtype| {
                let matches: Vec<&'g Entity> =
                    pool.iter().copied().filter(|e| &e.subtype == subtype).collect();
                (!matches.is_empty()).then_some(matches)
            });
            preferred.unwrap_or(pool)
        }
        SelectionStrategy::ByRelationship {
            relationship_kind,
            direction,
            must_have,
        } => pool
            .into_iter()
            .filter(|e| {
                graph.has_relationship(e.id, relationship_kind.as_deref(), None, *direction) == *must_have
            })
            .collect(),
        SelectionStrategy::ByProximity {
            reference_entity,
            max_distance,
        } => {
            let Some(origin) = ctx.resolve(reference_entity).and_then(|e| e.coordinates) else {
                return Vec::new();
            };
            let radius = max_distance.unwrap_or(ctx.config().proximity_max_distance);
            pool.into_iter()
                .filter(|e| {
                    e.coordinates
                        .map_or(false, |point| point.distance_to(&origin) <= radius)
                })
                .collect()
        }
        SelectionStrategy::ByProminence { min_prominence } => pool
            .into_iter()
            .filter(|e| e.prominence >= *min_prominence)
            .collect(),
    }
}

/// Whether `entity` already holds `max_count` or more matching relationships.
fn saturated(graph: &dyn GraphView, entity: &Entity, limit: &SaturationLimit) -> bool {
    let count = graph
        .relationships_of(entity.id, Some(limit.relationship_kind.as_str()), limit.direction)
        .into_iter()
        .filter(|rel| match &limit.from_kind {
            None => true,
            Some(kind) => graph
                .entity(rel.other_end(entity.id))
                .map_or(false, |other| &other.kind == kind),
        })
        .count();
    count >= limit.max_count
}

fn kind_set(kind: &Option<String>, kinds: &[String]) -> Vec<String> {
    let mut set: Vec<String> = kind.iter().cloned().collect();
    for k in kinds {
        if !set.contains(k) {
            set.push(k.clone());
        }
    }
    set
}

fn pool_of_kinds<'g>(entities: Vec<&'g Entity>, kinds: &[String]) -> Vec<&'g Entity> {
    if kinds.is_empty() {
        return entities;
    }
    entities
        .into_iter()
        .filter(|e| kinds.iter().any(|k| k == &e.kind))
        .collect()
}

fn narrow_subtypes<'g>(entities: Vec<&'g Entity>, include: &[String], exclude: &[String]) -> Vec<&'g Entity> {
    entities
        .into_iter()
        .filter(|e| include.is_empty() || include.iter().any(|s| s == &e.subtype))
        .filter(|e| !exclude.iter().any(|s| s == &e.subtype))
        .collect()
}

fn narrow_status<'g>(
    entities: Vec<&'g Entity>,
    status: &Option<String>,
    statuses: &[String],
    not_status: &Option<String>,
) -> Vec<&'g Entity> {
    entities
        .into_iter()
        .filter(|e| status.as_ref().map_or(true, |s| &e.status == s))
        .filter(|e| statuses.is_empty() || statuses.iter().any(|s| s == &e.status))
        .filter(|e| not_status.as_ref().map_or(true, |s| &e.status != s))
        .collect()
}

fn strategy_name(strategy: &SelectionStrategy) -> &'static str {
    match strategy {
        SelectionStrategy::ByKind => "by_kind",
        SelectionStrategy::ByPreferenceOrder { .. } => "by_preference_order",
        SelectionStrategy::ByRelationship { .. } => "by_relationship",
        SelectionStrategy::ByProximity { .. } => "by_proximity",
        SelectionStrategy::ByProminence { .. } => "by_prominence",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RngSource;
    use crate::filters::SelectionFilter;
    use crate::resolver::ContextResolver;
    use crate::test_support::realm;
    use world_model::{Direction, Prominence, Relationship, WorldGraph};

    fn names(entities: &[&Entity]) -> Vec<String> {
        entities.iter().map(|e| e.name.clone()).collect()
    }

    #[test]
    fn test_by_prominence_threshold() {
        let mut world = WorldGraph::new();
        for (name, level) in [
            ("F", Prominence::Forgotten),
            ("R", Prominence::Recognized),
            ("N", Prominence::Renowned),
            ("M", Prominence::Mythic),
        ] {
            world
                .add_entity(Entity::new("npc", "any", name).with_prominence(level))
                .unwrap();
        }
        let ctx = RuleContext::for_graph(&world);
        let rule = SelectionRule::new(SelectionStrategy::ByProminence {
            min_prominence: Prominence::Renowned,
        });

        assert_eq!(names(&select_entities(&rule, &ctx, None)), vec!["N", "M"]);
    }

    #[test]
    fn test_saturation_limit() {
        let mut world = WorldGraph::new();
        let people: Vec<_> = ["Zero", "One", "Two"]
            .iter()
            .map(|name| world.add_entity(Entity::new("npc", "villager", *name)).unwrap())
            .collect();
        let guilds: Vec<_> = ["G1", "G2"]
            .iter()
            .map(|name| world.add_entity(Entity::new("faction", "guild", *name)).unwrap())
            .collect();
        world.add_relationship(Relationship::new("member_of", people[1], guilds[0])).unwrap();
        world.add_relationship(Relationship::new("member_of", people[2], guilds[0])).unwrap();
        world.add_relationship(Relationship::new("member_of", people[2], guilds[1])).unwrap();

        let ctx = RuleContext::for_graph(&world);
        let rule = SelectionRule::new(SelectionStrategy::ByKind)
            .with_kind("npc")
            .with_saturation_limit(SaturationLimit::new("member_of", 2));

        assert_eq!(names(&select_entities(&rule, &ctx, None)), vec!["Zero", "One"]);
    }

    #[test]
    fn test_saturation_honors_direction_and_from_kind() {
        let realm = realm();
        let ctx = RuleContext::for_graph(&realm.world);

        // Each faction has two incoming member_of edges and no outgoing ones.
        let outgoing = SelectionRule::new(SelectionStrategy::ByKind)
            .with_kind("faction")
            .with_saturation_limit(SaturationLimit::new("member_of", 1).with_direction(Direction::Src));
        assert_eq!(select_entities(&outgoing, &ctx, None).len(), 2);

        let incoming = SelectionRule::new(SelectionStrategy::ByKind)
            .with_kind("faction")
            .with_saturation_limit(SaturationLimit::new("member_of", 2));
        assert!(select_entities(&incoming, &ctx, None).is_empty());

        // Counting only location counterparts, nobody is saturated.
        let merchants = SelectionRule::new(SelectionStrategy::ByKind)
            .with_kind("npc")
            .with_saturation_limit(SaturationLimit::new("enemy_of", 1).from_kind("location"));
        assert_eq!(select_entities(&merchants, &ctx, None).len(), 4);
    }

    #[test]
    fn test_by_preference_order() {
        let realm = realm();
        let ctx = RuleContext::for_graph(&realm.world);

        let prefer = SelectionRule::new(SelectionStrategy::ByPreferenceOrder {
            subtype_preferences: vec!["dragon".into(), "mystic".into(), "hero".into()],
        })
        .with_kind("npc");
        assert_eq!(realm.names(&select_entities(&prefer, &ctx, None)), vec!["Dara"]);

        let nothing = SelectionRule::new(SelectionStrategy::ByPreferenceOrder {
            subtype_preferences: vec!["dragon".into()],
        })
        .with_kind("npc");
        assert_eq!(select_entities(&nothing, &ctx, None).len(), 4);
    }

    #[test]
    fn test_by_relationship() {
        let realm = realm();
        let ctx = RuleContext::for_graph(&realm.world);

        let residents = SelectionRule::new(SelectionStrategy::ByRelationship {
            relationship_kind: Some("resident_of".into()),
            direction: Direction::Src,
            must_have: true,
        });
        assert_eq!(realm.names(&select_entities(&residents, &ctx, None)), vec!["Ama"]);

        let unaffiliated = SelectionRule::new(SelectionStrategy::ByRelationship {
            relationship_kind: Some("member_of".into()),
            direction: Direction::Both,
            must_have: false,
        });
        assert_eq!(realm.names(&select_entities(&unaffiliated, &ctx, None)), vec!["Fenmoor"]);
    }

    #[test]
    fn test_by_proximity() {
        let realm = realm();
        let ctx = ContextResolver::new(&realm.world)
            .with_self(realm.entity("fenmoor"))
            .into_context();

        // Bren is exactly 50 away; Cato is 100 away; Dara has no coordinates.
        let near = SelectionRule::new(SelectionStrategy::ByProximity {
            reference_entity: "$self".into(),
            max_distance: None,
        })
        .with_kind("npc");
        assert_eq!(realm.names(&select_entities(&near, &ctx, None)), vec!["Ama", "Bren"]);

        let from_dara = SelectionRule::new(SelectionStrategy::ByProximity {
            reference_entity: realm.reference("dara"),
            max_distance: Some(1000.0),
        });
        assert!(select_entities(&from_dara, &ctx, None).is_empty());
    }

    #[test]
    fn test_subtype_and_status_narrowing() {
        let realm = realm();
        let ctx = RuleContext::for_graph(&realm.world);

        let rule = SelectionRule::new(SelectionStrategy::ByKind)
            .with_kind("npc")
            .excluding_subtypes(&["hero"])
            .without_status("dead");
        assert_eq!(realm.names(&select_entities(&rule, &ctx, None)), vec!["Bren", "Cato"]);

        let rule = SelectionRule::new(SelectionStrategy::ByKind)
            .with_subtypes(&["hero", "mystic"])
            .with_status("alive");
        assert_eq!(realm.names(&select_entities(&rule, &ctx, None)), vec!["Ama"]);
    }

    #[test]
    fn test_trace_records_every_step() {
        let realm = realm();
        let ctx = ContextResolver::new(&realm.world)
            .with_self(realm.entity("ama"))
            .into_context();
        let rule = SelectionRule::new(SelectionStrategy::ByKind)
            .with_kind("npc")
            .with_filter(SelectionFilter::Exclude {
                entities: vec!["$self".into()],
            })
            .with_filter(SelectionFilter::HasStatus {
                status: "alive".into(),
            })
            .pick(PickStrategy::First, Some(1));

        let mut trace = SelectionTrace::new();
        let picked = select_entities(&rule, &ctx, Some(&mut trace));

        assert_eq!(realm.names(&picked), vec!["Bren"]);
        let remaining: Vec<usize> = trace.steps.iter().map(|s| s.remaining).collect();
        assert_eq!(remaining, vec![4, 4, 4, 4, 3, 2, 1]);
        assert_eq!(trace.remaining(), Some(1));
    }

    #[test]
    fn test_variable_selection_from_relationships() {
        let realm = realm();
        let ctx = ContextResolver::new(&realm.world)
            .with_self(realm.entity("ama"))
            .into_context()
            .with_random(RngSource::seeded(3));

        // Fellow guild members, preferring traders.
        let rule = VariableSelectionRule {
            from: VariableSource::Related {
                related_to: realm.reference("lanterns"),
                relationship_kind: "member_of".into(),
                direction: Direction::Dst,
            },
            filters: vec![SelectionFilter::Exclude {
                entities: vec!["$self".into()],
            }],
            prefer_filters: vec![SelectionFilter::HasTag {
                tag: "trader".into(),
                value: None,
            }],
            ..VariableSelectionRule::default()
        };
        assert_eq!(realm.names(&select_variable_entities(&rule, &ctx)), vec!["Bren"]);

        // A preference nobody meets is ignored.
        let rule = VariableSelectionRule {
            prefer_filters: vec![SelectionFilter::HasTag {
                tag: "outlaw".into(),
                value: None,
            }],
            pick_strategy: PickStrategy::All,
            ..rule
        };
        assert_eq!(realm.names(&select_variable_entities(&rule, &ctx)), vec!["Bren"]);

        let unresolved = VariableSelectionRule {
            from: VariableSource::Related {
                related_to: "$ghost".into(),
                relationship_kind: "member_of".into(),
                direction: Direction::Both,
            },
            ..VariableSelectionRule::default()
        };
        assert!(select_variable_entities(&unresolved, &ctx).is_empty());
    }

    #[test]
    fn test_variable_selection_from_graph() {
        let realm = realm();
        let ctx = RuleContext::for_graph(&realm.world).with_random(RngSource::seeded(5));
        let rule = VariableSelectionRule {
            kind: Some("faction".into()),
            max_results: Some(2),
            ..VariableSelectionRule::default()
        };
        let mut picked = realm.names(&select_variable_entities(&rule, &ctx));
        picked.sort();
        assert_eq!(picked, vec!["Lanterns", "Ravens"]);
    }

    #[test]
    fn test_parse_rule_with_flattened_strategy() {
        let rule: SelectionRule = serde_json::from_value(serde_json::json!({
            "strategy": "by_proximity",
            "reference_entity": "$self",
            "kind": "npc",
            "saturation_limits": [{ "relationship_kind": "member_of", "max_count": 2 }],
            "pick_strategy": "weighted",
            "max_results": 3
        }))
        .unwrap();

        assert_eq!(
            rule.strategy,
            SelectionStrategy::ByProximity {
                reference_entity: "$self".into(),
                max_distance: None,
            }
        );
        assert_eq!(rule.kind.as_deref(), Some("npc"));
        assert_eq!(rule.saturation_limits[0].direction, Direction::Both);
        assert_eq!(rule.pick_strategy, PickStrategy::Weighted);
    }
}
