//! Property-based tests for rule evaluation.
//!
//! Checks that hold for any world state: open ranges never reject, composite
//! conditions follow boolean semantics, and falloff curves stay bounded and
//! non-increasing.

use proptest::prelude::*;

use rule_engine::metrics::Scale;
use rule_engine::selection::{pick, PickStrategy};
use rule_engine::{evaluate_condition, evaluate_metric, Condition, ContextResolver, Metric, RngSource, RuleContext};
use world_model::{Entity, FalloffType, GraphView, Prominence, Relationship, WorldGraph};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn world_with(pressure: f64, npcs: usize, links: usize) -> WorldGraph {
    let mut world = WorldGraph::new();
    world.set_pressure("unrest", pressure);

    let hub = world
        .add_entity(Entity::new("faction", "guild", "Hub"))
        .expect("fresh id");
    for i in 0..npcs {
        let id = world
            .add_entity(Entity::new("npc", "villager", format!("Villager {i}")))
            .expect("fresh id");
        if i < links {
            world
                .add_relationship(Relationship::new("member_of", id, hub))
                .expect("endpoints exist");
        }
    }
    world
}

/// `true` maps to a condition that always passes, `false` to one that
/// never does.
fn fixed(outcome: bool) -> Condition {
    if outcome {
        Condition::Always
    } else {
        Condition::RandomChance { chance: 0.0 }
    }
}

fn arb_falloff() -> impl Strategy<Value = FalloffType> {
    prop_oneof![
        Just(FalloffType::None),
        Just(FalloffType::Linear),
        Just(FalloffType::InverseSquare),
        Just(FalloffType::Sqrt),
        Just(FalloffType::Exponential),
    ]
}

fn arb_prominence() -> impl Strategy<Value = Prominence> {
    (0usize..5).prop_map(|i| Prominence::ALL[i])
}

// ---------------------------------------------------------------------------
// Property: conditions without bounds never reject
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn open_ranges_always_pass(
        pressure in -1000.0..1000.0f64,
        npcs in 0usize..12,
        links in 0usize..12,
    ) {
        let world = world_with(pressure, npcs, links);
        let members = world.find_entities(&world_model::EntityQuery::new().kind("npc"));
        let ctx = match members.first() {
            Some(npc) => ContextResolver::new(&world).with_self(*npc).into_context(),
            None => RuleContext::for_graph(&world),
        };

        let open = [
            Condition::Pressure { pressure_id: "unrest".into(), min: None, max: None },
            Condition::Pressure { pressure_id: "absent".into(), min: None, max: None },
            Condition::EntityCount {
                kind: "npc".into(),
                subtype: None,
                status: None,
                min: None,
                max: None,
                overshoot_factor: None,
            },
        ];
        for condition in &open {
            prop_assert!(evaluate_condition(condition, &ctx, None).passed);
        }

        if !members.is_empty() {
            let count = Condition::RelationshipCount {
                relationship_kind: Some("member_of".into()),
                direction: Default::default(),
                min: None,
                max: None,
                with: None,
                target_kind: None,
                target_subtype: None,
                target_status: None,
            };
            prop_assert!(evaluate_condition(&count, &ctx, None).passed);
        }
    }
}

// ---------------------------------------------------------------------------
// Property: and/or follow boolean semantics
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn composites_follow_boolean_semantics(outcomes in prop::collection::vec(any::<bool>(), 0..8)) {
        let world = WorldGraph::new();
        let ctx = RuleContext::for_graph(&world);
        let children: Vec<Condition> = outcomes.iter().map(|o| fixed(*o)).collect();

        let all = evaluate_condition(&Condition::And { conditions: children.clone() }, &ctx, None);
        let any = evaluate_condition(&Condition::Or { conditions: children }, &ctx, None);

        prop_assert_eq!(all.passed, outcomes.iter().all(|o| *o));
        prop_assert_eq!(any.passed, outcomes.iter().any(|o| *o));
        prop_assert_eq!(all.children.len(), outcomes.len());
        prop_assert_eq!(any.children.len(), outcomes.len());
    }
}

proptest! {
    #[test]
    fn pressure_range_is_inclusive(value in -100.0..100.0f64, low in -100.0..100.0f64, width in 0.0..50.0f64) {
        let mut world = WorldGraph::new();
        world.set_pressure("unrest", value);
        let ctx = RuleContext::for_graph(&world);
        let condition = Condition::Pressure {
            pressure_id: "unrest".into(),
            min: Some(low),
            max: Some(low + width),
        };

        let expected = value >= low && value <= low + width;
        prop_assert_eq!(evaluate_condition(&condition, &ctx, None).passed, expected);
    }
}

// ---------------------------------------------------------------------------
// Property: falloff stays in [0, 1] and never grows with distance
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn falloff_is_bounded_and_non_increasing(
        curve in arb_falloff(),
        near in 0.0..1000.0f64,
        extra in 0.0..1000.0f64,
        reach in 0.1..500.0f64,
    ) {
        let world = WorldGraph::new();
        let ctx = RuleContext::for_graph(&world);
        let at = |distance: f64| {
            let metric = Metric::Falloff {
                falloff_type: curve,
                distance,
                max_distance: Some(reach),
                scale: Scale::default(),
            };
            evaluate_metric(&metric, &ctx).value
        };

        let close = at(near);
        let far = at(near + extra);
        prop_assert!((0.0..=1.0).contains(&close), "{:?} at {} gave {}", curve, near, close);
        prop_assert!((0.0..=1.0).contains(&far));
        prop_assert!(far <= close + 1e-12, "{:?}: {} -> {}", curve, close, far);
    }
}

// ---------------------------------------------------------------------------
// Property: picks never invent or repeat candidates
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn weighted_pick_is_a_subset(
        levels in prop::collection::vec(arb_prominence(), 0..10),
        wanted in 1usize..12,
        seed in any::<u64>(),
    ) {
        let mut world = WorldGraph::new();
        for (i, level) in levels.iter().enumerate() {
            world
                .add_entity(Entity::new("npc", "villager", format!("V{i}")).with_prominence(*level))
                .expect("fresh id");
        }
        let ctx = RuleContext::for_graph(&world).with_random(RngSource::seeded(seed));

        let picked = pick(world.entities(), PickStrategy::Weighted, Some(wanted), &ctx);
        prop_assert_eq!(picked.len(), wanted.min(levels.len()));

        let mut ids: Vec<_> = picked.iter().map(|e| e.id).collect();
        ids.sort_by_key(|id| id.to_string());
        ids.dedup();
        prop_assert_eq!(ids.len(), picked.len());
    }
}
