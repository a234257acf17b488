//! Selection Filters - composable predicates over candidate lists.
//!
//! A filter list is a left fold: each filter narrows what the previous one
//! left, so the list as a whole has AND semantics and an empty list changes
//! nothing.

mod types;

pub use types::*;

use std::collections::HashSet;
use tracing::warn;

use world_model::{Direction, Entity, EntityId, GraphView};

use crate::graph_path::evaluate_graph_path;
use crate::resolver::{EntityResolver, SELF_REFERENCE};

/// Narrow `entities` by one filter.
pub fn apply_filter<'g>(
    entities: Vec<&'g Entity>,
    filter: &SelectionFilter,
    resolver: &dyn EntityResolver<'g>,
) -> Vec<&'g Entity> {
    match filter {
        SelectionFilter::Exclude { entities: refs } => {
            let excluded: HashSet<EntityId> = refs
                .iter()
                .filter_map(|reference| resolver.resolve(reference))
                .map(|entity| entity.id)
                .collect();
            retain(entities, |e| !excluded.contains(&e.id))
        }
        SelectionFilter::HasRelationship {
            kind,
            with,
            direction,
        } => match partner(with.as_deref(), resolver) {
            Partner::Unresolved => Vec::new(),
            Partner::Any => retain(entities, |e| {
                related(resolver.graph(), e.id, kind, None, *direction)
            }),
            Partner::Entity(other) => retain(entities, |e| {
                related(resolver.graph(), e.id, kind, Some(other.id), *direction)
            }),
        },
        SelectionFilter::LacksRelationship {
            kind,
            with,
            direction,
        } => match partner(with.as_deref(), resolver) {
            Partner::Unresolved => entities,
            Partner::Any => retain(entities, |e| {
                !related(resolver.graph(), e.id, kind, None, *direction)
            }),
            Partner::Entity(other) => retain(entities, |e| {
                !related(resolver.graph(), e.id, kind, Some(other.id), *direction)
            }),
        },
        SelectionFilter::HasTag { tag, value } => {
            retain(entities, |e| e.has_tag_value(tag, value.as_ref()))
        }
        SelectionFilter::LacksTag { tag, value } => {
            retain(entities, |e| !e.has_tag_value(tag, value.as_ref()))
        }
        SelectionFilter::HasTags { tags } => {
            retain(entities, |e| tags.iter().all(|tag| e.has_tag(tag)))
        }
        SelectionFilter::HasAnyTag { tags } => {
            retain(entities, |e| tags.iter().any(|tag| e.has_tag(tag)))
        }
        SelectionFilter::LacksAnyTag { tags } => {
            retain(entities, |e| !tags.iter().any(|tag| e.has_tag(tag)))
        }
        SelectionFilter::HasCulture { culture } => retain(entities, |e| &e.culture == culture),
        SelectionFilter::MatchesCulture { with } => {
            match resolver.resolve(with.as_deref().unwrap_or(SELF_REFERENCE)) {
                Some(reference) => retain(entities, |e| e.culture == reference.culture),
                None => entities,
            }
        }
        SelectionFilter::NotMatchesCulture { with } => {
            match resolver.resolve(with.as_deref().unwrap_or(SELF_REFERENCE)) {
                Some(reference) => retain(entities, |e| e.culture != reference.culture),
                None => entities,
            }
        }
        SelectionFilter::HasStatus { status } => retain(entities, |e| &e.status == status),
        SelectionFilter::HasProminence { min_prominence } => {
            retain(entities, |e| e.prominence >= *min_prominence)
        }
        SelectionFilter::SharesRelated {
            relationship_kind,
            with,
        } => {
            let graph = resolver.graph();
            let Some(reference) = resolver.resolve(with) else {
                return Vec::new();
            };
            let theirs = neighbor_ids(graph, reference.id, relationship_kind);
            if theirs.is_empty() {
                return Vec::new();
            }
            retain(entities, |e| {
                !neighbor_ids(graph, e.id, relationship_kind).is_disjoint(&theirs)
            })
        }
        SelectionFilter::GraphPath { assertion } => {
            retain(entities, |e| evaluate_graph_path(e, assertion, resolver))
        }
        SelectionFilter::Unrecognized { type_name } => {
            warn!(filter = %type_name, "Unrecognized selection filter; rejecting all candidates");
            Vec::new()
        }
    }
}

/// Apply every filter in order. An empty list is a no-op.
pub fn apply_filters<'g>(
    entities: Vec<&'g Entity>,
    filters: &[SelectionFilter],
    resolver: &dyn EntityResolver<'g>,
) -> Vec<&'g Entity> {
    filters
        .iter()
        .fold(entities, |remaining, filter| apply_filter(remaining, filter, resolver))
}

/// Whether a single entity survives every filter. Stops at the first failure.
pub fn entity_passes_all_filters<'g>(
    entity: &'g Entity,
    filters: &[SelectionFilter],
    resolver: &dyn EntityResolver<'g>,
) -> bool {
    filters
        .iter()
        .all(|filter| !apply_filter(vec![entity], filter, resolver).is_empty())
}

enum Partner<'g> {
    /// No `with` given: any counterpart matches.
    Any,
    Entity(&'g Entity),
    Unresolved,
}

fn partner<'g>(with: Option<&str>, resolver: &dyn EntityResolver<'g>) -> Partner<'g> {
    match with {
        None => Partner::Any,
        Some(reference) => resolver
            .resolve(reference)
            .map_or(Partner::Unresolved, Partner::Entity),
    }
}

fn related(
    graph: &dyn GraphView,
    id: EntityId,
    kind: &str,
    with: Option<EntityId>,
    direction: Direction,
) -> bool {
    graph.has_relationship(id, Some(kind), with, direction)
}

fn neighbor_ids(graph: &dyn GraphView, id: EntityId, kind: &str) -> HashSet<EntityId> {
    graph
        .neighbors(id, Some(kind), Direction::Both)
        .into_iter()
        .map(|e| e.id)
        .collect()
}

fn retain<'g>(entities: Vec<&'g Entity>, keep: impl Fn(&'g Entity) -> bool) -> Vec<&'g Entity> {
    entities.into_iter().filter(|e| keep(*e)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_path::{GraphPathAssertion, PathCheck, PathStep};
    use crate::resolver::ContextResolver;
    use crate::test_support::realm;
    use world_model::{Prominence, TagValue};

    fn npcs(realm: &crate::test_support::Realm) -> Vec<&Entity> {
        ["ama", "bren", "cato", "dara"]
            .iter()
            .map(|name| realm.entity(name))
            .collect()
    }

    #[test]
    fn test_empty_filter_list_is_noop() {
        let realm = realm();
        let resolver = ContextResolver::new(&realm.world);
        let kept = apply_filters(npcs(&realm), &[], &resolver);
        assert_eq!(kept.len(), 4);
    }

    #[test]
    fn test_exclude_resolves_references() {
        let realm = realm();
        let resolver = ContextResolver::new(&realm.world).with_self(realm.entity("ama"));
        let filter = SelectionFilter::Exclude {
            entities: vec!["$self".into(), realm.reference("cato"), "$nobody".into()],
        };
        let kept = apply_filter(npcs(&realm), &filter, &resolver);
        assert_eq!(realm.names(&kept), vec!["Bren", "Dara"]);
    }

    #[test]
    fn test_relationship_filters() {
        let realm = realm();
        let resolver = ContextResolver::new(&realm.world).bind("$rival", realm.entity("cato"));

        let enemies_of_cato = SelectionFilter::HasRelationship {
            kind: "enemy_of".into(),
            with: Some("$rival".into()),
            direction: Direction::Src,
        };
        let kept = apply_filter(npcs(&realm), &enemies_of_cato, &resolver);
        assert_eq!(realm.names(&kept), vec!["Ama", "Bren"]);

        let no_enemies = SelectionFilter::LacksRelationship {
            kind: "enemy_of".into(),
            with: None,
            direction: Direction::Both,
        };
        let kept = apply_filter(npcs(&realm), &no_enemies, &resolver);
        assert_eq!(realm.names(&kept), vec!["Dara"]);
    }

    #[test]
    fn test_unresolved_relationship_partner() {
        let realm = realm();
        let resolver = ContextResolver::new(&realm.world);
        let has = SelectionFilter::HasRelationship {
            kind: "enemy_of".into(),
            with: Some("$ghost".into()),
            direction: Direction::Both,
        };
        let lacks = SelectionFilter::LacksRelationship {
            kind: "enemy_of".into(),
            with: Some("$ghost".into()),
            direction: Direction::Both,
        };
        assert!(apply_filter(npcs(&realm), &has, &resolver).is_empty());
        assert_eq!(apply_filter(npcs(&realm), &lacks, &resolver).len(), 4);
    }

    #[test]
    fn test_tag_filters() {
        let realm = realm();
        let resolver = ContextResolver::new(&realm.world);

        let oath = SelectionFilter::HasTag {
            tag: "oath".into(),
            value: Some(TagValue::from("sun")),
        };
        let wrong_oath = SelectionFilter::HasTag {
            tag: "oath".into(),
            value: Some(TagValue::from("moon")),
        };
        assert_eq!(realm.names(&apply_filter(npcs(&realm), &oath, &resolver)), vec!["Ama"]);
        assert!(apply_filter(npcs(&realm), &wrong_oath, &resolver).is_empty());

        let all = SelectionFilter::HasTags {
            tags: vec!["brave".into(), "oath".into()],
        };
        let any = SelectionFilter::HasAnyTag {
            tags: vec!["trader".into(), "outlaw".into()],
        };
        let none = SelectionFilter::LacksAnyTag {
            tags: vec!["trader".into(), "outlaw".into()],
        };
        let lacks = SelectionFilter::LacksTag {
            tag: "brave".into(),
            value: None,
        };
        assert_eq!(realm.names(&apply_filter(npcs(&realm), &all, &resolver)), vec!["Ama"]);
        assert_eq!(
            realm.names(&apply_filter(npcs(&realm), &any, &resolver)),
            vec!["Bren", "Cato"]
        );
        assert_eq!(
            realm.names(&apply_filter(npcs(&realm), &none, &resolver)),
            vec!["Ama", "Dara"]
        );
        assert_eq!(apply_filter(npcs(&realm), &lacks, &resolver).len(), 3);
    }

    #[test]
    fn test_culture_filters() {
        let realm = realm();
        let with_self = ContextResolver::new(&realm.world).with_self(realm.entity("cato"));
        let no_self = ContextResolver::new(&realm.world);

        let matches = SelectionFilter::MatchesCulture { with: None };
        let differs = SelectionFilter::NotMatchesCulture {
            with: Some(realm.reference("ama")),
        };
        let literal = SelectionFilter::HasCulture {
            culture: "aurora".into(),
        };

        assert_eq!(
            realm.names(&apply_filter(npcs(&realm), &matches, &with_self)),
            vec!["Cato", "Dara"]
        );
        assert_eq!(
            realm.names(&apply_filter(npcs(&realm), &differs, &no_self)),
            vec!["Cato", "Dara"]
        );
        assert_eq!(apply_filter(npcs(&realm), &literal, &no_self).len(), 2);
        // Unresolved reference: nobody is filtered out.
        assert_eq!(apply_filter(npcs(&realm), &matches, &no_self).len(), 4);
    }

    #[test]
    fn test_status_and_prominence() {
        let realm = realm();
        let resolver = ContextResolver::new(&realm.world);
        let dead = SelectionFilter::HasStatus {
            status: "dead".into(),
        };
        let famous = SelectionFilter::HasProminence {
            min_prominence: Prominence::Renowned,
        };
        assert_eq!(realm.names(&apply_filter(npcs(&realm), &dead, &resolver)), vec!["Dara"]);
        assert_eq!(
            realm.names(&apply_filter(npcs(&realm), &famous, &resolver)),
            vec!["Ama", "Dara"]
        );
    }

    #[test]
    fn test_shares_related() {
        let realm = realm();
        let resolver = ContextResolver::new(&realm.world).with_self(realm.entity("ama"));

        // Shares an enemy with Ama.
        let common_enemy = SelectionFilter::SharesRelated {
            relationship_kind: "enemy_of".into(),
            with: "$self".into(),
        };
        assert_eq!(
            realm.names(&apply_filter(npcs(&realm), &common_enemy, &resolver)),
            vec!["Ama", "Bren"]
        );

        // Dara has no enemies: empty reference set means an empty result.
        let via_dara = SelectionFilter::SharesRelated {
            relationship_kind: "enemy_of".into(),
            with: realm.reference("dara"),
        };
        assert!(apply_filter(npcs(&realm), &via_dara, &resolver).is_empty());
    }

    #[test]
    fn test_graph_path_filter() {
        let realm = realm();
        let resolver = ContextResolver::new(&realm.world);
        let in_warring_faction = SelectionFilter::GraphPath {
            assertion: GraphPathAssertion::new(
                PathCheck::Exists,
                vec![
                    PathStep::new("member_of", Direction::Src),
                    PathStep::new("at_war_with", Direction::Src),
                ],
            ),
        };
        assert_eq!(
            realm.names(&apply_filter(npcs(&realm), &in_warring_faction, &resolver)),
            vec!["Ama", "Bren"]
        );
    }

    #[test]
    fn test_passes_all_and_fold() {
        let realm = realm();
        let resolver = ContextResolver::new(&realm.world);
        let filters = vec![
            SelectionFilter::HasStatus {
                status: "alive".into(),
            },
            SelectionFilter::HasCulture {
                culture: "aurora".into(),
            },
        ];

        let kept = apply_filters(npcs(&realm), &filters, &resolver);
        assert_eq!(realm.names(&kept), vec!["Ama", "Bren"]);
        assert!(entity_passes_all_filters(realm.entity("bren"), &filters, &resolver));
        assert!(!entity_passes_all_filters(realm.entity("cato"), &filters, &resolver));
        assert!(entity_passes_all_filters(realm.entity("cato"), &[], &resolver));
    }

    #[test]
    fn test_unrecognized_filter_rejects_everything() {
        let realm = realm();
        let resolver = ContextResolver::new(&realm.world);
        let filter: SelectionFilter =
            serde_json::from_str(r#"{ "type": "has_aura", "color": "gold" }"#).unwrap();
        assert_eq!(
            filter,
            SelectionFilter::Unrecognized {
                type_name: "has_aura".into()
            }
        );
        assert!(apply_filter(npcs(&realm), &filter, &resolver).is_empty());
    }

    #[test]
    fn test_malformed_known_filter_is_an_error() {
        let result: Result<SelectionFilter, _> =
            serde_json::from_str(r#"{ "type": "has_tag", "value": true }"#);
        assert!(result.is_err());
    }
}
