//! Change sets - proposed edits to the world graph and the facade that commits them.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::WorldGraph;
use crate::entities::{CatalyzedEvent, Direction, EntityId, Relationship, RelationshipStatus, TagValue};

/// A single edit to one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EntityChange {
    SetTag {
        entity: EntityId,
        tag: String,
        value: TagValue,
    },
    RemoveTag {
        entity: EntityId,
        tag: String,
    },
    SetStatus {
        entity: EntityId,
        status: String,
    },
    /// Move prominence by whole levels, saturating at either end.
    ShiftProminence {
        entity: EntityId,
        steps: i32,
    },
}

impl EntityChange {
    pub fn entity(&self) -> EntityId {
        match self {
            EntityChange::SetTag { entity, .. }
            | EntityChange::RemoveTag { entity, .. }
            | EntityChange::SetStatus { entity, .. }
            | EntityChange::ShiftProminence { entity, .. } => *entity,
        }
    }
}

/// Identifies the active relationships an edit applies to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipKey {
    pub kind: String,
    pub entity: EntityId,
    pub other: EntityId,
    /// Side of the edge `entity` sits on.
    pub direction: Direction,
}

impl RelationshipKey {
    pub fn matches(&self, rel: &Relationship) -> bool {
        rel.kind == self.kind && rel.connects(self.entity, self.other, self.direction)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrengthChange {
    pub key: RelationshipKey,
    pub delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PressureChange {
    pub pressure_id: String,
    pub delta: f64,
}

/// Everything a rule proposes to change. Nothing here touches the graph
/// until a `MutationSink` commits it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub entity_changes: Vec<EntityChange>,
    pub new_relationships: Vec<Relationship>,
    pub archived_relationships: Vec<RelationshipKey>,
    pub strength_changes: Vec<StrengthChange>,
    pub pressure_changes: Vec<PressureChange>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entity_changes.is_empty()
            && self.new_relationships.is_empty()
            && self.archived_relationships.is_empty()
            && self.strength_changes.is_empty()
            && self.pressure_changes.is_empty()
    }

    /// Append another change set after this one.
    pub fn merge(&mut self, other: ChangeSet) {
        self.entity_changes.extend(other.entity_changes);
        self.new_relationships.extend(other.new_relationships);
        self.archived_relationships.extend(other.archived_relationships);
        self.strength_changes.extend(other.strength_changes);
        self.pressure_changes.extend(other.pressure_changes);
    }
}

/// What a commit actually did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplyReport {
    pub entities_changed: usize,
    pub relationships_added: usize,
    pub relationships_archived: usize,
    pub strengths_adjusted: usize,
    pub pressures_changed: usize,
    /// Tags refused because the entity was already at its tag cap.
    pub dropped_tags: Vec<(EntityId, String)>,
    /// Edits that could not be applied, with the reason.
    pub skipped: Vec<String>,
}

/// Mutation-application facade: commits prepared change sets.
pub trait MutationSink {
    fn apply_changes(&mut self, changes: &ChangeSet) -> ApplyReport;
}

impl WorldGraph {
    fn apply_entity_change(&mut self, change: &EntityChange, report: &mut ApplyReport) {
        let tick = self.tick;
        let cap = self.tag_cap;
        let Some(entity) = self.entity_mut(change.entity()) else {
            report
                .skipped
                .push(format!("entity {} not found", change.entity()));
            return;
        };

        match change {
            EntityChange::SetTag { tag, value, .. } => {
                if !entity.tags.contains_key(tag) && entity.tags.len() >= cap {
                    warn!(entity = %entity.id, tag = %tag, cap, "Tag cap reached, dropping tag");
                    report.dropped_tags.push((entity.id, tag.clone()));
                    return;
                }
                entity.tags.insert(tag.clone(), value.clone());
            }
            EntityChange::RemoveTag { tag, .. } => {
                entity.tags.remove(tag);
            }
            EntityChange::SetStatus { status, .. } => {
                entity.status = status.clone();
            }
            EntityChange::ShiftProminence { steps, .. } => {
                entity.prominence = entity.prominence.shifted(*steps);
            }
        }
        entity.updated_at = tick;
        report.entities_changed += 1;
    }

    fn apply_new_relationship(&mut self, relationship: &Relationship, report: &mut ApplyReport) {
        let mut relationship = relationship.clone();
        relationship.created_at = self.tick;
        relationship.status = RelationshipStatus::Active;

        let kind = relationship.kind.clone();
        let (src, dst) = (relationship.src, relationship.dst);
        let catalyst = relationship.catalyzed_by;

        if let Err(err) = self.add_relationship(relationship) {
            report.skipped.push(err.to_string());
            return;
        }
        report.relationships_added += 1;

        if let Some(catalyst) = catalyst {
            let tick = self.tick;
            if let Some(entity) = self.entity_mut(catalyst) {
                entity.catalyzed_events.push(CatalyzedEvent {
                    tick,
                    description: format!("{} between {} and {}", kind, src, dst),
                    relationship_kind: Some(kind),
                });
            }
        }
    }
}

impl MutationSink for WorldGraph {
    fn apply_changes(&mut self, changes: &ChangeSet) -> ApplyReport {
        let mut report = ApplyReport::default();

        for change in &changes.entity_changes {
            self.apply_entity_change(change, &mut report);
        }

        for relationship in &changes.new_relationships {
            self.apply_new_relationship(relationship, &mut report);
        }

        for key in &changes.archived_relationships {
            for rel in self.relationships.iter_mut().filter(|r| r.is_active() && key.matches(r)) {
                rel.status = RelationshipStatus::Historical;
                report.relationships_archived += 1;
            }
        }

        for change in &changes.strength_changes {
            for rel in self
                .relationships
                .iter_mut()
                .filter(|r| r.is_active() && change.key.matches(r))
            {
                rel.strength = Some((rel.strength() + change.delta).clamp(0.0, 1.0));
                report.strengths_adjusted += 1;
            }
        }

        for change in &changes.pressure_changes {
            self.adjust_pressure(&change.pressure_id, change.delta);
            report.pressures_changed += 1;
        }

        debug!(
            entities = report.entities_changed,
            added = report.relationships_added,
            archived = report.relationships_archived,
            skipped = report.skipped.len(),
            "Applied change set"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Entity, Prominence};
    use crate::world_state::GraphView;

    fn two_entities() -> (WorldGraph, EntityId, EntityId) {
        let mut world = WorldGraph::new();
        let a = world.add_entity(Entity::new("npc", "hero", "Ama")).unwrap();
        let b = world.add_entity(Entity::new("faction", "guild", "Guild")).unwrap();
        (world, a, b)
    }

    #[test]
    fn test_entity_changes_apply() {
        let (mut world, a, _) = two_entities();
        world.set_tick(7);

        let changes = ChangeSet {
            entity_changes: vec![
                EntityChange::SetTag {
                    entity: a,
                    tag: "exiled".to_string(),
                    value: TagValue::Flag(true),
                },
                EntityChange::SetStatus {
                    entity: a,
                    status: "wanderer".to_string(),
                },
                EntityChange::ShiftProminence { entity: a, steps: 1 },
            ],
            ..Default::default()
        };

        let report = world.apply_changes(&changes);
        assert_eq!(report.entities_changed, 3);

        let hero = world.entity(a).unwrap();
        assert!(hero.has_tag("exiled"));
        assert_eq!(hero.status, "wanderer");
        assert_eq!(hero.prominence, Prominence::Renowned);
        assert_eq!(hero.updated_at, 7);
    }

    #[test]
    fn test_tag_cap_drops_new_tags() {
        let (world, a, _) = two_entities();
        let mut world = world.with_tag_cap(2);

        let set = |tag: &str| EntityChange::SetTag {
            entity: a,
            tag: tag.to_string(),
            value: TagValue::Flag(true),
        };
        let changes = ChangeSet {
            entity_changes: vec![set("one"), set("two"), set("three"), set("one")],
            ..Default::default()
        };

        let report = world.apply_changes(&changes);
        assert_eq!(report.dropped_tags, vec![(a, "three".to_string())]);
        let hero = world.entity(a).unwrap();
        assert_eq!(hero.tags.len(), 2);
        assert!(!hero.has_tag("three"));
    }

    #[test]
    fn test_default_tag_cap_is_ten() {
        let (mut world, a, _) = two_entities();
        let changes = ChangeSet {
            entity_changes: (0..12)
                .map(|i| EntityChange::SetTag {
                    entity: a,
                    tag: format!("tag{}", i),
                    value: TagValue::Flag(true),
                })
                .collect(),
            ..Default::default()
        };

        let report = world.apply_changes(&changes);
        assert_eq!(world.entity(a).unwrap().tags.len(), 10);
        assert_eq!(report.dropped_tags.len(), 2);
    }

    #[test]
    fn test_catalyzed_relationship_is_recorded() {
        let (mut world, a, b) = two_entities();
        world.set_tick(3);

        let changes = ChangeSet {
            new_relationships: vec![Relationship::new("member_of", a, b).with_catalyst(a)],
            ..Default::default()
        };
        let report = world.apply_changes(&changes);

        assert_eq!(report.relationships_added, 1);
        assert_eq!(world.entity(a).unwrap().catalyzed_events.len(), 1);
        assert_eq!(world.relationships()[0].created_at, 3);
    }

    #[test]
    fn test_archive_and_strength() {
        let (mut world, a, b) = two_entities();
        world
            .add_relationship(Relationship::new("ally_of", a, b).with_strength(0.9))
            .unwrap();
        world.add_relationship(Relationship::new("rival_of", a, b)).unwrap();

        let changes = ChangeSet {
            strength_changes: vec![StrengthChange {
                key: RelationshipKey {
                    kind: "ally_of".to_string(),
                    entity: b,
                    other: a,
                    direction: Direction::Both,
                },
                delta: 0.5,
            }],
            archived_relationships: vec![RelationshipKey {
                kind: "rival_of".to_string(),
                entity: a,
                other: b,
                direction: Direction::Src,
            }],
            ..Default::default()
        };
        let report = world.apply_changes(&changes);

        assert_eq!(report.relationships_archived, 1);
        assert_eq!(report.strengths_adjusted, 1);
        let active = world.relationships();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].strength, Some(1.0));
    }

    #[test]
    fn test_missing_entity_is_skipped() {
        let (mut world, _, _) = two_entities();
        let changes = ChangeSet {
            entity_changes: vec![EntityChange::RemoveTag {
                entity: EntityId::new(),
                tag: "x".to_string(),
            }],
            ..Default::default()
        };
        let report = world.apply_changes(&changes);
        assert_eq!(report.entities_changed, 0);
        assert_eq!(report.skipped.len(), 1);
    }
}
