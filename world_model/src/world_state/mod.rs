//! World state management - the graph, its read facade and its clock.

mod changes;

pub use changes::*;

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::entities::{Direction, Entity, EntityId, Prominence, Relationship, TagValue};
use crate::error::{Result, WorldError};

/// Maximum number of tags an entity may carry at once.
pub const MAX_DYNAMIC_TAGS: usize = 10;

/// Creation throttling state maintained by the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RateLimitState {
    /// Tick of the most recent entity creation, if any happened.
    pub last_creation_tick: Option<u64>,
    /// Creations recorded since the current epoch began.
    pub creations_this_epoch: u32,
    /// Index of the current epoch.
    pub epoch: u64,
}

/// Search criteria for entities. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityQuery {
    pub kind: Option<String>,
    pub subtype: Option<String>,
    pub status: Option<String>,
    pub min_prominence: Option<Prominence>,
    pub tag: Option<(String, Option<TagValue>)>,
}

impl EntityQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn min_prominence(mut self, level: Prominence) -> Self {
        self.min_prominence = Some(level);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>, value: Option<TagValue>) -> Self {
        self.tag = Some((tag.into(), value));
        self
    }

    pub fn matches(&self, entity: &Entity) -> bool {
        self.kind.as_ref().map_or(true, |k| &entity.kind == k)
            && self.subtype.as_ref().map_or(true, |s| &entity.subtype == s)
            && self.status.as_ref().map_or(true, |s| &entity.status == s)
            && self.min_prominence.map_or(true, |p| entity.prominence >= p)
            && self
                .tag
                .as_ref()
                .map_or(true, |(tag, value)| entity.has_tag_value(tag, value.as_ref()))
    }
}

/// Read-only query facade over the world graph.
///
/// Relationship queries only ever see active relationships; archived
/// (historical) edges are kept for the record but invisible here.
pub trait GraphView {
    /// Current simulation tick.
    fn tick(&self) -> u64;

    /// Identifier of the current era, if one is running.
    fn era(&self) -> Option<&str>;

    fn entity(&self, id: EntityId) -> Option<&Entity>;

    /// Every entity, in a stable order.
    fn entities(&self) -> Vec<&Entity>;

    /// Every active relationship.
    fn relationships(&self) -> Vec<&Relationship>;

    /// Named pressure value. Unknown pressures read as 0.
    fn pressure(&self, id: &str) -> f64;

    fn rate_limits(&self) -> RateLimitState;

    fn find_entities(&self, query: &EntityQuery) -> Vec<&Entity> {
        self.entities()
            .into_iter()
            .filter(|entity| query.matches(entity))
            .collect()
    }

    /// Active relationships incident to `id` on the given side, optionally of one kind.
    fn relationships_of(
        &self,
        id: EntityId,
        kind: Option<&str>,
        direction: Direction,
    ) -> Vec<&Relationship> {
        self.relationships()
            .into_iter()
            .filter(|rel| kind.map_or(true, |k| rel.kind == k) && rel.touches(id, direction))
            .collect()
    }

    /// Whether `id` has a matching relationship, optionally with a specific other entity.
    fn has_relationship(
        &self,
        id: EntityId,
        kind: Option<&str>,
        with: Option<EntityId>,
        direction: Direction,
    ) -> bool {
        self.relationships_of(id, kind, direction)
            .into_iter()
            .any(|rel| with.map_or(true, |other| rel.connects(id, other, direction)))
    }

    /// Distinct entities on the far side of matching relationships, in edge order.
    fn neighbors(&self, id: EntityId, kind: Option<&str>, direction: Direction) -> Vec<&Entity> {
        let mut seen = HashSet::new();
        self.relationships_of(id, kind, direction)
            .into_iter()
            .map(|rel| match direction {
                Direction::Src => rel.dst,
                Direction::Dst => rel.src,
                Direction::Both => rel.other_end(id),
            })
            .filter(|other| seen.insert(*other))
            .filter_map(|other| self.entity(other))
            .collect()
    }

    fn entity_count(&self) -> usize {
        self.entities().len()
    }
}

/// In-memory world graph.
///
/// Entities keep insertion order and are never removed; lifecycle changes
/// go through `status`.
#[derive(Debug, Clone)]
pub struct WorldGraph {
    tick: u64,
    era: Option<String>,
    entities: Vec<Entity>,
    index: HashMap<EntityId, usize>,
    relationships: Vec<Relationship>,
    pressures: HashMap<String, f64>,
    rate_limits: RateLimitState,
    tag_cap: usize,
}

impl Default for WorldGraph {
    fn default() -> Self {
        Self {
            tick: 0,
            era: None,
            entities: Vec::new(),
            index: HashMap::new(),
            relationships: Vec::new(),
            pressures: HashMap::new(),
            rate_limits: RateLimitState::default(),
            tag_cap: MAX_DYNAMIC_TAGS,
        }
    }
}

impl WorldGraph {
    /// Create a new empty world graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the per-entity tag cap.
    pub fn with_tag_cap(mut self, cap: usize) -> Self {
        self.tag_cap = cap;
        self
    }

    pub fn tag_cap(&self) -> usize {
        self.tag_cap
    }

    /// Add an entity to the graph.
    pub fn add_entity(&mut self, entity: Entity) -> Result<EntityId> {
        let id = entity.id;
        if self.index.contains_key(&id) {
            return Err(WorldError::DuplicateEntity(id));
        }
        self.index.insert(id, self.entities.len());
        self.entities.push(entity);
        Ok(id)
    }

    /// Add a relationship. Both endpoints must already exist.
    pub fn add_relationship(&mut self, relationship: Relationship) -> Result<()> {
        for endpoint in [relationship.src, relationship.dst] {
            if !self.index.contains_key(&endpoint) {
                return Err(WorldError::MissingEndpoint {
                    kind: relationship.kind.clone(),
                    missing: endpoint,
                });
            }
        }
        self.relationships.push(relationship);
        Ok(())
    }

    /// Get mutable entity by ID.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.index.get(&id).map(|i| &mut self.entities[*i])
    }

    /// Every relationship, including historical ones.
    pub fn all_relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn set_pressure(&mut self, id: impl Into<String>, value: f64) {
        self.pressures.insert(id.into(), value);
    }

    pub fn adjust_pressure(&mut self, id: &str, delta: f64) {
        *self.pressures.entry(id.to_string()).or_insert(0.0) += delta;
    }

    pub fn set_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    pub fn advance_tick(&mut self, ticks: u64) {
        self.tick += ticks;
    }

    pub fn set_era(&mut self, era: impl Into<String>) {
        self.era = Some(era.into());
    }

    /// Start a new epoch, resetting the per-epoch creation count.
    pub fn begin_epoch(&mut self) {
        self.rate_limits.epoch += 1;
        self.rate_limits.creations_this_epoch = 0;
    }

    /// Record that an entity was created at the current tick.
    pub fn record_creation(&mut self) {
        self.rate_limits.last_creation_tick = Some(self.tick);
        self.rate_limits.creations_this_epoch += 1;
    }
}

impl GraphView for WorldGraph {
    fn tick(&self) -> u64 {
        self.tick
    }

    fn era(&self) -> Option<&str> {
        self.era.as_deref()
    }

    fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.index.get(&id).map(|i| &self.entities[*i])
    }

    fn entities(&self) -> Vec<&Entity> {
        self.entities.iter().collect()
    }

    fn relationships(&self) -> Vec<&Relationship> {
        self.relationships.iter().filter(|rel| rel.is_active()).collect()
    }

    fn pressure(&self, id: &str) -> f64 {
        self.pressures.get(id).copied().unwrap_or(0.0)
    }

    fn rate_limits(&self) -> RateLimitState {
        self.rate_limits
    }

    fn entity_count(&self) -> usize {
        self.entities.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::RelationshipStatus;

    fn sample() -> (WorldGraph, EntityId, EntityId, EntityId) {
        let mut world = WorldGraph::new();
        let hero = world
            .add_entity(Entity::new("npc", "hero", "Ama").with_prominence(Prominence::Renowned))
            .unwrap();
        let guild = world.add_entity(Entity::new("faction", "guild", "Lantern Guild")).unwrap();
        let town = world.add_entity(Entity::new("location", "town", "Fenmoor")).unwrap();
        world.add_relationship(Relationship::new("member_of", hero, guild)).unwrap();
        world.add_relationship(Relationship::new("resident_of", hero, town)).unwrap();
        (world, hero, guild, town)
    }

    #[test]
    fn test_find_entities() {
        let (world, hero, _, _) = sample();

        let npcs = world.find_entities(&EntityQuery::new().kind("npc"));
        assert_eq!(npcs.len(), 1);
        assert_eq!(npcs[0].id, hero);

        let renowned = world.find_entities(&EntityQuery::new().min_prominence(Prominence::Renowned));
        assert_eq!(renowned.len(), 1);
        assert_eq!(world.find_entities(&EntityQuery::new()).len(), 3);
    }

    #[test]
    fn test_relationship_queries() {
        let (world, hero, guild, town) = sample();

        assert_eq!(world.relationships_of(hero, None, Direction::Src).len(), 2);
        assert_eq!(world.relationships_of(hero, None, Direction::Dst).len(), 0);
        assert_eq!(world.relationships_of(guild, Some("member_of"), Direction::Both).len(), 1);
        assert!(world.has_relationship(hero, Some("member_of"), Some(guild), Direction::Src));
        assert!(!world.has_relationship(hero, Some("member_of"), Some(town), Direction::Both));

        let neighbors = world.neighbors(hero, None, Direction::Both);
        let ids: Vec<_> = neighbors.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![guild, town]);
    }

    #[test]
    fn test_historical_relationships_are_hidden() {
        let (mut world, hero, guild, _) = sample();
        let mut old = Relationship::new("enemy_of", hero, guild);
        old.status = RelationshipStatus::Historical;
        world.add_relationship(old).unwrap();

        assert!(!world.has_relationship(hero, Some("enemy_of"), None, Direction::Both));
        assert_eq!(world.all_relationships().len(), 3);
    }

    #[test]
    fn test_missing_endpoint_is_rejected() {
        let (mut world, hero, _, _) = sample();
        let ghost = EntityId::new();
        let err = world
            .add_relationship(Relationship::new("ally_of", hero, ghost))
            .unwrap_err();
        assert_eq!(
            err,
            WorldError::MissingEndpoint {
                kind: "ally_of".to_string(),
                missing: ghost
            }
        );
    }

    #[test]
    fn test_pressures_default_to_zero() {
        let mut world = WorldGraph::new();
        assert_eq!(world.pressure("conflict"), 0.0);
        world.set_pressure("conflict", 40.0);
        world.adjust_pressure("conflict", 2.5);
        assert_eq!(world.pressure("conflict"), 42.5);
    }

    #[test]
    fn test_rate_limit_bookkeeping() {
        let mut world = WorldGraph::new();
        world.set_tick(12);
        world.record_creation();
        world.record_creation();
        assert_eq!(world.rate_limits().last_creation_tick, Some(12));
        assert_eq!(world.rate_limits().creations_this_epoch, 2);

        world.begin_epoch();
        assert_eq!(world.rate_limits().creations_this_epoch, 0);
        assert_eq!(world.rate_limits().epoch, 1);
    }
}
