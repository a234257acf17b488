//! Relationships - directed, typed edges between entities.

use serde::{Deserialize, Serialize};

use super::EntityId;

/// Strength assumed for relationships that never declared one.
pub const DEFAULT_STRENGTH: f64 = 0.5;

/// Lifecycle of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipStatus {
    #[default]
    Active,
    Historical,
}

/// Which endpoint of a relationship an entity must occupy to match.
///
/// `src` is the outgoing side, `dst` the incoming side. Path steps spell the
/// same thing as `out` / `in` / `any`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[serde(alias = "out")]
    Src,
    #[serde(alias = "in")]
    Dst,
    #[default]
    #[serde(alias = "any")]
    Both,
}

/// A directed edge in the world graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub kind: String,
    pub src: EntityId,
    pub dst: EntityId,

    /// Conventionally 0.0 - 1.0. Absent means `DEFAULT_STRENGTH`.
    #[serde(default)]
    pub strength: Option<f64>,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub distance: Option<f64>,

    #[serde(default)]
    pub status: RelationshipStatus,

    /// Entity whose action brought this relationship about.
    #[serde(default)]
    pub catalyzed_by: Option<EntityId>,

    #[serde(default)]
    pub created_at: u64,
}

impl Relationship {
    /// Create an active relationship with no strength declared.
    pub fn new(kind: impl Into<String>, src: EntityId, dst: EntityId) -> Self {
        Self {
            kind: kind.into(),
            src,
            dst,
            strength: None,
            category: None,
            distance: None,
            status: RelationshipStatus::Active,
            catalyzed_by: None,
            created_at: 0,
        }
    }

    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = Some(strength);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = Some(distance);
        self
    }

    pub fn with_catalyst(mut self, catalyst: EntityId) -> Self {
        self.catalyzed_by = Some(catalyst);
        self
    }

    pub fn with_created_at(mut self, tick: u64) -> Self {
        self.created_at = tick;
        self
    }

    /// Effective strength, defaulting when absent.
    pub fn strength(&self) -> f64 {
        self.strength.unwrap_or(DEFAULT_STRENGTH)
    }

    pub fn is_active(&self) -> bool {
        self.status == RelationshipStatus::Active
    }

    /// Whether `entity` sits on the side of this edge named by `direction`.
    pub fn touches(&self, entity: EntityId, direction: Direction) -> bool {
        match direction {
            Direction::Src => self.src == entity,
            Direction::Dst => self.dst == entity,
            Direction::Both => self.src == entity || self.dst == entity,
        }
    }

    /// The endpoint opposite `entity`. Self-loops return `entity` itself.
    pub fn other_end(&self, entity: EntityId) -> EntityId {
        if self.src == entity {
            self.dst
        } else {
            self.src
        }
    }

    /// Whether this edge connects `a` and `b`, read from `a`'s side in `direction`.
    pub fn connects(&self, a: EntityId, b: EntityId, direction: Direction) -> bool {
        match direction {
            Direction::Src => self.src == a && self.dst == b,
            Direction::Dst => self.dst == a && self.src == b,
            Direction::Both => {
                (self.src == a && self.dst == b) || (self.dst == a && self.src == b)
            }
        }
    }
}
