//! Entity definitions for the world graph.

mod entity;
mod prominence;
mod relationship;

pub use entity::*;
pub use prominence::*;
pub use relationship::*;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for all entities in the world graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Create a new random entity ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an entity ID from a specific UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Create a nil/empty entity ID (useful for defaults).
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Parse a raw identifier as written in rule data.
    ///
    /// Returns `None` for anything that is not a UUID; rule references treat
    /// that as "unresolved" rather than an error.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_display() {
        let id = EntityId::new();
        assert_eq!(EntityId::parse(&id.to_string()), Some(id));
    }

    #[test]
    fn test_parse_rejects_names() {
        assert_eq!(EntityId::parse("faction_red"), None);
        assert_eq!(EntityId::parse(""), None);
    }
}
