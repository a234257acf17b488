//! The entity record - a node in the world graph.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{EntityId, Prominence};

/// Value stored under a tag key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Flag(bool),
    Text(String),
}

impl From<bool> for TagValue {
    fn from(flag: bool) -> Self {
        TagValue::Flag(flag)
    }
}

impl From<&str> for TagValue {
    fn from(text: &str) -> Self {
        TagValue::Text(text.to_string())
    }
}

impl From<String> for TagValue {
    fn from(text: String) -> Self {
        TagValue::Text(text)
    }
}

impl std::fmt::Display for TagValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagValue::Flag(flag) => write!(f, "{}", flag),
            TagValue::Text(text) => f.write_str(text),
        }
    }
}

/// Spatial coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Euclidean distance.
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Something this entity set in motion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalyzedEvent {
    pub tick: u64,
    pub description: String,
    #[serde(default)]
    pub relationship_kind: Option<String>,
}

/// A node in the world graph: a person, place, faction, event, ...
///
/// `kind`, `subtype` and `status` are open taxonomies chosen by content, not
/// closed enums.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: String,
    pub subtype: String,
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub prominence: Prominence,
    #[serde(default)]
    pub culture: String,
    #[serde(default)]
    pub tags: HashMap<String, TagValue>,
    #[serde(default)]
    pub coordinates: Option<Point>,
    #[serde(default)]
    pub catalyzed_events: Vec<CatalyzedEvent>,
    #[serde(default)]
    pub created_at: u64,
    #[serde(default)]
    pub updated_at: u64,
}

impl Entity {
    /// Create an active entity of the given kind and subtype.
    pub fn new(kind: impl Into<String>, subtype: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            kind: kind.into(),
            subtype: subtype.into(),
            name: name.into(),
            status: "active".to_string(),
            prominence: Prominence::default(),
            culture: String::new(),
            tags: HashMap::new(),
            coordinates: None,
            catalyzed_events: Vec::new(),
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_prominence(mut self, prominence: Prominence) -> Self {
        self.prominence = prominence;
        self
    }

    pub fn with_culture(mut self, culture: impl Into<String>) -> Self {
        self.culture = culture.into();
        self
    }

    /// Add a boolean `true` tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into(), TagValue::Flag(true));
        self
    }

    pub fn with_tag_value(mut self, tag: impl Into<String>, value: impl Into<TagValue>) -> Self {
        self.tags.insert(tag.into(), value.into());
        self
    }

    pub fn with_coordinates(mut self, point: Point) -> Self {
        self.coordinates = Some(point);
        self
    }

    /// Set both creation and update stamps.
    pub fn with_created_at(mut self, tick: u64) -> Self {
        self.created_at = tick;
        self.updated_at = tick;
        self
    }

    pub fn with_updated_at(mut self, tick: u64) -> Self {
        self.updated_at = tick;
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains_key(tag)
    }

    /// Tag membership, optionally requiring an exact value.
    pub fn has_tag_value(&self, tag: &str, value: Option<&TagValue>) -> bool {
        match (self.tags.get(tag), value) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(actual), Some(expected)) => actual == expected,
        }
    }

    pub fn tag(&self, tag: &str) -> Option<&TagValue> {
        self.tags.get(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_builder() {
        let npc = Entity::new("npc", "merchant", "Ilsa")
            .with_status("alive")
            .with_prominence(Prominence::Renowned)
            .with_culture("aurora")
            .with_tag("trader")
            .with_tag_value("guild", "silk");

        assert_eq!(npc.kind, "npc");
        assert_eq!(npc.status, "alive");
        assert_eq!(npc.prominence, Prominence::Renowned);
        assert!(npc.has_tag("trader"));
        assert!(npc.has_tag_value("guild", Some(&TagValue::from("silk"))));
        assert!(!npc.has_tag_value("guild", Some(&TagValue::from("wool"))));
        assert!(!npc.has_tag("smuggler"));
    }

    #[test]
    fn test_point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_tag_value_untagged_serde() {
        let flag: TagValue = serde_json::from_str("true").unwrap();
        let text: TagValue = serde_json::from_str("\"north\"").unwrap();
        assert_eq!(flag, TagValue::Flag(true));
        assert_eq!(text, TagValue::Text("north".to_string()));
    }
}
