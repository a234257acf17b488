//! Metric data and results.

use serde::{Deserialize, Serialize};
use world_model::{DecayRate, Direction, FalloffType, ProminenceCurve};

/// A plain count usable as a ratio operand. Carries no coefficient or cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CountMetric {
    EntityCount {
        kind: String,
        #[serde(default)]
        subtype: Option<String>,
        #[serde(default)]
        status: Option<String>,
    },
    RelationshipCount {
        #[serde(default)]
        relationship_kinds: Vec<String>,
        #[serde(default)]
        min_strength: Option<f64>,
    },
    TagCount { tag: String },
    TotalEntities,
    Constant { value: f64 },
}

/// A numeric rule.
///
/// Every variant may carry `coefficient` (multiplied in) and `cap` (upper
/// clamp), applied in that order after the base value is computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", tag = "type", rename_all = "snake_case")]
pub enum Metric {
    EntityCount {
        kind: String,
        #[serde(default)]
        subtype: Option<String>,
        #[serde(default)]
        status: Option<String>,
        #[serde(flatten)]
        scale: Scale,
    },
    /// Relationships incident to `entity` when given, otherwise all of them.
    RelationshipCount {
        #[serde(default)]
        entity: Option<String>,
        #[serde(default)]
        relationship_kinds: Vec<String>,
        #[serde(default)]
        direction: Direction,
        #[serde(default)]
        min_strength: Option<f64>,
        #[serde(flatten)]
        scale: Scale,
    },
    /// Entities carrying `tag`.
    TagCount {
        tag: String,
        #[serde(flatten)]
        scale: Scale,
    },
    TotalEntities {
        #[serde(flatten)]
        scale: Scale,
    },
    Constant {
        value: f64,
        #[serde(flatten)]
        scale: Scale,
    },
    /// Relationships incident to one entity (default `$self`).
    ConnectionCount {
        #[serde(default)]
        entity: Option<String>,
        #[serde(default)]
        relationship_kinds: Vec<String>,
        #[serde(default)]
        direction: Direction,
        #[serde(default)]
        min_strength: Option<f64>,
        #[serde(flatten)]
        scale: Scale,
    },
    /// `numerator / denominator`, or `fallback_value` when the denominator is 0.
    Ratio {
        numerator: CountMetric,
        denominator: CountMetric,
        #[serde(default)]
        fallback_value: f64,
        #[serde(flatten)]
        scale: Scale,
    },
    StatusRatio {
        kind: String,
        #[serde(default)]
        subtype: Option<String>,
        alive_status: String,
        #[serde(flatten)]
        scale: Scale,
    },
    /// Share of relationships whose endpoints differ in culture.
    CrossCultureRatio {
        #[serde(default)]
        relationship_kinds: Vec<String>,
        #[serde(flatten)]
        scale: Scale,
    },
    /// Common enemies/allies. With `with`, counts targets both share;
    /// without, counts other entities sharing at least one target.
    SharedRelationship {
        shared_relationship_kind: String,
        #[serde(default = "default_shared_direction")]
        shared_direction: Direction,
        #[serde(default)]
        min_strength: Option<f64>,
        #[serde(default)]
        entity: Option<String>,
        #[serde(default)]
        with: Option<String>,
        #[serde(flatten)]
        scale: Scale,
    },
    CatalyzedEvents {
        #[serde(default)]
        entity: Option<String>,
        #[serde(flatten)]
        scale: Scale,
    },
    ProminenceMultiplier {
        #[serde(default)]
        entity: Option<String>,
        #[serde(default)]
        mode: ProminenceCurve,
        #[serde(flatten)]
        scale: Scale,
    },
    DecayRate {
        rate: DecayRate,
        #[serde(flatten)]
        scale: Scale,
    },
    Falloff {
        falloff_type: FalloffType,
        distance: f64,
        #[serde(default)]
        max_distance: Option<f64>,
        #[serde(flatten)]
        scale: Scale,
    },
    /// A numeric variable binding.
    Variable {
        name: String,
        #[serde(flatten)]
        scale: Scale,
    },
    #[serde(skip)]
    Unrecognized { type_name: String },
}

fn default_shared_direction() -> Direction {
    Direction::Src
}

impl Metric {
    pub const TYPE_NAMES: &'static [&'static str] = &[
        "entity_count",
        "relationship_count",
        "tag_count",
        "total_entities",
        "constant",
        "connection_count",
        "ratio",
        "status_ratio",
        "cross_culture_ratio",
        "shared_relationship",
        "catalyzed_events",
        "prominence_multiplier",
        "decay_rate",
        "falloff",
        "variable",
    ];

    pub fn type_name(&self) -> &str {
        match self {
            Metric::EntityCount { .. } => "entity_count",
            Metric::RelationshipCount { .. } => "relationship_count",
            Metric::TagCount { .. } => "tag_count",
            Metric::TotalEntities { .. } => "total_entities",
            Metric::Constant { .. } => "constant",
            Metric::ConnectionCount { .. } => "connection_count",
            Metric::Ratio { .. } => "ratio",
            Metric::StatusRatio { .. } => "status_ratio",
            Metric::CrossCultureRatio { .. } => "cross_culture_ratio",
            Metric::SharedRelationship { .. } => "shared_relationship",
            Metric::CatalyzedEvents { .. } => "catalyzed_events",
            Metric::ProminenceMultiplier { .. } => "prominence_multiplier",
            Metric::DecayRate { .. } => "decay_rate",
            Metric::Falloff { .. } => "falloff",
            Metric::Variable { .. } => "variable",
            Metric::Unrecognized { type_name } => type_name,
        }
    }

    /// Scaling shared by every recognized variant.
    pub fn scale(&self) -> Scale {
        match self {
            Metric::EntityCount { scale, .. }
            | Metric::RelationshipCount { scale, .. }
            | Metric::TagCount { scale, .. }
            | Metric::TotalEntities { scale }
            | Metric::Constant { scale, .. }
            | Metric::ConnectionCount { scale, .. }
            | Metric::Ratio { scale, .. }
            | Metric::StatusRatio { scale, .. }
            | Metric::CrossCultureRatio { scale, .. }
            | Metric::SharedRelationship { scale, .. }
            | Metric::CatalyzedEvents { scale, .. }
            | Metric::ProminenceMultiplier { scale, .. }
            | Metric::DecayRate { scale, .. }
            | Metric::Falloff { scale, .. }
            | Metric::Variable { scale, .. } => *scale,
            Metric::Unrecognized { .. } => Scale::default(),
        }
    }
}

lenient_rule_enum!(Metric);

/// Post-processing applied to a metric's base value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coefficient: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cap: Option<f64>,
}

impl Scale {
    pub fn apply(&self, value: f64) -> f64 {
        let scaled = value * self.coefficient.unwrap_or(1.0);
        match self.cap {
            Some(cap) => scaled.min(cap),
            None => scaled,
        }
    }
}

/// Outcome of one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    pub value: f64,
    pub diagnostic: String,
    #[serde(default)]
    pub details: serde_json::Value,
}

impl MetricResult {
    pub fn new(value: f64, diagnostic: impl Into<String>) -> Self {
        Self {
            value,
            diagnostic: diagnostic.into(),
            details: serde_json::Value::Null,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}
