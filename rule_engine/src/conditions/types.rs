//! Condition data and results.

use serde::{Deserialize, Serialize};
use world_model::{Direction, Prominence, TagValue};

use crate::graph_path::GraphPathAssertion;

/// Comparison between two pressures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ComparisonOperator {
    #[serde(rename = ">", alias = "above")]
    Greater,
    #[serde(rename = "<", alias = "below")]
    Less,
    #[default]
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
}

impl ComparisonOperator {
    const EPSILON: f64 = 1e-9;

    pub fn compare(self, a: f64, b: f64) -> bool {
        match self {
            ComparisonOperator::Greater => a > b,
            ComparisonOperator::Less => a < b,
            ComparisonOperator::GreaterOrEqual => a >= b,
            ComparisonOperator::LessOrEqual => a <= b,
            ComparisonOperator::Equal => (a - b).abs() < Self::EPSILON,
            ComparisonOperator::NotEqual => (a - b).abs() >= Self::EPSILON,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            ComparisonOperator::Greater => ">",
            ComparisonOperator::Less => "<",
            ComparisonOperator::GreaterOrEqual => ">=",
            ComparisonOperator::LessOrEqual => "<=",
            ComparisonOperator::Equal => "==",
            ComparisonOperator::NotEqual => "!=",
        }
    }
}

/// Which timestamp `time_elapsed` measures from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeAnchor {
    Created,
    #[default]
    Updated,
}

/// A boolean rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// Inclusive range over a pressure value.
    Pressure {
        pressure_id: String,
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    PressureCompare {
        pressure_a: String,
        pressure_b: String,
        #[serde(default)]
        operator: ComparisonOperator,
    },
    /// Any listed pressure strictly above the threshold.
    PressureAnyAbove {
        pressure_ids: Vec<String>,
        threshold: f64,
    },
    /// `max` is relaxed by the overshoot factor: passes while
    /// `count < floor(max * factor)`. The factor falls back to the
    /// engine config.
    EntityCount {
        kind: String,
        #[serde(default)]
        subtype: Option<String>,
        #[serde(default)]
        status: Option<String>,
        #[serde(default)]
        min: Option<usize>,
        #[serde(default)]
        max: Option<usize>,
        #[serde(default)]
        overshoot_factor: Option<f64>,
    },
    /// Relationships incident to the evaluated entity, optionally narrowed
    /// to one counterpart (`with`) or to counterparts of a kind/subtype/status.
    RelationshipCount {
        #[serde(default)]
        relationship_kind: Option<String>,
        #[serde(default)]
        direction: Direction,
        #[serde(default)]
        min: Option<usize>,
        #[serde(default)]
        max: Option<usize>,
        #[serde(default)]
        with: Option<String>,
        #[serde(default)]
        target_kind: Option<String>,
        #[serde(default)]
        target_subtype: Option<String>,
        #[serde(default)]
        target_status: Option<String>,
    },
    RelationshipExists {
        #[serde(default)]
        relationship_kind: Option<String>,
        #[serde(default)]
        direction: Direction,
        #[serde(default)]
        with: Option<String>,
        #[serde(default)]
        target_kind: Option<String>,
        #[serde(default)]
        target_subtype: Option<String>,
        #[serde(default)]
        target_status: Option<String>,
    },
    TagExists {
        #[serde(default)]
        entity: Option<String>,
        tag: String,
        #[serde(default)]
        value: Option<TagValue>,
    },
    /// Vacuously true when the entity reference does not resolve.
    TagAbsent {
        #[serde(default)]
        entity: Option<String>,
        tag: String,
    },
    Status {
        status: String,
        #[serde(default)]
        not: bool,
    },
    Prominence {
        #[serde(default)]
        min: Option<Prominence>,
        #[serde(default)]
        max: Option<Prominence>,
    },
    TimeElapsed {
        min_ticks: u64,
        #[serde(default)]
        since: TimeAnchor,
    },
    CooldownElapsed { cooldown_ticks: u64 },
    CreationsPerEpoch { max_per_epoch: u32 },
    EraMatch { eras: Vec<String> },
    /// Passes iff a uniform draw is strictly below `chance`.
    RandomChance { chance: f64 },
    GraphPath {
        #[serde(rename = "assert")]
        assertion: GraphPathAssertion,
    },
    EntityExists { entity: String },
    EntityHasRelationship {
        entity: String,
        relationship_kind: String,
        #[serde(default)]
        direction: Direction,
    },
    And { conditions: Vec<Condition> },
    Or { conditions: Vec<Condition> },
    Always,
    #[serde(skip)]
    Unrecognized { type_name: String },
}

impl Condition {
    pub const TYPE_NAMES: &'static [&'static str] = &[
        "pressure",
        "pressure_compare",
        "pressure_any_above",
        "entity_count",
        "relationship_count",
        "relationship_exists",
        "tag_exists",
        "tag_absent",
        "status",
        "prominence",
        "time_elapsed",
        "cooldown_elapsed",
        "creations_per_epoch",
        "era_match",
        "random_chance",
        "graph_path",
        "entity_exists",
        "entity_has_relationship",
        "and",
        "or",
        "always",
    ];

    /// The `type` tag this condition serializes under.
    pub fn type_name(&self) -> &str {
        match self {
            Condition::Pressure { .. } => "pressure",
            Condition::PressureCompare { .. } => "pressure_compare",
            Condition::PressureAnyAbove { .. } => "pressure_any_above",
            Condition::EntityCount { .. } => "entity_count",
            Condition::RelationshipCount { .. } => "relationship_count",
            Condition::RelationshipExists { .. } => "relationship_exists",
            Condition::TagExists { .. } => "tag_exists",
            Condition::TagAbsent { .. } => "tag_absent",
            Condition::Status { .. } => "status",
            Condition::Prominence { .. } => "prominence",
            Condition::TimeElapsed { .. } => "time_elapsed",
            Condition::CooldownElapsed { .. } => "cooldown_elapsed",
            Condition::CreationsPerEpoch { .. } => "creations_per_epoch",
            Condition::EraMatch { .. } => "era_match",
            Condition::RandomChance { .. } => "random_chance",
            Condition::GraphPath { .. } => "graph_path",
            Condition::EntityExists { .. } => "entity_exists",
            Condition::EntityHasRelationship { .. } => "entity_has_relationship",
            Condition::And { .. } => "and",
            Condition::Or { .. } => "or",
            Condition::Always => "always",
            Condition::Unrecognized { type_name } => type_name,
        }
    }
}

lenient_rule_enum!(Condition);

/// Outcome of one condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionResult {
    pub passed: bool,
    pub diagnostic: String,
    #[serde(default)]
    pub details: serde_json::Value,
    /// Results of sub-conditions, for composites.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ConditionResult>,
}

impl ConditionResult {
    pub fn pass(diagnostic: impl Into<String>) -> Self {
        Self::new(true, diagnostic)
    }

    pub fn fail(diagnostic: impl Into<String>) -> Self {
        Self::new(false, diagnostic)
    }

    pub fn new(passed: bool, diagnostic: impl Into<String>) -> Self {
        Self {
            passed,
            diagnostic: diagnostic.into(),
            details: serde_json::Value::Null,
            children: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    pub fn with_children(mut self, children: Vec<ConditionResult>) -> Self {
        self.children = children;
        self
    }
}
