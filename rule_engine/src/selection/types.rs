//! Selection rule data.

use serde::{Deserialize, Serialize};
use world_model::{Direction, Prominence};

use crate::filters::SelectionFilter;

/// How the candidate pool is first narrowed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// The pool itself.
    #[default]
    ByKind,
    /// First subtype in the list with any matches wins; no match keeps the pool.
    ByPreferenceOrder { subtype_preferences: Vec<String> },
    ByRelationship {
        #[serde(default)]
        relationship_kind: Option<String>,
        #[serde(default)]
        direction: Direction,
        #[serde(default = "default_true")]
        must_have: bool,
    },
    /// Within `max_distance` of the reference (inclusive). The radius falls
    /// back to the engine config.
    ByProximity {
        reference_entity: String,
        #[serde(default)]
        max_distance: Option<f64>,
    },
    ByProminence {
        #[serde(default = "default_min_prominence")]
        min_prominence: Prominence,
    },
}

fn default_true() -> bool {
    true
}

fn default_min_prominence() -> Prominence {
    Prominence::Marginal
}

/// How the narrowed list is reduced to the final result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickStrategy {
    /// Uniform pick; several picks are an unbiased shuffle-and-slice.
    Random,
    /// Probability proportional to prominence index + 1, without replacement.
    Weighted,
    /// Stable prefix of pool order.
    First,
    /// Everything, optionally capped by `max_results`.
    #[default]
    All,
}

/// Drops candidates already holding `max_count` or more relationships of a
/// kind, optionally counting only counterparts of `from_kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaturationLimit {
    pub relationship_kind: String,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub from_kind: Option<String>,
    pub max_count: usize,
}

impl SaturationLimit {
    pub fn new(relationship_kind: impl Into<String>, max_count: usize) -> Self {
        Self {
            relationship_kind: relationship_kind.into(),
            direction: Direction::Both,
            from_kind: None,
            max_count,
        }
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn from_kind(mut self, kind: impl Into<String>) -> Self {
        self.from_kind = Some(kind.into());
        self
    }
}

/// Free selection of a candidate set.
///
/// The strategy is flattened into the rule, so rule files must name it
/// (`"strategy": "by_kind"` for the plain pool).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionRule {
    #[serde(flatten)]
    pub strategy: SelectionStrategy,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub kinds: Vec<String>,
    #[serde(default)]
    pub subtypes: Vec<String>,
    #[serde(default)]
    pub exclude_subtypes: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub statuses: Vec<String>,
    #[serde(default)]
    pub not_status: Option<String>,
    #[serde(default)]
    pub filters: Vec<SelectionFilter>,
    #[serde(default)]
    pub saturation_limits: Vec<SaturationLimit>,
    #[serde(default)]
    pub pick_strategy: PickStrategy,
    #[serde(default)]
    pub max_results: Option<usize>,
}

impl SelectionRule {
    pub fn new(strategy: SelectionStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_subtypes(mut self, subtypes: &[&str]) -> Self {
        self.subtypes = subtypes.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn excluding_subtypes(mut self, subtypes: &[&str]) -> Self {
        self.exclude_subtypes = subtypes.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn without_status(mut self, status: impl Into<String>) -> Self {
        self.not_status = Some(status.into());
        self
    }

    pub fn with_filter(mut self, filter: SelectionFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_saturation_limit(mut self, limit: SaturationLimit) -> Self {
        self.saturation_limits.push(limit);
        self
    }

    pub fn pick(mut self, strategy: PickStrategy, max_results: Option<usize>) -> Self {
        self.pick_strategy = strategy;
        self.max_results = max_results;
        self
    }
}

/// Where a variable's candidate pool comes from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum VariableSource {
    /// Every entity in the graph.
    #[default]
    Graph,
    /// Entities related to a resolved reference.
    Related {
        related_to: String,
        relationship_kind: String,
        #[serde(default)]
        direction: Direction,
    },
}

/// Selection used to bind a named variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSelectionRule {
    #[serde(default)]
    pub from: VariableSource,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub kinds: Vec<String>,
    #[serde(default)]
    pub subtypes: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub statuses: Vec<String>,
    #[serde(default)]
    pub not_status: Option<String>,
    #[serde(default)]
    pub filters: Vec<SelectionFilter>,
    /// Applied only when they leave at least one candidate.
    #[serde(default)]
    pub prefer_filters: Vec<SelectionFilter>,
    #[serde(default = "default_variable_pick")]
    pub pick_strategy: PickStrategy,
    #[serde(default)]
    pub max_results: Option<usize>,
}

fn default_variable_pick() -> PickStrategy {
    PickStrategy::Random
}

impl Default for VariableSelectionRule {
    fn default() -> Self {
        Self {
            from: VariableSource::Graph,
            kind: None,
            kinds: Vec::new(),
            subtypes: Vec::new(),
            status: None,
            statuses: Vec::new(),
            not_status: None,
            filters: Vec::new(),
            prefer_filters: Vec::new(),
            pick_strategy: PickStrategy::Random,
            max_results: None,
        }
    }
}
