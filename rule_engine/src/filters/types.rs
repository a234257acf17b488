//! Selection filter data.

use serde::{Deserialize, Serialize};
use world_model::{Direction, Prominence, TagValue};

use crate::graph_path::GraphPathAssertion;

/// One narrowing predicate over a candidate list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", tag = "type", rename_all = "snake_case")]
pub enum SelectionFilter {
    /// Drop entities matching any of the resolved references.
    Exclude { entities: Vec<String> },
    HasRelationship {
        kind: String,
        #[serde(default)]
        with: Option<String>,
        #[serde(default)]
        direction: Direction,
    },
    LacksRelationship {
        kind: String,
        #[serde(default)]
        with: Option<String>,
        #[serde(default)]
        direction: Direction,
    },
    HasTag {
        tag: String,
        #[serde(default)]
        value: Option<TagValue>,
    },
    LacksTag {
        tag: String,
        #[serde(default)]
        value: Option<TagValue>,
    },
    /// Every listed tag present.
    HasTags { tags: Vec<String> },
    HasAnyTag { tags: Vec<String> },
    LacksAnyTag { tags: Vec<String> },
    HasCulture { culture: String },
    /// Same culture as `with` (default `$self`). Unresolved is a no-op.
    MatchesCulture {
        #[serde(default)]
        with: Option<String>,
    },
    NotMatchesCulture {
        #[serde(default)]
        with: Option<String>,
    },
    HasStatus { status: String },
    HasProminence { min_prominence: Prominence },
    /// Neighbor sets via `relationship_kind` (either direction) intersect.
    SharesRelated { relationship_kind: String, with: String },
    GraphPath {
        #[serde(rename = "assert")]
        assertion: GraphPathAssertion,
    },
    #[serde(skip)]
    Unrecognized { type_name: String },
}

impl SelectionFilter {
    pub const TYPE_NAMES: &'static [&'static str] = &[
        "exclude",
        "has_relationship",
        "lacks_relationship",
        "has_tag",
        "lacks_tag",
        "has_tags",
        "has_any_tag",
        "lacks_any_tag",
        "has_culture",
        "matches_culture",
        "not_matches_culture",
        "has_status",
        "has_prominence",
        "shares_related",
        "graph_path",
    ];

    /// Short label for traces and diagnostics.
    pub fn describe(&self) -> String {
        match self {
            SelectionFilter::Exclude { entities } => format!("exclude {} reference(s)", entities.len()),
            SelectionFilter::HasRelationship { kind, .. } => format!("has_relationship {kind}"),
            SelectionFilter::LacksRelationship { kind, .. } => format!("lacks_relationship {kind}"),
            SelectionFilter::HasTag { tag, .. } => format!("has_tag {tag}"),
            SelectionFilter::LacksTag { tag, .. } => format!("lacks_tag {tag}"),
            SelectionFilter::HasTags { tags } => format!("has_tags {}", tags.join(",")),
            SelectionFilter::HasAnyTag { tags } => format!("has_any_tag {}", tags.join(",")),
            SelectionFilter::LacksAnyTag { tags } => format!("lacks_any_tag {}", tags.join(",")),
            SelectionFilter::HasCulture { culture } => format!("has_culture {culture}"),
            SelectionFilter::MatchesCulture { .. } => "matches_culture".to_string(),
            SelectionFilter::NotMatchesCulture { .. } => "not_matches_culture".to_string(),
            SelectionFilter::HasStatus { status } => format!("has_status {status}"),
            SelectionFilter::HasProminence { min_prominence } => {
                format!("has_prominence >= {min_prominence}")
            }
            SelectionFilter::SharesRelated {
                relationship_kind, ..
            } => format!("shares_related {relationship_kind}"),
            SelectionFilter::GraphPath { assertion } => {
                format!("graph_path ({} step(s))", assertion.path.len())
            }
            SelectionFilter::Unrecognized { type_name } => format!("unrecognized '{type_name}'"),
        }
    }
}

lenient_rule_enum!(SelectionFilter);
