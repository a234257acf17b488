//! Graph path assertion data.

use serde::{Deserialize, Serialize};
use world_model::{Direction, Entity};

use crate::resolver::SELF_REFERENCE;

/// Sentinel that disables a target filter on a path step.
pub const ANY: &str = "any";

/// What to check about the final frontier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathCheck {
    Exists,
    NotExists,
    /// Frontier size >= `count` (default 1).
    CountMin,
    /// Frontier size <= `count` (default 0).
    CountMax,
}

/// One hop of a traversal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathStep {
    /// Relationship kind to follow.
    pub via: String,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub target_kind: Option<String>,
    #[serde(default)]
    pub target_subtype: Option<String>,
    #[serde(default)]
    pub target_status: Option<String>,
    /// Name to store this step's frontier under for later constraints.
    #[serde(default)]
    pub capture_as: Option<String>,
}

impl PathStep {
    pub fn new(via: impl Into<String>, direction: Direction) -> Self {
        Self {
            via: via.into(),
            direction,
            target_kind: None,
            target_subtype: None,
            target_status: None,
            capture_as: None,
        }
    }

    pub fn target_kind(mut self, kind: impl Into<String>) -> Self {
        self.target_kind = Some(kind.into());
        self
    }

    pub fn target_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.target_subtype = Some(subtype.into());
        self
    }

    pub fn target_status(mut self, status: impl Into<String>) -> Self {
        self.target_status = Some(status.into());
        self
    }

    pub fn capture_as(mut self, name: impl Into<String>) -> Self {
        self.capture_as = Some(name.into());
        self
    }

    /// Whether a reached entity survives this step's target filters.
    pub fn accepts(&self, entity: &Entity) -> bool {
        fn allows(filter: &Option<String>, actual: &str) -> bool {
            match filter.as_deref() {
                None | Some(ANY) => true,
                Some(expected) => expected == actual,
            }
        }
        allows(&self.target_kind, &entity.kind)
            && allows(&self.target_subtype, &entity.subtype)
            && allows(&self.target_status, &entity.status)
    }
}

fn self_reference() -> String {
    SELF_REFERENCE.to_string()
}

/// Post-traversal filter on the final frontier.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(remote = "Self", tag = "type", rename_all = "snake_case")]
pub enum PathConstraint {
    /// Candidate is absent from a captured set. A missing set passes.
    NotIn { set: String },
    /// Candidate is in a captured set. A missing set fails.
    In { set: String },
    /// Candidate is not the start entity.
    NotSelf,
    /// `with` defaults to `$self`, meaning the path's start entity.
    HasRelationship {
        kind: String,
        #[serde(default = "self_reference")]
        with: String,
        #[serde(default)]
        direction: Direction,
    },
    LacksRelationship {
        kind: String,
        #[serde(default = "self_reference")]
        with: String,
        #[serde(default)]
        direction: Direction,
    },
    KindEquals { kind: String },
    SubtypeEquals { subtype: String },
    #[serde(skip)]
    Unrecognized { type_name: String },
}

impl PathConstraint {
    pub const TYPE_NAMES: &'static [&'static str] = &[
        "not_in",
        "in",
        "not_self",
        "has_relationship",
        "lacks_relationship",
        "kind_equals",
        "subtype_equals",
    ];
}

lenient_rule_enum!(PathConstraint);

/// A multi-hop traversal plus a check on what it reaches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphPathAssertion {
    pub check: PathCheck,
    pub path: Vec<PathStep>,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default, rename = "where")]
    pub constraints: Vec<PathConstraint>,
}

impl GraphPathAssertion {
    pub fn new(check: PathCheck, path: Vec<PathStep>) -> Self {
        Self {
            check,
            path,
            count: None,
            constraints: Vec::new(),
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_constraint(mut self, constraint: PathConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }
}
