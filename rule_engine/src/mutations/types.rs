//! Mutation data and results.

use serde::{Deserialize, Serialize};
use world_model::{ApplyReport, ChangeSet, Direction, MutationSink, TagValue};

/// A proposed edit to the world graph, expressed with symbolic references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", tag = "type", rename_all = "snake_case")]
pub enum Mutation {
    SetTag {
        #[serde(default = "self_reference")]
        entity: String,
        tag: String,
        #[serde(default = "flag_true")]
        value: TagValue,
    },
    RemoveTag {
        #[serde(default = "self_reference")]
        entity: String,
        tag: String,
    },
    ChangeStatus {
        #[serde(default = "self_reference")]
        entity: String,
        new_status: String,
    },
    /// Move prominence by whole levels, clamped to the range.
    AdjustProminence {
        #[serde(default = "self_reference")]
        entity: String,
        delta: i32,
    },
    /// New edge, attributed to the evaluated entity when there is one.
    CreateRelationship {
        kind: String,
        src: String,
        dst: String,
        #[serde(default)]
        strength: Option<f64>,
        #[serde(default)]
        category: Option<String>,
        /// Also create the reverse edge.
        #[serde(default)]
        bidirectional: bool,
    },
    ArchiveRelationship {
        #[serde(default = "self_reference")]
        entity: String,
        with: String,
        kind: String,
        #[serde(default)]
        direction: Direction,
    },
    /// Shift the strength of the `src -> dst` edge; the result is clamped to `[0, 1]`.
    AdjustRelationshipStrength {
        src: String,
        dst: String,
        kind: String,
        delta: f64,
    },
    ModifyPressure {
        pressure_id: String,
        delta: f64,
    },
    #[serde(skip)]
    Unrecognized { type_name: String },
}

lenient_rule_enum!(Mutation);

fn self_reference() -> String {
    crate::resolver::SELF_REFERENCE.to_string()
}

fn flag_true() -> TagValue {
    TagValue::Flag(true)
}

impl Mutation {
    pub const TYPE_NAMES: &'static [&'static str] = &[
        "set_tag",
        "remove_tag",
        "change_status",
        "adjust_prominence",
        "create_relationship",
        "archive_relationship",
        "adjust_relationship_strength",
        "modify_pressure",
    ];

    pub fn type_name(&self) -> &str {
        match self {
            Mutation::SetTag { .. } => "set_tag",
            Mutation::RemoveTag { .. } => "remove_tag",
            Mutation::ChangeStatus { .. } => "change_status",
            Mutation::AdjustProminence { .. } => "adjust_prominence",
            Mutation::CreateRelationship { .. } => "create_relationship",
            Mutation::ArchiveRelationship { .. } => "archive_relationship",
            Mutation::AdjustRelationshipStrength { .. } => "adjust_relationship_strength",
            Mutation::ModifyPressure { .. } => "modify_pressure",
            Mutation::Unrecognized { type_name } => type_name,
        }
    }
}

/// Outcome of preparing one or more mutations.
///
/// `applied` stays `false` until [`MutationResult::commit`] hands the change
/// set to a sink.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MutationResult {
    pub applied: bool,
    pub diagnostic: String,
    pub changes: ChangeSet,
    /// Diagnostics of mutations that produced no changes.
    pub skipped: Vec<String>,
}

impl MutationResult {
    pub fn prepared(diagnostic: impl Into<String>, changes: ChangeSet) -> Self {
        Self {
            applied: false,
            diagnostic: diagnostic.into(),
            changes,
            skipped: Vec::new(),
        }
    }

    pub fn skipped(diagnostic: impl Into<String>) -> Self {
        let diagnostic = diagnostic.into();
        Self {
            applied: false,
            skipped: vec![diagnostic.clone()],
            diagnostic,
            changes: ChangeSet::new(),
        }
    }

    /// Hand the change set to `sink`. Marks the result applied when the sink
    /// made at least one edit.
    pub fn commit(&mut self, sink: &mut impl MutationSink) -> ApplyReport {
        let report = sink.apply_changes(&self.changes);
        self.applied = report.entities_changed
            + report.relationships_added
            + report.relationships_archived
            + report.strengths_adjusted
            + report.pressures_changed
            > 0;
        report
    }
}
