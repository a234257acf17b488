//! Named bundles of rules, loaded from JSON or TOML and validated up front.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::conditions::Condition;
use crate::error::{Result, RuleError};
use crate::filters::SelectionFilter;
use crate::graph_path::{GraphPathAssertion, PathConstraint};
use crate::metrics::Metric;
use crate::mutations::Mutation;
use crate::selection::{SelectionRule, VariableSelectionRule};

/// A named collection of rules, keyed by rule name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub name: String,
    #[serde(default)]
    pub conditions: BTreeMap<String, Condition>,
    #[serde(default)]
    pub metrics: BTreeMap<String, Metric>,
    #[serde(default)]
    pub selections: BTreeMap<String, SelectionRule>,
    #[serde(default)]
    pub variables: BTreeMap<String, VariableSelectionRule>,
    #[serde(default)]
    pub mutations: BTreeMap<String, Vec<Mutation>>,
}

impl RuleSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn from_json_str(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Load a rule set, choosing the format by file extension (`.toml`,
    /// anything else is read as JSON).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let rules = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&source)?,
            _ => Self::from_json_str(&source)?,
        };
        debug!(
            path = %path.display(),
            name = %rules.name,
            conditions = rules.conditions.len(),
            metrics = rules.metrics.len(),
            selections = rules.selections.len(),
            "Loaded rule set"
        );
        Ok(rules)
    }

    /// Every problem found in the rule set, in a stable order.
    pub fn problems(&self) -> Vec<RuleError> {
        let mut validator = Validator::default();

        for (name, condition) in &self.conditions {
            validator.condition(&format!("conditions.{name}"), condition);
        }
        for (name, metric) in &self.metrics {
            validator.metric(&format!("metrics.{name}"), metric);
        }
        for (name, rule) in &self.selections {
            validator.selection(&format!("selections.{name}"), rule);
        }
        for (name, rule) in &self.variables {
            validator.variable(&format!("variables.{name}"), rule);
        }
        for (name, list) in &self.mutations {
            for (i, mutation) in list.iter().enumerate() {
                validator.mutation(&format!("mutations.{name}[{i}]"), mutation);
            }
        }
        validator.problems
    }

    /// Fail with [`RuleError::Validation`] if any rule is unrecognized or
    /// can never behave sensibly.
    pub fn validate(&self) -> Result<()> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            debug!(name = %self.name, problems = problems.len(), "Rule set failed validation");
            Err(RuleError::Validation(problems))
        }
    }
}

#[derive(Default)]
struct Validator {
    problems: Vec<RuleError>,
}

impl Validator {
    fn unrecognized(&mut self, family: &'static str, type_name: &str, location: &str) {
        self.problems.push(RuleError::Unrecognized {
            family,
            type_name: type_name.to_string(),
            location: location.to_string(),
        });
    }

    fn invalid(&mut self, location: &str, reason: impl Into<String>) {
        self.problems.push(RuleError::Invalid {
            location: location.to_string(),
            reason: reason.into(),
        });
    }

    fn range<T: PartialOrd + std::fmt::Debug>(&mut self, location: &str, min: &Option<T>, max: &Option<T>) {
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                self.invalid(location, format!("min {:?} exceeds max {:?}", min, max));
            }
        }
    }

    fn condition(&mut self, location: &str, condition: &Condition) {
        match condition {
            Condition::Pressure { min, max, .. } => self.range(location, min, max),
            Condition::EntityCount { min, max, .. } | Condition::RelationshipCount { min, max, .. } => {
                self.range(location, min, max)
            }
            Condition::Prominence { min, max } => self.range(location, min, max),
            Condition::RandomChance { chance } => {
                if !(0.0..=1.0).contains(chance) {
                    self.invalid(location, format!("chance {} outside [0, 1]", chance));
                }
            }
            Condition::GraphPath { assertion } => self.path(location, assertion),
            Condition::And { conditions } | Condition::Or { conditions } => {
                for (i, child) in conditions.iter().enumerate() {
                    self.condition(&format!("{location}.conditions[{i}]"), child);
                }
            }
            Condition::Unrecognized { type_name } => self.unrecognized("condition", type_name, location),
            _ => {}
        }
    }

    fn path(&mut self, location: &str, assertion: &GraphPathAssertion) {
        if assertion.path.is_empty() {
            self.invalid(location, "graph path has no steps");
        }
        for (i, constraint) in assertion.constraints.iter().enumerate() {
            if let PathConstraint::Unrecognized { type_name } = constraint {
                self.unrecognized("path constraint", type_name, &format!("{location}.where[{i}]"));
            }
        }
    }

    fn filters(&mut self, location: &str, field: &str, filters: &[SelectionFilter]) {
        for (i, filter) in filters.iter().enumerate() {
            let location = format!("{location}.{field}[{i}]");
            match filter {
                SelectionFilter::GraphPath { assertion } => self.path(&location, assertion),
                SelectionFilter::Unrecognized { type_name } => {
                    self.unrecognized("filter", type_name, &location)
                }
                _ => {}
            }
        }
    }

    fn metric(&mut self, location: &str, metric: &Metric) {
        if let Metric::Unrecognized { type_name } = metric {
            self.unrecognized("metric", type_name, location);
        }
    }

    fn selection(&mut self, location: &str, rule: &SelectionRule) {
        self.filters(location, "filters", &rule.filters);
        for (i, limit) in rule.saturation_limits.iter().enumerate() {
            if limit.max_count == 0 {
                self.invalid(
                    &format!("{location}.saturation_limits[{i}]"),
                    "saturation limit max_count must be positive",
                );
            }
        }
    }

    fn variable(&mut self, location: &str, rule: &VariableSelectionRule) {
        self.filters(location, "filters", &rule.filters);
        self.filters(location, "prefer_filters", &rule.prefer_filters);
    }

    fn mutation(&mut self, location: &str, mutation: &Mutation) {
        if let Mutation::Unrecognized { type_name } = mutation {
            self.unrecognized("mutation", type_name, location);
        }
    }
}
