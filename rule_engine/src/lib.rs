//! # Rule Engine
//!
//! Declarative rules evaluated against a `world_model` graph. This crate
//! reads the graph through `GraphView`, answers questions about it, and
//! proposes changes; it never writes to the graph itself.
//!
//! ## Core Components
//!
//! - **resolver**: turns `$self`, `$variables` and raw IDs into entities
//! - **filters**: narrowing predicates over candidate lists
//! - **graph_path**: multi-hop traversal assertions
//! - **conditions**: boolean rules with diagnostics
//! - **metrics**: numeric rules with diagnostics
//! - **selection**: candidate selection and variable binding
//! - **mutations**: change sets handed to a `MutationSink`
//! - **rule_set**: loading and validating named rule bundles
//!
//! ## Failure model
//!
//! Evaluation never returns `Err`. An unresolved reference or an
//! unrecognized rule variant produces a failing result with a diagnostic.
//! `RuleError` is reserved for loading and validating rules.

#[macro_use]
mod lenient;

pub mod conditions;
pub mod config;
pub mod context;
pub mod error;
pub mod filters;
pub mod graph_path;
pub mod metrics;
pub mod mutations;
pub mod resolver;
pub mod rule_set;
pub mod selection;

#[cfg(test)]
mod test_support;

pub use conditions::{evaluate_condition, evaluate_conditions, Condition, ConditionResult};
pub use config::EngineConfig;
pub use context::{FixedSequence, RandomSource, RngSource, RuleContext};
pub use error::{Result, RuleError};
pub use filters::{apply_filter, apply_filters, entity_passes_all_filters, SelectionFilter};
pub use graph_path::{evaluate_graph_path, GraphPathAssertion, PathCheck, PathConstraint, PathStep};
pub use metrics::{evaluate_metric, Metric, MetricResult};
pub use mutations::{prepare_mutation, prepare_mutations, Mutation, MutationResult};
pub use resolver::{ActionResolver, Binding, ContextResolver, EntityResolver, SELF_REFERENCE};
pub use rule_set::RuleSet;
pub use selection::{
    select_entities, select_variable_entities, PickStrategy, SaturationLimit, SelectionRule,
    SelectionStrategy, SelectionTrace, VariableSelectionRule, VariableSource,
};
