//! Error types for loading and validating rules.
//!
//! Evaluation never produces these; a rule that cannot be satisfied at run
//! time fails softly with a diagnostic instead.

use thiserror::Error;

/// Errors raised while building, loading or validating rules.
#[derive(Error, Debug)]
pub enum RuleError {
    /// JSON rule data could not be parsed.
    #[error("Failed to parse rule JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML rule or config data could not be parsed.
    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// Reading a rule or config file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A rule carries a type tag outside its closed variant set.
    #[error("Unrecognized {family} type '{type_name}' at {location}")]
    Unrecognized {
        /// Rule family, e.g. "condition" or "metric".
        family: &'static str,
        /// The offending type tag.
        type_name: String,
        /// Where in the rule set it was found.
        location: String,
    },

    /// A rule is well-formed but can never behave sensibly.
    #[error("Invalid rule at {location}: {reason}")]
    Invalid {
        /// Where in the rule set it was found.
        location: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Validation found one or more problems.
    #[error("Rule set failed validation with {} problem(s)", .0.len())]
    Validation(Vec<RuleError>),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, RuleError>;
