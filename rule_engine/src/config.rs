//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// Tunables shared by every evaluation that runs under a context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Multiplier applied to `entity_count` upper bounds before comparing.
    pub overshoot_factor: f64,

    /// Radius used by `by_proximity` selection when the rule gives none.
    pub proximity_max_distance: f64,

    /// Reach used by `falloff` metrics when the rule gives none.
    pub falloff_max_distance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            overshoot_factor: 1.5,
            proximity_max_distance: 50.0,
            falloff_max_distance: 100.0,
        }
    }
}

impl EngineConfig {
    /// Parse a config from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Load a config from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}
