//! Numeric tables: prominence multipliers, decay rates, distance falloff.

use serde::{Deserialize, Serialize};

use crate::entities::Prominence;

/// Named multiplier curves over the five prominence levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProminenceCurve {
    /// Scales success probabilities: 0.6 (forgotten) to 1.5 (mythic).
    #[default]
    SuccessChance,
    /// Scales how often an entity acts: 0.3 (forgotten) to 2.0 (mythic).
    ActionRate,
}

impl ProminenceCurve {
    fn table(&self) -> [f64; 5] {
        match self {
            ProminenceCurve::SuccessChance => [0.6, 0.8, 1.0, 1.2, 1.5],
            ProminenceCurve::ActionRate => [0.3, 0.6, 1.0, 1.5, 2.0],
        }
    }

    /// Multiplier for the given level.
    pub fn multiplier(&self, prominence: Prominence) -> f64 {
        self.table()[prominence.index()]
    }
}

/// Qualitative decay speeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecayRate {
    None,
    Slow,
    #[default]
    Medium,
    Fast,
}

impl DecayRate {
    /// Fraction lost per tick.
    pub fn coefficient(&self) -> f64 {
        match self {
            DecayRate::None => 0.0,
            DecayRate::Slow => 0.01,
            DecayRate::Medium => 0.03,
            DecayRate::Fast => 0.06,
        }
    }
}

/// Distance attenuation curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FalloffType {
    /// Remaining reach in distance units: `max(0, max_distance - distance)`.
    Absolute,
    /// No attenuation.
    None,
    #[default]
    Linear,
    InverseSquare,
    Sqrt,
    Exponential,
}

impl FalloffType {
    /// Attenuation at `distance` for a curve reaching `max_distance`.
    ///
    /// Every curve is non-increasing in distance; all but `Absolute` stay in
    /// `[0, 1]`. Negative distances count as zero and a non-positive reach is
    /// treated as 1.
    pub fn attenuate(&self, distance: f64, max_distance: f64) -> f64 {
        let d = if distance.is_finite() { distance.max(0.0) } else { f64::INFINITY };
        let reach = if max_distance > 0.0 { max_distance } else { 1.0 };

        match self {
            FalloffType::Absolute => (reach - d).max(0.0),
            FalloffType::None => 1.0,
            FalloffType::Linear => (1.0 - d / reach).clamp(0.0, 1.0),
            FalloffType::InverseSquare => {
                let scaled = d / reach;
                1.0 / (1.0 + scaled * scaled)
            }
            FalloffType::Sqrt => (1.0 - (d / reach).sqrt()).clamp(0.0, 1.0),
            FalloffType::Exponential => (-d / reach).exp(),
        }
    }
}
