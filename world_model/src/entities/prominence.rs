//! Prominence - the ordinal narrative-importance scale.

use serde::{Deserialize, Serialize};

/// Narrative importance of an entity, ordered from least to most prominent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Prominence {
    Forgotten,
    Marginal,
    #[default]
    Recognized,
    Renowned,
    Mythic,
}

impl Prominence {
    /// All levels in ascending order.
    pub const ALL: [Prominence; 5] = [
        Prominence::Forgotten,
        Prominence::Marginal,
        Prominence::Recognized,
        Prominence::Renowned,
        Prominence::Mythic,
    ];

    /// Lowest level.
    pub const MIN: Prominence = Prominence::Forgotten;

    /// Highest level.
    pub const MAX: Prominence = Prominence::Mythic;

    /// Ordinal index from 0 (forgotten) to 4 (mythic).
    pub fn index(self) -> usize {
        self as usize
    }

    /// Level at the given index, clamped into range.
    pub fn from_index(index: i64) -> Self {
        Self::ALL[index.clamp(0, 4) as usize]
    }

    /// Parse a level name. Unknown names fall back to `Recognized`.
    pub fn parse_lenient(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "forgotten" => Prominence::Forgotten,
            "marginal" => Prominence::Marginal,
            "recognized" => Prominence::Recognized,
            "renowned" => Prominence::Renowned,
            "mythic" => Prominence::Mythic,
            _ => Prominence::Recognized,
        }
    }

    /// Move `steps` levels up (positive) or down (negative), saturating.
    pub fn shifted(self, steps: i32) -> Self {
        Self::from_index(self.index() as i64 + i64::from(steps))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Prominence::Forgotten => "forgotten",
            Prominence::Marginal => "marginal",
            Prominence::Recognized => "recognized",
            Prominence::Renowned => "renowned",
            Prominence::Mythic => "mythic",
        }
    }
}

impl From<String> for Prominence {
    fn from(name: String) -> Self {
        Self::parse_lenient(&name)
    }
}

impl From<Prominence> for String {
    fn from(level: Prominence) -> Self {
        level.as_str().to_string()
    }
}

impl std::fmt::Display for Prominence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
