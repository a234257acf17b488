//! Narrowing trace for diagnostics.

use serde::{Deserialize, Serialize};
use tracing::trace;

/// One narrowing step and how many candidates it left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceStep {
    pub description: String,
    pub remaining: usize,
}

/// Records each narrowing step of a selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionTrace {
    pub steps: Vec<TraceStep>,
}

impl SelectionTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, description: impl Into<String>, remaining: usize) {
        let description = description.into();
        trace!(step = %description, remaining, "Selection narrowed");
        self.steps.push(TraceStep {
            description,
            remaining,
        });
    }

    /// Count left after the last step, if any step ran.
    pub fn remaining(&self) -> Option<usize> {
        self.steps.last().map(|step| step.remaining)
    }
}
