//! Completion grading for coordinator calls.

use serde::{Deserialize, Serialize};

/// How completely a coordinator call executed.
///
/// Coordinator entry points never return errors; callers inspect this
/// grade to tell a clean run from one that substituted defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Every collaborator produced real output.
    Full,
    /// Some collaborators failed and their sections hold fallback content.
    Degraded,
    /// Nothing useful was produced; the whole result is defaulted.
    Fallback,
}

impl Outcome {
    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            Outcome::Full => "full",
            Outcome::Degraded => "degraded",
            Outcome::Fallback => "fallback",
        }
    }

    /// Whether at least part of the result came from real collaborators.
    pub fn has_real_output(&self) -> bool {
        !matches!(self, Outcome::Fallback)
    }

    /// Grade a run from its produced/failed section counts.
    pub fn from_counts(produced: usize, failed: usize) -> Self {
        match (produced, failed) {
            (0, _) => Outcome::Fallback,
            (_, 0) => Outcome::Full,
            _ => Outcome::Degraded,
        }
    }
}
