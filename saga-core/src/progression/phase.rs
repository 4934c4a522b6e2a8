//! Narrative phase classification.

use serde::{Deserialize, Serialize};

/// Where a chapter sits in the overall dramatic arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativePhase {
    Introduction,
    RisingAction,
    Climax,
    FallingAction,
    Resolution,
}

impl NarrativePhase {
    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            NarrativePhase::Introduction => "introduction",
            NarrativePhase::RisingAction => "rising action",
            NarrativePhase::Climax => "climax",
            NarrativePhase::FallingAction => "falling action",
            NarrativePhase::Resolution => "resolution",
        }
    }
}

/// Chapter-number cutoffs for phase classification.
///
/// A chapter number at or below a cutoff lands in that phase; anything past
/// the last cutoff is resolution. Content markers can override the numeric
/// answer per chapter without moving these boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseThresholds {
    /// Last chapter of the introduction.
    pub introduction_until: u32,
    /// Last chapter of the rising action.
    pub rising_until: u32,
    /// Last chapter of the climax.
    pub climax_until: u32,
    /// Last chapter of the falling action.
    pub falling_until: u32,
}

impl Default for PhaseThresholds {
    fn default() -> Self {
        Self {
            introduction_until: 5,
            rising_until: 15,
            climax_until: 20,
            falling_until: 25,
        }
    }
}

impl PhaseThresholds {
    /// Classify a chapter number.
    pub fn phase_for(&self, chapter: u32) -> NarrativePhase {
        if chapter <= self.introduction_until {
            NarrativePhase::Introduction
        } else if chapter <= self.rising_until {
            NarrativePhase::RisingAction
        } else if chapter <= self.climax_until {
            NarrativePhase::Climax
        } else if chapter <= self.falling_until {
            NarrativePhase::FallingAction
        } else {
            NarrativePhase::Resolution
        }
    }
}
