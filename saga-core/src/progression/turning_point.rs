//! Turning point detection records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Categories of turning point the detector recognizes.
///
/// Each category carries a fixed significance score; the bucketing into
/// impact levels happens on those fixed scores, not on anything measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurningPointKind {
    PlotTwist,
    Revelation,
    ConflictEscalation,
    CharacterDevelopment,
    Resolution,
}

impl TurningPointKind {
    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            TurningPointKind::PlotTwist => "plot twist",
            TurningPointKind::Revelation => "revelation",
            TurningPointKind::ConflictEscalation => "conflict escalation",
            TurningPointKind::CharacterDevelopment => "character development",
            TurningPointKind::Resolution => "resolution",
        }
    }

    /// Fixed significance for this category, on a 0-10 scale.
    pub fn significance(&self) -> f64 {
        match self {
            TurningPointKind::PlotTwist => 9.0,
            TurningPointKind::Revelation => 8.0,
            TurningPointKind::ConflictEscalation => 7.0,
            TurningPointKind::CharacterDevelopment => 6.0,
            TurningPointKind::Resolution => 5.0,
        }
    }
}

/// Impact bucket derived from a significance score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactLevel {
    Critical,
    High,
    Medium,
    Low,
}

impl ImpactLevel {
    /// Bucket a significance score.
    pub fn from_significance(significance: f64) -> Self {
        if significance >= 9.0 {
            ImpactLevel::Critical
        } else if significance >= 7.0 {
            ImpactLevel::High
        } else if significance >= 5.0 {
            ImpactLevel::Medium
        } else {
            ImpactLevel::Low
        }
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            ImpactLevel::Critical => "critical",
            ImpactLevel::High => "high",
            ImpactLevel::Medium => "medium",
            ImpactLevel::Low => "low",
        }
    }
}

/// A detected turning point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurningPointRecord {
    /// Chapter where the turning point landed.
    pub chapter: u32,

    /// Detected category.
    pub kind: TurningPointKind,

    /// Significance carried over from the category.
    pub significance: f64,

    /// Impact bucket for the significance.
    pub impact: ImpactLevel,

    /// When the detection was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl TurningPointRecord {
    /// Record a turning point of a category at a chapter.
    pub fn detect(kind: TurningPointKind, chapter: u32) -> Self {
        let significance = kind.significance();
        Self {
            chapter,
            kind,
            significance,
            impact: ImpactLevel::from_significance(significance),
            recorded_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impact_buckets() {
        assert_eq!(ImpactLevel::from_significance(9.5), ImpactLevel::Critical);
        assert_eq!(ImpactLevel::from_significance(9.0), ImpactLevel::Critical);
        assert_eq!(ImpactLevel::from_significance(8.9), ImpactLevel::High);
        assert_eq!(ImpactLevel::from_significance(7.0), ImpactLevel::High);
        assert_eq!(ImpactLevel::from_significance(6.9), ImpactLevel::Medium);
        assert_eq!(ImpactLevel::from_significance(5.0), ImpactLevel::Medium);
        assert_eq!(ImpactLevel::from_significance(4.9), ImpactLevel::Low);
    }

    #[test]
    fn test_category_significance_is_fixed() {
        let record = TurningPointRecord::detect(TurningPointKind::PlotTwist, 12);
        assert_eq!(record.significance, 9.0);
        assert_eq!(record.impact, ImpactLevel::Critical);

        let quiet = TurningPointRecord::detect(TurningPointKind::Resolution, 12);
        assert_eq!(quiet.impact, ImpactLevel::Medium);
    }
}
