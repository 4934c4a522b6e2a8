//! Integrated analysis result types.

use crate::analysis::analyzer::{AnalyzerKind, AnalyzerReport};
use crate::outcome::Outcome;
use crate::quality::{DimensionScores, Trend};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether a section came from a real analyzer or a substituted default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionSource {
    Analyzer,
    Fallback,
}

/// One analyzer's contribution to an integrated result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSection {
    /// Dimension the section covers.
    pub kind: AnalyzerKind,

    /// Real output or substituted default.
    pub source: SectionSource,

    /// The report itself.
    pub report: AnalyzerReport,
}

impl AnalysisSection {
    /// Wrap a real analyzer report.
    pub fn produced(kind: AnalyzerKind, report: AnalyzerReport) -> Self {
        Self {
            kind,
            source: SectionSource::Analyzer,
            report,
        }
    }

    /// Build the substituted default for a failed analyzer.
    pub fn fallback(kind: AnalyzerKind) -> Self {
        Self {
            kind,
            source: SectionSource::Fallback,
            report: AnalyzerReport::fallback(kind),
        }
    }

    /// Whether this section is a substituted default.
    pub fn is_fallback(&self) -> bool {
        self.source == SectionSource::Fallback
    }
}

/// Quality tracker output folded into an analysis result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityMetricBundle {
    /// Per-dimension scores for the chapter.
    pub dimensions: DimensionScores,

    /// Weighted overall score.
    pub overall: f64,

    /// Trend after this chapter.
    pub trend: Trend,
}

impl Default for QualityMetricBundle {
    fn default() -> Self {
        Self {
            dimensions: DimensionScores::default(),
            overall: 5.0,
            trend: Trend::Stable,
        }
    }
}

/// Bookkeeping about how an analysis call executed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// Names of analyzers that produced real output.
    pub services_used: Vec<String>,

    /// Whether the result was answered from cache.
    pub cache_hit: bool,

    /// Wall time of the call in milliseconds.
    pub elapsed_ms: u64,

    /// Related chapters retrieved from memory.
    pub related_chapters: usize,

    /// How completely the call executed.
    pub outcome: Outcome,
}

/// Everything one analysis call produced, merged across analyzers and
/// trackers. Sections are keyed by analyzer name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegratedAnalysisResult {
    /// Chapter the result describes.
    pub chapter_number: u32,

    /// Per-analyzer sections, keyed by analyzer name.
    pub sections: BTreeMap<String, AnalysisSection>,

    /// Quality scores for the chapter.
    pub quality: QualityMetricBundle,

    /// Merged, capped suggestion list across analyzers and trackers.
    pub integrated_suggestions: Vec<String>,

    /// Call bookkeeping.
    pub metadata: AnalysisMetadata,
}

impl IntegratedAnalysisResult {
    /// Fully-defaulted result used when nothing could be analyzed: one
    /// fallback section per built-in dimension and neutral quality.
    pub fn fallback(chapter_number: u32) -> Self {
        let sections = AnalyzerKind::ALL
            .iter()
            .map(|kind| (kind.name().to_string(), AnalysisSection::fallback(*kind)))
            .collect();
        Self {
            chapter_number,
            sections,
            quality: QualityMetricBundle::default(),
            integrated_suggestions: Vec::new(),
            metadata: AnalysisMetadata {
                services_used: Vec::new(),
                cache_hit: false,
                elapsed_ms: 0,
                related_chapters: 0,
                outcome: Outcome::Fallback,
            },
        }
    }

    /// Section by analyzer name.
    pub fn section(&self, name: &str) -> Option<&AnalysisSection> {
        self.sections.get(name)
    }

    /// First section of a kind, if any analyzer of that kind ran.
    pub fn section_of_kind(&self, kind: AnalyzerKind) -> Option<&AnalysisSection> {
        self.sections.values().find(|s| s.kind == kind)
    }

    /// Sections that hold real analyzer output.
    pub fn produced_count(&self) -> usize {
        self.sections.values().filter(|s| !s.is_fallback()).count()
    }

    /// Sections that hold substituted defaults.
    pub fn fallback_count(&self) -> usize {
        self.sections.values().filter(|s| s.is_fallback()).count()
    }

    /// Mean score across the sections that produced real output, falling
    /// back to the neutral midpoint when none did.
    pub fn mean_section_score(&self) -> f64 {
        let produced: Vec<f64> = self
            .sections
            .values()
            .filter(|s| !s.is_fallback())
            .map(|s| s.report.score)
            .collect();
        if produced.is_empty() {
            5.0
        } else {
            produced.iter().sum::<f64>() / produced.len() as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_result_covers_every_kind() {
        let result = IntegratedAnalysisResult::fallback(4);
        assert_eq!(result.chapter_number, 4);
        assert_eq!(result.sections.len(), AnalyzerKind::ALL.len());
        assert_eq!(result.fallback_count(), AnalyzerKind::ALL.len());
        assert_eq!(result.produced_count(), 0);
        assert_eq!(result.metadata.outcome, Outcome::Fallback);
        assert!(result.section("theme").is_some());
    }

    #[test]
    fn test_mean_section_score_skips_fallbacks() {
        let mut result = IntegratedAnalysisResult::fallback(1);
        result.sections.insert(
            "style".to_string(),
            AnalysisSection::produced(AnalyzerKind::Style, AnalyzerReport::new("tight prose", 8.0)),
        );

        assert_eq!(result.produced_count(), 1);
        assert!((result.mean_section_score() - 8.0).abs() < 1e-9);
    }
}
