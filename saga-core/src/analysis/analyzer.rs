//! Analyzer seam and report types.

use crate::chapter::ChapterInput;
use crate::memory::MemoryHit;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The analysis dimensions the pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerKind {
    Theme,
    Character,
    NarrativeStructure,
    Style,
    ReaderExperience,
}

impl AnalyzerKind {
    /// Every kind, in sequential execution order.
    pub const ALL: [AnalyzerKind; 5] = [
        AnalyzerKind::Theme,
        AnalyzerKind::Character,
        AnalyzerKind::NarrativeStructure,
        AnalyzerKind::Style,
        AnalyzerKind::ReaderExperience,
    ];

    /// Stable section name.
    pub fn name(&self) -> &'static str {
        match self {
            AnalyzerKind::Theme => "theme",
            AnalyzerKind::Character => "character",
            AnalyzerKind::NarrativeStructure => "narrative_structure",
            AnalyzerKind::Style => "style",
            AnalyzerKind::ReaderExperience => "reader_experience",
        }
    }

    /// Position in sequential runs. Upstream views of the chapter (theme,
    /// character) run before the downstream reader-facing ones.
    pub fn sequence_rank(&self) -> usize {
        match self {
            AnalyzerKind::Theme => 0,
            AnalyzerKind::Character => 1,
            AnalyzerKind::NarrativeStructure => 2,
            AnalyzerKind::Style => 3,
            AnalyzerKind::ReaderExperience => 4,
        }
    }
}

/// Errors an analyzer can fail with. The coordinator catches these per
/// analyzer and substitutes a fallback section.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("analyzer unavailable: {0}")]
    Unavailable(String),

    #[error("analysis failed: {0}")]
    Failed(String),
}

/// What a single analyzer produced for one chapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerReport {
    /// One-line assessment.
    pub summary: String,

    /// Dimension score in [1, 10].
    pub score: f64,

    /// Concrete observations about the chapter.
    #[serde(default)]
    pub findings: Vec<String>,

    /// Improvement suggestions for this dimension.
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl AnalyzerReport {
    /// Create a report. The score is clamped into [1, 10].
    pub fn new(summary: impl Into<String>, score: f64) -> Self {
        Self {
            summary: summary.into(),
            score: score.clamp(1.0, 10.0),
            findings: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    /// Add a finding, builder style.
    pub fn with_finding(mut self, finding: impl Into<String>) -> Self {
        self.findings.push(finding.into());
        self
    }

    /// Add a suggestion, builder style.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Neutral stand-in used when an analyzer of this kind fails.
    pub fn fallback(kind: AnalyzerKind) -> Self {
        Self::new(
            format!("{} analysis unavailable; neutral defaults applied", kind.name()),
            5.0,
        )
        .with_suggestion(format!(
            "re-run once the {} analyzer is available",
            kind.name()
        ))
    }
}

/// One analysis dimension over chapters.
///
/// Implementations receive the chapter plus any related story memory the
/// coordinator retrieved. They must not assume other analyzers ran first.
#[async_trait]
pub trait ChapterAnalyzer: Send + Sync {
    /// Unique name, used as the section key in integrated results.
    fn name(&self) -> &str;

    /// Which dimension this analyzer covers.
    fn kind(&self) -> AnalyzerKind;

    /// Analyze one chapter.
    async fn analyze(
        &self,
        chapter: &ChapterInput,
        related: &[MemoryHit],
    ) -> Result<AnalyzerReport, AnalyzerError>;
}
