//! Optimizer seam and bundle types.

use crate::analysis::IntegratedAnalysisResult;
use crate::chapter::ChapterInput;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The optimization categories the pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    Theme,
    Style,
    Character,
    Tension,
}

impl OptimizerKind {
    /// Every kind, in sequential execution order.
    pub const ALL: [OptimizerKind; 4] = [
        OptimizerKind::Theme,
        OptimizerKind::Character,
        OptimizerKind::Tension,
        OptimizerKind::Style,
    ];

    /// Stable section name.
    pub fn name(&self) -> &'static str {
        match self {
            OptimizerKind::Theme => "theme",
            OptimizerKind::Style => "style",
            OptimizerKind::Character => "character",
            OptimizerKind::Tension => "tension",
        }
    }

    /// Position in sequential runs. Story-level passes (theme, character)
    /// precede the prose-level ones.
    pub fn sequence_rank(&self) -> usize {
        match self {
            OptimizerKind::Theme => 0,
            OptimizerKind::Character => 1,
            OptimizerKind::Tension => 2,
            OptimizerKind::Style => 3,
        }
    }
}

/// How urgent a suggestion is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

/// Errors an optimizer can fail with. The coordinator catches these per
/// category and substitutes a fallback bundle.
#[derive(Debug, Error)]
pub enum OptimizerError {
    #[error("optimizer unavailable: {0}")]
    Unavailable(String),

    #[error("optimization failed: {0}")]
    Failed(String),
}

/// One raw suggestion produced by an optimizer, before integration
/// assigns it an id and ranks it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftSuggestion {
    /// The suggested revision.
    pub text: String,

    /// Urgency as judged by the optimizer.
    pub priority: Priority,

    /// Expected benefit in [0, 1].
    pub impact: f64,

    /// Expected cost to apply in [0, 1].
    pub effort: f64,
}

impl DraftSuggestion {
    /// Create a suggestion, clamping impact and effort into [0, 1].
    pub fn new(text: impl Into<String>, priority: Priority, impact: f64, effort: f64) -> Self {
        Self {
            text: text.into(),
            priority,
            impact: impact.clamp(0.0, 1.0),
            effort: effort.clamp(0.0, 1.0),
        }
    }
}

/// What a single optimizer produced for one chapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationBundle {
    /// One-line assessment of the category.
    pub summary: String,

    /// Suggested revisions in this category.
    #[serde(default)]
    pub suggestions: Vec<DraftSuggestion>,

    /// Estimated score gain if the suggestions are applied, in [0, 1].
    pub expected_gain: f64,
}

impl OptimizationBundle {
    /// Create a bundle. The expected gain is clamped into [0, 1].
    pub fn new(summary: impl Into<String>, expected_gain: f64) -> Self {
        Self {
            summary: summary.into(),
            suggestions: Vec::new(),
            expected_gain: expected_gain.clamp(0.0, 1.0),
        }
    }

    /// Add a suggestion, builder style.
    pub fn with_suggestion(mut self, suggestion: DraftSuggestion) -> Self {
        self.suggestions.push(suggestion);
        self
    }

    /// Neutral stand-in used when an optimizer of this kind fails.
    pub fn fallback(kind: OptimizerKind) -> Self {
        Self::new(
            format!("{} optimization unavailable; no changes proposed", kind.name()),
            0.0,
        )
    }
}

/// One optimization category over chapters.
///
/// Implementations receive the chapter plus the integrated analysis it
/// was produced from; analysis sections may themselves be fallbacks, so
/// optimizers must not assume any section carries real output.
#[async_trait]
pub trait ChapterOptimizer: Send + Sync {
    /// Unique name, used as the section key in integrated results.
    fn name(&self) -> &str;

    /// Which category this optimizer covers.
    fn kind(&self) -> OptimizerKind;

    /// Propose revisions for one chapter.
    async fn optimize(
        &self,
        chapter: &ChapterInput,
        analysis: &IntegratedAnalysisResult,
    ) -> Result<OptimizationBundle, OptimizerError>;
}
