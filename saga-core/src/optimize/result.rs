//! Integrated optimization result types.

use crate::optimize::optimizer::{OptimizationBundle, OptimizerKind, Priority};
use crate::optimize::recommend::IntegratedRecommendations;
use crate::outcome::Outcome;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether a bundle came from a real optimizer or a substituted default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BundleSource {
    Optimizer,
    Fallback,
}

/// One optimizer's contribution to an integrated result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationSection {
    /// Category the section covers.
    pub kind: OptimizerKind,

    /// Real output or substituted default.
    pub source: BundleSource,

    /// The bundle itself.
    pub bundle: OptimizationBundle,
}

impl OptimizationSection {
    /// Wrap a real optimizer bundle.
    pub fn produced(kind: OptimizerKind, bundle: OptimizationBundle) -> Self {
        Self {
            kind,
            source: BundleSource::Optimizer,
            bundle,
        }
    }

    /// Build the substituted default for a failed optimizer.
    pub fn fallback(kind: OptimizerKind) -> Self {
        Self {
            kind,
            source: BundleSource::Fallback,
            bundle: OptimizationBundle::fallback(kind),
        }
    }

    /// Whether this section is a substituted default.
    pub fn is_fallback(&self) -> bool {
        self.source == BundleSource::Fallback
    }
}

/// Bookkeeping about how an optimization call executed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationMetadata {
    /// Names of optimizers that produced real output.
    pub categories_used: Vec<String>,

    /// Prioritized suggestions at high priority.
    pub high_priority: usize,

    /// Prioritized suggestions at medium priority.
    pub medium_priority: usize,

    /// Prioritized suggestions at low priority.
    pub low_priority: usize,

    /// Whether the result was answered from cache.
    pub cache_hit: bool,

    /// Wall time of the call in milliseconds.
    pub elapsed_ms: u64,

    /// How completely the call executed.
    pub outcome: Outcome,
}

impl OptimizationMetadata {
    /// Fill the per-priority counts from a recommendation set.
    pub fn with_counts(mut self, recommendations: &IntegratedRecommendations) -> Self {
        self.high_priority = recommendations.count_at(Priority::High);
        self.medium_priority = recommendations.count_at(Priority::Medium);
        self.low_priority = recommendations.count_at(Priority::Low);
        self
    }
}

/// Everything one optimization call produced. Sections are keyed by
/// optimizer name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegratedOptimizationResult {
    /// Chapter the result describes.
    pub chapter_number: u32,

    /// Per-optimizer sections, keyed by optimizer name.
    pub sections: BTreeMap<String, OptimizationSection>,

    /// The merged, conflict-resolved recommendation set.
    pub recommendations: IntegratedRecommendations,

    /// Call bookkeeping.
    pub metadata: OptimizationMetadata,
}

impl IntegratedOptimizationResult {
    /// Fully-defaulted result used when nothing could be optimized: one
    /// fallback section per category and an empty recommendation set.
    pub fn fallback(chapter_number: u32) -> Self {
        let sections = OptimizerKind::ALL
            .iter()
            .map(|kind| (kind.name().to_string(), OptimizationSection::fallback(*kind)))
            .collect();
        Self {
            chapter_number,
            sections,
            recommendations: IntegratedRecommendations::default(),
            metadata: OptimizationMetadata {
                categories_used: Vec::new(),
                high_priority: 0,
                medium_priority: 0,
                low_priority: 0,
                cache_hit: false,
                elapsed_ms: 0,
                outcome: Outcome::Fallback,
            },
        }
    }

    /// Section by optimizer name.
    pub fn section(&self, name: &str) -> Option<&OptimizationSection> {
        self.sections.get(name)
    }

    /// Sections that hold real optimizer output.
    pub fn produced_count(&self) -> usize {
        self.sections.values().filter(|s| !s.is_fallback()).count()
    }

    /// Sections that hold substituted defaults.
    pub fn fallback_count(&self) -> usize {
        self.sections.values().filter(|s| s.is_fallback()).count()
    }
}
