//! Chapter optimization: fan-out across optimizer categories and
//! integration into a prioritized, conflict-resolved recommendation set.
//!
//! Structured like the analysis coordinator: same cache discipline, same
//! per-collaborator fault boundary, same never-fails entry point.

pub mod builtin;
pub mod optimizer;
pub mod recommend;
pub mod result;

pub use builtin::builtin_optimizers;
pub use optimizer::{
    ChapterOptimizer, DraftSuggestion, OptimizationBundle, OptimizerError, OptimizerKind, Priority,
};
pub use recommend::{
    ConflictResolution, ImplementationPhase, IntegratedRecommendations, PriorityStrategy,
    Suggestion, SynergyOpportunity,
};
pub use result::{
    BundleSource, IntegratedOptimizationResult, OptimizationMetadata, OptimizationSection,
};

use crate::analysis::IntegratedAnalysisResult;
use crate::cache::{chapter_cache_key, ResultCache};
use crate::chapter::ChapterInput;
use crate::exec::ExecutionMode;
use crate::outcome::Outcome;
use crate::stats::{integration_efficiency, SystemStatisticsTracker};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Tuning knobs for the optimization coordinator.
#[derive(Debug, Clone)]
pub struct OptimizationConfig {
    /// Whether optimizers run together or one at a time.
    pub mode: ExecutionMode,

    /// How the merged suggestion list is ranked.
    pub strategy: PriorityStrategy,

    /// Suggestions kept per category; the prioritized list is capped at
    /// four times this.
    pub max_per_category: usize,

    /// Whether results are cached and served on repeat calls.
    pub cache_enabled: bool,

    /// Cached results kept before LRU eviction.
    pub cache_capacity: usize,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Parallel,
            strategy: PriorityStrategy::Balanced,
            max_per_category: 3,
            cache_enabled: true,
            cache_capacity: 64,
        }
    }
}

/// Runs the optimizer set over chapters and integrates recommendations.
pub struct OptimizationCoordinator {
    optimizers: Vec<Arc<dyn ChapterOptimizer>>,
    stats: Arc<Mutex<SystemStatisticsTracker>>,
    cache: ResultCache<IntegratedOptimizationResult>,
    config: OptimizationConfig,
}

impl OptimizationCoordinator {
    /// Wire a coordinator over its collaborators.
    pub fn new(
        optimizers: Vec<Arc<dyn ChapterOptimizer>>,
        stats: Arc<Mutex<SystemStatisticsTracker>>,
        config: OptimizationConfig,
    ) -> Self {
        let cache = ResultCache::new(config.cache_capacity, config.cache_enabled);
        Self {
            optimizers,
            stats,
            cache,
            config,
        }
    }

    /// Cache hits served so far.
    pub fn cache_hits(&self) -> u64 {
        self.cache.hits()
    }

    /// Optimize one chapter against its integrated analysis.
    ///
    /// Never fails: optimizer errors become fallback bundles, and if
    /// integration itself breaks the caller gets the fully-defaulted
    /// fallback result.
    pub async fn optimize_chapter(
        &self,
        chapter: &ChapterInput,
        analysis: &IntegratedAnalysisResult,
    ) -> IntegratedOptimizationResult {
        let started = Instant::now();
        let key = chapter_cache_key(chapter);

        if let Some(mut hit) = self.cache.get(&key) {
            debug!(chapter = chapter.number, "optimization served from cache");
            hit.metadata.cache_hit = true;
            return hit;
        }

        let result = self
            .run_optimization(chapter, analysis, started)
            .await
            .unwrap_or_else(|reason| {
                warn!(chapter = chapter.number, reason, "optimization integration failed");
                IntegratedOptimizationResult::fallback(chapter.number)
            });

        self.cache.insert(key, result.clone());
        info!(
            chapter = chapter.number,
            outcome = result.metadata.outcome.name(),
            suggestions = result.recommendations.prioritized.len(),
            conflicts = result.recommendations.conflicts.len(),
            "chapter optimized"
        );
        result
    }

    async fn run_optimization(
        &self,
        chapter: &ChapterInput,
        analysis: &IntegratedAnalysisResult,
        started: Instant,
    ) -> Result<IntegratedOptimizationResult, &'static str> {
        let outputs = match self.config.mode {
            ExecutionMode::Parallel => self.run_parallel(chapter, analysis).await,
            ExecutionMode::Sequential => self.run_sequential(chapter, analysis).await,
        };

        {
            let mut stats = self.stats.lock().await;
            for output in &outputs {
                stats
                    .record_component_call(&output.name, output.bundle.is_some(), output.elapsed)
                    .await;
                if output.kind == OptimizerKind::Tension {
                    let improvement = output
                        .bundle
                        .as_ref()
                        .map(|b| b.expected_gain)
                        .unwrap_or(0.0);
                    stats
                        .record_tension_optimization(
                            chapter.context.tension().unwrap_or("sustain"),
                            output.bundle.is_some(),
                            improvement,
                        )
                        .await;
                }
            }
        }

        let mut sections = BTreeMap::new();
        let mut categories_used = Vec::new();
        let mut flattened = Vec::new();
        let mut produced = 0usize;
        let mut failed = 0usize;

        for output in outputs {
            let section = match output.bundle {
                Some(bundle) => {
                    produced += 1;
                    categories_used.push(output.name.clone());
                    for draft in bundle
                        .suggestions
                        .iter()
                        .take(self.config.max_per_category)
                    {
                        flattened.push(Suggestion {
                            id: Uuid::new_v4(),
                            kind: output.kind,
                            text: draft.text.clone(),
                            priority: draft.priority,
                            impact: draft.impact,
                            effort: draft.effort,
                        });
                    }
                    OptimizationSection::produced(output.kind, bundle)
                }
                None => {
                    failed += 1;
                    OptimizationSection::fallback(output.kind)
                }
            };
            if sections.insert(output.name, section).is_some() {
                return Err("duplicate optimizer name");
            }
        }

        let recommendations = IntegratedRecommendations::build(
            flattened,
            self.config.strategy,
            self.config.max_per_category,
        );

        let payload = serde_json::to_vec(&sections).map(|b| b.len()).unwrap_or(0);
        {
            let mut stats = self.stats.lock().await;
            stats
                .record_integration(
                    "optimization-pipeline",
                    payload,
                    integration_efficiency(produced, failed),
                )
                .await;
            if let Err(e) = stats.persist().await {
                warn!(error = %e, "failed to persist pipeline statistics");
            }
        }

        let elapsed = started.elapsed();
        let metadata = OptimizationMetadata {
            categories_used,
            high_priority: 0,
            medium_priority: 0,
            low_priority: 0,
            cache_hit: false,
            elapsed_ms: elapsed.as_millis() as u64,
            outcome: Outcome::from_counts(produced, failed),
        }
        .with_counts(&recommendations);

        Ok(IntegratedOptimizationResult {
            chapter_number: chapter.number,
            sections,
            recommendations,
            metadata,
        })
    }

    /// Start every optimizer at once and wait for all of them.
    async fn run_parallel(
        &self,
        chapter: &ChapterInput,
        analysis: &IntegratedAnalysisResult,
    ) -> Vec<OptimizerOutput> {
        let tasks = self.optimizers.iter().map(|optimizer| async move {
            Self::run_one(optimizer.as_ref(), chapter, analysis).await
        });
        join_all(tasks).await
    }

    /// Run optimizers one at a time, story-level categories first.
    async fn run_sequential(
        &self,
        chapter: &ChapterInput,
        analysis: &IntegratedAnalysisResult,
    ) -> Vec<OptimizerOutput> {
        let mut ordered: Vec<&Arc<dyn ChapterOptimizer>> = self.optimizers.iter().collect();
        ordered.sort_by_key(|o| o.kind().sequence_rank());

        let mut outputs = Vec::with_capacity(ordered.len());
        for optimizer in ordered {
            outputs.push(Self::run_one(optimizer.as_ref(), chapter, analysis).await);
        }
        outputs
    }

    /// The single-optimizer fault boundary.
    async fn run_one(
        optimizer: &dyn ChapterOptimizer,
        chapter: &ChapterInput,
        analysis: &IntegratedAnalysisResult,
    ) -> OptimizerOutput {
        let started = Instant::now();
        let bundle = match optimizer.optimize(chapter, analysis).await {
            Ok(bundle) => Some(bundle),
            Err(e) => {
                warn!(
                    optimizer = optimizer.name(),
                    chapter = chapter.number,
                    error = %e,
                    "optimizer failed, substituting fallback"
                );
                None
            }
        };
        OptimizerOutput {
            name: optimizer.name().to_string(),
            kind: optimizer.kind(),
            bundle,
            elapsed: started.elapsed(),
        }
    }
}

struct OptimizerOutput {
    name: String,
    kind: OptimizerKind,
    bundle: Option<OptimizationBundle>,
    elapsed: std::time::Duration,
}
