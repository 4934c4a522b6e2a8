//! The composition root: one `Pipeline` wires the store, chapter memory,
//! the three trackers and both coordinators for a single narrative.
//!
//! Nothing here is global. Tests build fresh pipelines over in-memory
//! stores, and two pipelines never share state unless handed the same
//! store. Each tracker sits behind its own `tokio::sync::Mutex`, which is
//! what makes "one logical writer per persisted document" hold: writes to
//! a document only ever happen while its tracker's lock is held. Two
//! calls that land on the same cache key are not serialized; both may
//! compute and the later insert wins.

use crate::analysis::{
    builtin_analyzers, AnalysisConfig, AnalysisCoordinator, ChapterAnalyzer,
    IntegratedAnalysisResult,
};
use crate::chapter::ChapterInput;
use crate::exec::ExecutionMode;
use crate::memory::NarrativeMemory;
use crate::optimize::{
    builtin_optimizers, ChapterOptimizer, IntegratedOptimizationResult, OptimizationConfig,
    OptimizationCoordinator, PriorityStrategy,
};
use crate::progression::{
    ArcRecord, ProgressionConfig, ProgressionTracker, StoryProgressionState, TurningPointRecord,
};
use crate::quality::{QualityConfig, QualityMetricsTracker, QualitySummary};
use crate::stats::{StatsConfig, StatsSampler, StatsSummary, SystemStatisticsTracker};
use crate::store::MemoryStore;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Configuration for a whole pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Analysis coordinator knobs.
    pub analysis: AnalysisConfig,

    /// Optimization coordinator knobs.
    pub optimization: OptimizationConfig,

    /// Quality tracker knobs.
    pub quality: QualityConfig,

    /// Progression tracker knobs.
    pub progression: ProgressionConfig,

    /// Statistics tracker knobs, including the sampling interval.
    pub stats: StatsConfig,

    /// Whether the background performance sampler is started.
    pub sampler_enabled: bool,
}

impl PipelineConfig {
    /// Set the execution mode for both coordinators, builder style.
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.analysis.mode = mode;
        self.optimization.mode = mode;
        self
    }

    /// Enable or disable result caching for both coordinators.
    pub fn with_caching(mut self, enabled: bool) -> Self {
        self.analysis.cache_enabled = enabled;
        self.optimization.cache_enabled = enabled;
        self
    }

    /// Set the suggestion ranking strategy.
    pub fn with_strategy(mut self, strategy: PriorityStrategy) -> Self {
        self.optimization.strategy = strategy;
        self
    }

    /// Set the retention window for every tracker.
    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.quality.retention_days = days;
        self.progression.retention_days = days;
        self.stats.retention_days = days;
        self
    }

    /// Start the background sampler, builder style.
    pub fn with_sampler(mut self, enabled: bool) -> Self {
        self.sampler_enabled = enabled;
        self
    }
}

/// A fully wired analysis/optimization pipeline for one narrative.
pub struct Pipeline {
    memory: Arc<NarrativeMemory>,
    quality: Arc<Mutex<QualityMetricsTracker>>,
    progression: Arc<Mutex<ProgressionTracker>>,
    stats: Arc<Mutex<SystemStatisticsTracker>>,
    analysis: AnalysisCoordinator,
    optimization: OptimizationCoordinator,
    sampler: Option<StatsSampler>,
}

impl Pipeline {
    /// Build a pipeline with the built-in analyzer and optimizer sets.
    ///
    /// Must be called from within a Tokio runtime when the sampler is
    /// enabled, since the sampler is spawned immediately.
    pub fn new(store: Arc<dyn MemoryStore>, config: PipelineConfig) -> Self {
        Self::with_collaborators(store, config, builtin_analyzers(), builtin_optimizers())
    }

    /// Build a pipeline over explicit analyzer and optimizer sets. This is
    /// the seam for plugging in external (or stub) collaborators; the set
    /// is fixed here, once, for the life of the pipeline.
    pub fn with_collaborators(
        store: Arc<dyn MemoryStore>,
        config: PipelineConfig,
        analyzers: Vec<Arc<dyn ChapterAnalyzer>>,
        optimizers: Vec<Arc<dyn ChapterOptimizer>>,
    ) -> Self {
        let memory = Arc::new(NarrativeMemory::new(Arc::clone(&store)));
        let quality = Arc::new(Mutex::new(QualityMetricsTracker::new(
            Arc::clone(&store),
            config.quality.clone(),
        )));
        let progression = Arc::new(Mutex::new(ProgressionTracker::new(
            Arc::clone(&store),
            config.progression.clone(),
        )));
        let stats = Arc::new(Mutex::new(SystemStatisticsTracker::new(
            store,
            config.stats.clone(),
        )));

        let sampler = if config.sampler_enabled {
            let interval = config.stats.sampling_interval;
            Some(StatsSampler::spawn(Arc::clone(&stats), interval))
        } else {
            None
        };

        let analysis = AnalysisCoordinator::new(
            analyzers,
            Arc::clone(&memory),
            Arc::clone(&quality),
            Arc::clone(&progression),
            Arc::clone(&stats),
            config.analysis,
        );
        let optimization =
            OptimizationCoordinator::new(optimizers, Arc::clone(&stats), config.optimization);

        info!(sampler = sampler.is_some(), "pipeline assembled");
        Self {
            memory,
            quality,
            progression,
            stats,
            analysis,
            optimization,
            sampler,
        }
    }

    /// Analyze one chapter. Never fails; see
    /// [`AnalysisCoordinator::analyze_chapter`].
    pub async fn analyze_chapter(&self, chapter: &ChapterInput) -> IntegratedAnalysisResult {
        self.analysis.analyze_chapter(chapter).await
    }

    /// Optimize one chapter against an analysis produced earlier. Never
    /// fails; see [`OptimizationCoordinator::optimize_chapter`].
    pub async fn optimize_chapter(
        &self,
        chapter: &ChapterInput,
        analysis: &IntegratedAnalysisResult,
    ) -> IntegratedOptimizationResult {
        self.optimization.optimize_chapter(chapter, analysis).await
    }

    /// Analyze then optimize in one call.
    pub async fn process_chapter(
        &self,
        chapter: &ChapterInput,
    ) -> (IntegratedAnalysisResult, IntegratedOptimizationResult) {
        let analysis = self.analyze_chapter(chapter).await;
        let optimization = self.optimize_chapter(chapter, &analysis).await;
        (analysis, optimization)
    }

    /// Current story progression state, loading persisted state first if
    /// no chapter has touched the tracker yet.
    pub async fn progression(&self) -> StoryProgressionState {
        let mut tracker = self.progression.lock().await;
        tracker.ensure_loaded().await;
        tracker.state().clone()
    }

    /// All known arcs, oldest first.
    pub async fn arcs(&self) -> Vec<ArcRecord> {
        let mut tracker = self.progression.lock().await;
        tracker.ensure_loaded().await;
        tracker.arcs().to_vec()
    }

    /// All recorded turning points, oldest first.
    pub async fn turning_points(&self) -> Vec<TurningPointRecord> {
        let mut tracker = self.progression.lock().await;
        tracker.ensure_loaded().await;
        tracker.turning_points().to_vec()
    }

    /// Aggregate quality view.
    pub async fn quality_summary(&self) -> QualitySummary {
        let mut tracker = self.quality.lock().await;
        tracker.ensure_loaded().await;
        tracker.summary()
    }

    /// Aggregate telemetry view.
    pub async fn stats_summary(&self) -> StatsSummary {
        let mut tracker = self.stats.lock().await;
        tracker.ensure_loaded().await;
        tracker.summary()
    }

    /// The shared chapter memory.
    pub fn memory(&self) -> &Arc<NarrativeMemory> {
        &self.memory
    }

    /// Cache hits served by the analysis coordinator.
    pub fn analysis_cache_hits(&self) -> u64 {
        self.analysis.cache_hits()
    }

    /// Stop the background sampler. Idempotent; also happens on drop.
    pub fn shutdown(&mut self) {
        if let Some(sampler) = self.sampler.take() {
            sampler.stop();
            info!("pipeline sampler stopped");
        }
    }
}
