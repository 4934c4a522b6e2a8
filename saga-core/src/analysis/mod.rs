//! Chapter analysis: fan-out across analyzers, tracker updates and
//! result integration.
//!
//! The coordinator owns the analyzer set and the result cache, and drives
//! the three trackers as side effects of every uncached call. Its entry
//! point never fails; whatever goes wrong inside is logged and reflected
//! in the result's [`Outcome`](crate::outcome::Outcome) grade instead.

pub mod analyzer;
pub mod builtin;
pub mod result;

pub use analyzer::{AnalyzerError, AnalyzerKind, AnalyzerReport, ChapterAnalyzer};
pub use builtin::builtin_analyzers;
pub use result::{
    AnalysisMetadata, AnalysisSection, IntegratedAnalysisResult, QualityMetricBundle,
    SectionSource,
};

use crate::cache::{chapter_cache_key, ResultCache};
use crate::chapter::ChapterInput;
use crate::exec::ExecutionMode;
use crate::memory::{MemoryHit, NarrativeMemory};
use crate::outcome::Outcome;
use crate::progression::ProgressionTracker;
use crate::quality::QualityMetricsTracker;
use crate::stats::{integration_efficiency, SystemStatisticsTracker};
use crate::text::recurring_names;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Tuning knobs for the analysis coordinator.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Whether analyzers run together or one at a time.
    pub mode: ExecutionMode,

    /// Whether results are cached and served on repeat calls.
    pub cache_enabled: bool,

    /// Cached results kept before LRU eviction.
    pub cache_capacity: usize,

    /// Most related chapters retrieved from memory per call.
    pub search_limit: usize,

    /// Cap on the merged suggestion list.
    pub max_suggestions: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Parallel,
            cache_enabled: true,
            cache_capacity: 64,
            search_limit: 5,
            max_suggestions: 10,
        }
    }
}

/// Runs the analyzer set over chapters and integrates the results.
pub struct AnalysisCoordinator {
    analyzers: Vec<Arc<dyn ChapterAnalyzer>>,
    memory: Arc<NarrativeMemory>,
    quality: Arc<Mutex<QualityMetricsTracker>>,
    progression: Arc<Mutex<ProgressionTracker>>,
    stats: Arc<Mutex<SystemStatisticsTracker>>,
    cache: ResultCache<IntegratedAnalysisResult>,
    config: AnalysisConfig,
    /// Set when chapter memory failed to initialize; analysis then runs
    /// without memory integration instead of aborting.
    memory_degraded: AtomicBool,
}

impl AnalysisCoordinator {
    /// Wire a coordinator over its collaborators.
    pub fn new(
        analyzers: Vec<Arc<dyn ChapterAnalyzer>>,
        memory: Arc<NarrativeMemory>,
        quality: Arc<Mutex<QualityMetricsTracker>>,
        progression: Arc<Mutex<ProgressionTracker>>,
        stats: Arc<Mutex<SystemStatisticsTracker>>,
        config: AnalysisConfig,
    ) -> Self {
        let cache = ResultCache::new(config.cache_capacity, config.cache_enabled);
        Self {
            analyzers,
            memory,
            quality,
            progression,
            stats,
            cache,
            config,
            memory_degraded: AtomicBool::new(false),
        }
    }

    /// Names of the configured analyzers, in registration order.
    pub fn analyzer_names(&self) -> Vec<String> {
        self.analyzers.iter().map(|a| a.name().to_string()).collect()
    }

    /// Cache hits served so far.
    pub fn cache_hits(&self) -> u64 {
        self.cache.hits()
    }

    /// Whether the coordinator is running without chapter memory.
    pub fn is_memory_degraded(&self) -> bool {
        self.memory_degraded.load(Ordering::Relaxed)
    }

    /// Analyze one chapter.
    ///
    /// Never fails: analyzer errors become fallback sections, persistence
    /// errors are logged, and if integration itself breaks the caller gets
    /// the fully-defaulted fallback result.
    pub async fn analyze_chapter(&self, chapter: &ChapterInput) -> IntegratedAnalysisResult {
        let started = Instant::now();
        let memory_ready = self.ensure_memory().await;

        let key = chapter_cache_key(chapter);
        if let Some(mut hit) = self.cache.get(&key) {
            debug!(chapter = chapter.number, "analysis served from cache");
            hit.metadata.cache_hit = true;
            return hit;
        }

        if memory_ready {
            if let Err(e) = self.memory.record_chapter(chapter).await {
                warn!(chapter = chapter.number, error = %e, "failed to record chapter memory");
            }
        }

        let related = if memory_ready {
            self.search_related(chapter).await
        } else {
            Vec::new()
        };

        let result = self
            .run_analysis(chapter, &related, started)
            .await
            .unwrap_or_else(|reason| {
                warn!(chapter = chapter.number, reason, "analysis integration failed");
                IntegratedAnalysisResult::fallback(chapter.number)
            });

        self.cache.insert(key, result.clone());
        info!(
            chapter = chapter.number,
            outcome = result.metadata.outcome.name(),
            elapsed_ms = result.metadata.elapsed_ms,
            "chapter analyzed"
        );
        result
    }

    /// Best-effort memory initialization. Degrades once and stays degraded
    /// until a later call succeeds.
    async fn ensure_memory(&self) -> bool {
        match self.memory.ensure_initialized().await {
            Ok(()) => {
                self.memory_degraded.store(false, Ordering::Relaxed);
                true
            }
            Err(e) => {
                warn!(error = %e, "chapter memory unavailable, analyzing without it");
                self.memory_degraded.store(true, Ordering::Relaxed);
                false
            }
        }
    }

    /// Retrieve chapters related to this one, best-effort.
    async fn search_related(&self, chapter: &ChapterInput) -> Vec<MemoryHit> {
        let mut terms: Vec<String> = Vec::new();
        if let Some(theme) = chapter.context.theme() {
            terms.push(theme.to_string());
        }
        if let Some(genre) = chapter.context.genre() {
            terms.push(genre.to_string());
        }
        terms.extend(recurring_names(&chapter.content).into_iter().take(3));

        if terms.is_empty() {
            return Vec::new();
        }
        let query = terms.join(" ");
        match self.memory.search(&query, self.config.search_limit).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(error = %e, "chapter memory search failed");
                Vec::new()
            }
        }
    }

    async fn run_analysis(
        &self,
        chapter: &ChapterInput,
        related: &[MemoryHit],
        started: Instant,
    ) -> Result<IntegratedAnalysisResult, &'static str> {
        let outputs = match self.config.mode {
            ExecutionMode::Parallel => self.run_parallel(chapter, related).await,
            ExecutionMode::Sequential => self.run_sequential(chapter, related).await,
        };

        // Per-analyzer telemetry, then the merge.
        {
            let mut stats = self.stats.lock().await;
            for output in &outputs {
                stats
                    .record_component_call(&output.name, output.report.is_some(), output.elapsed)
                    .await;
            }
        }

        let mut sections = BTreeMap::new();
        let mut services_used = Vec::new();
        let mut suggestions = Vec::new();
        let mut produced = 0usize;
        let mut failed = 0usize;

        for output in outputs {
            let section = match output.report {
                Some(report) => {
                    produced += 1;
                    services_used.push(output.name.clone());
                    suggestions.extend(report.suggestions.iter().cloned());
                    AnalysisSection::produced(output.kind, report)
                }
                None => {
                    failed += 1;
                    AnalysisSection::fallback(output.kind)
                }
            };
            if sections.insert(output.name, section).is_some() {
                return Err("duplicate analyzer name");
            }
        }

        let assessment = self.quality.lock().await.record_chapter(chapter).await;
        let progression = self.progression.lock().await.update_from_chapter(chapter).await;

        for (dimension, score) in assessment.record.scores.weakest(2) {
            if score < 5.0 {
                suggestions.push(format!(
                    "strengthen {}: currently the weakest dimension at {:.1}",
                    dimension.replace('_', " "),
                    score
                ));
            }
        }
        if let Some(arc) = progression.started_arc {
            suggestions.push(format!(
                "a new arc ({arc}) just opened; establish its stakes early"
            ));
        }
        suggestions.dedup();
        suggestions.truncate(self.config.max_suggestions);

        let elapsed = started.elapsed();
        let payload = serde_json::to_vec(&sections).map(|b| b.len()).unwrap_or(0);
        {
            let mut stats = self.stats.lock().await;
            stats.record_chapter(chapter, produced > 0, elapsed).await;
            stats
                .record_integration(
                    "analysis-pipeline",
                    payload,
                    integration_efficiency(produced, failed),
                )
                .await;
            if let Err(e) = stats.persist().await {
                warn!(error = %e, "failed to persist pipeline statistics");
            }
        }

        let quality = QualityMetricBundle {
            dimensions: assessment.record.scores.clone(),
            overall: assessment.record.overall,
            trend: assessment.trend,
        };

        Ok(IntegratedAnalysisResult {
            chapter_number: chapter.number,
            sections,
            quality,
            integrated_suggestions: suggestions,
            metadata: AnalysisMetadata {
                services_used,
                cache_hit: false,
                elapsed_ms: elapsed.as_millis() as u64,
                related_chapters: related.len(),
                outcome: Outcome::from_counts(produced, failed),
            },
        })
    }

    /// Start every analyzer at once and wait for all of them. A failure in
    /// one never cancels or contaminates its siblings.
    async fn run_parallel(
        &self,
        chapter: &ChapterInput,
        related: &[MemoryHit],
    ) -> Vec<AnalyzerOutput> {
        let tasks = self.analyzers.iter().map(|analyzer| async move {
            Self::run_one(analyzer.as_ref(), chapter, related).await
        });
        join_all(tasks).await
    }

    /// Run analyzers one at a time, upstream dimensions first.
    async fn run_sequential(
        &self,
        chapter: &ChapterInput,
        related: &[MemoryHit],
    ) -> Vec<AnalyzerOutput> {
        let mut ordered: Vec<&Arc<dyn ChapterAnalyzer>> = self.analyzers.iter().collect();
        ordered.sort_by_key(|a| a.kind().sequence_rank());

        let mut outputs = Vec::with_capacity(ordered.len());
        for analyzer in ordered {
            outputs.push(Self::run_one(analyzer.as_ref(), chapter, related).await);
        }
        outputs
    }

    /// The single-analyzer fault boundary: an error here becomes a `None`
    /// report and nothing more.
    async fn run_one(
        analyzer: &dyn ChapterAnalyzer,
        chapter: &ChapterInput,
        related: &[MemoryHit],
    ) -> AnalyzerOutput {
        let started = Instant::now();
        let report = match analyzer.analyze(chapter, related).await {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(
                    analyzer = analyzer.name(),
                    chapter = chapter.number,
                    error = %e,
                    "analyzer failed, substituting fallback"
                );
                None
            }
        };
        AnalyzerOutput {
            name: analyzer.name().to_string(),
            kind: analyzer.kind(),
            report,
            elapsed: started.elapsed(),
        }
    }
}

struct AnalyzerOutput {
    name: String,
    kind: AnalyzerKind,
    report: Option<AnalyzerReport>,
    elapsed: std::time::Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::ProgressionConfig;
    use crate::quality::QualityConfig;
    use crate::stats::StatsConfig;
    use crate::store::{InMemoryStore, MemoryStore};
    use crate::testing::StubAnalyzer;

    fn coordinator_with(
        analyzers: Vec<Arc<dyn ChapterAnalyzer>>,
        config: AnalysisConfig,
    ) -> AnalysisCoordinator {
        let store: Arc<dyn MemoryStore> = Arc::new(InMemoryStore::new());
        AnalysisCoordinator::new(
            analyzers,
            Arc::new(NarrativeMemory::new(Arc::clone(&store))),
            Arc::new(Mutex::new(QualityMetricsTracker::new(
                Arc::clone(&store),
                QualityConfig::default(),
            ))),
            Arc::new(Mutex::new(ProgressionTracker::new(
                Arc::clone(&store),
                ProgressionConfig::default(),
            ))),
            Arc::new(Mutex::new(SystemStatisticsTracker::new(
                store,
                StatsConfig::default(),
            ))),
            config,
        )
    }

    fn sample_chapter() -> ChapterInput {
        ChapterInput::new(
            3,
            "Mara crossed the square at dusk. \"You came back,\" said Edra. \
             The conflict deepened between them, but neither drew a blade.",
        )
    }

    #[tokio::test]
    async fn test_failed_analyzers_become_fallback_sections() {
        let ok_theme = Arc::new(StubAnalyzer::succeeding("theme", AnalyzerKind::Theme, 7.0));
        let ok_style = Arc::new(StubAnalyzer::succeeding("style", AnalyzerKind::Style, 6.0));
        let bad = Arc::new(StubAnalyzer::failing("character", AnalyzerKind::Character));

        let coordinator = coordinator_with(
            vec![ok_theme.clone(), bad.clone(), ok_style.clone()],
            AnalysisConfig::default(),
        );
        let result = coordinator.analyze_chapter(&sample_chapter()).await;

        assert_eq!(result.metadata.outcome, Outcome::Degraded);
        assert_eq!(result.metadata.services_used, vec!["theme", "style"]);
        assert!(result.section("character").is_some_and(|s| s.is_fallback()));
        assert!(!result.section("theme").unwrap().is_fallback());
        assert_eq!(bad.calls(), 1);
    }

    #[tokio::test]
    async fn test_all_analyzers_failing_yields_fallback_outcome() {
        let coordinator = coordinator_with(
            vec![
                Arc::new(StubAnalyzer::failing("theme", AnalyzerKind::Theme)),
                Arc::new(StubAnalyzer::failing("style", AnalyzerKind::Style)),
            ],
            AnalysisConfig::default(),
        );
        let result = coordinator.analyze_chapter(&sample_chapter()).await;

        assert_eq!(result.metadata.outcome, Outcome::Fallback);
        assert!(result.metadata.services_used.is_empty());
        assert_eq!(result.fallback_count(), 2);
    }

    #[tokio::test]
    async fn test_cache_short_circuits_second_call() {
        let stub = Arc::new(StubAnalyzer::succeeding("theme", AnalyzerKind::Theme, 8.0));
        let coordinator =
            coordinator_with(vec![stub.clone()], AnalysisConfig::default());

        let chapter = sample_chapter();
        let first = coordinator.analyze_chapter(&chapter).await;
        let second = coordinator.analyze_chapter(&chapter).await;

        assert_eq!(stub.calls(), 1, "second call must not re-run analyzers");
        assert!(!first.metadata.cache_hit);
        assert!(second.metadata.cache_hit);
        assert_eq!(coordinator.cache_hits(), 1);
        assert_eq!(first.quality.overall, second.quality.overall);
    }

    #[tokio::test]
    async fn test_disabled_cache_reruns_analyzers() {
        let stub = Arc::new(StubAnalyzer::succeeding("theme", AnalyzerKind::Theme, 8.0));
        let config = AnalysisConfig {
            cache_enabled: false,
            ..AnalysisConfig::default()
        };
        let coordinator = coordinator_with(vec![stub.clone()], config);

        let chapter = sample_chapter();
        coordinator.analyze_chapter(&chapter).await;
        coordinator.analyze_chapter(&chapter).await;
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn test_sequential_mode_matches_parallel_sections() {
        let analyzers: Vec<Arc<dyn ChapterAnalyzer>> = vec![
            Arc::new(StubAnalyzer::succeeding("style", AnalyzerKind::Style, 6.0)),
            Arc::new(StubAnalyzer::succeeding("theme", AnalyzerKind::Theme, 7.0)),
        ];
        let sequential = coordinator_with(
            analyzers,
            AnalysisConfig {
                mode: ExecutionMode::Sequential,
                ..AnalysisConfig::default()
            },
        );
        let result = sequential.analyze_chapter(&sample_chapter()).await;

        assert_eq!(result.produced_count(), 2);
        assert_eq!(result.metadata.outcome, Outcome::Full);
        // Sequential runs reorder by dependency rank: theme before style.
        assert_eq!(result.metadata.services_used, vec!["theme", "style"]);
    }

    #[tokio::test]
    async fn test_trackers_updated_as_side_effects() {
        let coordinator = coordinator_with(builtin_analyzers(), AnalysisConfig::default());
        let result = coordinator.analyze_chapter(&sample_chapter()).await;

        assert!((1.0..=10.0).contains(&result.quality.overall));
        let progression = coordinator.progression.lock().await;
        assert_eq!(progression.state().last_chapter, 3);
    }

    #[tokio::test]
    async fn test_integration_seam_recorded_per_chapter() {
        let coordinator = coordinator_with(
            vec![
                Arc::new(StubAnalyzer::succeeding("theme", AnalyzerKind::Theme, 7.0)),
                Arc::new(StubAnalyzer::failing("style", AnalyzerKind::Style)),
            ],
            AnalysisConfig::default(),
        );
        coordinator.analyze_chapter(&sample_chapter()).await;

        let stats = coordinator.stats.lock().await;
        let seam = stats
            .integrations()
            .get("analysis-pipeline")
            .expect("analysis seam must be recorded");
        assert_eq!(seam.operations, 1);
        assert!(seam.data_volume_bytes > 0);
        assert!((seam.efficiency - 0.5).abs() < 1e-9);
    }
}
