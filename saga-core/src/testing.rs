//! Testing utilities: scripted collaborators and a preassembled
//! pipeline harness.
//!
//! Stubs count their calls with atomics so tests can assert on caching
//! and fan-out behavior without touching coordinator internals.

use crate::analysis::{AnalyzerError, AnalyzerKind, AnalyzerReport, ChapterAnalyzer};
use crate::analysis::IntegratedAnalysisResult;
use crate::chapter::ChapterInput;
use crate::memory::MemoryHit;
use crate::optimize::{
    ChapterOptimizer, DraftSuggestion, OptimizationBundle, OptimizerError, OptimizerKind,
};
use crate::pipeline::{Pipeline, PipelineConfig};
use crate::store::InMemoryStore;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A scripted analyzer that either returns a fixed report or fails, and
/// counts how often it was invoked.
pub struct StubAnalyzer {
    name: String,
    kind: AnalyzerKind,
    report: Option<AnalyzerReport>,
    calls: AtomicUsize,
}

impl StubAnalyzer {
    /// A stub that always succeeds with the given score.
    pub fn succeeding(name: impl Into<String>, kind: AnalyzerKind, score: f64) -> Self {
        let name = name.into();
        Self {
            report: Some(AnalyzerReport::new(format!("{name} stub report"), score)),
            name,
            kind,
            calls: AtomicUsize::new(0),
        }
    }

    /// A stub that succeeds with an exact report.
    pub fn with_report(name: impl Into<String>, kind: AnalyzerKind, report: AnalyzerReport) -> Self {
        Self {
            name: name.into(),
            kind,
            report: Some(report),
            calls: AtomicUsize::new(0),
        }
    }

    /// A stub that always fails.
    pub fn failing(name: impl Into<String>, kind: AnalyzerKind) -> Self {
        Self {
            name: name.into(),
            kind,
            report: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// How many times `analyze` was called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChapterAnalyzer for StubAnalyzer {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> AnalyzerKind {
        self.kind
    }

    async fn analyze(
        &self,
        _chapter: &ChapterInput,
        _related: &[MemoryHit],
    ) -> Result<AnalyzerReport, AnalyzerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.report {
            Some(report) => Ok(report.clone()),
            None => Err(AnalyzerError::Failed(format!("{} scripted failure", self.name))),
        }
    }
}

/// A scripted optimizer, the optimizer-side twin of [`StubAnalyzer`].
pub struct StubOptimizer {
    name: String,
    kind: OptimizerKind,
    bundle: Option<OptimizationBundle>,
    calls: AtomicUsize,
}

impl StubOptimizer {
    /// A stub that succeeds with the given suggestions.
    pub fn succeeding(
        name: impl Into<String>,
        kind: OptimizerKind,
        suggestions: Vec<DraftSuggestion>,
    ) -> Self {
        let name = name.into();
        let mut bundle = OptimizationBundle::new(format!("{name} stub bundle"), 0.3);
        bundle.suggestions = suggestions;
        Self {
            name,
            kind,
            bundle: Some(bundle),
            calls: AtomicUsize::new(0),
        }
    }

    /// A stub that always fails.
    pub fn failing(name: impl Into<String>, kind: OptimizerKind) -> Self {
        Self {
            name: name.into(),
            kind,
            bundle: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// How many times `optimize` was called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChapterOptimizer for StubOptimizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> OptimizerKind {
        self.kind
    }

    async fn optimize(
        &self,
        _chapter: &ChapterInput,
        _analysis: &IntegratedAnalysisResult,
    ) -> Result<OptimizationBundle, OptimizerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.bundle {
            Some(bundle) => Ok(bundle.clone()),
            None => Err(OptimizerError::Failed(format!("{} scripted failure", self.name))),
        }
    }
}

/// A pipeline over a fresh in-memory store with the sampler off, for
/// integration tests that walk chapters through the whole system.
pub struct TestPipeline {
    /// The assembled pipeline.
    pub pipeline: Pipeline,
}

impl TestPipeline {
    /// Built-in collaborators, default configuration.
    pub fn new() -> Self {
        Self::with_config(PipelineConfig::default())
    }

    /// Built-in collaborators, custom configuration. The sampler stays
    /// off regardless so tests never race a background task.
    pub fn with_config(config: PipelineConfig) -> Self {
        let config = config.with_sampler(false);
        Self {
            pipeline: Pipeline::new(Arc::new(InMemoryStore::new()), config),
        }
    }

    /// Custom collaborator sets over a fresh store.
    pub fn with_collaborators(
        config: PipelineConfig,
        analyzers: Vec<Arc<dyn ChapterAnalyzer>>,
        optimizers: Vec<Arc<dyn ChapterOptimizer>>,
    ) -> Self {
        let config = config.with_sampler(false);
        Self {
            pipeline: Pipeline::with_collaborators(
                Arc::new(InMemoryStore::new()),
                config,
                analyzers,
                optimizers,
            ),
        }
    }
}

impl Default for TestPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// A short chapter with believable prose, for tests that only need
/// plausible input.
pub fn sample_chapter(number: u32) -> ChapterInput {
    ChapterInput::new(
        number,
        format!(
            "Chapter {number} found Mara on the north road again. \"We keep moving,\" \
             said Mara, though the conflict deepened with every mile. Somewhere behind \
             them the city burned, and no one asked who had lit the fire."
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stub_analyzer_counts_calls() {
        let stub = StubAnalyzer::succeeding("theme", AnalyzerKind::Theme, 7.0);
        let chapter = sample_chapter(1);

        assert_eq!(stub.calls(), 0);
        stub.analyze(&chapter, &[]).await.unwrap();
        stub.analyze(&chapter, &[]).await.unwrap();
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn test_failing_stub_fails_every_time() {
        let stub = StubOptimizer::failing("tension", OptimizerKind::Tension);
        let chapter = sample_chapter(1);
        let analysis = IntegratedAnalysisResult::fallback(1);

        assert!(stub.optimize(&chapter, &analysis).await.is_err());
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn test_harness_runs_end_to_end() {
        let harness = TestPipeline::new();
        let (analysis, optimization) = harness.pipeline.process_chapter(&sample_chapter(1)).await;
        assert_eq!(analysis.chapter_number, 1);
        assert_eq!(optimization.chapter_number, 1);
    }
}
