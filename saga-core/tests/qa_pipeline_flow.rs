//! QA tests for the full analysis/optimization flow.
//!
//! These walk chapters through an assembled pipeline and verify the
//! externally observable guarantees:
//! - entry points never fail, whatever the collaborators do
//! - fault isolation across the analyzer fan-out
//! - cache discipline on repeated calls
//! - phase and arc progression driven by chapter content
//! - conflict detection across recommendation categories

use saga_core::analysis::AnalyzerKind;
use saga_core::optimize::{DraftSuggestion, OptimizerKind, Priority};
use saga_core::progression::{theme_for_arc, ArcStatus, NarrativePhase};
use saga_core::store::STATISTICS_KEY;
use saga_core::testing::{sample_chapter, StubAnalyzer, StubOptimizer, TestPipeline};
use saga_core::{
    ChapterAnalyzer, ChapterInput, ChapterOptimizer, InMemoryStore, MemoryStore, Outcome,
    Pipeline, PipelineConfig,
};
use std::sync::Arc;

#[tokio::test]
async fn test_overall_quality_stays_in_range_across_chapters() {
    let harness = TestPipeline::new();
    for number in 1..=6 {
        let (analysis, _) = harness.pipeline.process_chapter(&sample_chapter(number)).await;
        assert!(
            (1.0..=10.0).contains(&analysis.quality.overall),
            "chapter {number} scored {} outside [1, 10]",
            analysis.quality.overall
        );
    }
}

#[tokio::test]
async fn test_two_failing_analyzers_out_of_six_degrade_gracefully() {
    let analyzers: Vec<Arc<dyn ChapterAnalyzer>> = vec![
        Arc::new(StubAnalyzer::succeeding("theme", AnalyzerKind::Theme, 7.0)),
        Arc::new(StubAnalyzer::succeeding("character", AnalyzerKind::Character, 6.0)),
        Arc::new(StubAnalyzer::failing("narrative_structure", AnalyzerKind::NarrativeStructure)),
        Arc::new(StubAnalyzer::succeeding("style", AnalyzerKind::Style, 8.0)),
        Arc::new(StubAnalyzer::failing("reader_experience", AnalyzerKind::ReaderExperience)),
        Arc::new(StubAnalyzer::succeeding("pacing", AnalyzerKind::Style, 5.5)),
    ];
    let harness =
        TestPipeline::with_collaborators(PipelineConfig::default(), analyzers, Vec::new());

    let result = harness.pipeline.analyze_chapter(&sample_chapter(1)).await;

    assert_eq!(result.metadata.outcome, Outcome::Degraded);
    assert_eq!(
        result.metadata.services_used,
        vec!["theme", "character", "style", "pacing"],
        "exactly the four succeeding analyzers must be listed"
    );
    for failed in ["narrative_structure", "reader_experience"] {
        let section = result.section(failed).unwrap();
        assert!(section.is_fallback(), "{failed} must hold its fallback value");
        assert_eq!(section.report.score, 5.0);
    }
}

#[tokio::test]
async fn test_repeated_analysis_is_served_from_cache() {
    let stub = Arc::new(StubAnalyzer::succeeding("theme", AnalyzerKind::Theme, 7.5));
    let harness = TestPipeline::with_collaborators(
        PipelineConfig::default(),
        vec![stub.clone()],
        Vec::new(),
    );

    let chapter = sample_chapter(4);
    let first = harness.pipeline.analyze_chapter(&chapter).await;
    let second = harness.pipeline.analyze_chapter(&chapter).await;

    assert_eq!(stub.calls(), 1, "the cached call must not re-run analyzers");
    assert!(second.metadata.cache_hit);
    assert_eq!(harness.pipeline.analysis_cache_hits(), 1);
    assert_eq!(first.quality.overall, second.quality.overall);

    // A different chapter misses the cache and runs the analyzer again.
    harness.pipeline.analyze_chapter(&sample_chapter(5)).await;
    assert_eq!(stub.calls(), 2);
}

#[tokio::test]
async fn test_numeric_phase_thresholds_without_overrides() {
    let harness = TestPipeline::new();

    harness
        .pipeline
        .analyze_chapter(&ChapterInput::new(1, "Morning frost lay over the quiet town."))
        .await;
    assert_eq!(
        harness.pipeline.progression().await.current_phase,
        NarrativePhase::Introduction
    );

    let harness = TestPipeline::new();
    harness
        .pipeline
        .analyze_chapter(&ChapterInput::new(18, "Swords rang across the keep all night."))
        .await;
    assert_eq!(
        harness.pipeline.progression().await.current_phase,
        NarrativePhase::Climax
    );
}

#[tokio::test]
async fn test_arc_end_marker_completes_arc_and_starts_the_next() {
    let harness = TestPipeline::new();
    for number in 1..=3 {
        harness.pipeline.analyze_chapter(&sample_chapter(number)).await;
    }
    harness
        .pipeline
        .analyze_chapter(&ChapterInput::new(
            4,
            "The banners came down over the valley. End of arc.",
        ))
        .await;

    let state = harness.pipeline.progression().await;
    assert_eq!(state.current_arc, 2);
    assert_eq!(state.arc_start_chapter, 5);
    assert_eq!(state.current_theme, theme_for_arc(2));
    assert!(!state.arc_completed, "the new arc is open, not completed");
}

#[tokio::test]
async fn test_arc_number_never_decreases_over_a_long_run() {
    let harness = TestPipeline::new();
    let mut last_arc = 0;
    for number in 1..=30 {
        harness.pipeline.analyze_chapter(&sample_chapter(number)).await;
        let arc = harness.pipeline.progression().await.current_arc;
        assert!(arc >= last_arc, "arc went backwards at chapter {number}");
        last_arc = arc;
    }
    assert!(last_arc >= 2, "thirty chapters should close at least one arc");
}

#[tokio::test]
async fn test_contradictory_recommendations_resolve_once() {
    let optimizers: Vec<Arc<dyn ChapterOptimizer>> = vec![
        Arc::new(StubOptimizer::succeeding(
            "style",
            OptimizerKind::Style,
            vec![DraftSuggestion::new(
                "slow the pacing through the farewell scene",
                Priority::Medium,
                0.5,
                0.3,
            )],
        )),
        Arc::new(StubOptimizer::succeeding(
            "tension",
            OptimizerKind::Tension,
            vec![DraftSuggestion::new(
                "quicken the pace as the pursuit closes in",
                Priority::High,
                0.7,
                0.4,
            )],
        )),
    ];
    let harness =
        TestPipeline::with_collaborators(PipelineConfig::default(), Vec::new(), optimizers);

    let chapter = sample_chapter(2);
    let analysis = harness.pipeline.analyze_chapter(&chapter).await;
    let result = harness.pipeline.optimize_chapter(&chapter, &analysis).await;

    assert_eq!(result.recommendations.conflicts.len(), 1);
    let conflict = &result.recommendations.conflicts[0];
    assert_eq!(conflict.conflict_type, "contradiction");

    let slow = result
        .recommendations
        .prioritized
        .iter()
        .find(|s| s.text.contains("slow the pacing"))
        .expect("slow-pace suggestion present");
    let fast = result
        .recommendations
        .prioritized
        .iter()
        .find(|s| s.text.contains("quicken the pace"))
        .expect("speed-up suggestion present");
    let pair = [conflict.first, conflict.second];
    assert!(pair.contains(&slow.id) && pair.contains(&fast.id));
}

#[tokio::test]
async fn test_all_collaborators_failing_still_returns_results() {
    let analyzers: Vec<Arc<dyn ChapterAnalyzer>> = vec![
        Arc::new(StubAnalyzer::failing("theme", AnalyzerKind::Theme)),
        Arc::new(StubAnalyzer::failing("style", AnalyzerKind::Style)),
    ];
    let optimizers: Vec<Arc<dyn ChapterOptimizer>> = vec![
        Arc::new(StubOptimizer::failing("theme", OptimizerKind::Theme)),
        Arc::new(StubOptimizer::failing("tension", OptimizerKind::Tension)),
    ];
    let harness = TestPipeline::with_collaborators(PipelineConfig::default(), analyzers, optimizers);

    let chapter = sample_chapter(1);
    let (analysis, optimization) = harness.pipeline.process_chapter(&chapter).await;

    assert_eq!(analysis.metadata.outcome, Outcome::Fallback);
    assert_eq!(optimization.metadata.outcome, Outcome::Fallback);
    assert!(analysis.metadata.services_used.is_empty());
    assert!(optimization.recommendations.prioritized.is_empty());
}

#[tokio::test]
async fn test_completed_arc_is_frozen_with_end_chapter() {
    let harness = TestPipeline::new();
    for number in 1..=5 {
        harness.pipeline.analyze_chapter(&sample_chapter(number)).await;
    }
    harness
        .pipeline
        .analyze_chapter(&ChapterInput::new(6, "The feud was settled. End of arc."))
        .await;

    let state = harness.pipeline.progression().await;
    assert_eq!(state.current_arc, 2);
    assert_eq!(state.arc_start_chapter, 7);
    assert_eq!(state.total_arcs, 2);

    let arcs = harness.pipeline.arcs().await;
    let first = arcs.iter().find(|a| a.number == 1).expect("arc 1 recorded");
    assert_eq!(first.status, ArcStatus::Completed);
    assert_eq!(first.end_chapter, Some(6));
}

#[tokio::test]
async fn test_processed_chapter_persists_integration_statistics() {
    let store: Arc<dyn MemoryStore> = Arc::new(InMemoryStore::new());
    let pipeline = Pipeline::new(Arc::clone(&store), PipelineConfig::default());
    pipeline.process_chapter(&sample_chapter(1)).await;

    let raw = store
        .read(STATISTICS_KEY)
        .await
        .expect("statistics document persisted");
    let doc: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    let integrations = doc["integrations"]
        .as_object()
        .expect("integrations object present");
    assert!(!integrations.is_empty());
    for seam in ["analysis-pipeline", "optimization-pipeline"] {
        let stat = &integrations[seam];
        assert_eq!(stat["operations"].as_u64(), Some(1), "{seam} operations");
        assert!(
            stat["data_volume_bytes"].as_u64().unwrap_or(0) > 0,
            "{seam} must carry a data volume estimate"
        );
    }
}
