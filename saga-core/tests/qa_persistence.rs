//! QA tests for cross-instance persistence.
//!
//! A pipeline's derived state lives in the store, not the process: a new
//! pipeline over the same store must pick up where the old one stopped,
//! and a file-backed store must round-trip the same documents.

use saga_core::testing::sample_chapter;
use saga_core::{FileStore, InMemoryStore, MemoryStore, Pipeline, PipelineConfig};
use std::sync::Arc;

#[tokio::test]
async fn test_progression_survives_pipeline_restart() {
    let store: Arc<dyn MemoryStore> = Arc::new(InMemoryStore::new());

    let first = Pipeline::new(Arc::clone(&store), PipelineConfig::default());
    for number in 1..=4 {
        first.analyze_chapter(&sample_chapter(number)).await;
    }
    let before = first.progression().await;
    drop(first);

    let second = Pipeline::new(store, PipelineConfig::default());
    second.analyze_chapter(&sample_chapter(5)).await;
    let after = second.progression().await;

    assert_eq!(after.current_arc, before.current_arc);
    assert_eq!(after.last_chapter, 5);
}

#[tokio::test]
async fn test_quality_history_survives_pipeline_restart() {
    let store: Arc<dyn MemoryStore> = Arc::new(InMemoryStore::new());

    let first = Pipeline::new(Arc::clone(&store), PipelineConfig::default());
    for number in 1..=3 {
        first.analyze_chapter(&sample_chapter(number)).await;
    }
    drop(first);

    let second = Pipeline::new(store, PipelineConfig::default());
    second.analyze_chapter(&sample_chapter(4)).await;

    assert_eq!(second.quality_summary().await.chapters_scored, 4);
}

#[tokio::test]
async fn test_chapter_memory_survives_pipeline_restart() {
    let store: Arc<dyn MemoryStore> = Arc::new(InMemoryStore::new());

    let first = Pipeline::new(Arc::clone(&store), PipelineConfig::default());
    first.analyze_chapter(&sample_chapter(1)).await;
    drop(first);

    let second = Pipeline::new(store, PipelineConfig::default());
    let hits = second.memory().search("Mara", 5).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].chapter, 1);
}

#[tokio::test]
async fn test_file_store_backs_a_full_run() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let store: Arc<dyn MemoryStore> = Arc::new(FileStore::new(dir.path()));

    let pipeline = Pipeline::new(Arc::clone(&store), PipelineConfig::default());
    let (analysis, optimization) = pipeline.process_chapter(&sample_chapter(1)).await;
    assert_eq!(analysis.chapter_number, 1);
    assert_eq!(optimization.chapter_number, 1);
    drop(pipeline);

    // The documents are plain JSON files a later run can reload.
    assert!(dir
        .path()
        .join("mid-term")
        .join("narrative-progression.json")
        .exists());

    let reopened = Pipeline::new(store, PipelineConfig::default());
    assert_eq!(reopened.quality_summary().await.chapters_scored, 1);
}

#[tokio::test]
async fn test_statistics_accumulate_across_restarts() {
    let store: Arc<dyn MemoryStore> = Arc::new(InMemoryStore::new());

    let first = Pipeline::new(Arc::clone(&store), PipelineConfig::default());
    first.analyze_chapter(&sample_chapter(1)).await;
    drop(first);

    let second = Pipeline::new(store, PipelineConfig::default());
    second.analyze_chapter(&sample_chapter(2)).await;

    let summary = second.stats_summary().await;
    assert_eq!(summary.chapters_processed, 2);
    assert!(summary.total_calls > 0);
}
