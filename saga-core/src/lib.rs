//! Serialized-narrative analysis and optimization engine.
//!
//! This crate provides:
//! - Multi-dimension quality scoring with trend detection and alerting
//! - A narrative progression state machine (arcs, phases, turning points)
//! - Fault-isolated fan-out across analyzer and optimizer collaborators
//! - Prioritized, conflict-resolved revision recommendations
//! - Operational telemetry with a background performance sampler
//!
//! # Quick Start
//!
//! ```ignore
//! use saga_core::{ChapterInput, Pipeline, PipelineConfig};
//! use saga_core::store::InMemoryStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut pipeline = Pipeline::new(
//!         Arc::new(InMemoryStore::new()),
//!         PipelineConfig::default(),
//!     );
//!
//!     let chapter = ChapterInput::new(1, "Our story begins at the harbor...");
//!     let (analysis, optimization) = pipeline.process_chapter(&chapter).await;
//!     println!("overall quality: {:.1}", analysis.quality.overall);
//!     for suggestion in &optimization.recommendations.prioritized {
//!         println!("[{}] {}", suggestion.priority.name(), suggestion.text);
//!     }
//!
//!     pipeline.shutdown();
//! }
//! ```

pub mod alert;
pub mod analysis;
pub mod cache;
pub mod chapter;
pub mod exec;
pub mod memory;
pub mod optimize;
pub mod outcome;
pub mod pipeline;
pub mod progression;
pub mod quality;
pub mod stats;
pub mod store;
pub mod testing;
pub mod text;

// Primary public API
pub use analysis::{AnalysisConfig, AnalysisCoordinator, ChapterAnalyzer, IntegratedAnalysisResult};
pub use chapter::{ChapterContext, ChapterInput};
pub use exec::ExecutionMode;
pub use memory::NarrativeMemory;
pub use optimize::{
    ChapterOptimizer, IntegratedOptimizationResult, OptimizationConfig, OptimizationCoordinator,
    PriorityStrategy,
};
pub use outcome::Outcome;
pub use pipeline::{Pipeline, PipelineConfig};
pub use progression::{NarrativePhase, ProgressionTracker, StoryProgressionState};
pub use quality::QualityMetricsTracker;
pub use stats::SystemStatisticsTracker;
pub use store::{FileStore, InMemoryStore, MemoryStore};
