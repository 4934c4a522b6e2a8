//! Narrative progression tracking.
//!
//! One tracker owns the story's phase, its arc ledger and its turning
//! point history. Chapter updates never fail: content signals are
//! extracted, milestones and turning points recorded, arc completion
//! rules applied, and the whole document persisted best-effort.

pub mod arc;
pub mod phase;
pub mod signals;
pub mod turning_point;

pub use arc::{
    theme_for_arc, ArcRecord, ArcStatus, CharacterArc, Milestone, MilestoneKind, ARC_THEMES,
};
pub use phase::{NarrativePhase, PhaseThresholds};
pub use signals::{KeywordSignals, ProgressionSignals};
pub use turning_point::{ImpactLevel, TurningPointKind, TurningPointRecord};

use crate::chapter::ChapterInput;
use crate::store::{load_json, save_json, MemoryStore, StoreResult, PROGRESSION_KEY};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Tuning knobs for progression tracking.
#[derive(Debug, Clone)]
pub struct ProgressionConfig {
    /// Chapter-number cutoffs for the numeric phase.
    pub thresholds: PhaseThresholds,

    /// Days of history kept when loading persisted state.
    pub retention_days: u32,

    /// Chapters within which a repeated milestone kind is dropped.
    pub milestone_window: u32,

    /// Milestones needed for the early arc-completion rule.
    pub completion_min_milestones: usize,

    /// Minimum span for the early arc-completion rule.
    pub completion_min_span: u32,

    /// Span at which an arc completes regardless of milestones.
    pub completion_max_span: u32,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            thresholds: PhaseThresholds::default(),
            retention_days: 90,
            milestone_window: 2,
            completion_min_milestones: 3,
            completion_min_span: 5,
            completion_max_span: 10,
        }
    }
}

impl ProgressionConfig {
    /// Set the retention window, builder style.
    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention_days = days;
        self
    }

    /// Set the phase cutoffs, builder style.
    pub fn with_thresholds(mut self, thresholds: PhaseThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }
}

/// Where the story currently stands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryProgressionState {
    /// Arc currently receiving chapters. Strictly non-decreasing.
    pub current_arc: u32,

    /// Theme of the current arc.
    pub current_theme: String,

    /// First chapter of the current arc.
    pub arc_start_chapter: u32,

    /// End chapter, set only in the instant an arc closes.
    pub arc_end_chapter: Option<u32>,

    /// Whether the current arc has completed.
    pub arc_completed: bool,

    /// Total arcs opened so far.
    pub total_arcs: u32,

    /// Phase of the most recently seen chapter.
    pub current_phase: NarrativePhase,

    /// Highest chapter number seen.
    #[serde(default)]
    pub last_chapter: u32,
}

impl Default for StoryProgressionState {
    fn default() -> Self {
        Self {
            current_arc: 1,
            current_theme: theme_for_arc(1).to_string(),
            arc_start_chapter: 1,
            arc_end_chapter: None,
            arc_completed: false,
            total_arcs: 1,
            current_phase: NarrativePhase::Introduction,
            last_chapter: 0,
        }
    }
}

/// What a single chapter update changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterProgression {
    /// Chapter that was processed.
    pub chapter: u32,

    /// Phase assigned to the chapter.
    pub phase: NarrativePhase,

    /// Milestones newly recorded by this update.
    pub new_milestones: Vec<Milestone>,

    /// Turning points newly recorded by this update.
    pub turning_points: Vec<TurningPointRecord>,

    /// Arc number closed by this update, if any.
    pub completed_arc: Option<u32>,

    /// Arc number opened by this update, if any.
    pub started_arc: Option<u32>,
}

/// Persisted form of the tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProgressionDocument {
    recorded_at: DateTime<Utc>,
    #[serde(default)]
    state: StoryProgressionState,
    #[serde(default)]
    arcs: Vec<ArcRecord>,
    #[serde(default)]
    turning_points: Vec<TurningPointRecord>,
}

/// Tracks phases, arcs, milestones and turning points across chapters.
pub struct ProgressionTracker {
    store: Arc<dyn MemoryStore>,
    signals: Box<dyn ProgressionSignals>,
    config: ProgressionConfig,
    state: StoryProgressionState,
    arcs: Vec<ArcRecord>,
    turning_points: Vec<TurningPointRecord>,
    loaded: bool,
}

impl ProgressionTracker {
    /// Create a tracker with the built-in keyword signal detector.
    pub fn new(store: Arc<dyn MemoryStore>, config: ProgressionConfig) -> Self {
        Self::with_signals(store, config, Box::new(KeywordSignals::new()))
    }

    /// Create a tracker with a custom signal detector.
    pub fn with_signals(
        store: Arc<dyn MemoryStore>,
        config: ProgressionConfig,
        signals: Box<dyn ProgressionSignals>,
    ) -> Self {
        Self {
            store,
            signals,
            config,
            state: StoryProgressionState::default(),
            arcs: Vec::new(),
            turning_points: Vec::new(),
            loaded: false,
        }
    }

    /// Load persisted state and prune anything past the retention window.
    /// A missing document leaves the defaults in place.
    pub async fn load(&mut self) -> StoreResult<()> {
        let doc: Option<ProgressionDocument> =
            load_json(self.store.as_ref(), PROGRESSION_KEY).await?;
        if let Some(doc) = doc {
            self.state = doc.state;
            self.arcs = doc.arcs;
            self.turning_points = doc.turning_points;
            self.prune(Utc::now());
            debug!(
                arc = self.state.current_arc,
                turning_points = self.turning_points.len(),
                "progression state loaded"
            );
        }
        self.loaded = true;
        Ok(())
    }

    /// Current story state.
    pub fn state(&self) -> &StoryProgressionState {
        &self.state
    }

    /// All known arcs, oldest first.
    pub fn arcs(&self) -> &[ArcRecord] {
        &self.arcs
    }

    /// A specific arc by number.
    pub fn arc(&self, number: u32) -> Option<&ArcRecord> {
        self.arcs.iter().find(|a| a.number == number)
    }

    /// All recorded turning points, oldest first.
    pub fn turning_points(&self) -> &[TurningPointRecord] {
        &self.turning_points
    }

    /// Fold a chapter into the progression state.
    ///
    /// Never fails: load and persist problems are logged and the update
    /// proceeds on in-memory state.
    pub async fn update_from_chapter(&mut self, chapter: &ChapterInput) -> ChapterProgression {
        self.ensure_loaded().await;

        let content = &chapter.content;
        let phase = self
            .signals
            .phase_override(content)
            .unwrap_or_else(|| self.config.thresholds.phase_for(chapter.number));
        self.state.current_phase = phase;
        self.state.last_chapter = self.state.last_chapter.max(chapter.number);

        let arc_idx = self.open_arc_index();

        // Milestones, deduplicated against the recent window.
        let mut new_milestones = Vec::new();
        for kind in self.signals.milestones(content) {
            let arc = &mut self.arcs[arc_idx];
            if !arc.has_recent_milestone(kind, chapter.number, self.config.milestone_window) {
                let milestone = Milestone::achieved(kind, chapter.number);
                arc.milestones.push(milestone.clone());
                new_milestones.push(milestone);
            }
        }

        for name in self.signals.character_names(content) {
            self.arcs[arc_idx].touch_character(&name, chapter.number);
        }
        self.arcs[arc_idx].updated_at = Utc::now();

        // Turning points, at most one per kind per chapter.
        let mut new_turning_points = Vec::new();
        for kind in self.signals.turning_points(content) {
            let already = self
                .turning_points
                .iter()
                .any(|t| t.chapter == chapter.number && t.kind == kind);
            if !already {
                let record = TurningPointRecord::detect(kind, chapter.number);
                self.turning_points.push(record.clone());
                new_turning_points.push(record);
            }
        }

        let (completed_arc, started_arc) = self.apply_completion_rules(chapter, content, arc_idx);

        if let Err(e) = self.persist().await {
            warn!(error = %e, "failed to persist narrative progression");
        }

        ChapterProgression {
            chapter: chapter.number,
            phase,
            new_milestones,
            turning_points: new_turning_points,
            completed_arc,
            started_arc,
        }
    }

    /// Write the current document to the store.
    pub async fn persist(&self) -> StoreResult<()> {
        let doc = ProgressionDocument {
            recorded_at: Utc::now(),
            state: self.state.clone(),
            arcs: self.arcs.clone(),
            turning_points: self.turning_points.clone(),
        };
        save_json(self.store.as_ref(), PROGRESSION_KEY, &doc).await
    }

    pub(crate) async fn ensure_loaded(&mut self) {
        if self.loaded {
            return;
        }
        if let Err(e) = self.load().await {
            warn!(error = %e, "progression state unavailable, starting from defaults");
            self.loaded = true;
        }
    }

    /// Index of the current arc's record, creating it on first touch.
    fn open_arc_index(&mut self) -> usize {
        if let Some(idx) = self
            .arcs
            .iter()
            .position(|a| a.number == self.state.current_arc)
        {
            return idx;
        }
        self.arcs.push(ArcRecord::begin(
            self.state.current_arc,
            self.state.current_theme.clone(),
            self.state.arc_start_chapter,
        ));
        self.arcs.len() - 1
    }

    fn apply_completion_rules(
        &mut self,
        chapter: &ChapterInput,
        content: &str,
        arc_idx: usize,
    ) -> (Option<u32>, Option<u32>) {
        let arc = &self.arcs[arc_idx];
        if !arc.status.is_open() {
            return (None, None);
        }

        let span = arc.span(chapter.number);
        let by_marker = self.signals.arc_end(content);
        let by_milestones = arc.achieved_count() >= self.config.completion_min_milestones
            && span >= self.config.completion_min_span;
        let by_ceiling = span >= self.config.completion_max_span;

        if !(by_marker || by_milestones || by_ceiling) {
            return (None, None);
        }

        let completed = self.state.current_arc;
        self.arcs[arc_idx].complete(chapter.number);
        self.state.arc_end_chapter = Some(chapter.number);
        self.state.arc_completed = true;
        debug!(arc = completed, chapter = chapter.number, "arc completed");

        // The next arc opens immediately; arc numbers only move forward.
        let next = completed + 1;
        let theme = theme_for_arc(next);
        self.arcs
            .push(ArcRecord::begin(next, theme, chapter.number + 1));
        self.state.current_arc = next;
        self.state.current_theme = theme.to_string();
        self.state.arc_start_chapter = chapter.number + 1;
        self.state.arc_end_chapter = None;
        self.state.arc_completed = false;
        self.state.total_arcs += 1;

        (Some(completed), Some(next))
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - Duration::days(i64::from(self.config.retention_days));
        self.turning_points.retain(|t| t.recorded_at >= cutoff);
        // Open arcs are never pruned, whatever their age.
        self.arcs
            .retain(|a| a.status.is_open() || a.updated_at >= cutoff);
    }
}
