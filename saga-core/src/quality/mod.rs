//! Chapter quality tracking: per-chapter scores, trend detection and
//! threshold alerts.

pub mod scoring;

pub use scoring::{
    DimensionScores, HeuristicScoring, QualityScoring, DIMENSION_WEIGHTS, SCORE_CEILING,
    SCORE_FLOOR,
};

use crate::alert::{AlertKind, AlertRecord, AlertSeverity};
use crate::chapter::ChapterInput;
use crate::store::{load_json, save_json, MemoryStore, StoreResult, QUALITY_KEY};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Scores considered by trend detection.
const TREND_WINDOW: usize = 5;

/// Minimum trend delta before movement counts as a trend.
const TREND_DELTA: f64 = 0.5;

/// Consecutive strictly-decreasing scores that trigger a decline alert.
const DECLINE_RUN: usize = 3;

/// Tuning knobs for quality tracking.
#[derive(Debug, Clone)]
pub struct QualityConfig {
    /// Days of history kept when loading persisted state.
    pub retention_days: u32,

    /// Overall score below which a critical alert fires.
    pub critical_threshold: f64,

    /// Overall score below which a poor-quality alert fires.
    pub poor_threshold: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            retention_days: 90,
            critical_threshold: 3.0,
            poor_threshold: 5.0,
        }
    }
}

impl QualityConfig {
    /// Set the retention window, builder style.
    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention_days = days;
        self
    }

    /// Set both alert thresholds, builder style.
    pub fn with_thresholds(mut self, critical: f64, poor: f64) -> Self {
        self.critical_threshold = critical;
        self.poor_threshold = poor;
        self
    }
}

/// Direction quality is moving in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Stable,
    Declining,
}

impl Trend {
    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Stable => "stable",
            Trend::Declining => "declining",
        }
    }
}

/// Scores recorded for one chapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterQualityRecord {
    /// Chapter number.
    pub chapter: u32,

    /// Per-dimension scores.
    pub scores: DimensionScores,

    /// Weighted overall score.
    pub overall: f64,

    /// When the chapter was scored.
    pub recorded_at: DateTime<Utc>,
}

/// What one scoring pass produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityAssessment {
    /// The record that was stored.
    pub record: ChapterQualityRecord,

    /// Trend after including this chapter.
    pub trend: Trend,

    /// Alerts raised by this chapter.
    pub new_alerts: Vec<AlertRecord>,
}

/// Aggregate view for status reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualitySummary {
    /// Chapters scored so far.
    pub chapters_scored: usize,

    /// Mean overall score across all records.
    pub average_overall: f64,

    /// Most recent overall score.
    pub latest_overall: Option<f64>,

    /// Current trend.
    pub trend: Trend,

    /// Alerts not yet resolved.
    pub open_alerts: usize,
}

/// Persisted form of the tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct QualityDocument {
    recorded_at: DateTime<Utc>,
    #[serde(default)]
    records: Vec<ChapterQualityRecord>,
    #[serde(default)]
    alerts: Vec<AlertRecord>,
    #[serde(default)]
    decline_run: usize,
    #[serde(default)]
    decline_alerted: bool,
}

/// Tracks chapter quality over time.
///
/// The decline detector keeps the length of the current strictly-decreasing
/// run and raises `QUALITY_DECLINE_TREND` exactly once per run; any
/// non-decrease resets both the run and the alert latch.
pub struct QualityMetricsTracker {
    store: Arc<dyn MemoryStore>,
    scoring: Box<dyn QualityScoring>,
    config: QualityConfig,
    records: Vec<ChapterQualityRecord>,
    alerts: Vec<AlertRecord>,
    decline_run: usize,
    decline_alerted: bool,
    loaded: bool,
}

impl QualityMetricsTracker {
    /// Create a tracker with the built-in heuristic scorer.
    pub fn new(store: Arc<dyn MemoryStore>, config: QualityConfig) -> Self {
        Self::with_scoring(store, config, Box::new(HeuristicScoring::new()))
    }

    /// Create a tracker with a custom scorer.
    pub fn with_scoring(
        store: Arc<dyn MemoryStore>,
        config: QualityConfig,
        scoring: Box<dyn QualityScoring>,
    ) -> Self {
        Self {
            store,
            scoring,
            config,
            records: Vec::new(),
            alerts: Vec::new(),
            decline_run: 0,
            decline_alerted: false,
            loaded: false,
        }
    }

    /// Load persisted records and prune anything past the retention window.
    pub async fn load(&mut self) -> StoreResult<()> {
        let doc: Option<QualityDocument> = load_json(self.store.as_ref(), QUALITY_KEY).await?;
        if let Some(doc) = doc {
            self.records = doc.records;
            self.alerts = doc.alerts;
            self.decline_run = doc.decline_run;
            self.decline_alerted = doc.decline_alerted;
            self.prune(Utc::now());
            debug!(records = self.records.len(), "quality history loaded");
        }
        self.loaded = true;
        Ok(())
    }

    /// Score a chapter, record it and raise any alerts it warrants.
    ///
    /// Never fails: load and persist problems are logged and the update
    /// proceeds on in-memory state.
    pub async fn record_chapter(&mut self, chapter: &ChapterInput) -> QualityAssessment {
        self.ensure_loaded().await;

        let scores = self.scoring.score(chapter).clamped();
        let overall = scores.overall();

        // Track the strictly-decreasing run before pushing the new record.
        match self.records.last() {
            Some(prev) if overall < prev.overall => self.decline_run += 1,
            _ => {
                self.decline_run = 1;
                self.decline_alerted = false;
            }
        }

        let record = ChapterQualityRecord {
            chapter: chapter.number,
            scores,
            overall,
            recorded_at: Utc::now(),
        };
        self.records.push(record.clone());

        let mut new_alerts = Vec::new();
        if overall < self.config.critical_threshold {
            new_alerts.push(AlertRecord::new(
                AlertKind::QualityCritical,
                AlertSeverity::Critical,
                format!("chapter {} scored {overall:.1}, below critical threshold", chapter.number),
            ));
        } else if overall < self.config.poor_threshold {
            new_alerts.push(AlertRecord::new(
                AlertKind::QualityPoor,
                AlertSeverity::High,
                format!("chapter {} scored {overall:.1}, below poor threshold", chapter.number),
            ));
        }

        if self.decline_run >= DECLINE_RUN && !self.decline_alerted {
            new_alerts.push(AlertRecord::new(
                AlertKind::QualityDeclineTrend,
                AlertSeverity::Medium,
                format!(
                    "quality declined over the last {} chapters (latest {overall:.1})",
                    self.decline_run
                ),
            ));
            self.decline_alerted = true;
        }

        self.alerts.extend(new_alerts.iter().cloned());
        let trend = self.trend();

        if let Err(e) = self.persist().await {
            warn!(error = %e, "failed to persist quality metrics");
        }

        QualityAssessment {
            record,
            trend,
            new_alerts,
        }
    }

    /// Trend over the last few chapters: the mean of the newer half of the
    /// window against the mean of the older half.
    pub fn trend(&self) -> Trend {
        let start = self.records.len().saturating_sub(TREND_WINDOW);
        let window: Vec<f64> = self.records[start..].iter().map(|r| r.overall).collect();
        if window.len() < 2 {
            return Trend::Stable;
        }

        let half = window.len() / 2;
        let older = mean(&window[..half]);
        let newer = mean(&window[window.len() - half..]);

        let delta = newer - older;
        if delta > TREND_DELTA {
            Trend::Improving
        } else if delta < -TREND_DELTA {
            Trend::Declining
        } else {
            Trend::Stable
        }
    }

    /// All quality records, oldest first.
    pub fn records(&self) -> &[ChapterQualityRecord] {
        &self.records
    }

    /// The most recent record.
    pub fn latest(&self) -> Option<&ChapterQualityRecord> {
        self.records.last()
    }

    /// All alerts raised so far.
    pub fn alerts(&self) -> &[AlertRecord] {
        &self.alerts
    }

    /// Aggregate view for status reporting.
    pub fn summary(&self) -> QualitySummary {
        let average_overall = if self.records.is_empty() {
            0.0
        } else {
            self.records.iter().map(|r| r.overall).sum::<f64>() / self.records.len() as f64
        };
        QualitySummary {
            chapters_scored: self.records.len(),
            average_overall,
            latest_overall: self.records.last().map(|r| r.overall),
            trend: self.trend(),
            open_alerts: self.alerts.iter().filter(|a| !a.resolved).count(),
        }
    }

    /// Write the current document to the store.
    pub async fn persist(&self) -> StoreResult<()> {
        let doc = QualityDocument {
            recorded_at: Utc::now(),
            records: self.records.clone(),
            alerts: self.alerts.clone(),
            decline_run: self.decline_run,
            decline_alerted: self.decline_alerted,
        };
        save_json(self.store.as_ref(), QUALITY_KEY, &doc).await
    }

    pub(crate) async fn ensure_loaded(&mut self) {
        if self.loaded {
            return;
        }
        if let Err(e) = self.load().await {
            warn!(error = %e, "quality history unavailable, starting fresh");
            self.loaded = true;
        }
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - Duration::days(i64::from(self.config.retention_days));
        self.records.retain(|r| r.recorded_at >= cutoff);
        self.alerts.retain(|a| a.raised_at >= cutoff);
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    /// Scorer that replays a fixed sequence of overall scores.
    struct ScriptedScoring {
        scores: std::sync::Mutex<Vec<f64>>,
    }

    impl ScriptedScoring {
        fn new(scores: Vec<f64>) -> Self {
            Self {
                scores: std::sync::Mutex::new(scores),
            }
        }
    }

    impl QualityScoring for ScriptedScoring {
        fn score(&self, _chapter: &ChapterInput) -> DimensionScores {
            let mut guard = self.scores.lock().unwrap();
            let value = if guard.is_empty() { 5.0 } else { guard.remove(0) };
            DimensionScores::uniform(value)
        }
    }

    fn scripted(scores: Vec<f64>) -> QualityMetricsTracker {
        QualityMetricsTracker::with_scoring(
            Arc::new(InMemoryStore::new()),
            QualityConfig::default(),
            Box::new(ScriptedScoring::new(scores)),
        )
    }

    async fn run_chapters(tracker: &mut QualityMetricsTracker, count: u32) -> Vec<QualityAssessment> {
        let mut out = Vec::new();
        for n in 1..=count {
            out.push(
                tracker
                    .record_chapter(&ChapterInput::new(n, format!("Chapter {n} text.")))
                    .await,
            );
        }
        out
    }

    #[tokio::test]
    async fn test_decline_alert_fires_exactly_once_per_run() {
        let mut tracker = scripted(vec![9.0, 8.0, 7.0, 6.0]);
        let assessments = run_chapters(&mut tracker, 4).await;

        assert!(assessments[0].new_alerts.is_empty());
        assert!(assessments[1].new_alerts.is_empty());
        let third: Vec<_> = assessments[2]
            .new_alerts
            .iter()
            .map(|a| a.kind)
            .collect();
        assert_eq!(third, vec![AlertKind::QualityDeclineTrend]);
        assert!(
            assessments[3].new_alerts.is_empty(),
            "a continuing run must not re-alert"
        );
    }

    #[tokio::test]
    async fn test_decline_alert_rearms_after_recovery() {
        let mut tracker = scripted(vec![9.0, 8.0, 7.0, 8.0, 7.5, 7.0, 6.5]);
        let assessments = run_chapters(&mut tracker, 7).await;

        let decline_count = assessments
            .iter()
            .flat_map(|a| a.new_alerts.iter())
            .filter(|a| a.kind == AlertKind::QualityDeclineTrend)
            .count();
        assert_eq!(decline_count, 2, "recovery resets the latch");
    }

    #[tokio::test]
    async fn test_threshold_alerts() {
        let mut tracker = scripted(vec![6.0, 4.2, 2.5]);
        let assessments = run_chapters(&mut tracker, 3).await;

        assert!(assessments[0].new_alerts.is_empty());
        assert_eq!(assessments[1].new_alerts[0].kind, AlertKind::QualityPoor);
        assert_eq!(
            assessments[2].new_alerts[0].kind,
            AlertKind::QualityCritical
        );
        assert_eq!(assessments[2].new_alerts[0].severity, AlertSeverity::Critical);
    }

    #[tokio::test]
    async fn test_trend_detection() {
        let mut improving = scripted(vec![4.0, 4.2, 6.0, 7.0, 7.5]);
        let last = run_chapters(&mut improving, 5).await.pop().unwrap();
        assert_eq!(last.trend, Trend::Improving);

        let mut declining = scripted(vec![9.0, 8.0, 7.0]);
        let last = run_chapters(&mut declining, 3).await.pop().unwrap();
        assert_eq!(last.trend, Trend::Declining);

        let mut stable = scripted(vec![7.0, 7.2, 6.9, 7.1]);
        let last = run_chapters(&mut stable, 4).await.pop().unwrap();
        assert_eq!(last.trend, Trend::Stable);

        let mut single = scripted(vec![7.0]);
        let last = run_chapters(&mut single, 1).await.pop().unwrap();
        assert_eq!(last.trend, Trend::Stable, "one score cannot trend");
    }

    #[tokio::test]
    async fn test_summary_counts_open_alerts() {
        let mut tracker = scripted(vec![4.0, 4.0]);
        run_chapters(&mut tracker, 2).await;

        let summary = tracker.summary();
        assert_eq!(summary.chapters_scored, 2);
        assert_eq!(summary.open_alerts, 2);
        assert!((summary.average_overall - 4.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_history_survives_reload() {
        let store: Arc<dyn MemoryStore> = Arc::new(InMemoryStore::new());

        let mut first = QualityMetricsTracker::with_scoring(
            Arc::clone(&store),
            QualityConfig::default(),
            Box::new(ScriptedScoring::new(vec![9.0, 8.0])),
        );
        run_chapters(&mut first, 2).await;

        let mut second = QualityMetricsTracker::new(store, QualityConfig::default());
        second.load().await.unwrap();

        assert_eq!(second.records().len(), 2);
        assert_eq!(second.decline_run, 2, "run state persists across restarts");
    }
}
