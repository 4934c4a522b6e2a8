//! Operational statistics for the pipeline.
//!
//! Tracks per-component usage with exponentially smoothed success rates
//! and latencies, category counters for prompt, template and tension
//! work, integration volume, and a bounded ring of performance snapshots
//! with threshold alerts.

pub mod sampler;

pub use sampler::StatsSampler;

use crate::alert::{AlertKind, AlertRecord, AlertSeverity};
use crate::chapter::ChapterInput;
use crate::store::{load_json, save_json, MemoryStore, StoreResult, STATISTICS_KEY};
use crate::text::contains_any;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tracing::{debug, warn};

/// Smoothing factor for the exponential moving averages.
pub const EMA_ALPHA: f64 = 0.3;

/// Maximum retained performance snapshots.
const SNAPSHOT_CAPACITY: usize = 288;

/// Baseline for the synthetic memory estimate.
const BASE_MEMORY_MB: f64 = 32.0;

static ACTION_MARKERS: &[&str] = &["ran", "fought", "struck", "chase", "battle", "fled"];
static DESCRIPTION_MARKERS: &[&str] = &["gleamed", "shadow", "scent", "cold", "golden", "mist"];
static REFLECTION_MARKERS: &[&str] = &["realized", "remembered", "thought", "wondered"];

/// Tuning knobs for statistics tracking.
#[derive(Debug, Clone)]
pub struct StatsConfig {
    /// Days of history kept when loading persisted state.
    pub retention_days: u32,

    /// How often the background sampler takes a snapshot.
    pub sampling_interval: StdDuration,

    /// Snapshot alert ceiling for mean latency.
    pub max_avg_latency_ms: f64,

    /// Snapshot alert ceiling for error rate.
    pub max_error_rate: f64,

    /// Snapshot alert ceiling for the memory estimate.
    pub max_memory_mb: f64,

    /// Snapshot alert floor for chapter throughput.
    pub min_throughput_per_min: f64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            retention_days: 30,
            sampling_interval: StdDuration::from_secs(300),
            max_avg_latency_ms: 5_000.0,
            max_error_rate: 0.25,
            max_memory_mb: 512.0,
            min_throughput_per_min: 0.2,
        }
    }
}

impl StatsConfig {
    /// Set the sampling interval, builder style.
    pub fn with_sampling_interval(mut self, interval: StdDuration) -> Self {
        self.sampling_interval = interval;
        self
    }

    /// Set the retention window, builder style.
    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention_days = days;
        self
    }
}

/// Usage stats for one named component.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentUsageStat {
    /// Total recorded calls.
    pub calls: u64,

    /// Calls that failed.
    pub failures: u64,

    /// Smoothed success rate in [0, 1].
    pub success_rate: f64,

    /// Smoothed latency in milliseconds.
    pub avg_latency_ms: f64,

    /// When the component was last called.
    pub last_called_at: Option<DateTime<Utc>>,
}

impl ComponentUsageStat {
    fn record(&mut self, success: bool, latency_ms: f64) {
        let outcome = if success { 1.0 } else { 0.0 };
        if self.calls == 0 {
            self.success_rate = outcome;
            self.avg_latency_ms = latency_ms;
        } else {
            self.success_rate = ema(self.success_rate, outcome);
            self.avg_latency_ms = ema(self.avg_latency_ms, latency_ms);
        }
        self.calls += 1;
        if !success {
            self.failures += 1;
        }
        self.last_called_at = Some(Utc::now());
    }
}

/// Usage stats for one prompt category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptCategoryStat {
    /// Chapters that exercised this category.
    pub uses: u64,

    /// Smoothed success rate in [0, 1].
    pub success_rate: f64,

    /// Smoothed processing time in milliseconds.
    pub avg_generation_ms: f64,
}

/// Usage stats for one template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateUsageStat {
    /// Times the template was applied.
    pub uses: u64,

    /// Smoothed effectiveness in [0, 1].
    pub effectiveness: f64,
}

/// Usage stats for one tension-optimization category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TensionCategoryStat {
    /// Optimization passes in this category.
    pub uses: u64,

    /// Smoothed success rate in [0, 1].
    pub success_rate: f64,

    /// Smoothed improvement measure in [0, 1].
    pub avg_improvement: f64,
}

/// Volume stats for one integration seam.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegrationStat {
    /// Operations through the seam.
    pub operations: u64,

    /// Smoothed efficiency in [0, 1].
    pub efficiency: f64,

    /// Total bytes moved, accumulated.
    pub data_volume_bytes: u64,
}

/// One point-in-time performance reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    /// When the snapshot was taken.
    pub taken_at: DateTime<Utc>,

    /// Mean of the smoothed component latencies.
    pub avg_latency_ms: f64,

    /// Failures over total calls across all components.
    pub error_rate: f64,

    /// Synthetic memory footprint estimate.
    pub memory_estimate_mb: f64,

    /// Chapters per minute since the first recorded chapter.
    pub throughput_per_min: f64,

    /// Chapters processed so far.
    pub chapters_processed: u64,
}

/// Aggregate view for status reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSummary {
    /// Chapters processed so far.
    pub chapters_processed: u64,

    /// Distinct components seen.
    pub component_count: usize,

    /// Total calls across all components.
    pub total_calls: u64,

    /// Failures over total calls.
    pub error_rate: f64,

    /// Snapshots currently retained.
    pub snapshots_retained: usize,

    /// Alerts not yet resolved.
    pub open_alerts: usize,

    /// The most recent snapshot, if any.
    pub last_snapshot: Option<PerformanceSnapshot>,
}

/// Persisted form of the tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StatisticsDocument {
    recorded_at: DateTime<Utc>,
    #[serde(default)]
    components: BTreeMap<String, ComponentUsageStat>,
    #[serde(default)]
    prompt_categories: BTreeMap<String, PromptCategoryStat>,
    #[serde(default)]
    templates: BTreeMap<String, TemplateUsageStat>,
    #[serde(default)]
    tension_categories: BTreeMap<String, TensionCategoryStat>,
    #[serde(default)]
    integrations: BTreeMap<String, IntegrationStat>,
    #[serde(default)]
    snapshots: VecDeque<PerformanceSnapshot>,
    #[serde(default)]
    alerts: Vec<AlertRecord>,
    #[serde(default)]
    chapters_processed: u64,
    #[serde(default)]
    first_chapter_at: Option<DateTime<Utc>>,
}

/// Tracks operational statistics across the whole pipeline.
pub struct SystemStatisticsTracker {
    store: Arc<dyn MemoryStore>,
    config: StatsConfig,
    components: BTreeMap<String, ComponentUsageStat>,
    prompt_categories: BTreeMap<String, PromptCategoryStat>,
    templates: BTreeMap<String, TemplateUsageStat>,
    tension_categories: BTreeMap<String, TensionCategoryStat>,
    integrations: BTreeMap<String, IntegrationStat>,
    snapshots: VecDeque<PerformanceSnapshot>,
    alerts: Vec<AlertRecord>,
    chapters_processed: u64,
    first_chapter_at: Option<DateTime<Utc>>,
    loaded: bool,
}

impl SystemStatisticsTracker {
    /// Create a tracker over a store.
    pub fn new(store: Arc<dyn MemoryStore>, config: StatsConfig) -> Self {
        Self {
            store,
            config,
            components: BTreeMap::new(),
            prompt_categories: BTreeMap::new(),
            templates: BTreeMap::new(),
            tension_categories: BTreeMap::new(),
            integrations: BTreeMap::new(),
            snapshots: VecDeque::new(),
            alerts: Vec::new(),
            chapters_processed: 0,
            first_chapter_at: None,
            loaded: false,
        }
    }

    /// The configured sampling interval, for wiring up the sampler.
    pub fn sampling_interval(&self) -> StdDuration {
        self.config.sampling_interval
    }

    /// Load persisted statistics and prune past the retention window.
    pub async fn load(&mut self) -> StoreResult<()> {
        let doc: Option<StatisticsDocument> =
            load_json(self.store.as_ref(), STATISTICS_KEY).await?;
        if let Some(doc) = doc {
            self.components = doc.components;
            self.prompt_categories = doc.prompt_categories;
            self.templates = doc.templates;
            self.tension_categories = doc.tension_categories;
            self.integrations = doc.integrations;
            self.snapshots = doc.snapshots;
            self.alerts = doc.alerts;
            self.chapters_processed = doc.chapters_processed;
            self.first_chapter_at = doc.first_chapter_at;
            self.prune(Utc::now());
            debug!(
                components = self.components.len(),
                snapshots = self.snapshots.len(),
                "statistics loaded"
            );
        }
        self.loaded = true;
        Ok(())
    }

    /// Record a processed chapter: bumps the chapter counter and updates
    /// the prompt and template category stats detected from the content.
    pub async fn record_chapter(
        &mut self,
        chapter: &ChapterInput,
        success: bool,
        elapsed: StdDuration,
    ) {
        self.ensure_loaded().await;

        self.chapters_processed += 1;
        if self.first_chapter_at.is_none() {
            self.first_chapter_at = Some(Utc::now());
        }

        let elapsed_ms = elapsed.as_secs_f64() * 1_000.0;
        let outcome = if success { 1.0 } else { 0.0 };

        for category in detect_prompt_categories(&chapter.content) {
            let stat = self.prompt_categories.entry(category.to_string()).or_default();
            if stat.uses == 0 {
                stat.success_rate = outcome;
                stat.avg_generation_ms = elapsed_ms;
            } else {
                stat.success_rate = ema(stat.success_rate, outcome);
                stat.avg_generation_ms = ema(stat.avg_generation_ms, elapsed_ms);
            }
            stat.uses += 1;
        }

        let template = format!(
            "{}-chapter",
            chapter.context.genre().unwrap_or("general")
        );
        let stat = self.templates.entry(template).or_default();
        if stat.uses == 0 {
            stat.effectiveness = outcome;
        } else {
            stat.effectiveness = ema(stat.effectiveness, outcome);
        }
        stat.uses += 1;
    }

    /// Record one component call with its outcome and elapsed time.
    pub async fn record_component_call(
        &mut self,
        component: &str,
        success: bool,
        elapsed: StdDuration,
    ) {
        self.ensure_loaded().await;
        self.components
            .entry(component.to_string())
            .or_default()
            .record(success, elapsed.as_secs_f64() * 1_000.0);
    }

    /// Record a tension-optimization pass in a category.
    pub async fn record_tension_optimization(
        &mut self,
        category: &str,
        success: bool,
        improvement: f64,
    ) {
        self.ensure_loaded().await;
        let stat = self
            .tension_categories
            .entry(category.to_string())
            .or_default();
        let outcome = if success { 1.0 } else { 0.0 };
        let improvement = improvement.clamp(0.0, 1.0);
        if stat.uses == 0 {
            stat.success_rate = outcome;
            stat.avg_improvement = improvement;
        } else {
            stat.success_rate = ema(stat.success_rate, outcome);
            stat.avg_improvement = ema(stat.avg_improvement, improvement);
        }
        stat.uses += 1;
    }

    /// Record data volume through an integration seam.
    pub async fn record_integration(&mut self, seam: &str, bytes: usize, efficiency: f64) {
        self.ensure_loaded().await;
        let stat = self.integrations.entry(seam.to_string()).or_default();
        let efficiency = efficiency.clamp(0.0, 1.0);
        if stat.operations == 0 {
            stat.efficiency = efficiency;
        } else {
            stat.efficiency = ema(stat.efficiency, efficiency);
        }
        stat.operations += 1;
        stat.data_volume_bytes += bytes as u64;
    }

    /// Take a performance snapshot, append it to the bounded ring and
    /// evaluate the four threshold alerts against it.
    pub fn take_snapshot(&mut self) -> PerformanceSnapshot {
        let now = Utc::now();

        let active: Vec<&ComponentUsageStat> =
            self.components.values().filter(|c| c.calls > 0).collect();
        let avg_latency_ms = if active.is_empty() {
            0.0
        } else {
            active.iter().map(|c| c.avg_latency_ms).sum::<f64>() / active.len() as f64
        };

        let total_calls: u64 = active.iter().map(|c| c.calls).sum();
        let total_failures: u64 = active.iter().map(|c| c.failures).sum();
        let error_rate = if total_calls == 0 {
            0.0
        } else {
            total_failures as f64 / total_calls as f64
        };

        // Synthetic estimate: a baseline plus growth with tracked state,
        // with a little jitter so repeated idle snapshots are not byte
        // identical.
        let jitter: f64 = rand::thread_rng().gen_range(0.0..2.0);
        let memory_estimate_mb = BASE_MEMORY_MB
            + 0.01 * self.chapters_processed as f64
            + 0.05 * (self.components.len() + self.snapshots.len()) as f64
            + jitter;

        let throughput_per_min = match self.first_chapter_at {
            Some(first) if self.chapters_processed > 0 => {
                let minutes = (now - first).num_seconds().max(0) as f64 / 60.0;
                self.chapters_processed as f64 / minutes.max(1.0)
            }
            _ => 0.0,
        };

        let snapshot = PerformanceSnapshot {
            taken_at: now,
            avg_latency_ms,
            error_rate,
            memory_estimate_mb,
            throughput_per_min,
            chapters_processed: self.chapters_processed,
        };

        if self.snapshots.len() >= SNAPSHOT_CAPACITY {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(snapshot.clone());

        self.evaluate_thresholds(&snapshot);
        snapshot
    }

    /// All retained snapshots, oldest first.
    pub fn snapshots(&self) -> &VecDeque<PerformanceSnapshot> {
        &self.snapshots
    }

    /// All alerts raised so far.
    pub fn alerts(&self) -> &[AlertRecord] {
        &self.alerts
    }

    /// Usage stats for one component.
    pub fn component(&self, name: &str) -> Option<&ComponentUsageStat> {
        self.components.get(name)
    }

    /// All component stats, keyed by name.
    pub fn components(&self) -> &BTreeMap<String, ComponentUsageStat> {
        &self.components
    }

    /// All prompt category stats, keyed by category.
    pub fn prompt_categories(&self) -> &BTreeMap<String, PromptCategoryStat> {
        &self.prompt_categories
    }

    /// All tension category stats, keyed by category.
    pub fn tension_categories(&self) -> &BTreeMap<String, TensionCategoryStat> {
        &self.tension_categories
    }

    /// All integration seam stats, keyed by seam.
    pub fn integrations(&self) -> &BTreeMap<String, IntegrationStat> {
        &self.integrations
    }

    /// Aggregate view for status reporting.
    pub fn summary(&self) -> StatsSummary {
        let total_calls: u64 = self.components.values().map(|c| c.calls).sum();
        let total_failures: u64 = self.components.values().map(|c| c.failures).sum();
        StatsSummary {
            chapters_processed: self.chapters_processed,
            component_count: self.components.len(),
            total_calls,
            error_rate: if total_calls == 0 {
                0.0
            } else {
                total_failures as f64 / total_calls as f64
            },
            snapshots_retained: self.snapshots.len(),
            open_alerts: self.alerts.iter().filter(|a| !a.resolved).count(),
            last_snapshot: self.snapshots.back().cloned(),
        }
    }

    /// Write the current document to the store.
    pub async fn persist(&self) -> StoreResult<()> {
        let doc = StatisticsDocument {
            recorded_at: Utc::now(),
            components: self.components.clone(),
            prompt_categories: self.prompt_categories.clone(),
            templates: self.templates.clone(),
            tension_categories: self.tension_categories.clone(),
            integrations: self.integrations.clone(),
            snapshots: self.snapshots.clone(),
            alerts: self.alerts.clone(),
            chapters_processed: self.chapters_processed,
            first_chapter_at: self.first_chapter_at,
        };
        save_json(self.store.as_ref(), STATISTICS_KEY, &doc).await
    }

    pub(crate) async fn ensure_loaded(&mut self) {
        if self.loaded {
            return;
        }
        if let Err(e) = self.load().await {
            warn!(error = %e, "statistics unavailable, starting fresh");
            self.loaded = true;
        }
    }

    /// Raise threshold alerts for a snapshot. A kind with an unresolved
    /// alert outstanding is not raised again.
    fn evaluate_thresholds(&mut self, snapshot: &PerformanceSnapshot) {
        let mut raise = |alerts: &mut Vec<AlertRecord>, kind, severity, message: String| {
            let outstanding = alerts.iter().any(|a| a.kind == kind && !a.resolved);
            if !outstanding {
                alerts.push(AlertRecord::new(kind, severity, message));
            }
        };

        if snapshot.avg_latency_ms > self.config.max_avg_latency_ms {
            raise(
                &mut self.alerts,
                AlertKind::HighLatency,
                AlertSeverity::High,
                format!("mean latency {:.0}ms over ceiling", snapshot.avg_latency_ms),
            );
        }
        if snapshot.error_rate > self.config.max_error_rate {
            raise(
                &mut self.alerts,
                AlertKind::HighErrorRate,
                AlertSeverity::Critical,
                format!("error rate {:.2} over ceiling", snapshot.error_rate),
            );
        }
        if snapshot.memory_estimate_mb > self.config.max_memory_mb {
            raise(
                &mut self.alerts,
                AlertKind::HighMemoryUse,
                AlertSeverity::Medium,
                format!("memory estimate {:.0}MB over ceiling", snapshot.memory_estimate_mb),
            );
        }
        if snapshot.chapters_processed > 0
            && snapshot.throughput_per_min < self.config.min_throughput_per_min
        {
            raise(
                &mut self.alerts,
                AlertKind::LowThroughput,
                AlertSeverity::Low,
                format!(
                    "throughput {:.2} chapters/min under floor",
                    snapshot.throughput_per_min
                ),
            );
        }
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - Duration::days(i64::from(self.config.retention_days));
        self.snapshots.retain(|s| s.taken_at >= cutoff);
        self.alerts.retain(|a| a.raised_at >= cutoff);
    }
}

fn ema(current: f64, sample: f64) -> f64 {
    EMA_ALPHA * sample + (1.0 - EMA_ALPHA) * current
}

/// Fraction of a fan-out that produced real output, 0.0 when nothing ran.
pub(crate) fn integration_efficiency(produced: usize, failed: usize) -> f64 {
    let total = produced + failed;
    if total == 0 {
        0.0
    } else {
        produced as f64 / total as f64
    }
}

/// Prompt categories a chapter exercises, judged from its surface text.
fn detect_prompt_categories(content: &str) -> Vec<&'static str> {
    let lower = content.to_lowercase();
    let mut categories = Vec::new();

    if content.contains('"') || content.contains('\u{201c}') {
        categories.push("dialogue");
    }
    if contains_any(&lower, ACTION_MARKERS) {
        categories.push("action");
    }
    if contains_any(&lower, DESCRIPTION_MARKERS) {
        categories.push("description");
    }
    if contains_any(&lower, REFLECTION_MARKERS) {
        categories.push("reflection");
    }
    if categories.is_empty() {
        categories.push("general");
    }
    categories
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn tracker() -> SystemStatisticsTracker {
        SystemStatisticsTracker::new(Arc::new(InMemoryStore::new()), StatsConfig::default())
    }

    #[test]
    fn test_ema_weighting() {
        assert!((ema(10.0, 20.0) - 13.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_component_first_sample_seeds_averages() {
        let mut tracker = tracker();
        tracker
            .record_component_call("analysis-coordinator", true, StdDuration::from_millis(120))
            .await;

        let stat = tracker.component("analysis-coordinator").unwrap();
        assert_eq!(stat.calls, 1);
        assert_eq!(stat.failures, 0);
        assert!((stat.success_rate - 1.0).abs() < 1e-9);
        assert!((stat.avg_latency_ms - 120.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_component_failure_moves_success_rate_down() {
        let mut tracker = tracker();
        tracker
            .record_component_call("theme-analyzer", true, StdDuration::from_millis(100))
            .await;
        tracker
            .record_component_call("theme-analyzer", false, StdDuration::from_millis(300))
            .await;

        let stat = tracker.component("theme-analyzer").unwrap();
        assert_eq!(stat.calls, 2);
        assert_eq!(stat.failures, 1);
        assert!((stat.success_rate - 0.7).abs() < 1e-9, "1.0 smoothed toward 0.0");
        assert!((stat.avg_latency_ms - 160.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_prompt_category_detection() {
        let mut tracker = tracker();
        tracker
            .record_chapter(
                &ChapterInput::new(1, "\"Run!\" she cried. They fled into the mist."),
                true,
                StdDuration::from_millis(50),
            )
            .await;

        assert!(tracker.prompt_categories().contains_key("dialogue"));
        assert!(tracker.prompt_categories().contains_key("action"));
        assert!(tracker.prompt_categories().contains_key("description"));
        assert_eq!(tracker.chapters_processed, 1);
    }

    #[tokio::test]
    async fn test_plain_text_lands_in_general_category() {
        let mut tracker = tracker();
        tracker
            .record_chapter(
                &ChapterInput::new(1, "Nothing much happened."),
                true,
                StdDuration::from_millis(10),
            )
            .await;

        assert!(tracker.prompt_categories().contains_key("general"));
    }

    #[tokio::test]
    async fn test_snapshot_ring_is_bounded() {
        let mut tracker = tracker();
        for _ in 0..(SNAPSHOT_CAPACITY + 10) {
            tracker.take_snapshot();
        }
        assert_eq!(tracker.snapshots().len(), SNAPSHOT_CAPACITY);
    }

    #[tokio::test]
    async fn test_latency_alert_fires_once_while_unresolved() {
        let mut tracker = tracker();
        tracker
            .record_component_call("slow-analyzer", true, StdDuration::from_secs(10))
            .await;

        tracker.take_snapshot();
        tracker.take_snapshot();

        let latency_alerts = tracker
            .alerts()
            .iter()
            .filter(|a| a.kind == AlertKind::HighLatency)
            .count();
        assert_eq!(latency_alerts, 1);
    }

    #[tokio::test]
    async fn test_error_rate_alert() {
        let mut tracker = tracker();
        for _ in 0..3 {
            tracker
                .record_component_call("flaky", false, StdDuration::from_millis(5))
                .await;
        }
        tracker.take_snapshot();

        assert!(tracker
            .alerts()
            .iter()
            .any(|a| a.kind == AlertKind::HighErrorRate));
    }

    #[tokio::test]
    async fn test_memory_alert_respects_config() {
        let config = StatsConfig {
            max_memory_mb: 1.0,
            ..StatsConfig::default()
        };
        let mut tracker =
            SystemStatisticsTracker::new(Arc::new(InMemoryStore::new()), config);
        tracker.take_snapshot();

        assert!(tracker
            .alerts()
            .iter()
            .any(|a| a.kind == AlertKind::HighMemoryUse));
    }

    #[tokio::test]
    async fn test_tension_and_integration_stats() {
        let mut tracker = tracker();
        tracker.record_tension_optimization("raise", true, 0.8).await;
        tracker.record_tension_optimization("raise", true, 0.4).await;
        tracker.record_integration("analysis-pipeline", 2_048, 1.0).await;

        let raise = tracker.tension_categories().get("raise").unwrap();
        assert_eq!(raise.uses, 2);
        assert!((raise.avg_improvement - 0.68).abs() < 1e-9, "0.8 smoothed toward 0.4");

        let seam = tracker.integrations.get("analysis-pipeline").unwrap();
        assert_eq!(seam.data_volume_bytes, 2_048);
    }

    #[tokio::test]
    async fn test_stats_survive_reload() {
        let store: Arc<dyn MemoryStore> = Arc::new(InMemoryStore::new());

        let mut first = SystemStatisticsTracker::new(Arc::clone(&store), StatsConfig::default());
        first
            .record_component_call("analysis-coordinator", true, StdDuration::from_millis(80))
            .await;
        first.take_snapshot();
        first.persist().await.unwrap();

        let mut second = SystemStatisticsTracker::new(store, StatsConfig::default());
        second.load().await.unwrap();

        assert_eq!(second.component("analysis-coordinator").unwrap().calls, 1);
        assert_eq!(second.snapshots().len(), 1);
    }
}
