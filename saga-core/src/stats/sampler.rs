//! Background performance sampler.
//!
//! A spawned task takes a snapshot on a fixed interval until stopped.
//! Persistence after each snapshot is best-effort.

use crate::stats::SystemStatisticsTracker;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Handle to the background sampling task.
///
/// Dropping the handle aborts the task, so a pipeline going away never
/// leaks its sampler.
pub struct StatsSampler {
    shutdown: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl StatsSampler {
    /// Spawn a sampler over a shared tracker. Must be called from within a
    /// Tokio runtime.
    pub fn spawn(tracker: Arc<Mutex<SystemStatisticsTracker>>, interval: Duration) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; skip it so the first
            // snapshot lands a full interval after spawn.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if flag.load(Ordering::Relaxed) {
                    break;
                }

                let mut tracker = tracker.lock().await;
                let snapshot = tracker.take_snapshot();
                debug!(
                    latency_ms = snapshot.avg_latency_ms,
                    error_rate = snapshot.error_rate,
                    "performance snapshot taken"
                );
                if let Err(e) = tracker.persist().await {
                    warn!(error = %e, "failed to persist statistics snapshot");
                }
            }
        });

        Self { shutdown, handle }
    }

    /// Stop the sampler. Idempotent.
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.handle.abort();
    }

    /// Whether the sampling task has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for StatsSampler {
    fn drop(&mut self) {
        self.stop();
    }
}
