//! Alert records raised by the quality and statistics trackers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What condition an alert reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    /// Chapter quality fell below the critical threshold.
    QualityCritical,
    /// Chapter quality fell below the poor threshold.
    QualityPoor,
    /// Quality scores have been strictly decreasing for several chapters.
    QualityDeclineTrend,
    /// Average operation latency exceeded its ceiling.
    HighLatency,
    /// Error rate exceeded its ceiling.
    HighErrorRate,
    /// Estimated memory footprint exceeded its ceiling.
    HighMemoryUse,
    /// Chapter throughput dropped below its floor.
    LowThroughput,
}

impl AlertKind {
    /// Stable machine-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            AlertKind::QualityCritical => "QUALITY_CRITICAL",
            AlertKind::QualityPoor => "QUALITY_POOR",
            AlertKind::QualityDeclineTrend => "QUALITY_DECLINE_TREND",
            AlertKind::HighLatency => "HIGH_LATENCY",
            AlertKind::HighErrorRate => "HIGH_ERROR_RATE",
            AlertKind::HighMemoryUse => "HIGH_MEMORY_USE",
            AlertKind::LowThroughput => "LOW_THROUGHPUT",
        }
    }
}

/// How urgent an alert is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
            AlertSeverity::Critical => "critical",
        }
    }
}

/// A single raised alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    /// Unique alert id.
    pub id: Uuid,

    /// Condition that fired.
    pub kind: AlertKind,

    /// Urgency grade.
    pub severity: AlertSeverity,

    /// Human-readable detail.
    pub message: String,

    /// Whether the condition has since been addressed.
    #[serde(default)]
    pub resolved: bool,

    /// When the alert was raised.
    pub raised_at: DateTime<Utc>,
}

impl AlertRecord {
    /// Raise a new unresolved alert.
    pub fn new(kind: AlertKind, severity: AlertSeverity, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            severity,
            message: message.into(),
            resolved: false,
            raised_at: Utc::now(),
        }
    }

    /// Mark the alert resolved.
    pub fn resolve(&mut self) {
        self.resolved = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_names_are_screaming_snake() {
        assert_eq!(AlertKind::QualityDeclineTrend.name(), "QUALITY_DECLINE_TREND");
        assert_eq!(AlertKind::HighLatency.name(), "HIGH_LATENCY");
    }

    #[test]
    fn test_severity_ordering() {
        assert!(AlertSeverity::Critical > AlertSeverity::High);
        assert!(AlertSeverity::High > AlertSeverity::Medium);
        assert!(AlertSeverity::Medium > AlertSeverity::Low);
    }

    #[test]
    fn test_new_alert_is_unresolved() {
        let mut alert = AlertRecord::new(
            AlertKind::QualityPoor,
            AlertSeverity::High,
            "chapter 3 scored 4.2",
        );
        assert!(!alert.resolved);
        alert.resolve();
        assert!(alert.resolved);
    }
}
