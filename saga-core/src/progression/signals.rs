//! Content signal extraction for progression tracking.
//!
//! The tracker asks a [`ProgressionSignals`] implementation what a chapter
//! contains; the built-in implementation matches fixed marker phrases at
//! word boundaries. Swapping in a smarter detector is a constructor-time
//! decision, not a per-call probe.

use crate::progression::arc::MilestoneKind;
use crate::progression::phase::NarrativePhase;
use crate::progression::turning_point::TurningPointKind;
use crate::text::{contains_any, recurring_names};

/// Signal extraction seam used by the progression tracker.
pub trait ProgressionSignals: Send + Sync {
    /// A phase stated by the content itself, overriding the numeric phase
    /// for this chapter only.
    fn phase_override(&self, content: &str) -> Option<NarrativePhase>;

    /// Milestone kinds the content shows evidence of.
    fn milestones(&self, content: &str) -> Vec<MilestoneKind>;

    /// Turning point kinds the content shows evidence of.
    fn turning_points(&self, content: &str) -> Vec<TurningPointKind>;

    /// Whether the content explicitly closes the current arc.
    fn arc_end(&self, content: &str) -> bool;

    /// Character names appearing in the content.
    fn character_names(&self, content: &str) -> Vec<String>;
}

/// Phase markers, checked latest phase first so an epilogue note wins over
/// an offhand mention of earlier beats.
static PHASE_MARKERS: &[(NarrativePhase, &[&str])] = &[
    (
        NarrativePhase::Resolution,
        &["epilogue", "the story ends", "all was told"],
    ),
    (
        NarrativePhase::FallingAction,
        &["the dust settled", "aftermath", "began to heal"],
    ),
    (
        NarrativePhase::Climax,
        &["climax", "final confrontation", "decisive battle"],
    ),
    (
        NarrativePhase::RisingAction,
        &["tension mounted", "the conflict deepened", "stakes rose"],
    ),
    (
        NarrativePhase::Introduction,
        &["prologue", "our story begins", "first met"],
    ),
];

static MILESTONE_MARKERS: &[(MilestoneKind, &[&str])] = &[
    (
        MilestoneKind::NewElement,
        &[
            "for the first time",
            "a stranger arrived",
            "never seen before",
            "a new power",
        ],
    ),
    (
        MilestoneKind::ConflictEscalation,
        &["confrontation", "clashed", "threatened", "the feud deepened"],
    ),
    (
        MilestoneKind::DecisiveResolution,
        &[
            "settled once and for all",
            "was defeated",
            "victory was won",
            "resolved at last",
        ],
    ),
    (
        MilestoneKind::TurningPoint,
        &[
            "turning point",
            "everything changed",
            "nothing would be the same",
        ],
    ),
];

static TURNING_POINT_MARKERS: &[(TurningPointKind, &[&str])] = &[
    (
        TurningPointKind::PlotTwist,
        &[
            "to everyone's surprise",
            "the truth was the opposite",
            "a twist",
        ],
    ),
    (
        TurningPointKind::Revelation,
        &["revealed", "came to light", "the secret"],
    ),
    (
        TurningPointKind::ConflictEscalation,
        &["escalated", "open war", "beyond repair"],
    ),
    (
        TurningPointKind::CharacterDevelopment,
        &["had changed", "came to understand", "resolve hardened"],
    ),
    (
        TurningPointKind::Resolution,
        &["reconciled", "at peace", "the conflict ended"],
    ),
];

static ARC_END_MARKERS: &[&str] = &["end of arc", "the arc concludes"];

/// Marker-phrase signal extraction. Deterministic and offline.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordSignals;

impl KeywordSignals {
    /// Create the default detector.
    pub fn new() -> Self {
        Self
    }
}

impl ProgressionSignals for KeywordSignals {
    fn phase_override(&self, content: &str) -> Option<NarrativePhase> {
        let lower = content.to_lowercase();
        PHASE_MARKERS
            .iter()
            .find(|(_, markers)| contains_any(&lower, markers))
            .map(|(phase, _)| *phase)
    }

    fn milestones(&self, content: &str) -> Vec<MilestoneKind> {
        let lower = content.to_lowercase();
        MILESTONE_MARKERS
            .iter()
            .filter(|(_, markers)| contains_any(&lower, markers))
            .map(|(kind, _)| *kind)
            .collect()
    }

    fn turning_points(&self, content: &str) -> Vec<TurningPointKind> {
        let lower = content.to_lowercase();
        TURNING_POINT_MARKERS
            .iter()
            .filter(|(_, markers)| contains_any(&lower, markers))
            .map(|(kind, _)| *kind)
            .collect()
    }

    fn arc_end(&self, content: &str) -> bool {
        contains_any(&content.to_lowercase(), ARC_END_MARKERS)
    }

    fn character_names(&self, content: &str) -> Vec<String> {
        recurring_names(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_override_prefers_later_phases() {
        let signals = KeywordSignals::new();

        assert_eq!(
            signals.phase_override("The Epilogue came after the climax."),
            Some(NarrativePhase::Resolution)
        );
        assert_eq!(
            signals.phase_override("They reached the climax of the siege."),
            Some(NarrativePhase::Climax)
        );
        assert_eq!(signals.phase_override("An ordinary morning."), None);
    }

    #[test]
    fn test_milestone_detection() {
        let signals = KeywordSignals::new();
        let kinds =
            signals.milestones("For the first time, a stranger arrived. They clashed at noon.");

        assert!(kinds.contains(&MilestoneKind::NewElement));
        assert!(kinds.contains(&MilestoneKind::ConflictEscalation));
        assert!(!kinds.contains(&MilestoneKind::DecisiveResolution));
    }

    #[test]
    fn test_turning_point_detection() {
        let signals = KeywordSignals::new();
        let kinds = signals.turning_points("The ledger's secret came to light at last.");

        assert_eq!(kinds, vec![TurningPointKind::Revelation]);
    }

    #[test]
    fn test_arc_end_marker() {
        let signals = KeywordSignals::new();
        assert!(signals.arc_end("And so, end of arc."));
        assert!(!signals.arc_end("The arc of the bridge gleamed."));
    }
}
