//! Recommendation integration: ranking, conflict resolution, phase
//! planning and synergy detection over the flattened suggestion list.
//!
//! Conflict detection is a closed rule table, not a constraint solver:
//! each rule names two categories and the marker phrases that identify a
//! contradictory pair.

use crate::optimize::optimizer::{OptimizerKind, Priority};
use crate::text::contains_any;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How the prioritized list is ranked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityStrategy {
    /// Highest expected benefit first.
    Impact,
    /// Cheapest to apply first.
    Effort,
    /// Benefit weighted against cost.
    #[default]
    Balanced,
}

impl PriorityStrategy {
    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            PriorityStrategy::Impact => "impact",
            PriorityStrategy::Effort => "effort",
            PriorityStrategy::Balanced => "balanced",
        }
    }

    /// Ranking score; higher sorts earlier under every strategy.
    fn score(&self, suggestion: &Suggestion) -> f64 {
        match self {
            PriorityStrategy::Impact => suggestion.impact,
            PriorityStrategy::Effort => -suggestion.effort,
            PriorityStrategy::Balanced => suggestion.impact * 0.7 - suggestion.effort * 0.3,
        }
    }
}

impl std::str::FromStr for PriorityStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "impact" => Ok(PriorityStrategy::Impact),
            "effort" => Ok(PriorityStrategy::Effort),
            "balanced" => Ok(PriorityStrategy::Balanced),
            other => Err(format!("unknown priority strategy: {other}")),
        }
    }
}

/// A suggestion after integration: identified, categorized and rankable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    /// Unique id, referenced by conflicts, phases and synergies.
    pub id: Uuid,

    /// Category the suggestion came from.
    pub kind: OptimizerKind,

    /// The suggested revision.
    pub text: String,

    /// Urgency as judged by its optimizer.
    pub priority: Priority,

    /// Expected benefit in [0, 1].
    pub impact: f64,

    /// Expected cost to apply in [0, 1].
    pub effort: f64,
}

/// A detected contradiction between two suggestions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictResolution {
    /// Conflict category; currently always "contradiction".
    pub conflict_type: String,

    /// First conflicting suggestion.
    pub first: Uuid,

    /// Second conflicting suggestion.
    pub second: Uuid,

    /// Why the pair cannot both be applied as written.
    pub resolution: String,

    /// What to do about it.
    pub recommended_action: String,
}

/// One phase of the implementation plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImplementationPhase {
    /// Phase name.
    pub name: String,

    /// What the phase covers.
    pub description: String,

    /// Suggestions to apply in this phase, in prioritized order.
    pub suggestion_ids: Vec<Uuid>,
}

/// A cross-category pairing expected to compound in benefit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynergyOpportunity {
    /// What the pairing achieves.
    pub description: String,

    /// Theme suggestions involved.
    pub theme_ids: Vec<Uuid>,

    /// Character suggestions involved.
    pub character_ids: Vec<Uuid>,
}

/// The integrated recommendation set for one chapter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegratedRecommendations {
    /// Ranked, truncated suggestion list.
    pub prioritized: Vec<Suggestion>,

    /// Contradictions detected within the prioritized list.
    pub conflicts: Vec<ConflictResolution>,

    /// Suggested order of application; empty phases are dropped.
    pub implementation_order: Vec<ImplementationPhase>,

    /// Cross-category pairings worth applying together.
    pub synergies: Vec<SynergyOpportunity>,
}

impl IntegratedRecommendations {
    /// Build the full recommendation set from a flattened suggestion list.
    pub fn build(
        mut suggestions: Vec<Suggestion>,
        strategy: PriorityStrategy,
        max_per_category: usize,
    ) -> Self {
        prioritize(&mut suggestions, strategy, max_per_category * 4);
        let conflicts = detect_conflicts(&suggestions);
        let implementation_order = plan_phases(&suggestions);
        let synergies = detect_synergies(&suggestions);
        Self {
            prioritized: suggestions,
            conflicts,
            implementation_order,
            synergies,
        }
    }

    /// Count of prioritized suggestions at a priority level.
    pub fn count_at(&self, priority: Priority) -> usize {
        self.prioritized.iter().filter(|s| s.priority == priority).count()
    }
}

/// Sort by strategy score (ties broken by priority, then impact) and
/// truncate to the cap.
fn prioritize(suggestions: &mut Vec<Suggestion>, strategy: PriorityStrategy, cap: usize) {
    suggestions.sort_by(|a, b| {
        strategy
            .score(b)
            .partial_cmp(&strategy.score(a))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(b.priority.cmp(&a.priority))
            .then(b.impact.partial_cmp(&a.impact).unwrap_or(std::cmp::Ordering::Equal))
    });
    suggestions.truncate(cap);
}

/// One side of a conflict rule: a category plus the marker phrases that
/// identify the contradictory wording.
struct ConflictSide {
    kind: OptimizerKind,
    markers: &'static [&'static str],
}

struct ConflictRule {
    a: ConflictSide,
    b: ConflictSide,
    resolution: &'static str,
    action: &'static str,
}

/// Marker phrases in style suggestions that ask for a slower pace.
pub const SLOW_PACE_MARKERS: &[&str] = &[
    "slow the pacing",
    "slow the pace",
    "room to breathe",
];

/// Marker phrases in tension suggestions that ask for a faster pace.
pub const SPEED_UP_MARKERS: &[&str] = &[
    "quicken the pace",
    "accelerate the pacing",
    "raise the tempo",
];

static CONFLICT_RULES: &[ConflictRule] = &[
    ConflictRule {
        a: ConflictSide {
            kind: OptimizerKind::Style,
            markers: SLOW_PACE_MARKERS,
        },
        b: ConflictSide {
            kind: OptimizerKind::Tension,
            markers: SPEED_UP_MARKERS,
        },
        resolution: "style asks for a slower pace while tension asks for a faster one; \
                     both cannot be applied to the same scenes",
        action: "split the chapter: slow the quiet scenes, accelerate the confrontation",
    },
    ConflictRule {
        a: ConflictSide {
            kind: OptimizerKind::Style,
            markers: &["trim description", "cut description"],
        },
        b: ConflictSide {
            kind: OptimizerKind::Theme,
            markers: &["deepen the imagery", "expand the imagery"],
        },
        resolution: "style wants description cut while theme wants imagery expanded",
        action: "keep only the imagery that carries the theme; trim the rest",
    },
    ConflictRule {
        a: ConflictSide {
            kind: OptimizerKind::Character,
            markers: &["introspective beat", "interior monologue"],
        },
        b: ConflictSide {
            kind: OptimizerKind::Tension,
            markers: &["cut reflective passages", "remove the lull"],
        },
        resolution: "character work adds reflection while tension work removes it",
        action: "move the introspection to the chapter opening, before tension builds",
    },
];

fn side_matches(side: &ConflictSide, suggestion: &Suggestion) -> bool {
    suggestion.kind == side.kind && contains_any(&suggestion.text.to_lowercase(), side.markers)
}

/// Pairwise scan of the prioritized list against the rule table. Each
/// matching pair emits exactly one resolution record.
fn detect_conflicts(suggestions: &[Suggestion]) -> Vec<ConflictResolution> {
    let mut conflicts = Vec::new();
    for (i, first) in suggestions.iter().enumerate() {
        for second in &suggestions[i + 1..] {
            for rule in CONFLICT_RULES {
                let hit = (side_matches(&rule.a, first) && side_matches(&rule.b, second))
                    || (side_matches(&rule.b, first) && side_matches(&rule.a, second));
                if hit {
                    conflicts.push(ConflictResolution {
                        conflict_type: "contradiction".to_string(),
                        first: first.id,
                        second: second.id,
                        resolution: rule.resolution.to_string(),
                        recommended_action: rule.action.to_string(),
                    });
                }
            }
        }
    }
    conflicts
}

/// Bucket suggestions into the four fixed phases, dropping empty ones.
fn plan_phases(suggestions: &[Suggestion]) -> Vec<ImplementationPhase> {
    let mut preparation = Vec::new();
    let mut core = Vec::new();
    let mut refinement = Vec::new();
    let mut validation = Vec::new();

    for suggestion in suggestions {
        match suggestion.kind {
            OptimizerKind::Character if suggestion.priority == Priority::High => {
                preparation.push(suggestion.id)
            }
            OptimizerKind::Theme | OptimizerKind::Tension => core.push(suggestion.id),
            OptimizerKind::Style => refinement.push(suggestion.id),
            OptimizerKind::Character => validation.push(suggestion.id),
        }
    }

    let phases = [
        (
            "preparation",
            "establish the character groundwork the rest depends on",
            preparation,
        ),
        (
            "core implementation",
            "apply the theme and tension changes",
            core,
        ),
        ("refinement", "polish prose and style", refinement),
        (
            "validation",
            "apply remaining low-priority touches and re-read",
            validation,
        ),
    ];

    phases
        .into_iter()
        .filter(|(_, _, ids)| !ids.is_empty())
        .map(|(name, description, suggestion_ids)| ImplementationPhase {
            name: name.to_string(),
            description: description.to_string(),
            suggestion_ids,
        })
        .collect()
}

/// Seed heuristic: one opportunity when both theme and character work is
/// present, pairing the leading suggestions of each.
fn detect_synergies(suggestions: &[Suggestion]) -> Vec<SynergyOpportunity> {
    let theme_ids: Vec<Uuid> = suggestions
        .iter()
        .filter(|s| s.kind == OptimizerKind::Theme)
        .take(2)
        .map(|s| s.id)
        .collect();
    let character_ids: Vec<Uuid> = suggestions
        .iter()
        .filter(|s| s.kind == OptimizerKind::Character)
        .take(2)
        .map(|s| s.id)
        .collect();

    if theme_ids.is_empty() || character_ids.is_empty() {
        return Vec::new();
    }

    vec![SynergyOpportunity {
        description: "express the theme through character choices so both changes \
                      reinforce each other"
            .to_string(),
        theme_ids,
        character_ids,
    }]
}
