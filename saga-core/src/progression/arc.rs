//! Story arc records and milestones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Themes assigned to arcs in order. Arc numbers past the end of the list
/// reuse the final theme.
pub const ARC_THEMES: [&str; 8] = [
    "origins and first bonds",
    "trials of growth",
    "shadows gathering",
    "betrayal and doubt",
    "descent into crisis",
    "the turning tide",
    "final confrontation",
    "aftermath and renewal",
];

/// Theme for a one-based arc number.
pub fn theme_for_arc(number: u32) -> &'static str {
    let idx = (number.max(1) as usize - 1).min(ARC_THEMES.len() - 1);
    ARC_THEMES[idx]
}

/// Lifecycle of a story arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArcStatus {
    /// Sketched but not yet receiving chapters.
    Planning,
    /// Currently receiving chapters.
    InProgress,
    /// Closed out by the completion rules.
    Completed,
    /// Dropped by an explicit editorial decision, never automatically.
    Abandoned,
}

impl ArcStatus {
    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            ArcStatus::Planning => "planning",
            ArcStatus::InProgress => "in progress",
            ArcStatus::Completed => "completed",
            ArcStatus::Abandoned => "abandoned",
        }
    }

    /// Whether the arc still accepts chapter updates.
    pub fn is_open(&self) -> bool {
        matches!(self, ArcStatus::Planning | ArcStatus::InProgress)
    }
}

/// What kind of story beat a milestone marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneKind {
    /// A new character, place or element entered the story.
    NewElement,
    /// An existing conflict grew sharper.
    ConflictEscalation,
    /// Something was settled for good.
    DecisiveResolution,
    /// The direction of the story changed.
    TurningPoint,
}

impl MilestoneKind {
    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            MilestoneKind::NewElement => "new element",
            MilestoneKind::ConflictEscalation => "conflict escalation",
            MilestoneKind::DecisiveResolution => "decisive resolution",
            MilestoneKind::TurningPoint => "turning point",
        }
    }
}

/// A story beat achieved inside an arc.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    /// Beat category.
    pub kind: MilestoneKind,

    /// Chapter where the beat landed.
    pub chapter: u32,

    /// Short description of the beat.
    pub description: String,

    /// Whether the beat actually happened (vs. planned).
    pub achieved: bool,
}

impl Milestone {
    /// Record an achieved milestone.
    pub fn achieved(kind: MilestoneKind, chapter: u32) -> Self {
        Self {
            kind,
            chapter,
            description: format!("{} in chapter {}", kind.name(), chapter),
            achieved: true,
        }
    }
}

/// Per-character presence inside an arc.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterArc {
    /// Character name as detected in the text.
    pub name: String,

    /// First chapter the character appeared in within this arc.
    pub first_chapter: u32,

    /// Most recent chapter the character appeared in.
    pub last_chapter: u32,

    /// Total chapters the character appeared in.
    pub appearances: u32,
}

/// One story arc: a themed span of chapters with its milestones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArcRecord {
    /// One-based arc number. Strictly increasing across the story.
    pub number: u32,

    /// Assigned theme.
    pub theme: String,

    /// First chapter of the arc.
    pub start_chapter: u32,

    /// Last chapter, set when the arc completes.
    pub end_chapter: Option<u32>,

    /// Lifecycle state.
    pub status: ArcStatus,

    /// Achieved story beats.
    #[serde(default)]
    pub milestones: Vec<Milestone>,

    /// Characters active in the arc.
    #[serde(default)]
    pub character_arcs: Vec<CharacterArc>,

    /// Last time the arc was touched; drives retention pruning.
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl ArcRecord {
    /// Open a new arc at a starting chapter.
    pub fn begin(number: u32, theme: impl Into<String>, start_chapter: u32) -> Self {
        Self {
            number,
            theme: theme.into(),
            start_chapter,
            end_chapter: None,
            status: ArcStatus::InProgress,
            milestones: Vec::new(),
            character_arcs: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Chapters elapsed since the arc started.
    pub fn span(&self, current_chapter: u32) -> u32 {
        current_chapter.saturating_sub(self.start_chapter)
    }

    /// Number of achieved milestones.
    pub fn achieved_count(&self) -> usize {
        self.milestones.iter().filter(|m| m.achieved).count()
    }

    /// Whether a milestone of this kind already landed within `window`
    /// chapters of `chapter`. Used to deduplicate repeated detections.
    pub fn has_recent_milestone(&self, kind: MilestoneKind, chapter: u32, window: u32) -> bool {
        self.milestones
            .iter()
            .any(|m| m.kind == kind && chapter.saturating_sub(m.chapter) <= window)
    }

    /// Record a character appearance in this arc.
    pub fn touch_character(&mut self, name: &str, chapter: u32) {
        match self.character_arcs.iter_mut().find(|c| c.name == name) {
            Some(existing) => {
                if existing.last_chapter != chapter {
                    existing.appearances += 1;
                }
                existing.last_chapter = existing.last_chapter.max(chapter);
            }
            None => self.character_arcs.push(CharacterArc {
                name: name.to_string(),
                first_chapter: chapter,
                last_chapter: chapter,
                appearances: 1,
            }),
        }
    }

    /// Close the arc at a final chapter.
    pub fn complete(&mut self, end_chapter: u32) {
        self.end_chapter = Some(end_chapter);
        self.status = ArcStatus::Completed;
        self.updated_at = Utc::now();
    }
}
