//! Heuristic quality scoring across ten prose dimensions.
//!
//! Every dimension lands on a 1-10 scale. The built-in scorer is a set of
//! surface heuristics over [`TextStats`] and small keyword tables; the
//! trait is the seam for plugging in a different judge.

use crate::chapter::ChapterInput;
use crate::text::{count_any, recurring_names, TextStats};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Lowest score any dimension can take.
pub const SCORE_FLOOR: f64 = 1.0;

/// Highest score any dimension can take.
pub const SCORE_CEILING: f64 = 10.0;

/// Dimension weights used for the overall score. They sum to 1.0.
pub const DIMENSION_WEIGHTS: [(&str, f64); 10] = [
    ("readability", 0.10),
    ("consistency", 0.10),
    ("engagement", 0.15),
    ("character_development", 0.10),
    ("plot_coherence", 0.15),
    ("dialogue_quality", 0.08),
    ("descriptive_quality", 0.07),
    ("pacing", 0.10),
    ("thematic_consistency", 0.07),
    ("emotional_impact", 0.08),
];

/// Per-dimension quality scores, each in [1, 10].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScores {
    pub readability: f64,
    pub consistency: f64,
    pub engagement: f64,
    pub character_development: f64,
    pub plot_coherence: f64,
    pub dialogue_quality: f64,
    pub descriptive_quality: f64,
    pub pacing: f64,
    pub thematic_consistency: f64,
    pub emotional_impact: f64,
}

impl Default for DimensionScores {
    /// Neutral midpoint scores, used by fallback results.
    fn default() -> Self {
        Self::uniform(5.0)
    }
}

impl DimensionScores {
    /// Every dimension set to the same value.
    pub fn uniform(value: f64) -> Self {
        let v = value.clamp(SCORE_FLOOR, SCORE_CEILING);
        Self {
            readability: v,
            consistency: v,
            engagement: v,
            character_development: v,
            plot_coherence: v,
            dialogue_quality: v,
            descriptive_quality: v,
            pacing: v,
            thematic_consistency: v,
            emotional_impact: v,
        }
    }

    /// Dimension values in weight-table order.
    pub fn as_pairs(&self) -> [(&'static str, f64); 10] {
        [
            ("readability", self.readability),
            ("consistency", self.consistency),
            ("engagement", self.engagement),
            ("character_development", self.character_development),
            ("plot_coherence", self.plot_coherence),
            ("dialogue_quality", self.dialogue_quality),
            ("descriptive_quality", self.descriptive_quality),
            ("pacing", self.pacing),
            ("thematic_consistency", self.thematic_consistency),
            ("emotional_impact", self.emotional_impact),
        ]
    }

    /// Clamp every dimension into [1, 10].
    pub fn clamped(mut self) -> Self {
        for value in [
            &mut self.readability,
            &mut self.consistency,
            &mut self.engagement,
            &mut self.character_development,
            &mut self.plot_coherence,
            &mut self.dialogue_quality,
            &mut self.descriptive_quality,
            &mut self.pacing,
            &mut self.thematic_consistency,
            &mut self.emotional_impact,
        ] {
            *value = value.clamp(SCORE_FLOOR, SCORE_CEILING);
        }
        self
    }

    /// Weighted overall score, in [1, 10].
    pub fn overall(&self) -> f64 {
        self.as_pairs()
            .iter()
            .zip(DIMENSION_WEIGHTS.iter())
            .map(|((_, value), (_, weight))| value * weight)
            .sum()
    }

    /// The weakest dimensions, lowest first.
    pub fn weakest(&self, count: usize) -> Vec<(&'static str, f64)> {
        let mut pairs = self.as_pairs().to_vec();
        pairs.sort_by(|a, b| a.1.total_cmp(&b.1));
        pairs.truncate(count);
        pairs
    }
}

/// Quality judgment seam used by the metrics tracker.
pub trait QualityScoring: Send + Sync {
    /// Score one chapter across all dimensions. Implementations must
    /// return values already inside [1, 10].
    fn score(&self, chapter: &ChapterInput) -> DimensionScores;
}

static ENGAGEMENT_WORDS: Lazy<HashSet<&str>> = Lazy::new(|| {
    [
        "ran", "leapt", "struck", "chased", "fled", "grabbed", "screamed", "burst", "danger",
        "threat", "risk", "suddenly", "raced", "lunged",
    ]
    .into_iter()
    .collect()
});

static EMOTION_WORDS: Lazy<HashSet<&str>> = Lazy::new(|| {
    [
        "fear", "joy", "grief", "rage", "hope", "despair", "love", "dread", "relief", "shame",
        "longing", "fury", "sorrow", "wonder",
    ]
    .into_iter()
    .collect()
});

static SENSORY_WORDS: Lazy<HashSet<&str>> = Lazy::new(|| {
    [
        "gleamed", "cold", "warm", "rough", "smooth", "scent", "smell", "taste", "echo",
        "crimson", "golden", "shadow", "glow", "damp", "bitter", "salt",
    ]
    .into_iter()
    .collect()
});

static GROWTH_WORDS: Lazy<HashSet<&str>> = Lazy::new(|| {
    [
        "realized", "understood", "decided", "learned", "remembered", "vowed", "admitted",
        "forgave", "regretted", "resolved",
    ]
    .into_iter()
    .collect()
});

static CONNECTIVE_WORDS: Lazy<HashSet<&str>> = Lazy::new(|| {
    [
        "because", "therefore", "meanwhile", "however", "after", "before", "then", "since",
        "until", "although",
    ]
    .into_iter()
    .collect()
});

static FORMAL_MARKERS: &[&str] = &["moreover", "thus", "indeed", "shall", "hence"];
static INFORMAL_MARKERS: &[&str] = &["gonna", "yeah", "okay", "kinda", "stuff"];

/// Deterministic surface-heuristic scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicScoring;

impl HeuristicScoring {
    /// Create the default scorer.
    pub fn new() -> Self {
        Self
    }
}

impl QualityScoring for HeuristicScoring {
    fn score(&self, chapter: &ChapterInput) -> DimensionScores {
        let stats = TextStats::measure(&chapter.content);
        if stats.word_count == 0 {
            return DimensionScores::uniform(SCORE_FLOOR);
        }

        let lower = chapter.content.to_lowercase();
        let word_set_count = |set: &HashSet<&str>| -> usize {
            lower
                .split_whitespace()
                .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
                .filter(|w| set.contains(w))
                .count()
        };

        let scores = DimensionScores {
            readability: readability(&stats),
            consistency: consistency(&stats, &lower),
            engagement: engagement(&stats, word_set_count(&ENGAGEMENT_WORDS)),
            character_development: character_development(
                &stats,
                word_set_count(&GROWTH_WORDS),
                &chapter.content,
            ),
            plot_coherence: plot_coherence(&stats, word_set_count(&CONNECTIVE_WORDS)),
            dialogue_quality: dialogue_quality(&stats),
            descriptive_quality: descriptive_quality(&stats, word_set_count(&SENSORY_WORDS)),
            pacing: pacing(&stats),
            thematic_consistency: thematic_consistency(&stats, &lower, chapter),
            emotional_impact: emotional_impact(&stats, word_set_count(&EMOTION_WORDS)),
        };
        scores.clamped()
    }
}

/// Sentence and word length against a comfortable reading band.
fn readability(stats: &TextStats) -> f64 {
    let s = stats.avg_sentence_words;
    let sentence_penalty = if s < 10.0 {
        (10.0 - s) * 0.25
    } else if s > 20.0 {
        (s - 20.0) * 0.3
    } else {
        0.0
    };
    let word_penalty = (stats.avg_word_chars - 6.0).max(0.0) * 0.8;
    8.0 - sentence_penalty - word_penalty
}

/// Register stability: mixing formal and informal markers costs points,
/// as does heavy word repetition.
fn consistency(stats: &TextStats, lower: &str) -> f64 {
    let formal = count_any(lower, FORMAL_MARKERS);
    let informal = count_any(lower, INFORMAL_MARKERS);
    let mixing_penalty = formal.min(informal) as f64 * 1.5;
    let repetition_penalty = if stats.unique_word_ratio < 0.3 { 1.0 } else { 0.0 };
    8.0 - mixing_penalty - repetition_penalty
}

/// Action density, dialogue presence and direct questions.
fn engagement(stats: &TextStats, action_hits: usize) -> f64 {
    let density = stats.per_hundred_words(action_hits);
    let question_bonus = if stats.question_count > 0 { 0.5 } else { 0.0 };
    4.0 + (density * 1.2).min(3.5) + stats.dialogue_share() * 2.0 + question_bonus
}

/// Interior growth vocabulary plus named recurring characters.
fn character_development(stats: &TextStats, growth_hits: usize, content: &str) -> f64 {
    let density = stats.per_hundred_words(growth_hits);
    let name_bonus = if recurring_names(content).is_empty() { 0.0 } else { 1.5 };
    4.0 + (density * 1.5).min(3.0) + name_bonus
}

/// Connective tissue between sentences and multi-paragraph structure.
fn plot_coherence(stats: &TextStats, connective_hits: usize) -> f64 {
    let density = stats.per_hundred_words(connective_hits);
    let structure_bonus = if stats.paragraph_count >= 2 { 1.0 } else { 0.0 };
    4.5 + (density * 1.0).min(3.0) + structure_bonus
}

/// Dialogue share against an ideal band around forty percent.
fn dialogue_quality(stats: &TextStats) -> f64 {
    if stats.dialogue_segments == 0 {
        return 4.0;
    }
    let share = stats.dialogue_share();
    let fit = (1.0 - (share - 0.4).abs() / 0.4).clamp(0.0, 1.0);
    5.0 + 3.0 * fit
}

/// Sensory vocabulary density.
fn descriptive_quality(stats: &TextStats, sensory_hits: usize) -> f64 {
    4.0 + (stats.per_hundred_words(sensory_hits) * 1.3).min(4.0)
}

/// Sentence length variation: flat rhythm and wild swings both read badly.
fn pacing(stats: &TextStats) -> f64 {
    let fit = 1.0 - ((stats.sentence_length_stddev - 8.0) / 8.0).abs().min(1.0);
    4.0 + 4.0 * fit
}

/// Recurrence of the declared theme in the text. Without a declared theme
/// this stays neutral.
fn thematic_consistency(stats: &TextStats, lower: &str, chapter: &ChapterInput) -> f64 {
    let Some(theme) = chapter.context.theme() else {
        return 6.0;
    };
    let theme_lower = theme.to_lowercase();
    let theme_words: Vec<&str> = theme_lower
        .split_whitespace()
        .filter(|w| w.len() >= 3)
        .collect();
    if theme_words.is_empty() {
        return 6.0;
    }
    let hits = count_any(lower, &theme_words);
    if hits == 0 {
        return 3.5;
    }
    5.0 + (stats.per_hundred_words(hits) * 3.0).min(3.5)
}

/// Emotion vocabulary plus restrained exclamation use.
fn emotional_impact(stats: &TextStats, emotion_hits: usize) -> f64 {
    let density = stats.per_hundred_words(emotion_hits);
    let exclaim_bonus = (stats.exclamation_count.min(3) as f64) * 0.4;
    4.0 + (density * 1.5).min(4.0) + exclaim_bonus
}
