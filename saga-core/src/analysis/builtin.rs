//! Built-in keyword-heuristic analyzers.
//!
//! One analyzer per dimension, all driven by [`TextStats`] and the phrase
//! helpers in [`crate::text`]. They share the trait seam with external
//! collaborators, so a composition can mix heuristic and remote analyzers
//! freely.

use crate::analysis::analyzer::{AnalyzerError, AnalyzerKind, AnalyzerReport, ChapterAnalyzer};
use crate::chapter::ChapterInput;
use crate::memory::MemoryHit;
use crate::text::{contains_any, count_any, recurring_names, TextStats};
use async_trait::async_trait;

/// The full built-in analyzer set, in sequential execution order.
pub fn builtin_analyzers() -> Vec<std::sync::Arc<dyn ChapterAnalyzer>> {
    vec![
        std::sync::Arc::new(ThemeAnalyzer),
        std::sync::Arc::new(CharacterAnalyzer),
        std::sync::Arc::new(NarrativeStructureAnalyzer),
        std::sync::Arc::new(StyleAnalyzer),
        std::sync::Arc::new(ReaderExperienceAnalyzer),
    ]
}

const THEME_MARKERS: &[&str] = &[
    "redemption", "betrayal", "sacrifice", "loyalty", "revenge", "forgiveness",
    "power", "freedom", "identity", "loss", "hope", "duty",
];

const EMOTION_MARKERS: &[&str] = &[
    "fear", "joy", "grief", "anger", "love", "despair", "relief", "dread",
    "wept", "laughed", "trembled",
];

const STRUCTURE_MARKERS: &[&str] = &[
    "meanwhile", "later", "before", "suddenly", "at last", "finally",
    "that night", "the next morning",
];

/// Scores how strongly the declared theme (or any recognizable theme)
/// runs through the chapter.
pub struct ThemeAnalyzer;

#[async_trait]
impl ChapterAnalyzer for ThemeAnalyzer {
    fn name(&self) -> &str {
        "theme"
    }

    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Theme
    }

    async fn analyze(
        &self,
        chapter: &ChapterInput,
        related: &[MemoryHit],
    ) -> Result<AnalyzerReport, AnalyzerError> {
        let lower = chapter.content.to_lowercase();
        let stats = TextStats::measure(&chapter.content);

        let declared = chapter.context.theme().map(str::to_lowercase);
        let declared_hits = declared
            .as_deref()
            .map(|t| count_any(&lower, &[t]))
            .unwrap_or(0);
        let generic_hits = count_any(&lower, THEME_MARKERS);
        let density = stats.per_hundred_words(declared_hits * 2 + generic_hits);

        let mut score = 4.0 + density * 1.5;
        if declared.is_some() && declared_hits == 0 {
            score -= 1.0;
        }
        if !related.is_empty() {
            // Earlier chapters matching the same vocabulary suggest the
            // theme is carried across instalments, not just this one.
            score += 0.5;
        }

        let mut report = AnalyzerReport::new(
            format!(
                "thematic density {:.1} per hundred words across {} words",
                density, stats.word_count
            ),
            score,
        );
        if let Some(theme) = &declared {
            if declared_hits == 0 {
                report = report
                    .with_finding(format!("declared theme \"{theme}\" never surfaces"))
                    .with_suggestion(format!(
                        "weave the \"{theme}\" theme into at least one scene"
                    ));
            } else {
                report =
                    report.with_finding(format!("theme \"{theme}\" appears {declared_hits} times"));
            }
        }
        if generic_hits == 0 && declared_hits == 0 {
            report = report.with_suggestion("anchor the chapter to a recognizable theme");
        }
        Ok(report)
    }
}

/// Scores the presence and continuity of characters.
pub struct CharacterAnalyzer;

#[async_trait]
impl ChapterAnalyzer for CharacterAnalyzer {
    fn name(&self) -> &str {
        "character"
    }

    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Character
    }

    async fn analyze(
        &self,
        chapter: &ChapterInput,
        related: &[MemoryHit],
    ) -> Result<AnalyzerReport, AnalyzerError> {
        let names = recurring_names(&chapter.content);
        let stats = TextStats::measure(&chapter.content);
        let lower = chapter.content.to_lowercase();
        let emotional = count_any(&lower, EMOTION_MARKERS);

        let mut score = 3.0 + names.len() as f64 * 1.2 + stats.dialogue_share() * 2.0;
        score += (stats.per_hundred_words(emotional) * 0.8).min(1.5);

        let continuity = related
            .iter()
            .filter(|hit| {
                let excerpt = &hit.excerpt;
                names.iter().any(|n| excerpt.contains(n.as_str()))
            })
            .count();
        if continuity > 0 {
            score += 0.5;
        }

        let mut report = AnalyzerReport::new(
            format!(
                "{} recurring characters, dialogue share {:.0}%",
                names.len(),
                stats.dialogue_share() * 100.0
            ),
            score,
        );
        for name in names.iter().take(3) {
            report = report.with_finding(format!("recurring character: {name}"));
        }
        if names.is_empty() {
            report = report.with_suggestion("give at least one character a repeated presence");
        }
        if stats.dialogue_share() < 0.1 {
            report = report.with_suggestion("let characters speak; dialogue is nearly absent");
        }
        Ok(report)
    }
}

/// Scores scene sequencing and paragraph shape.
pub struct NarrativeStructureAnalyzer;

#[async_trait]
impl ChapterAnalyzer for NarrativeStructureAnalyzer {
    fn name(&self) -> &str {
        "narrative_structure"
    }

    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::NarrativeStructure
    }

    async fn analyze(
        &self,
        chapter: &ChapterInput,
        _related: &[MemoryHit],
    ) -> Result<AnalyzerReport, AnalyzerError> {
        let stats = TextStats::measure(&chapter.content);
        let lower = chapter.content.to_lowercase();
        let transitions = count_any(&lower, STRUCTURE_MARKERS);

        let mut score = 4.0;
        if stats.paragraph_count >= 3 {
            score += 1.5;
        }
        score += (transitions as f64 * 0.5).min(2.0);
        if stats.sentence_count > 0 && stats.avg_sentence_words > 35.0 {
            score -= 1.0;
        }

        let mut report = AnalyzerReport::new(
            format!(
                "{} paragraphs, {} transition markers",
                stats.paragraph_count, transitions
            ),
            score,
        );
        if stats.paragraph_count < 3 {
            report = report.with_suggestion("break the chapter into more scenes or paragraphs");
        }
        if transitions == 0 {
            report = report.with_suggestion("signal scene changes with transition phrases");
        }
        Ok(report)
    }
}

/// Scores prose surface quality: sentence rhythm and vocabulary range.
pub struct StyleAnalyzer;

#[async_trait]
impl ChapterAnalyzer for StyleAnalyzer {
    fn name(&self) -> &str {
        "style"
    }

    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Style
    }

    async fn analyze(
        &self,
        chapter: &ChapterInput,
        _related: &[MemoryHit],
    ) -> Result<AnalyzerReport, AnalyzerError> {
        let stats = TextStats::measure(&chapter.content);
        if stats.word_count == 0 {
            return Err(AnalyzerError::Failed("empty chapter".to_string()));
        }

        let mut score = 4.0 + stats.unique_word_ratio * 4.0;
        // Flat sentence rhythm reads monotone; some variance is healthy.
        if stats.sentence_length_stddev >= 4.0 {
            score += 1.0;
        }
        if stats.avg_sentence_words > 30.0 {
            score -= 1.5;
        }

        let mut report = AnalyzerReport::new(
            format!(
                "vocabulary richness {:.0}%, mean sentence {:.0} words",
                stats.unique_word_ratio * 100.0,
                stats.avg_sentence_words
            ),
            score,
        );
        if stats.avg_sentence_words > 30.0 {
            report = report.with_suggestion("shorten sentences; the average runs long");
        }
        if stats.sentence_length_stddev < 2.0 && stats.sentence_count >= 5 {
            report = report.with_suggestion("vary sentence length to break the monotone rhythm");
        }
        Ok(report)
    }
}

const HOOK_MARKERS: &[&str] = &[
    "but", "until", "unless", "what if", "too late", "no one knew",
    "little did", "everything changed",
];

/// Scores the chapter as a reading experience: hooks, questions, payoff.
pub struct ReaderExperienceAnalyzer;

#[async_trait]
impl ChapterAnalyzer for ReaderExperienceAnalyzer {
    fn name(&self) -> &str {
        "reader_experience"
    }

    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::ReaderExperience
    }

    async fn analyze(
        &self,
        chapter: &ChapterInput,
        _related: &[MemoryHit],
    ) -> Result<AnalyzerReport, AnalyzerError> {
        let stats = TextStats::measure(&chapter.content);
        let lower = chapter.content.to_lowercase();
        let hooks = count_any(&lower, HOOK_MARKERS);

        let mut score = 4.0
            + (stats.per_hundred_words(hooks) * 1.2).min(2.5)
            + (stats.question_count as f64 * 0.3).min(1.5);
        if let Some(target) = chapter.context.target_length() {
            let ratio = stats.word_count as f64 / target.max(1) as f64;
            if !(0.6..=1.5).contains(&ratio) {
                score -= 1.0;
            }
        }

        // Look at roughly the last 200 characters, cut at a char boundary.
        let tail_start = lower
            .char_indices()
            .rev()
            .nth(199)
            .map(|(i, _)| i)
            .unwrap_or(0);
        let ends_on_hook = contains_any(&lower[tail_start..], &["but", "then", "until"])
            || lower.trim_end().ends_with('?');
        if ends_on_hook {
            score += 0.5;
        }

        let mut report = AnalyzerReport::new(
            format!("{hooks} tension hooks, {} open questions", stats.question_count),
            score,
        );
        if hooks == 0 {
            report = report.with_suggestion("add a hook that makes the reader need the next page");
        }
        if !ends_on_hook {
            report = report.with_suggestion("end the chapter on an unresolved beat");
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chapter::ChapterContext;

    fn chapter(text: &str) -> ChapterInput {
        ChapterInput::new(1, text)
    }

    #[tokio::test]
    async fn test_theme_analyzer_rewards_declared_theme() {
        let with_theme = ChapterInput::new(
            1,
            "Redemption was all Mara wanted. Each dawn she chased redemption again.",
        )
        .with_context(ChapterContext::new().with("theme", "redemption"));
        let without = chapter("The cart rolled along the road. Nothing else happened there.");

        let hit = ThemeAnalyzer.analyze(&with_theme, &[]).await.unwrap();
        let miss = ThemeAnalyzer.analyze(&without, &[]).await.unwrap();
        assert!(hit.score > miss.score);
    }

    #[tokio::test]
    async fn test_theme_analyzer_flags_absent_declared_theme() {
        let ch = chapter("The cart rolled along the dusty road toward town.")
            .with_context(ChapterContext::new().with("theme", "betrayal"));
        let report = ThemeAnalyzer.analyze(&ch, &[]).await.unwrap();
        assert!(report.findings.iter().any(|f| f.contains("betrayal")));
    }

    #[tokio::test]
    async fn test_character_analyzer_counts_recurring_names() {
        let ch = chapter(
            "At noon, Karim drew his blade. \"Stand down,\" said Karim. \
             Across the yard, Wren laughed, and Wren did not stand down.",
        );
        let report = CharacterAnalyzer.analyze(&ch, &[]).await.unwrap();
        assert!(report.findings.iter().any(|f| f.contains("Karim")));
        assert!(report.findings.iter().any(|f| f.contains("Wren")));
    }

    #[tokio::test]
    async fn test_style_analyzer_fails_on_empty_chapter() {
        let result = StyleAnalyzer.analyze(&chapter(""), &[]).await;
        assert!(matches!(result, Err(AnalyzerError::Failed(_))));
    }

    #[tokio::test]
    async fn test_reader_experience_rewards_hooks() {
        let hooked = chapter(
            "Everything changed at midnight. No one knew the gate stood open. \
             Who had drawn the bolt? But the answer would wait until dawn.",
        );
        let flat = chapter("The inventory was counted. The ledger was closed. All was in order.");

        let hooked_report = ReaderExperienceAnalyzer.analyze(&hooked, &[]).await.unwrap();
        let flat_report = ReaderExperienceAnalyzer.analyze(&flat, &[]).await.unwrap();
        assert!(hooked_report.score > flat_report.score);
    }

    #[tokio::test]
    async fn test_all_builtin_scores_stay_in_range() {
        let long = "Mara ran. The bells rang. Betrayal! Who did this? \"Run,\" said Tomas.\n\n\
                    Meanwhile the river rose. Suddenly all was fire and fear and grief. "
            .repeat(20);
        let texts: [&str; 3] = ["", "One word.", &long];
        for analyzer in builtin_analyzers() {
            for text in &texts {
                if let Ok(report) = analyzer.analyze(&chapter(text), &[]).await {
                    assert!(
                        (1.0..=10.0).contains(&report.score),
                        "{} out of range on {:?}",
                        analyzer.name(),
                        &text[..text.len().min(20)]
                    );
                }
            }
        }
    }
}
