//! Built-in keyword-heuristic optimizers.
//!
//! One optimizer per category, reading the chapter's text statistics
//! plus whatever the corresponding analysis section found. Like the
//! analyzers, they share a trait seam with external collaborators.

use crate::analysis::{AnalyzerKind, IntegratedAnalysisResult};
use crate::chapter::ChapterInput;
use crate::optimize::optimizer::{
    ChapterOptimizer, DraftSuggestion, OptimizationBundle, OptimizerError, OptimizerKind, Priority,
};
use crate::text::{count_any, recurring_names, TextStats};
use async_trait::async_trait;

/// The full built-in optimizer set, in sequential execution order.
pub fn builtin_optimizers() -> Vec<std::sync::Arc<dyn ChapterOptimizer>> {
    vec![
        std::sync::Arc::new(ThemeOptimizer),
        std::sync::Arc::new(CharacterOptimizer),
        std::sync::Arc::new(TensionOptimizer),
        std::sync::Arc::new(StyleOptimizer),
    ]
}

/// Priority derived from how weak an analysis score is.
fn priority_for_score(score: f64) -> Priority {
    if score < 4.0 {
        Priority::High
    } else if score < 6.5 {
        Priority::Medium
    } else {
        Priority::Low
    }
}

/// Score from the matching analysis section, or the neutral midpoint if
/// that section is missing or a fallback.
fn section_score(analysis: &IntegratedAnalysisResult, kind: AnalyzerKind) -> f64 {
    analysis
        .section_of_kind(kind)
        .filter(|s| !s.is_fallback())
        .map(|s| s.report.score)
        .unwrap_or(5.0)
}

/// Reinforces the declared theme where it runs thin.
pub struct ThemeOptimizer;

#[async_trait]
impl ChapterOptimizer for ThemeOptimizer {
    fn name(&self) -> &str {
        "theme"
    }

    fn kind(&self) -> OptimizerKind {
        OptimizerKind::Theme
    }

    async fn optimize(
        &self,
        chapter: &ChapterInput,
        analysis: &IntegratedAnalysisResult,
    ) -> Result<OptimizationBundle, OptimizerError> {
        let score = section_score(analysis, AnalyzerKind::Theme);
        let priority = priority_for_score(score);
        let gain = ((7.5 - score) / 10.0).clamp(0.0, 0.6);

        let mut bundle = OptimizationBundle::new(
            format!("theme presence scored {score:.1}; reinforce where it runs thin"),
            gain,
        );

        if let Some(theme) = chapter.context.theme() {
            let lower = chapter.content.to_lowercase();
            if count_any(&lower, &[&theme.to_lowercase()]) == 0 {
                bundle = bundle.with_suggestion(DraftSuggestion::new(
                    format!("ground at least one scene in the \"{theme}\" theme explicitly"),
                    Priority::High,
                    0.8,
                    0.4,
                ));
            } else if score < 7.0 {
                bundle = bundle.with_suggestion(DraftSuggestion::new(
                    format!("deepen the imagery that carries \"{theme}\" through the middle scenes"),
                    priority,
                    0.6,
                    0.5,
                ));
            }
        }
        if score < 6.0 {
            bundle = bundle.with_suggestion(DraftSuggestion::new(
                "echo the opening image in the closing paragraph to bind the chapter thematically",
                priority,
                0.5,
                0.3,
            ));
        }
        Ok(bundle)
    }
}

/// Strengthens character presence and continuity.
pub struct CharacterOptimizer;

#[async_trait]
impl ChapterOptimizer for CharacterOptimizer {
    fn name(&self) -> &str {
        "character"
    }

    fn kind(&self) -> OptimizerKind {
        OptimizerKind::Character
    }

    async fn optimize(
        &self,
        chapter: &ChapterInput,
        analysis: &IntegratedAnalysisResult,
    ) -> Result<OptimizationBundle, OptimizerError> {
        let score = section_score(analysis, AnalyzerKind::Character);
        let priority = priority_for_score(score);
        let stats = TextStats::measure(&chapter.content);
        let names = recurring_names(&chapter.content);

        let mut bundle = OptimizationBundle::new(
            format!("{} recurring characters at score {score:.1}", names.len()),
            ((7.0 - score) / 10.0).clamp(0.0, 0.5),
        );

        if names.is_empty() {
            bundle = bundle.with_suggestion(DraftSuggestion::new(
                "anchor the chapter on a named viewpoint character",
                Priority::High,
                0.9,
                0.6,
            ));
        } else if score < 6.5 {
            bundle = bundle.with_suggestion(DraftSuggestion::new(
                format!(
                    "give {} an introspective beat that shows what this chapter costs them",
                    names[0]
                ),
                priority,
                0.6,
                0.4,
            ));
        }
        if stats.dialogue_share() < 0.15 && stats.word_count > 100 {
            bundle = bundle.with_suggestion(DraftSuggestion::new(
                "convert at least one summarized exchange into spoken dialogue",
                Priority::Medium,
                0.5,
                0.3,
            ));
        }
        Ok(bundle)
    }
}

/// Adjusts tension against the declared direction hint.
pub struct TensionOptimizer;

#[async_trait]
impl ChapterOptimizer for TensionOptimizer {
    fn name(&self) -> &str {
        "tension"
    }

    fn kind(&self) -> OptimizerKind {
        OptimizerKind::Tension
    }

    async fn optimize(
        &self,
        chapter: &ChapterInput,
        analysis: &IntegratedAnalysisResult,
    ) -> Result<OptimizationBundle, OptimizerError> {
        let score = section_score(analysis, AnalyzerKind::ReaderExperience);
        let lower = chapter.content.to_lowercase();
        let stats = TextStats::measure(&chapter.content);
        let tension_markers = count_any(
            &lower,
            &["danger", "threat", "too late", "no way out", "trapped", "risk"],
        );
        let density = stats.per_hundred_words(tension_markers);
        let wants_raise = chapter.context.tension() == Some("raise");

        let mut bundle = OptimizationBundle::new(
            format!("tension density {density:.1} per hundred words"),
            ((7.0 - score) / 10.0).clamp(0.0, 0.5),
        );

        if wants_raise || density < 0.5 {
            bundle = bundle.with_suggestion(DraftSuggestion::new(
                "quicken the pace through the back half; shorten scenes as the stakes rise",
                if wants_raise { Priority::High } else { Priority::Medium },
                0.7,
                0.4,
            ));
        }
        if chapter.context.tension() == Some("ease") && density > 1.5 {
            bundle = bundle.with_suggestion(DraftSuggestion::new(
                "let the aftermath land; the chapter never stops escalating",
                Priority::Medium,
                0.5,
                0.4,
            ));
        }
        if stats.question_count == 0 && stats.word_count > 100 {
            bundle = bundle.with_suggestion(DraftSuggestion::new(
                "leave one question unanswered at the chapter break",
                Priority::Low,
                0.4,
                0.2,
            ));
        }
        Ok(bundle)
    }
}

/// Polishes prose rhythm and vocabulary.
pub struct StyleOptimizer;

#[async_trait]
impl ChapterOptimizer for StyleOptimizer {
    fn name(&self) -> &str {
        "style"
    }

    fn kind(&self) -> OptimizerKind {
        OptimizerKind::Style
    }

    async fn optimize(
        &self,
        chapter: &ChapterInput,
        analysis: &IntegratedAnalysisResult,
    ) -> Result<OptimizationBundle, OptimizerError> {
        if chapter.content.trim().is_empty() {
            return Err(OptimizerError::Failed("empty chapter".to_string()));
        }

        let score = section_score(analysis, AnalyzerKind::Style);
        let stats = TextStats::measure(&chapter.content);
        let priority = priority_for_score(score);

        let mut bundle = OptimizationBundle::new(
            format!("style scored {score:.1}; mean sentence {:.0} words", stats.avg_sentence_words),
            ((7.5 - score) / 10.0).clamp(0.0, 0.5),
        );

        if stats.avg_sentence_words > 28.0 {
            bundle = bundle.with_suggestion(DraftSuggestion::new(
                "break the longest sentences; the average runs past easy reading",
                priority,
                0.6,
                0.3,
            ));
        }
        if stats.avg_sentence_words < 9.0 && stats.sentence_count >= 5 {
            bundle = bundle.with_suggestion(DraftSuggestion::new(
                "slow the pacing in quiet scenes; clipped sentences give nothing room to breathe",
                Priority::Medium,
                0.5,
                0.3,
            ));
        }
        if stats.unique_word_ratio < 0.4 && stats.word_count > 200 {
            bundle = bundle.with_suggestion(DraftSuggestion::new(
                "vary the vocabulary; repeated words flatten the prose",
                Priority::Low,
                0.4,
                0.4,
            ));
        }
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chapter::ChapterContext;

    fn analysis_for(chapter: &ChapterInput) -> IntegratedAnalysisResult {
        IntegratedAnalysisResult::fallback(chapter.number)
    }

    #[tokio::test]
    async fn test_theme_optimizer_flags_missing_declared_theme() {
        let chapter = ChapterInput::new(1, "The cart rolled along the road all morning.")
            .with_context(ChapterContext::new().with("theme", "betrayal"));
        let bundle = ThemeOptimizer
            .optimize(&chapter, &analysis_for(&chapter))
            .await
            .unwrap();

        assert!(bundle
            .suggestions
            .iter()
            .any(|s| s.priority == Priority::High && s.text.contains("betrayal")));
    }

    #[tokio::test]
    async fn test_tension_optimizer_honors_raise_hint() {
        let chapter = ChapterInput::new(2, "They talked about the harvest for a while.")
            .with_context(ChapterContext::new().with("tension", "raise"));
        let bundle = TensionOptimizer
            .optimize(&chapter, &analysis_for(&chapter))
            .await
            .unwrap();

        assert!(bundle
            .suggestions
            .iter()
            .any(|s| s.priority == Priority::High && s.text.contains("quicken the pace")));
    }

    #[tokio::test]
    async fn test_style_optimizer_fails_on_empty_chapter() {
        let chapter = ChapterInput::new(3, "   ");
        let result = StyleOptimizer.optimize(&chapter, &analysis_for(&chapter)).await;
        assert!(matches!(result, Err(OptimizerError::Failed(_))));
    }

    #[tokio::test]
    async fn test_character_optimizer_asks_for_dialogue_when_absent() {
        let text = "The long report described the province in exhaustive detail. ".repeat(10);
        let chapter = ChapterInput::new(4, text);
        let bundle = CharacterOptimizer
            .optimize(&chapter, &analysis_for(&chapter))
            .await
            .unwrap();

        assert!(bundle.suggestions.iter().any(|s| s.text.contains("dialogue")));
    }

    #[tokio::test]
    async fn test_gains_stay_in_range() {
        let chapter = ChapterInput::new(5, "Mara ran until the bells stopped.");
        let analysis = analysis_for(&chapter);
        for optimizer in builtin_optimizers() {
            if let Ok(bundle) = optimizer.optimize(&chapter, &analysis).await {
                assert!((0.0..=1.0).contains(&bundle.expected_gain), "{}", optimizer.name());
            }
        }
    }
}
