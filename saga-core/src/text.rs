//! Text measurement helpers shared by the built-in heuristics.
//!
//! Everything here is deterministic and allocation-light; the analyzers,
//! the quality scorer and the progression signals all lean on it.

use std::collections::HashSet;

/// Check if `text` contains `phrase` at word boundaries.
///
/// A boundary is the start/end of string or a non-alphanumeric character,
/// so "rage" does not match inside "courage". Multi-word phrases match as
/// a unit. Both sides are expected in lowercase.
pub fn contains_phrase(text: &str, phrase: &str) -> bool {
    count_phrase(text, phrase) > 0
}

/// Count word-boundary occurrences of `phrase` in `text`.
pub fn count_phrase(text: &str, phrase: &str) -> usize {
    if phrase.is_empty() {
        return 0;
    }

    let text_bytes = text.as_bytes();
    let phrase_bytes = phrase.as_bytes();
    let text_len = text_bytes.len();
    let phrase_len = phrase_bytes.len();

    if phrase_len > text_len {
        return 0;
    }

    let mut count = 0;
    let mut i = 0;
    while i + phrase_len <= text_len {
        if &text_bytes[i..i + phrase_len] == phrase_bytes {
            let left_ok = i == 0 || !text_bytes[i - 1].is_ascii_alphanumeric();
            let right_ok =
                i + phrase_len == text_len || !text_bytes[i + phrase_len].is_ascii_alphanumeric();
            if left_ok && right_ok {
                count += 1;
                i += phrase_len;
                continue;
            }
        }
        i += 1;
    }

    count
}

/// Count occurrences of any phrase in `markers`, against lowercased text.
pub fn count_any(text_lower: &str, markers: &[&str]) -> usize {
    markers.iter().map(|m| count_phrase(text_lower, m)).sum()
}

/// Whether any phrase in `markers` occurs, against lowercased text.
pub fn contains_any(text_lower: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| contains_phrase(text_lower, m))
}

/// Capitalized tokens that recur, used as a cheap proper-name detector.
///
/// Tokens at sentence starts are skipped so ordinary sentence-initial words
/// do not register, and a name must appear at least twice to count.
pub fn recurring_names(text: &str) -> Vec<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut sentence_start = true;

    for raw in text.split_whitespace() {
        let token = raw.trim_matches(|c: char| !c.is_alphanumeric());
        let ends_sentence = raw.ends_with(['.', '!', '?']);

        if token.len() >= 3 && !sentence_start {
            let mut chars = token.chars();
            let capitalized = chars.next().is_some_and(|c| c.is_uppercase())
                && chars.all(|c| c.is_lowercase());
            if capitalized {
                match counts.iter_mut().find(|(name, _)| name == token) {
                    Some((_, n)) => *n += 1,
                    None => counts.push((token.to_string(), 1)),
                }
            }
        }

        sentence_start = ends_sentence;
    }

    counts
        .into_iter()
        .filter(|(_, n)| *n >= 2)
        .map(|(name, _)| name)
        .collect()
}

/// Surface statistics for a block of prose.
#[derive(Debug, Clone, Default)]
pub struct TextStats {
    /// Whitespace-separated words.
    pub word_count: usize,
    /// Sentences, split on terminal punctuation.
    pub sentence_count: usize,
    /// Paragraphs, split on blank lines.
    pub paragraph_count: usize,
    /// Quoted spans, a proxy for dialogue volume.
    pub dialogue_segments: usize,
    /// Question marks.
    pub question_count: usize,
    /// Exclamation marks.
    pub exclamation_count: usize,
    /// Mean words per sentence.
    pub avg_sentence_words: f64,
    /// Mean characters per word.
    pub avg_word_chars: f64,
    /// Distinct lowercase words over total words.
    pub unique_word_ratio: f64,
    /// Population standard deviation of sentence word counts.
    pub sentence_length_stddev: f64,
}

impl TextStats {
    /// Measure a block of text.
    pub fn measure(text: &str) -> Self {
        let words: Vec<&str> = text.split_whitespace().collect();
        let word_count = words.len();

        let avg_word_chars = if word_count == 0 {
            0.0
        } else {
            words.iter().map(|w| w.chars().count()).sum::<usize>() as f64 / word_count as f64
        };

        let mut unique: HashSet<String> = HashSet::new();
        for word in &words {
            let cleaned: String = word
                .chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect();
            if !cleaned.is_empty() {
                unique.insert(cleaned);
            }
        }
        let unique_word_ratio = if word_count == 0 {
            0.0
        } else {
            unique.len() as f64 / word_count as f64
        };

        let sentence_lengths = sentence_word_counts(text);
        let sentence_count = sentence_lengths.len();
        let avg_sentence_words = if sentence_count == 0 {
            0.0
        } else {
            sentence_lengths.iter().sum::<usize>() as f64 / sentence_count as f64
        };
        let sentence_length_stddev = if sentence_count == 0 {
            0.0
        } else {
            let mean = avg_sentence_words;
            let variance = sentence_lengths
                .iter()
                .map(|&len| {
                    let d = len as f64 - mean;
                    d * d
                })
                .sum::<f64>()
                / sentence_count as f64;
            variance.sqrt()
        };

        let paragraph_count = text
            .split("\n\n")
            .filter(|p| !p.trim().is_empty())
            .count()
            .max(usize::from(!text.trim().is_empty()));

        // Straight quotes come in pairs; curly text has one opener per span.
        let dialogue_segments =
            text.matches('"').count() / 2 + text.matches('\u{201c}').count();

        Self {
            word_count,
            sentence_count,
            paragraph_count,
            dialogue_segments,
            question_count: text.matches('?').count(),
            exclamation_count: text.matches('!').count(),
            avg_sentence_words,
            avg_word_chars,
            unique_word_ratio,
            sentence_length_stddev,
        }
    }

    /// Share of sentences that carry dialogue, in [0, 1].
    pub fn dialogue_share(&self) -> f64 {
        if self.sentence_count == 0 {
            0.0
        } else {
            (self.dialogue_segments as f64 / self.sentence_count as f64).min(1.0)
        }
    }

    /// Occurrences per hundred words, for keyword-density heuristics.
    pub fn per_hundred_words(&self, occurrences: usize) -> f64 {
        if self.word_count == 0 {
            0.0
        } else {
            occurrences as f64 * 100.0 / self.word_count as f64
        }
    }
}

fn sentence_word_counts(text: &str) -> Vec<usize> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.split_whitespace().count())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phrase_matching_respects_word_boundaries() {
        assert!(contains_phrase("the storm broke", "storm"));
        assert!(!contains_phrase("the brainstorm session", "storm"));
        assert!(contains_phrase("a turning point came", "turning point"));
        assert!(contains_phrase("storm", "storm"));
        assert!(!contains_phrase("sto", "storm"));
        assert!(!contains_phrase("storm", ""));
    }

    #[test]
    fn test_phrase_counting() {
        assert_eq!(count_phrase("war. war never changes. postwar", "war"), 2);
        assert_eq!(count_any("fire and ice and fire", &["fire", "ice"]), 3);
    }

    #[test]
    fn test_recurring_names() {
        let text = "At dawn, Mira walked out. The road suited Mira better than the town. \
                    Someone called Jonas once.";
        let names = recurring_names(text);
        assert!(names.contains(&"Mira".to_string()));
        assert!(!names.contains(&"Jonas".to_string()), "single mention should not count");
        assert!(!names.contains(&"The".to_string()), "sentence starts should not count");
    }

    #[test]
    fn test_stats_on_simple_text() {
        let stats = TextStats::measure("One two three. Four five? \"Six!\"\n\nSeven eight.");
        assert_eq!(stats.sentence_count, 4);
        assert_eq!(stats.paragraph_count, 2);
        assert_eq!(stats.question_count, 1);
        assert_eq!(stats.exclamation_count, 1);
        assert!(stats.word_count >= 8);
    }

    #[test]
    fn test_stats_on_empty_text() {
        let stats = TextStats::measure("");
        assert_eq!(stats.word_count, 0);
        assert_eq!(stats.sentence_count, 0);
        assert_eq!(stats.avg_sentence_words, 0.0);
        assert_eq!(stats.dialogue_share(), 0.0);
    }

    #[test]
    fn test_per_hundred_words() {
        let stats = TextStats::measure("one two three four five six seven eight nine ten");
        assert!((stats.per_hundred_words(2) - 20.0).abs() < 1e-9);
    }
}
