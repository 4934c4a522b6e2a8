//! Chapter input types shared across the pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Well-known context keys recognized by the built-in heuristics.
pub mod context_keys {
    /// Central theme of the story (e.g. "redemption").
    pub const THEME: &str = "theme";
    /// Genre label (e.g. "fantasy").
    pub const GENRE: &str = "genre";
    /// Target chapter length in words.
    pub const TARGET_LENGTH: &str = "target_length";
    /// Desired tension direction: "raise", "ease" or "sustain".
    pub const TENSION: &str = "tension";
}

/// Free-form metadata handed in alongside chapter text.
///
/// Keys are ordered so the serialized form is stable, which matters for
/// cache keying. Unknown keys are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChapterContext {
    entries: BTreeMap<String, String>,
}

impl ChapterContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Insert an entry.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Look up an entry.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// The declared story theme, if any.
    pub fn theme(&self) -> Option<&str> {
        self.get(context_keys::THEME)
    }

    /// The declared genre, if any.
    pub fn genre(&self) -> Option<&str> {
        self.get(context_keys::GENRE)
    }

    /// The target length in words, if declared and parseable.
    pub fn target_length(&self) -> Option<u32> {
        self.get(context_keys::TARGET_LENGTH)?.parse().ok()
    }

    /// The tension direction hint, if any.
    pub fn tension(&self) -> Option<&str> {
        self.get(context_keys::TENSION)
    }

    /// Whether no entries are set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Canonical serialized form. The BTreeMap ordering makes this stable
    /// across calls with the same entries.
    pub fn canonical_json(&self) -> String {
        serde_json::to_string(&self.entries).unwrap_or_else(|_| "{}".to_string())
    }
}

/// A single chapter submitted for analysis or optimization.
///
/// Treated as immutable once constructed; the pipeline never mutates
/// chapter text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterInput {
    /// One-based chapter number within the work.
    pub number: u32,

    /// Full chapter text.
    pub content: String,

    /// Optional story-level metadata.
    #[serde(default)]
    pub context: ChapterContext,
}

impl ChapterInput {
    /// Create a chapter with empty context.
    pub fn new(number: u32, content: impl Into<String>) -> Self {
        Self {
            number,
            content: content.into(),
            context: ChapterContext::new(),
        }
    }

    /// Attach context, builder style.
    pub fn with_context(mut self, context: ChapterContext) -> Self {
        self.context = context;
        self
    }

    /// The first `max_chars` characters of the content, cut at a char
    /// boundary so multi-byte text never splits mid-character.
    pub fn excerpt(&self, max_chars: usize) -> &str {
        match self.content.char_indices().nth(max_chars) {
            Some((byte_idx, _)) => &self.content[..byte_idx],
            None => &self.content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_accessors() {
        let ctx = ChapterContext::new()
            .with(context_keys::THEME, "redemption")
            .with(context_keys::TARGET_LENGTH, "2500");

        assert_eq!(ctx.theme(), Some("redemption"));
        assert_eq!(ctx.target_length(), Some(2500));
        assert_eq!(ctx.genre(), None);
    }

    #[test]
    fn test_canonical_json_is_order_independent() {
        let a = ChapterContext::new().with("theme", "loss").with("genre", "noir");
        let b = ChapterContext::new().with("genre", "noir").with("theme", "loss");

        assert_eq!(a.canonical_json(), b.canonical_json());
    }

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        let chapter = ChapterInput::new(1, "héllo wörld");
        assert_eq!(chapter.excerpt(5), "héllo");

        let short = ChapterInput::new(2, "hi");
        assert_eq!(short.excerpt(100), "hi");
    }

    #[test]
    fn test_unparseable_target_length_is_none() {
        let ctx = ChapterContext::new().with(context_keys::TARGET_LENGTH, "about 3k");
        assert_eq!(ctx.target_length(), None);
    }
}
