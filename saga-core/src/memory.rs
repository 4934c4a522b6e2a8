//! Long-term chapter memory over the key/value store.
//!
//! Each recorded chapter keeps a bounded excerpt plus its context, with a
//! small index document listing which chapters exist. Search is keyword
//! matching over excerpts, newest chapters first.

use crate::chapter::{ChapterContext, ChapterInput};
use crate::store::{
    chapter_key, load_json, save_json, MemoryStore, StoreResult, CHAPTER_INDEX_KEY,
};
use crate::text::count_phrase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Characters of chapter text kept in each stored record.
const EXCERPT_CHARS: usize = 1000;

/// Most recent chapters scanned per search.
const SEARCH_SCAN_LIMIT: usize = 50;

/// Minimum query term length considered meaningful.
const MIN_TERM_LEN: usize = 3;

/// A stored chapter excerpt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterRecord {
    /// Chapter number.
    pub number: u32,

    /// Leading excerpt of the chapter text.
    pub excerpt: String,

    /// Context the chapter was submitted with.
    #[serde(default)]
    pub context: ChapterContext,

    /// When the chapter was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// A search result from chapter memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryHit {
    /// Matching chapter number.
    pub chapter: u32,

    /// Stored excerpt of that chapter.
    pub excerpt: String,

    /// How many query-term occurrences matched.
    pub matches: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ChapterIndex {
    chapters: Vec<u32>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

/// Story memory shared by both coordinators.
///
/// Initialization is lazy and idempotent: the first call loads the index
/// (or starts one when absent) and later calls are no-ops.
pub struct NarrativeMemory {
    store: Arc<dyn MemoryStore>,
    index: RwLock<Option<ChapterIndex>>,
}

impl NarrativeMemory {
    /// Create memory over a store. No IO happens until first use.
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self {
            store,
            index: RwLock::new(None),
        }
    }

    /// Whether the index has been loaded.
    pub async fn is_initialized(&self) -> bool {
        self.index.read().await.is_some()
    }

    /// Load the chapter index, creating an empty one when the store has
    /// none. Safe to call repeatedly.
    pub async fn ensure_initialized(&self) -> StoreResult<()> {
        let mut guard = self.index.write().await;
        if guard.is_some() {
            return Ok(());
        }

        let loaded: Option<ChapterIndex> = load_json(self.store.as_ref(), CHAPTER_INDEX_KEY).await?;
        let index = loaded.unwrap_or_default();
        debug!(chapters = index.chapters.len(), "chapter memory ready");
        *guard = Some(index);
        Ok(())
    }

    /// Record a chapter excerpt and update the index.
    pub async fn record_chapter(&self, chapter: &ChapterInput) -> StoreResult<()> {
        self.ensure_initialized().await?;

        let record = ChapterRecord {
            number: chapter.number,
            excerpt: chapter.excerpt(EXCERPT_CHARS).to_string(),
            context: chapter.context.clone(),
            recorded_at: Utc::now(),
        };
        save_json(self.store.as_ref(), &chapter_key(chapter.number), &record).await?;

        let mut guard = self.index.write().await;
        let index = guard.get_or_insert_with(ChapterIndex::default);
        if let Err(pos) = index.chapters.binary_search(&chapter.number) {
            index.chapters.insert(pos, chapter.number);
        }
        index.updated_at = Some(Utc::now());
        save_json(self.store.as_ref(), CHAPTER_INDEX_KEY, index).await
    }

    /// Load a stored chapter record, if present.
    pub async fn chapter(&self, number: u32) -> StoreResult<Option<ChapterRecord>> {
        load_json(self.store.as_ref(), &chapter_key(number)).await
    }

    /// Chapter numbers currently indexed, ascending.
    pub async fn chapter_numbers(&self) -> Vec<u32> {
        match self.index.read().await.as_ref() {
            Some(index) => index.chapters.clone(),
            None => Vec::new(),
        }
    }

    /// Keyword search over stored excerpts.
    ///
    /// Query terms shorter than three characters are dropped. Chapters are
    /// scanned newest first and ranked by total term occurrences; only
    /// positive matches are returned, at most `limit` of them.
    pub async fn search(&self, query: &str, limit: usize) -> StoreResult<Vec<MemoryHit>> {
        self.ensure_initialized().await?;

        let query_lower = query.to_lowercase();
        let mut terms: Vec<&str> = query_lower
            .split_whitespace()
            .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|t| t.len() >= MIN_TERM_LEN)
            .collect();
        terms.sort_unstable();
        terms.dedup();

        if terms.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let numbers: Vec<u32> = {
            let guard = self.index.read().await;
            match guard.as_ref() {
                Some(index) => index
                    .chapters
                    .iter()
                    .rev()
                    .take(SEARCH_SCAN_LIMIT)
                    .copied()
                    .collect(),
                None => Vec::new(),
            }
        };

        let mut hits = Vec::new();
        for number in numbers {
            let Some(record) = self.chapter(number).await? else {
                continue;
            };
            let excerpt_lower = record.excerpt.to_lowercase();
            let matches: usize = terms.iter().map(|t| count_phrase(&excerpt_lower, t)).sum();
            if matches > 0 {
                hits.push(MemoryHit {
                    chapter: record.number,
                    excerpt: record.excerpt,
                    matches,
                });
            }
        }

        hits.sort_by(|a, b| b.matches.cmp(&a.matches).then(b.chapter.cmp(&a.chapter)));
        hits.truncate(limit);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn memory() -> NarrativeMemory {
        NarrativeMemory::new(Arc::new(InMemoryStore::new()))
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let memory = memory();
        assert!(!memory.is_initialized().await);

        memory.ensure_initialized().await.unwrap();
        memory.ensure_initialized().await.unwrap();
        assert!(memory.is_initialized().await);
    }

    #[tokio::test]
    async fn test_record_and_reload_chapter() {
        let memory = memory();
        let chapter = ChapterInput::new(3, "The harbor lights dimmed as the fleet departed.");

        memory.record_chapter(&chapter).await.unwrap();

        let record = memory.chapter(3).await.unwrap().expect("record stored");
        assert_eq!(record.number, 3);
        assert!(record.excerpt.contains("harbor lights"));
        assert_eq!(memory.chapter_numbers().await, vec![3]);
    }

    #[tokio::test]
    async fn test_recording_same_chapter_twice_keeps_one_index_entry() {
        let memory = memory();
        let chapter = ChapterInput::new(5, "First draft.");
        memory.record_chapter(&chapter).await.unwrap();

        let revised = ChapterInput::new(5, "Second draft.");
        memory.record_chapter(&revised).await.unwrap();

        assert_eq!(memory.chapter_numbers().await, vec![5]);
        let record = memory.chapter(5).await.unwrap().unwrap();
        assert!(record.excerpt.contains("Second"));
    }

    #[tokio::test]
    async fn test_search_ranks_by_matches() {
        let memory = memory();
        memory
            .record_chapter(&ChapterInput::new(1, "The dragon slept. No dragon stirred."))
            .await
            .unwrap();
        memory
            .record_chapter(&ChapterInput::new(2, "A dragon woke in the deep."))
            .await
            .unwrap();
        memory
            .record_chapter(&ChapterInput::new(3, "Quiet fields, no beasts at all."))
            .await
            .unwrap();

        let hits = memory.search("dragon", 10).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chapter, 1, "two mentions should outrank one");
        assert_eq!(hits[0].matches, 2);
        assert_eq!(hits[1].chapter, 2);
    }

    #[tokio::test]
    async fn test_search_drops_short_terms() {
        let memory = memory();
        memory
            .record_chapter(&ChapterInput::new(1, "An ox at the ford."))
            .await
            .unwrap();

        let hits = memory.search("an ox at", 10).await.unwrap();
        assert!(hits.is_empty(), "all terms are under the length floor");
    }

    #[tokio::test]
    async fn test_index_survives_new_memory_instance() {
        let store: Arc<dyn MemoryStore> = Arc::new(InMemoryStore::new());
        let first = NarrativeMemory::new(Arc::clone(&store));
        first
            .record_chapter(&ChapterInput::new(9, "The siege began at dusk."))
            .await
            .unwrap();

        let second = NarrativeMemory::new(store);
        let hits = second.search("siege", 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chapter, 9);
    }
}
