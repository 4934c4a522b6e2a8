//! Bounded result caching keyed by chapter fingerprints.

use crate::chapter::ChapterInput;
use lru::LruCache;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Characters of chapter content folded into the cache key.
const KEY_CONTENT_CHARS: usize = 1000;

/// Cache key for a chapter: a digest over the leading content, the chapter
/// number and the canonical context form. Context entries are ordered, so
/// equal contexts always produce equal keys.
pub fn chapter_cache_key(chapter: &ChapterInput) -> String {
    let mut hasher = Sha256::new();
    hasher.update(chapter.excerpt(KEY_CONTENT_CHARS).as_bytes());
    hasher.update(chapter.number.to_le_bytes());
    hasher.update(chapter.context.canonical_json().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Bounded LRU over cloneable results, with a hit counter.
///
/// Lookups clone the stored value; entries are never handed out by
/// reference. A disabled cache answers every probe with a miss and drops
/// every insert.
pub struct ResultCache<T> {
    entries: Mutex<LruCache<String, T>>,
    hits: AtomicU64,
    enabled: bool,
}

impl<T: Clone> ResultCache<T> {
    /// Create a cache holding at most `capacity` entries.
    pub fn new(capacity: usize, enabled: bool) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            enabled,
        }
    }

    /// Look up a key, bumping its recency and the hit counter on success.
    pub fn get(&self, key: &str) -> Option<T> {
        if !self.enabled {
            return None;
        }
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let value = entries.get(key).cloned();
        if value.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        value
    }

    /// Store a value, evicting the least recently used entry when full.
    pub fn insert(&self, key: String, value: T) {
        if !self.enabled {
            return;
        }
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .put(key, value);
    }

    /// Total hits since construction.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Entries currently cached.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
