//! Key/value persistence backends for tracker state.
//!
//! Trackers read and write whole JSON documents under well-known keys.
//! The store trait is the seam for swapping backends; the crate ships an
//! in-process map for tests and a directory-backed store for real runs.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::sync::RwLock;

/// Key for the persisted narrative progression document.
pub const PROGRESSION_KEY: &str = "mid-term/narrative-progression";

/// Key for the persisted quality metrics document.
pub const QUALITY_KEY: &str = "mid-term/quality-metrics";

/// Key for the persisted system statistics document.
pub const STATISTICS_KEY: &str = "mid-term/system-statistics";

/// Key for the chapter index document.
pub const CHAPTER_INDEX_KEY: &str = "mid-term/chapters/index";

/// Key for a single recorded chapter.
pub fn chapter_key(number: u32) -> String {
    format!("mid-term/chapters/{number}")
}

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence backend for tracker documents.
///
/// Implementations must be safe to share across tasks. Writes replace the
/// whole value under a key; there is no partial update.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Whether a key currently holds a value.
    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Read the value under a key. Missing keys are `StoreError::NotFound`.
    async fn read(&self, key: &str) -> StoreResult<Vec<u8>>;

    /// Write (or replace) the value under a key.
    async fn write(&self, key: &str, value: &[u8]) -> StoreResult<()>;
}

/// Read and deserialize a JSON document, mapping a missing key to `None`.
///
/// Parse failures are real errors; callers decide whether to fall back to
/// defaults.
pub async fn load_json<T: DeserializeOwned>(
    store: &dyn MemoryStore,
    key: &str,
) -> StoreResult<Option<T>> {
    match store.read(key).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(StoreError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Serialize and write a JSON document.
pub async fn save_json<T: Serialize>(
    store: &dyn MemoryStore,
    key: &str,
    value: &T,
) -> StoreResult<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    store.write(key, &bytes).await
}

/// Process-local store backed by a map. Used in tests and for callers that
/// do not need durability.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no keys.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.entries.read().await.contains_key(key))
    }

    async fn read(&self, key: &str) -> StoreResult<Vec<u8>> {
        self.entries
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn write(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// Directory-backed store. Each key maps to a JSON file under the root;
/// slashes in keys become subdirectories.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `root`. The directory is created lazily on
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let mut path = self.root.clone();
        for segment in key.split('/').filter(|s| !s.is_empty()) {
            path.push(sanitize_segment(segment));
        }
        path.set_extension("json");
        path
    }
}

/// Keep path segments filesystem-safe without losing key identity for the
/// characters the pipeline actually uses.
fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[async_trait]
impl MemoryStore for FileStore {
    async fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(fs::try_exists(self.path_for(key)).await?)
    }

    async fn read(&self, key: &str) -> StoreResult<Vec<u8>> {
        match fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, value).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Doc {
        name: String,
        count: u32,
    }

    #[tokio::test]
    async fn test_in_memory_roundtrip() {
        let store = InMemoryStore::new();
        store.write("a/b", b"hello").await.unwrap();

        assert!(store.exists("a/b").await.unwrap());
        assert_eq!(store.read("a/b").await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_missing_key_is_not_found() {
        let store = InMemoryStore::new();
        match store.read("nope").await {
            Err(StoreError::NotFound(key)) => assert_eq!(key, "nope"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_load_json_maps_missing_to_none() {
        let store = InMemoryStore::new();
        let loaded: Option<Doc> = load_json(&store, "absent").await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_json_document_roundtrip() {
        let store = InMemoryStore::new();
        let doc = Doc {
            name: "chapter one".to_string(),
            count: 3,
        };

        save_json(&store, QUALITY_KEY, &doc).await.unwrap();
        let loaded: Option<Doc> = load_json(&store, QUALITY_KEY).await.unwrap();

        assert_eq!(loaded, Some(doc));
    }

    #[tokio::test]
    async fn test_corrupt_document_is_an_error() {
        let store = InMemoryStore::new();
        store.write("bad", b"{not json").await.unwrap();

        let loaded: StoreResult<Option<Doc>> = load_json(&store, "bad").await;
        assert!(matches!(loaded, Err(StoreError::Json(_))));
    }

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let store = FileStore::new(dir.path());

        assert!(!store.exists(PROGRESSION_KEY).await.unwrap());
        save_json(&store, PROGRESSION_KEY, &Doc {
            name: "arc".to_string(),
            count: 1,
        })
        .await
        .unwrap();

        assert!(store.exists(PROGRESSION_KEY).await.unwrap());
        let loaded: Option<Doc> = load_json(&store, PROGRESSION_KEY).await.unwrap();
        assert_eq!(loaded.unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_file_store_nests_key_segments() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let store = FileStore::new(dir.path());

        store.write(&chapter_key(7), b"{}").await.unwrap();

        let expected = dir.path().join("mid-term").join("chapters").join("7.json");
        assert!(expected.exists());
    }

    #[test]
    fn test_sanitize_segment() {
        assert_eq!(sanitize_segment("mid-term"), "mid-term");
        assert_eq!(sanitize_segment("odd key!"), "odd_key_");
    }
}
