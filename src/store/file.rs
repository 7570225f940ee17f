//! File-backed video cache.
//!
//! Each video lives in its own JSON document named after the key's storage
//! id. Documents are written to a temporary file and renamed into place so a
//! reader never sees a partial write.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

use super::{KeyLocks, LocalStore, StoreError};
use crate::domain::{VideoItem, VideoKey};

/// On-disk envelope around a cached video
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedVideo {
    /// When the entry was written
    pub cached_at: DateTime<Utc>,

    /// The cached video
    pub video: VideoItem,
}

/// Video cache stored as one JSON file per video
pub struct FileStore {
    dir: PathBuf,
    locks: KeyLocks,
}

impl FileStore {
    /// Create a store rooted at `dir` (created lazily on first write)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            locks: KeyLocks::new(),
        }
    }

    /// Root directory of the store
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the document for a key
    pub fn path_for(&self, key: &VideoKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.storage_id()))
    }

    async fn read_entry(&self, path: &Path) -> Option<CachedVideo> {
        let content = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Failed to read cache entry {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Ignoring corrupt cache entry {}: {}", path.display(), e);
                None
            }
        }
    }

    /// List every cached entry, skipping unreadable ones
    pub async fn list(&self) -> Result<Vec<CachedVideo>, StoreError> {
        let mut entries = Vec::new();

        if !self.dir.exists() {
            return Ok(entries);
        }

        let mut dir = fs::read_dir(&self.dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(cached) = self.read_entry(&path).await {
                entries.push(cached);
            }
        }

        entries.sort_by(|a, b| a.video.key().to_string().cmp(&b.video.key().to_string()));
        Ok(entries)
    }
}

#[async_trait]
impl LocalStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn get_video(&self, key: &VideoKey) -> Option<VideoItem> {
        let path = self.path_for(key);
        let entry = self.read_entry(&path).await?;

        // Guard against storage id collisions
        if &entry.video.key() != key {
            tracing::warn!(
                %key,
                stored = %entry.video.key(),
                "Cache entry belongs to a different key"
            );
            return None;
        }

        tracing::debug!(%key, "Cache hit");
        Some(entry.video)
    }

    async fn save_video(&self, video: &VideoItem) -> Result<(), StoreError> {
        let key = video.key();
        let _guard = self.locks.lock(&key).await;

        fs::create_dir_all(&self.dir).await?;

        let entry = CachedVideo {
            cached_at: Utc::now(),
            video: video.clone(),
        };
        let content = serde_json::to_string_pretty(&entry)?;

        let path = self.path_for(&key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &path).await?;

        tracing::debug!(%key, "Saved {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_and_get() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path().join("cache"));
        let video = VideoItem::new("Algebra", "Intro").with_duration(300);

        assert!(store.get_video(&video.key()).await.is_none());
        assert!(!store.contains(&video.key()).await);

        store.save_video(&video).await.unwrap();

        assert_eq!(store.get_video(&video.key()).await, Some(video.clone()));
        assert!(store.contains(&video.key()).await);
    }

    #[tokio::test]
    async fn test_overwrite_keeps_latest() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path());

        store
            .save_video(&VideoItem::new("Algebra", "Intro").with_title("Old"))
            .await
            .unwrap();
        store
            .save_video(&VideoItem::new("Algebra", "Intro").with_title("New"))
            .await
            .unwrap();

        let video = store.get_video(&VideoKey::new("Algebra", "Intro")).await.unwrap();
        assert_eq!(video.title, "New");
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path());
        let key = VideoKey::new("Algebra", "Intro");

        std::fs::write(store.path_for(&key), "{ not json").unwrap();

        assert!(store.get_video(&key).await.is_none());
        assert!(!store.contains(&key).await);
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_entry_for_other_key_is_a_miss() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path());
        let key = VideoKey::new("Algebra", "Intro");

        let entry = CachedVideo {
            cached_at: Utc::now(),
            video: VideoItem::new("Biology", "Cells"),
        };
        std::fs::write(store.path_for(&key), serde_json::to_string(&entry).unwrap()).unwrap();

        assert!(store.get_video(&key).await.is_none());
        assert!(!store.contains(&key).await);
    }

    #[tokio::test]
    async fn test_concurrent_saves_same_key() {
        let temp = TempDir::new().unwrap();
        let store = std::sync::Arc::new(FileStore::new(temp.path()));

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = std::sync::Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let video = VideoItem::new("Algebra", "Intro").with_title(format!("v{}", i));
                store.save_video(&video).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let video = store.get_video(&VideoKey::new("Algebra", "Intro")).await.unwrap();
        assert!(video.title.starts_with('v'));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_missing_dir_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path().join("nope"));
        assert!(store.list().await.unwrap().is_empty());
    }
}
