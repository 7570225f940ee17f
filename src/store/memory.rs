//! In-memory video cache.
//!
//! Useful when no cache directory is configured, and as an observable store
//! in tests: it counts reads and writes and can simulate slow or read-only
//! backends.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{KeyLocks, LocalStore, StoreError};
use crate::domain::{VideoItem, VideoKey};

/// Video cache held in a map
#[derive(Default)]
pub struct MemoryStore {
    videos: RwLock<HashMap<VideoKey, VideoItem>>,
    locks: KeyLocks,
    reads: AtomicUsize,
    writes: AtomicUsize,
    read_latency: Option<Duration>,
    write_latency: Option<Duration>,
    read_only: bool,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every read and write by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.read_latency = Some(latency);
        self.write_latency = Some(latency);
        self
    }

    /// Delay only writes by `latency`
    pub fn with_write_latency(mut self, latency: Duration) -> Self {
        self.write_latency = Some(latency);
        self
    }

    /// Reject every write with [`StoreError::ReadOnly`]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Seed the store with a video
    pub fn with_video(mut self, video: VideoItem) -> Self {
        self.videos.get_mut().insert(video.key(), video);
        self
    }

    /// Number of `get_video` calls served
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of successful writes
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of cached videos
    pub async fn len(&self) -> usize {
        self.videos.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.videos.read().await.is_empty()
    }
}

async fn simulate_latency(latency: Option<Duration>) {
    if let Some(latency) = latency {
        tokio::time::sleep(latency).await;
    }
}

#[async_trait]
impl LocalStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get_video(&self, key: &VideoKey) -> Option<VideoItem> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        simulate_latency(self.read_latency).await;
        self.videos.read().await.get(key).cloned()
    }

    async fn save_video(&self, video: &VideoItem) -> Result<(), StoreError> {
        let key = video.key();
        let _guard = self.locks.lock(&key).await;

        simulate_latency(self.write_latency).await;
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }

        self.videos.write().await.insert(key, video.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn contains(&self, key: &VideoKey) -> bool {
        self.videos.read().await.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seed_and_counters() {
        let store = MemoryStore::new().with_video(VideoItem::new("Algebra", "Intro"));

        assert!(store.get_video(&VideoKey::new("Algebra", "Intro")).await.is_some());
        assert!(store.get_video(&VideoKey::new("Algebra", "Other")).await.is_none());
        assert_eq!(store.reads(), 2);
        assert_eq!(store.writes(), 0);

        store.save_video(&VideoItem::new("Algebra", "Other")).await.unwrap();
        assert_eq!(store.writes(), 1);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_read_only_rejects_writes() {
        let store = MemoryStore::new().read_only();
        let result = store.save_video(&VideoItem::new("Algebra", "Intro")).await;

        assert!(matches!(result, Err(StoreError::ReadOnly)));
        assert!(store.is_empty().await);
        assert_eq!(store.writes(), 0);
    }
}
