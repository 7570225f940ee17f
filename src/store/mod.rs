//! Local persistence for resolved videos.
//!
//! A [`LocalStore`] caches video metadata keyed by `(playlist, video)`.
//! Reads never fail: a missing or unreadable entry is simply a miss.
//! Writes are best-effort and serialized per key.

pub mod file;
pub mod memory;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::OwnedMutexGuard;

use crate::domain::{VideoItem, VideoKey};

pub use file::FileStore;
pub use memory::MemoryStore;

/// Errors from store writes
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store is read-only")]
    ReadOnly,
}

/// Trait for video caches
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Human-readable store name
    fn name(&self) -> &str;

    /// Look up a cached video; `None` on miss or unreadable entry
    async fn get_video(&self, key: &VideoKey) -> Option<VideoItem>;

    /// Persist a video under its own key
    async fn save_video(&self, video: &VideoItem) -> Result<(), StoreError>;

    /// Whether `get_video` would return a hit for `key`
    async fn contains(&self, key: &VideoKey) -> bool {
        self.get_video(key).await.is_some()
    }
}

/// Per-key async mutexes used to serialize writes
#[derive(Debug, Default)]
pub struct KeyLocks {
    locks: Mutex<HashMap<VideoKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the write lock for a key
    pub async fn lock(&self, key: &VideoKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            // Drop entries nobody is holding or waiting on
            locks.retain(|_, m| Arc::strong_count(m) > 1);
            Arc::clone(locks.entry(key.clone()).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of keys with a held or awaited lock
    pub fn active(&self) -> usize {
        let locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.values().filter(|m| Arc::strong_count(m) > 1).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_key_locks_serialize_same_key() {
        let locks = Arc::new(KeyLocks::new());
        let key = VideoKey::new("Algebra", "Intro");

        let guard = locks.lock(&key).await;
        assert_eq!(locks.active(), 1);

        let locks2 = Arc::clone(&locks);
        let key2 = key.clone();
        let waiter = tokio::spawn(async move {
            let _g = locks2.lock(&key2).await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn test_key_locks_independent_keys() {
        let locks = KeyLocks::new();
        let _a = locks.lock(&VideoKey::new("Algebra", "Intro")).await;
        // Would deadlock if keys shared a lock
        let _b = locks.lock(&VideoKey::new("Algebra", "Slopes")).await;
        assert_eq!(locks.active(), 2);
    }
}
