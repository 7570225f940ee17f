//! Video resolution: local store first, catalog second, then write-back.
//!
//! Concurrent resolutions of the same key share a single in-flight
//! computation, so a burst of requests for one video costs one store read,
//! one catalog scan and at most one write-back. The shared entry lives
//! until that write-back has landed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tokio::sync::{Notify, OnceCell};

use crate::domain::{VideoItem, VideoKey};
use crate::library::{Catalog, CatalogError};
use crate::store::LocalStore;

/// Why a video could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Video not found: {0}")]
    NotFound(VideoKey),

    #[error("Ambiguous lookup for {key}: {matches} videos share that name")]
    AmbiguousLookup { key: VideoKey, matches: usize },
}

type Resolution = Result<VideoItem, ResolveError>;

type InFlightTable = Mutex<HashMap<VideoKey, Arc<InFlight>>>;

/// A shared resolution for one key.
///
/// The entry stays in the table until its write-back (if any) has finished,
/// so a same-key request arriving meanwhile reuses the result instead of
/// missing the store and writing again.
#[derive(Debug, Default)]
struct InFlight {
    result: OnceCell<Resolution>,
    writing: AtomicBool,
}

/// Resolves videos against the local store and the catalog
pub struct VideoResolver {
    store: Arc<dyn LocalStore>,
    catalog: Arc<Catalog>,
    in_flight: Arc<InFlightTable>,
    writes: Arc<WriteTracker>,
}

impl VideoResolver {
    pub fn new(store: Arc<dyn LocalStore>, catalog: Arc<Catalog>) -> Self {
        Self {
            store,
            catalog,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            writes: Arc::new(WriteTracker::default()),
        }
    }

    /// The catalog used for fallback lookups
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Resolve a video by playlist and name
    pub async fn resolve(&self, playlist: &str, video: &str) -> Resolution {
        self.resolve_key(&VideoKey::new(playlist, video)).await
    }

    /// Resolve a video by key, joining any in-flight resolution of the same key
    pub async fn resolve_key(&self, key: &VideoKey) -> Resolution {
        let entry = {
            let mut in_flight = lock_table(&self.in_flight);
            Arc::clone(in_flight.entry(key.clone()).or_default())
        };

        let result = entry
            .result
            .get_or_init(|| self.fetch(key, &entry))
            .await
            .clone();

        // With a write-back pending, the write task clears the entry instead
        if !entry.writing.load(Ordering::SeqCst) {
            remove_entry(&self.in_flight, key, &entry);
        }

        result
    }

    /// Whether the video is present in the local store
    pub async fn is_cached(&self, key: &VideoKey) -> bool {
        self.store.contains(key).await
    }

    /// Number of keys with a resolution or write-back in flight
    pub fn in_flight(&self) -> usize {
        lock_table(&self.in_flight).len()
    }

    /// Wait for every scheduled write-back to finish
    pub async fn drain_writes(&self) {
        self.writes.wait_idle().await;
    }

    /// Number of write-backs not yet finished
    pub fn pending_writes(&self) -> usize {
        self.writes.pending()
    }

    async fn fetch(&self, key: &VideoKey, entry: &Arc<InFlight>) -> Resolution {
        if let Some(video) = self.store.get_video(key).await {
            tracing::debug!(%key, store = self.store.name(), "Resolved from local store");
            return Ok(video);
        }

        match self.catalog.find_video(key) {
            Ok(Some(video)) => {
                tracing::debug!(%key, "Resolved from catalog");
                self.write_back(video.clone(), Arc::clone(entry));
                Ok(video)
            }
            Ok(None) => {
                tracing::debug!(%key, "Video not found");
                Err(ResolveError::NotFound(key.clone()))
            }
            Err(CatalogError::AmbiguousVideo { matches, .. }) => {
                Err(ResolveError::AmbiguousLookup {
                    key: key.clone(),
                    matches,
                })
            }
            Err(e) => {
                tracing::warn!(%key, error = %e, "Catalog lookup failed");
                Err(ResolveError::NotFound(key.clone()))
            }
        }
    }

    fn write_back(&self, video: VideoItem, entry: Arc<InFlight>) {
        let store = Arc::clone(&self.store);
        let writes = Arc::clone(&self.writes);
        let in_flight = Arc::clone(&self.in_flight);

        // Set before the result is published so joiners see it
        entry.writing.store(true, Ordering::SeqCst);
        writes.started();
        tokio::spawn(async move {
            let key = video.key();
            match store.save_video(&video).await {
                Ok(()) => tracing::debug!(%key, "Write-back complete"),
                Err(e) => tracing::warn!(%key, error = %e, "Write-back failed"),
            }
            remove_entry(&in_flight, &key, &entry);
            writes.finished();
        });
    }
}

fn lock_table(table: &InFlightTable) -> MutexGuard<'_, HashMap<VideoKey, Arc<InFlight>>> {
    table.lock().unwrap_or_else(|e| e.into_inner())
}

/// Remove `entry` for `key` unless a newer entry has replaced it
fn remove_entry(table: &InFlightTable, key: &VideoKey, entry: &Arc<InFlight>) {
    let mut in_flight = lock_table(table);
    if in_flight.get(key).is_some_and(|e| Arc::ptr_eq(e, entry)) {
        in_flight.remove(key);
    }
}

/// Counts outstanding write-backs and wakes waiters when none remain
#[derive(Debug, Default)]
struct WriteTracker {
    pending: AtomicUsize,
    idle: Notify,
}

impl WriteTracker {
    fn started(&self) {
        self.pending.fetch_add(1, Ordering::SeqCst);
    }

    fn finished(&self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }

    fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    async fn wait_idle(&self) {
        loop {
            // Register before checking so a concurrent finish is not missed
            let notified = self.idle.notified();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PlaylistItem, VideoRecord};
    use crate::store::MemoryStore;

    fn catalog() -> Arc<Catalog> {
        Arc::new(Catalog::from_parts(
            Vec::new(),
            vec![PlaylistItem::new("Algebra").with_video(VideoRecord::new("Intro"))],
        ))
    }

    #[tokio::test]
    async fn test_catalog_hit_writes_back() {
        let store = Arc::new(MemoryStore::new());
        let resolver = VideoResolver::new(store.clone(), catalog());

        let video = resolver.resolve("Algebra", "Intro").await.unwrap();
        resolver.drain_writes().await;

        assert_eq!(video.name, "Intro");
        assert_eq!(store.writes(), 1);
        assert!(resolver.is_cached(&video.key()).await);
        assert_eq!(resolver.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_write_failure_is_not_surfaced() {
        let store = Arc::new(MemoryStore::new().read_only());
        let resolver = VideoResolver::new(store.clone(), catalog());

        let video = resolver.resolve("Algebra", "Intro").await;
        resolver.drain_writes().await;

        assert!(video.is_ok());
        assert_eq!(store.writes(), 0);
        assert_eq!(resolver.pending_writes(), 0);
    }

    #[tokio::test]
    async fn test_not_found() {
        let store = Arc::new(MemoryStore::new());
        let resolver = VideoResolver::new(store.clone(), catalog());

        let result = resolver.resolve("Algebra", "Missing").await;
        resolver.drain_writes().await;

        assert_eq!(
            result,
            Err(ResolveError::NotFound(VideoKey::new("Algebra", "Missing")))
        );
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_drain_with_nothing_pending() {
        let resolver = VideoResolver::new(Arc::new(MemoryStore::new()), catalog());
        resolver.drain_writes().await;
        assert_eq!(resolver.pending_writes(), 0);
    }
}
