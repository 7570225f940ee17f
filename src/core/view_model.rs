//! Application-root view-model consumed by the GUI shell.

use std::sync::{Arc, RwLock, RwLockReadGuard};

use tokio::runtime::Handle;

use super::resolver::{ResolveError, VideoResolver};
use super::session::{QueryingHandle, SessionState};
use super::ui::UiDispatcher;
use crate::domain::{GroupItem, PlaylistItem, VideoItem, VideoKey};
use crate::library::{find_playlist, Catalog, CatalogError};
use crate::store::LocalStore;

#[derive(Debug, Default)]
struct LoadedData {
    is_data_loaded: bool,
    groups: Vec<GroupItem>,
    playlists: Vec<Arc<PlaylistItem>>,
}

/// Ties the catalog, the resolver and the session state together
pub struct MainViewModel {
    catalog: Arc<Catalog>,
    resolver: Arc<VideoResolver>,
    session: SessionState,
    data: RwLock<LoadedData>,
    runtime: Handle,
}

impl MainViewModel {
    /// Create a view-model bound to the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime. Use
    /// [`MainViewModel::with_runtime`] to pass a handle explicitly.
    pub fn new(catalog: Arc<Catalog>, store: Arc<dyn LocalStore>, ui: UiDispatcher) -> Self {
        Self::with_runtime(catalog, store, ui, Handle::current())
    }

    /// Create a view-model whose background work runs on `runtime`
    pub fn with_runtime(
        catalog: Arc<Catalog>,
        store: Arc<dyn LocalStore>,
        ui: UiDispatcher,
        runtime: Handle,
    ) -> Self {
        let resolver = Arc::new(VideoResolver::new(store, Arc::clone(&catalog)));

        Self {
            catalog,
            resolver,
            session: SessionState::new(ui),
            data: RwLock::new(LoadedData::default()),
            runtime,
        }
    }

    fn data(&self) -> RwLockReadGuard<'_, LoadedData> {
        self.data.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Populate groups and playlists from the catalog, once
    pub fn load_data(&self) {
        let mut data = self.data.write().unwrap_or_else(|e| e.into_inner());
        if data.is_data_loaded {
            return;
        }

        data.is_data_loaded = true;
        let LoadedData {
            groups, playlists, ..
        } = &mut *data;
        self.catalog.initialize(groups, playlists);

        tracing::info!(
            groups = groups.len(),
            playlists = playlists.len(),
            "View data loaded"
        );
    }

    pub fn is_data_loaded(&self) -> bool {
        self.data().is_data_loaded
    }

    /// Snapshot of the loaded groups
    pub fn groups(&self) -> Vec<GroupItem> {
        self.data().groups.clone()
    }

    /// Snapshot of the loaded playlists
    pub fn playlists(&self) -> Vec<Arc<PlaylistItem>> {
        self.data().playlists.clone()
    }

    /// Look up a loaded playlist and make sure its videos are loaded
    pub fn get_playlist(&self, name: &str) -> Result<Arc<PlaylistItem>, CatalogError> {
        let data = self.data();
        let playlist = find_playlist(&data.playlists, name)
            .ok_or_else(|| CatalogError::PlaylistNotFound(name.to_string()))?;

        playlist.load_videos();
        Ok(Arc::clone(playlist))
    }

    /// Resolve a video, reporting ambiguous lookups as faults
    pub async fn resolve_video(&self, playlist: &str, name: &str) -> Option<VideoItem> {
        resolve_reporting(&self.resolver, &self.session, VideoKey::new(playlist, name)).await
    }

    /// Resolve a video in the background and hand the result to `callback`
    /// on the UI thread. The callback runs exactly once.
    ///
    /// Safe to call from any thread, the UI thread included: the work is
    /// spawned on the runtime captured at construction.
    pub fn get_video<F>(&self, playlist: &str, name: &str, callback: F)
    where
        F: FnOnce(Option<VideoItem>) + Send + 'static,
    {
        let resolver = Arc::clone(&self.resolver);
        let session = self.session.clone();
        let key = VideoKey::new(playlist, name);

        self.runtime.spawn(async move {
            let video = resolve_reporting(&resolver, &session, key).await;
            session.ui().invoke(move || callback(video));
        });
    }

    /// Start a server query; hold the handle until it completes
    pub fn start_querying(&self) -> QueryingHandle {
        self.session.begin()
    }

    pub fn querying(&self) -> bool {
        self.session.querying()
    }

    /// Report a fault to the user and record it
    pub fn set_error(&self, message: impl Into<String>) {
        self.session.set_error(message);
    }

    pub fn clear_error(&self) {
        self.session.clear_error();
    }

    pub fn is_error(&self) -> bool {
        self.session.is_error()
    }

    pub fn error_message(&self) -> Option<String> {
        self.session.error_message()
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn resolver(&self) -> &Arc<VideoResolver> {
        &self.resolver
    }

    /// Wait for background write-backs and queued UI work to finish
    pub async fn shutdown(&self) {
        self.resolver.drain_writes().await;
        self.session.ui().flush().await;
    }
}

async fn resolve_reporting(
    resolver: &VideoResolver,
    session: &SessionState,
    key: VideoKey,
) -> Option<VideoItem> {
    match resolver.resolve_key(&key).await {
        Ok(video) => Some(video),
        Err(ResolveError::NotFound(_)) => None,
        Err(e @ ResolveError::AmbiguousLookup { .. }) => {
            session.set_error(e.to_string());
            None
        }
    }
}
