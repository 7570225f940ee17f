//! Catalog of all known groups, playlists and videos.
//!
//! The catalog is read once from a JSON document and never mutated
//! afterwards, so it can be shared across tasks behind an `Arc`.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;

use crate::domain::{GroupItem, PlaylistItem, VideoItem, VideoKey};

/// Errors raised by catalog lookups and loading
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Playlist not found: {0}")]
    PlaylistNotFound(String),

    #[error("Video name {video:?} matches {matches} entries in playlist {playlist:?}")]
    AmbiguousVideo {
        playlist: String,
        video: String,
        matches: usize,
    },

    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// On-disk shape of the catalog
#[derive(Debug, Serialize, Deserialize)]
struct CatalogDocument {
    #[serde(default = "default_version")]
    version: u32,

    #[serde(default)]
    groups: Vec<GroupItem>,

    #[serde(default)]
    playlists: Vec<PlaylistItem>,
}

fn default_version() -> u32 {
    1
}

/// In-memory index of groups and playlists, in load order
#[derive(Debug)]
pub struct Catalog {
    /// Catalog format version
    pub version: u32,

    groups: Vec<GroupItem>,
    playlists: Vec<Arc<PlaylistItem>>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self {
            version: default_version(),
            groups: Vec::new(),
            playlists: Vec::new(),
        }
    }

    /// Build a catalog from already constructed parts
    pub fn from_parts(groups: Vec<GroupItem>, playlists: Vec<PlaylistItem>) -> Self {
        Self {
            version: default_version(),
            groups,
            playlists: playlists.into_iter().map(Arc::new).collect(),
        }
    }

    /// Parse a catalog document
    pub fn parse(json: &str) -> Result<Self, CatalogError> {
        let doc: CatalogDocument = serde_json::from_str(json)?;

        Ok(Self {
            version: doc.version,
            groups: doc.groups,
            playlists: doc.playlists.into_iter().map(Arc::new).collect(),
        })
    }

    /// Load the catalog from disk. A missing file yields an empty catalog.
    pub async fn load(path: &Path) -> Result<Self, CatalogError> {
        if !path.exists() {
            tracing::info!("No catalog at {}, starting empty", path.display());
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path).await.map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let catalog = Self::parse(&content)?;
        tracing::info!(
            groups = catalog.groups.len(),
            playlists = catalog.playlists.len(),
            "Loaded catalog from {}",
            path.display()
        );

        Ok(catalog)
    }

    /// Append every group and playlist to the given collections.
    ///
    /// Guarding against repeated calls is the caller's job.
    pub fn initialize(&self, groups: &mut Vec<GroupItem>, playlists: &mut Vec<Arc<PlaylistItem>>) {
        groups.extend(self.groups.iter().cloned());
        playlists.extend(self.playlists.iter().cloned());
    }

    /// All groups in load order
    pub fn groups(&self) -> &[GroupItem] {
        &self.groups
    }

    /// All playlists in load order
    pub fn playlists(&self) -> &[Arc<PlaylistItem>] {
        &self.playlists
    }

    /// Playlists belonging to a group
    pub fn playlists_in_group(&self, group: &str) -> Vec<&Arc<PlaylistItem>> {
        self.playlists
            .iter()
            .filter(|p| p.group.as_deref() == Some(group))
            .collect()
    }

    /// Exact-match playlist lookup; triggers the lazy video load
    pub fn get_playlist(&self, name: &str) -> Result<Arc<PlaylistItem>, CatalogError> {
        let playlist = find_playlist(&self.playlists, name)
            .ok_or_else(|| CatalogError::PlaylistNotFound(name.to_string()))?;
        playlist.load_videos();
        Ok(Arc::clone(playlist))
    }

    /// Find a single video by key.
    ///
    /// Returns `Ok(None)` when the playlist or video is absent, and an error
    /// when the video name is not unique within its playlist.
    pub fn find_video(&self, key: &VideoKey) -> Result<Option<VideoItem>, CatalogError> {
        let Some(playlist) = find_playlist(&self.playlists, &key.playlist) else {
            return Ok(None);
        };

        let mut matches = playlist.load_videos().iter().filter(|v| v.name == key.video);
        let Some(first) = matches.next() else {
            return Ok(None);
        };

        let extra = matches.count();
        if extra > 0 {
            return Err(CatalogError::AmbiguousVideo {
                playlist: key.playlist.clone(),
                video: key.video.clone(),
                matches: extra + 1,
            });
        }

        Ok(Some(first.clone()))
    }

    /// Get the number of playlists
    pub fn len(&self) -> usize {
        self.playlists.len()
    }

    /// Check if the catalog has no playlists
    pub fn is_empty(&self) -> bool {
        self.playlists.is_empty()
    }
}

/// Exact-match lookup that treats duplicate names as absent
pub fn find_playlist<'a>(
    playlists: &'a [Arc<PlaylistItem>],
    name: &str,
) -> Option<&'a Arc<PlaylistItem>> {
    let mut matches = playlists.iter().filter(|p| p.name == name);
    let first = matches.next()?;

    if matches.next().is_some() {
        tracing::warn!(playlist = name, "Duplicate playlist name in catalog");
        return None;
    }

    Some(first)
}
