//! Groups and playlists as loaded from the catalog document.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use super::video::VideoItem;

/// A top-level grouping of playlists (a subject area)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupItem {
    /// Group name, unique within the catalog
    pub name: String,

    /// Display description
    #[serde(default)]
    pub description: String,
}

impl GroupItem {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Video entry as it appears inside a playlist in the catalog document.
///
/// The owning playlist is implied by nesting, so it is filled in when the
/// playlist materializes its videos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub duration_secs: Option<u64>,
    #[serde(default)]
    pub published: Option<chrono::DateTime<chrono::Utc>>,
}

impl VideoRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: String::new(),
            url: None,
            duration_secs: None,
            published: None,
        }
    }

    fn into_item(self, playlist: &str) -> VideoItem {
        VideoItem {
            title: self.title.unwrap_or_else(|| self.name.clone()),
            name: self.name,
            playlist: playlist.to_string(),
            description: self.description,
            url: self.url,
            duration_secs: self.duration_secs,
            published: self.published,
        }
    }
}

/// A named, ordered list of videos.
///
/// Videos are materialized lazily by [`PlaylistItem::load_videos`]; the list
/// is built exactly once and every later call returns the same slice.
#[derive(Debug, Serialize, Deserialize)]
pub struct PlaylistItem {
    /// Playlist name, unique within the catalog
    pub name: String,

    /// Group this playlist belongs to
    #[serde(default)]
    pub group: Option<String>,

    /// Display description
    #[serde(default)]
    pub description: String,

    #[serde(rename = "videos", default)]
    records: Vec<VideoRecord>,

    #[serde(skip)]
    videos: OnceLock<Vec<VideoItem>>,
}

impl PlaylistItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: None,
            description: String::new(),
            records: Vec::new(),
            videos: OnceLock::new(),
        }
    }

    /// Assign the playlist to a group
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Append a video record
    pub fn with_video(mut self, record: VideoRecord) -> Self {
        self.records.push(record);
        self
    }

    /// Materialize the video list (idempotent)
    pub fn load_videos(&self) -> &[VideoItem] {
        self.videos.get_or_init(|| {
            tracing::debug!(playlist = %self.name, count = self.records.len(), "Loading videos");
            self.records
                .iter()
                .cloned()
                .map(|r| r.into_item(&self.name))
                .collect()
        })
    }

    /// Whether the video list has been materialized yet
    pub fn is_loaded(&self) -> bool {
        self.videos.get().is_some()
    }

    /// Number of videos in the playlist (does not force a load)
    pub fn video_count(&self) -> usize {
        self.records.len()
    }
}
