//! Video items and the keys that identify them in the cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Identifies a video by its owning playlist and its own name.
///
/// Video names are only unique within a playlist, so every cache lookup is
/// keyed by the pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoKey {
    /// Owning playlist name
    pub playlist: String,

    /// Video name within the playlist
    pub video: String,
}

impl VideoKey {
    /// Create a key from a playlist and video name
    pub fn new(playlist: impl Into<String>, video: impl Into<String>) -> Self {
        Self {
            playlist: playlist.into(),
            video: video.into(),
        }
    }

    /// Stable file stem for on-disk storage (first 16 hex chars of SHA256)
    pub fn storage_id(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.playlist.as_bytes());
        // Separator keeps ("ab", "c") and ("a", "bc") apart
        hasher.update([0u8]);
        hasher.update(self.video.as_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..8])
    }
}

impl std::fmt::Display for VideoKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.playlist, self.video)
    }
}

/// A single video inside a playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoItem {
    /// Video name, unique within its playlist
    pub name: String,

    /// Name of the owning playlist (lookup only, not ownership)
    pub playlist: String,

    /// Display title
    #[serde(default)]
    pub title: String,

    /// Display description
    #[serde(default)]
    pub description: String,

    /// Where the video can be streamed or downloaded from
    #[serde(default)]
    pub url: Option<String>,

    /// Running time in seconds
    #[serde(default)]
    pub duration_secs: Option<u64>,

    /// Publication date
    #[serde(default)]
    pub published: Option<DateTime<Utc>>,
}

impl VideoItem {
    /// Create a video with only its identity filled in
    pub fn new(playlist: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            title: name.clone(),
            name,
            playlist: playlist.into(),
            description: String::new(),
            url: None,
            duration_secs: None,
            published: None,
        }
    }

    /// Key under which this video is cached
    pub fn key(&self) -> VideoKey {
        VideoKey::new(&self.playlist, &self.name)
    }

    /// Set the display title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the source URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the running time
    pub fn with_duration(mut self, duration_secs: u64) -> Self {
        self.duration_secs = Some(duration_secs);
        self
    }
}
