//! Domain types for the video viewer.
//!
//! This module contains the core data structures:
//! - Groups and playlists, as loaded from the catalog
//! - Videos and the keys that identify them in the cache

pub mod playlist;
pub mod video;

// Re-export commonly used types
pub use playlist::{GroupItem, PlaylistItem, VideoRecord};
pub use video::{VideoItem, VideoKey};
