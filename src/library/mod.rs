//! Catalog of groups, playlists and videos.
//!
//! The catalog is a single JSON document, loaded once at startup:
//!
//! ```text
//! ~/.khanviewer/
//! ├── catalog.json              # Groups, playlists and their videos
//! └── cache/
//!     └── <storage_id>.json     # SHA256(playlist, video)[0:16]
//! ```

pub mod catalog;
pub mod client;

pub use catalog::{find_playlist, Catalog, CatalogError};
pub use client::CatalogClient;
