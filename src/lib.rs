//! khanviewer - local video cache coordinator
//!
//! Resolves videos for a playlist viewer from an on-disk cache, falling
//! back to an in-memory catalog and writing misses back to the cache.
//!
//! # Architecture
//!
//! - Lookups go local store first, catalog second
//! - Catalog hits are persisted in the background
//! - Concurrent requests for the same video share one resolution
//! - Shell notifications are delivered on a single UI thread
//!
//! # Modules
//!
//! - `core`: Resolution, session state, UI dispatch, view-model
//! - `domain`: Data structures (GroupItem, PlaylistItem, VideoItem)
//! - `library`: Catalog loading and sync
//! - `store`: Local video stores (file, memory)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Download the catalog
//! khanviewer sync --url https://example.com/catalog.json
//!
//! # Resolve a video through the cache
//! khanviewer resolve Algebra Intro
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod library;
pub mod store;

// Re-export main types at crate root for convenience
pub use self::core::{Field, MainViewModel, ResolveError, SessionState, Shell, UiDispatcher, VideoResolver};
pub use domain::{GroupItem, PlaylistItem, VideoItem, VideoKey, VideoRecord};
pub use library::{Catalog, CatalogError};
pub use store::{FileStore, LocalStore, MemoryStore, StoreError};
