//! Core coordination logic.
//!
//! This module contains:
//! - UiDispatcher: single UI thread for notifications and callbacks
//! - SessionState: busy indicator and error state
//! - VideoResolver: store/catalog lookup with write-back
//! - MainViewModel: the object the GUI shell binds to

pub mod resolver;
pub mod session;
pub mod ui;
pub mod view_model;

// Re-export commonly used types
pub use resolver::{ResolveError, VideoResolver};
pub use session::{QueryingHandle, SessionState};
pub use ui::{Field, Shell, UiDispatcher, UiThread};
pub use view_model::MainViewModel;
