//! Session state: the busy indicator and the sticky error state.
//!
//! The busy indicator counts outstanding [`QueryingHandle`]s. `querying`
//! is true while the count is above zero, and exactly one `Querying`
//! notification is posted per transition, never one per handle.

use std::sync::{Arc, Mutex, MutexGuard};

use super::ui::{Field, UiDispatcher};

#[derive(Debug, Default)]
struct Fields {
    outstanding: usize,
    is_error: bool,
    error_message: Option<String>,
}

#[derive(Debug)]
struct Inner {
    fields: Mutex<Fields>,
    ui: UiDispatcher,
}

impl Inner {
    fn fields(&self) -> MutexGuard<'_, Fields> {
        self.fields.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn release(&self) {
        let mut fields = self.fields();
        match fields.outstanding {
            0 => tracing::warn!("Querying handle released with no outstanding queries"),
            1 => {
                fields.outstanding = 0;
                tracing::debug!("Querying stopped");
                self.ui.notify_changed(Field::Querying);
            }
            _ => fields.outstanding -= 1,
        }
    }
}

/// Process-level UI state, owned by the application root and shared by
/// cloning.
#[derive(Debug, Clone)]
pub struct SessionState {
    inner: Arc<Inner>,
}

impl SessionState {
    pub fn new(ui: UiDispatcher) -> Self {
        Self {
            inner: Arc::new(Inner {
                fields: Mutex::new(Fields::default()),
                ui,
            }),
        }
    }

    /// Mark the start of a server query. Hold the handle for its duration.
    pub fn begin(&self) -> QueryingHandle {
        let mut fields = self.inner.fields();
        fields.outstanding += 1;
        if fields.outstanding == 1 {
            tracing::debug!("Querying started");
            // Posted under the lock so transitions reach the UI in order
            self.inner.ui.notify_changed(Field::Querying);
        }

        QueryingHandle {
            inner: Arc::clone(&self.inner),
            released: false,
        }
    }

    /// Whether any query is in flight
    pub fn querying(&self) -> bool {
        self.inner.fields().outstanding > 0
    }

    /// Number of outstanding querying handles
    pub fn outstanding(&self) -> usize {
        self.inner.fields().outstanding
    }

    /// Whether a fault has been reported
    pub fn is_error(&self) -> bool {
        self.inner.fields().is_error
    }

    /// Details of the last reported fault, meant for developers
    pub fn error_message(&self) -> Option<String> {
        self.inner.fields().error_message.clone()
    }

    /// Report a fault.
    ///
    /// Records the error and returns at once. The UI thread receives, in
    /// order, the alert and then the `ErrorMessage` and `IsError`
    /// notifications. The alert holds up the UI thread, not the caller, so
    /// the notifications arrive after it is dismissed. The state stays set
    /// until [`SessionState::clear_error`].
    pub fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(error = %message, "Fault reported");

        let mut fields = self.inner.fields();
        self.inner.ui.show_user_message(message.clone());
        fields.is_error = true;
        fields.error_message = Some(message);
        self.inner.ui.notify_changed(Field::ErrorMessage);
        self.inner.ui.notify_changed(Field::IsError);
    }

    /// Reset the error state
    pub fn clear_error(&self) {
        let mut fields = self.inner.fields();
        if !fields.is_error && fields.error_message.is_none() {
            return;
        }

        fields.is_error = false;
        fields.error_message = None;
        self.inner.ui.notify_changed(Field::ErrorMessage);
        self.inner.ui.notify_changed(Field::IsError);
    }

    /// Dispatcher for the UI thread this session reports to
    pub fn ui(&self) -> &UiDispatcher {
        &self.inner.ui
    }
}

/// Scoped token for an in-flight query. Dropping it releases the query.
#[must_use = "dropping the handle immediately ends the query"]
#[derive(Debug)]
pub struct QueryingHandle {
    inner: Arc<Inner>,
    released: bool,
}

impl QueryingHandle {
    /// Release the query early. Later releases, including drop, are no-ops.
    pub fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.inner.release();
        }
    }
}

impl Drop for QueryingHandle {
    fn drop(&mut self) {
        self.release();
    }
}
