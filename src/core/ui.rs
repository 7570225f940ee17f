//! UI-affine dispatch.
//!
//! Everything that touches the shell (property-change notifications,
//! alerts, completion callbacks) runs on one dedicated thread. Other threads
//! and tasks post messages to it through a [`UiDispatcher`]; messages are
//! handled strictly in the order they were posted.

use std::thread::{self, JoinHandle, ThreadId};

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};

/// Observable fields of the view-model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Querying,
    IsError,
    ErrorMessage,
}

impl Field {
    /// Property name as seen by the shell
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Querying => "Querying",
            Field::IsError => "IsError",
            Field::ErrorMessage => "ErrorMessage",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The GUI shell as seen from the core.
///
/// Methods are only ever called on the UI thread.
pub trait Shell: Send + 'static {
    /// A view-model property changed
    fn notify_changed(&mut self, field: Field);

    /// Show a blocking message to the user
    fn show_user_message(&mut self, text: &str);
}

type Callback = Box<dyn FnOnce() + Send + 'static>;

enum UiMessage {
    Changed(Field),
    Alert(String),
    Run(Callback),
    Flush(oneshot::Sender<()>),
}

/// Posts work onto the UI thread
#[derive(Clone)]
pub struct UiDispatcher {
    tx: mpsc::UnboundedSender<UiMessage>,
    thread_id: ThreadId,
}

impl std::fmt::Debug for UiDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiDispatcher")
            .field("thread_id", &self.thread_id)
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl UiDispatcher {
    /// Start the UI thread, handing it ownership of the shell
    pub fn spawn<S: Shell>(shell: S) -> Result<(Self, UiThread<S>)> {
        let (tx, rx) = mpsc::unbounded_channel();

        let handle = thread::Builder::new()
            .name("ui".to_string())
            .spawn(move || run_ui_loop(shell, rx))
            .context("Failed to start UI thread")?;

        let dispatcher = Self {
            tx,
            thread_id: handle.thread().id(),
        };

        Ok((dispatcher, UiThread { handle }))
    }

    /// Queue a property-change notification
    pub fn notify_changed(&self, field: Field) {
        self.post(UiMessage::Changed(field));
    }

    /// Queue a blocking user-facing alert
    pub fn show_user_message(&self, text: impl Into<String>) {
        self.post(UiMessage::Alert(text.into()));
    }

    /// Run a closure on the UI thread
    pub fn invoke(&self, f: impl FnOnce() + Send + 'static) {
        self.post(UiMessage::Run(Box::new(f)));
    }

    /// Wait until everything posted so far has been handled
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        self.post(UiMessage::Flush(tx));
        let _ = rx.await;
    }

    /// Whether the caller is running on the UI thread
    pub fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    fn post(&self, message: UiMessage) {
        if self.tx.send(message).is_err() {
            tracing::debug!("UI thread has stopped, dropping message");
        }
    }
}

/// Handle to the running UI thread
pub struct UiThread<S> {
    handle: JoinHandle<S>,
}

impl<S> UiThread<S> {
    /// Wait for the UI thread to finish and take the shell back.
    ///
    /// The thread exits once every [`UiDispatcher`] clone has been dropped.
    pub fn join(self) -> Result<S> {
        self.handle
            .join()
            .map_err(|_| anyhow::anyhow!("UI thread panicked"))
    }
}

fn run_ui_loop<S: Shell>(mut shell: S, mut rx: mpsc::UnboundedReceiver<UiMessage>) -> S {
    while let Some(message) = rx.blocking_recv() {
        match message {
            UiMessage::Changed(field) => shell.notify_changed(field),
            UiMessage::Alert(text) => shell.show_user_message(&text),
            UiMessage::Run(f) => f(),
            UiMessage::Flush(done) => {
                let _ = done.send(());
            }
        }
    }

    tracing::debug!("UI thread exiting");
    shell
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl Shell for Recorder {
        fn notify_changed(&mut self, field: Field) {
            self.events.push(format!("changed:{}", field));
        }

        fn show_user_message(&mut self, text: &str) {
            self.events.push(format!("alert:{}", text));
        }
    }

    #[tokio::test]
    async fn test_messages_handled_in_order() {
        let (ui, thread) = UiDispatcher::spawn(Recorder::default()).unwrap();

        ui.show_user_message("boom");
        ui.notify_changed(Field::ErrorMessage);
        ui.notify_changed(Field::IsError);
        drop(ui);

        let shell = thread.join().unwrap();
        assert_eq!(
            shell.events,
            vec!["alert:boom", "changed:ErrorMessage", "changed:IsError"]
        );
    }

    #[tokio::test]
    async fn test_invoke_runs_on_ui_thread() {
        let (ui, _thread) = UiDispatcher::spawn(Recorder::default()).unwrap();
        assert!(!ui.is_ui_thread());

        let seen = Arc::new(Mutex::new(None));
        let dispatcher = ui.clone();
        let slot = Arc::clone(&seen);
        ui.invoke(move || {
            *slot.lock().unwrap() = Some(dispatcher.is_ui_thread());
        });
        ui.flush().await;

        assert_eq!(*seen.lock().unwrap(), Some(true));
    }

    #[test]
    fn test_field_names() {
        assert_eq!(Field::Querying.as_str(), "Querying");
        assert_eq!(Field::IsError.to_string(), "IsError");
        assert_eq!(Field::ErrorMessage.to_string(), "ErrorMessage");
    }
}
