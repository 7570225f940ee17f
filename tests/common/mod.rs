//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use khanviewer::core::UiThread;
use khanviewer::{Catalog, Field, PlaylistItem, Shell, UiDispatcher, VideoRecord};

/// Something the shell was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    Changed(Field),
    Alert(String),
}

/// Shell that records every call for later inspection
#[derive(Clone, Default)]
pub struct RecordingShell {
    events: Arc<Mutex<Vec<ShellEvent>>>,
}

impl RecordingShell {
    pub fn events(&self) -> Vec<ShellEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn changes_of(&self, field: Field) -> usize {
        self.events()
            .iter()
            .filter(|e| **e == ShellEvent::Changed(field))
            .count()
    }
}

impl Shell for RecordingShell {
    fn notify_changed(&mut self, field: Field) {
        self.events.lock().unwrap().push(ShellEvent::Changed(field));
    }

    fn show_user_message(&mut self, text: &str) {
        self.events
            .lock()
            .unwrap()
            .push(ShellEvent::Alert(text.to_string()));
    }
}

/// Start a UI thread around a recording shell
pub fn recording_ui() -> (UiDispatcher, UiThread<RecordingShell>, RecordingShell) {
    let shell = RecordingShell::default();
    let (ui, thread) = UiDispatcher::spawn(shell.clone()).unwrap();
    (ui, thread, shell)
}

/// Catalog with two groups and a handful of playlists
pub fn sample_catalog() -> Arc<Catalog> {
    Arc::new(Catalog::from_parts(
        vec![
            khanviewer::GroupItem::new("Math", "Arithmetic through calculus"),
            khanviewer::GroupItem::new("Science", "Biology, chemistry, physics"),
        ],
        vec![
            PlaylistItem::new("Algebra")
                .with_group("Math")
                .with_video(VideoRecord::new("Intro"))
                .with_video(VideoRecord::new("Slopes"))
                .with_video(VideoRecord::new("Quadratics")),
            PlaylistItem::new("Biology")
                .with_group("Science")
                .with_video(VideoRecord::new("Cells"))
                .with_video(VideoRecord::new("DNA")),
            PlaylistItem::new("Duplicates")
                .with_group("Science")
                .with_video(VideoRecord::new("Twin"))
                .with_video(VideoRecord::new("Twin")),
        ],
    ))
}
