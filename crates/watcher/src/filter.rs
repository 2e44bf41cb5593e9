//! Classification of raw `notify` events
//!
//! Only file creations and content modifications are eligible to notify.
//! Directory events, deletions, renames, metadata and access events are
//! dropped here.

use notify::event::{CreateKind, ModifyKind, RemoveKind};
use notify::{Event, EventKind};
use std::path::Path;

/// Kind of change an eligible event represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// File created
    Created,
    /// File content modified
    Modified,
}

/// Classify an event, returning `None` when it can never trigger a notification
pub fn classify(event: &Event) -> Option<ChangeKind> {
    match event.kind {
        EventKind::Create(CreateKind::Folder) => None,
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Modify(ModifyKind::Data(_))
        | EventKind::Modify(ModifyKind::Any)
        | EventKind::Modify(ModifyKind::Other) => Some(ChangeKind::Modified),
        // Metadata-only changes, renames/moves, removals and access
        _ => None,
    }
}

/// Whether the event concerns a directory rather than a file
pub fn is_directory_event(event: &Event, path: &Path) -> bool {
    matches!(
        event.kind,
        EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder)
    ) || path.is_dir()
}
