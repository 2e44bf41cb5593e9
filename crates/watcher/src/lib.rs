//! Debounced file change notifications for Hearth
//!
//! This crate provides:
//! - Per-file watching on top of non-recursive directory watches
//! - Event filtering (created/modified files only, exact path match)
//! - Per-path debouncing with a settle pause before notifying
//! - Callback or channel delivery

pub mod debounce;
pub mod error;
pub mod filter;
pub mod notifier;

// Re-exports
pub use debounce::{DebounceState, WatchOptions};
pub use error::WatchError;
pub use filter::ChangeKind;
pub use notifier::{canonical_target, FileWatcher};

/// Result type for watcher operations
pub type Result<T> = std::result::Result<T, WatchError>;
