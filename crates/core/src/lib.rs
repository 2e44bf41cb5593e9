//! Shared building blocks for Hearth
//!
//! This crate provides:
//! - In-process message bus (broadcast of typed messages)
//! - Local settings file (TOML)
//! - BLAKE3 fingerprints for change detection

pub mod bus;
pub mod fingerprint;
pub mod settings;

// Re-exports
pub use bus::{Message, MessageBus};
pub use fingerprint::Fingerprint;
pub use settings::{RemoteSettings, Settings, WatchSettings};

/// Result type for core operations
pub type Result<T> = anyhow::Result<T>;
