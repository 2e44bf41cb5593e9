//! Remote device configuration for Hearth
//!
//! This crate provides:
//! - Device API client (settings and location endpoints)
//! - TTS entry derivation from the server's `ttsSettings`
//! - Scheduled and on-demand configuration updates published on the bus

pub mod api;
pub mod error;
pub mod tts;
pub mod updater;

// Re-exports
pub use api::{DeviceApi, HttpDeviceApi};
pub use error::ApiError;
pub use tts::parse_tts;
pub use updater::{ConfigUpdater, UpdateOutcome};
