//! Configuration updates from the device API
//!
//! The updater fetches the device settings and location, derives the `tts`
//! entry and publishes `configuration.updated` whenever the resulting
//! document differs from the last one it published. It runs on demand and
//! on a fixed schedule.

use crate::api::DeviceApi;
use crate::error::ApiError;
use crate::tts::parse_tts;
use hearth_core::bus::{CONFIGURATION_UPDATED, DEVICE_NOT_PAIRED};
use hearth_core::{Fingerprint, Message, MessageBus};
use parking_lot::Mutex;
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Result of an on-demand update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// New configuration was published
    Updated,
    /// Remote configuration is unchanged
    NoChange,
    /// The API rejected the device credentials
    NotPaired,
    /// Any other failure
    Failed(String),
}

/// Polls the device API and publishes configuration changes
pub struct ConfigUpdater<A> {
    api: A,
    bus: MessageBus,
    /// Fingerprint of the last published configuration
    last_published: Mutex<Option<Fingerprint>>,
    max_delay: Duration,
}

impl<A: DeviceApi> ConfigUpdater<A> {
    pub fn new(api: A, bus: MessageBus, max_delay: Duration) -> Self {
        Self {
            api,
            bus,
            last_published: Mutex::new(None),
            max_delay,
        }
    }

    /// Seed the fingerprint of a configuration published earlier
    pub fn with_last_published(self, fingerprint: Option<Fingerprint>) -> Self {
        *self.last_published.lock() = fingerprint;
        self
    }

    /// Fingerprint of the last published configuration
    pub fn last_published(&self) -> Option<Fingerprint> {
        *self.last_published.lock()
    }

    /// Fetch the full configuration document
    pub async fn fetch(&self) -> Result<Value, ApiError> {
        let mut config = self.api.find_setting().await?;

        if let Some(location) = self.api.find_location().await? {
            if !is_empty(&location) {
                config.insert("location".to_string(), location);
            }
        }

        let tts_settings = config
            .get("ttsSettings")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        match parse_tts(&tts_settings) {
            Some(tts) => {
                config.insert("tts".to_string(), tts);
            }
            None => debug!("No active TTS system in device settings"),
        }

        Ok(Value::Object(config))
    }

    /// Fetch the configuration and publish it if it changed
    ///
    /// Returns whether a new configuration was published.
    pub async fn update(&self) -> Result<bool, ApiError> {
        let config = self.fetch().await?;
        let fingerprint = Fingerprint::of_json(&config);

        let mut last_published = self.last_published.lock();
        if *last_published == Some(fingerprint) {
            debug!("Device configuration unchanged ({})", fingerprint);
            return Ok(false);
        }

        *last_published = Some(fingerprint);
        drop(last_published);

        info!("Device configuration changed ({})", fingerprint);
        self.bus.emit(Message::new(CONFIGURATION_UPDATED, config));
        Ok(true)
    }

    /// On-demand update requested by the user
    pub async fn handle_update_request(&self) -> UpdateOutcome {
        match self.update().await {
            Ok(true) => UpdateOutcome::Updated,
            Ok(false) => UpdateOutcome::NoChange,
            Err(ApiError::Unauthorized) => {
                self.bus.emit(Message::signal(DEVICE_NOT_PAIRED));
                UpdateOutcome::NotPaired
            }
            Err(e) => {
                warn!("Configuration update failed: {}", e);
                UpdateOutcome::Failed(e.to_string())
            }
        }
    }

    /// Scheduled update; failures are logged, never propagated
    pub async fn poll(&self) {
        match self.update().await {
            Ok(_) => {}
            Err(ApiError::Unauthorized) => {
                warn!("Impossible to update configuration because device isn't paired");
            }
            Err(e) => warn!("Scheduled configuration update failed: {}", e),
        }
    }

    /// When the next scheduled poll is due
    pub fn next_run(&self) -> Instant {
        Instant::now() + self.max_delay
    }

    /// Poll forever, waiting `max_delay` before each poll
    ///
    /// Cancel by aborting the task running this future.
    pub async fn run(self) {
        info!(
            "Starting configuration polling (interval: {:?})",
            self.max_delay
        );

        loop {
            tokio::time::sleep_until(self.next_run()).await;
            self.poll().await;
        }
    }
}

/// `null`, `{}` and `[]` count as no location
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
