//! Daemon lifecycle management
//!
//! The daemon polls the remote device configuration, watches the settings
//! file plus the configured paths, and applies settings edits live.

use crate::util;
use anyhow::{Context, Result};
use device_config::{ConfigUpdater, HttpDeviceApi};
use hearth_core::bus::{CONFIGURATION_RELOADED, FILE_CHANGED};
use hearth_core::{Message, MessageBus, RemoteSettings, Settings, WatchSettings};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use watcher::{FileWatcher, WatchOptions};

/// Run the daemon in the foreground until Ctrl-C
pub async fn run(config: Option<PathBuf>) -> Result<()> {
    let settings_path = util::settings_path(config)?;
    let settings = util::load_settings(&settings_path)?;

    let bus = MessageBus::default();
    let logger = tokio::spawn(log_messages(bus.subscribe()));

    let (changes_tx, mut changes) = mpsc::unbounded_channel();
    let mut daemon = Daemon::start(settings_path, settings, bus, changes_tx)?;

    info!("Daemon running (Ctrl-C to stop)");
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                info!("Shutting down");
                break;
            }
            Some(path) = changes.recv() => daemon.on_change(&path),
        }
    }

    daemon.stop();
    logger.abort();
    Ok(())
}

/// Running daemon components
struct Daemon {
    /// Settings file as reported by the watcher
    settings_file: PathBuf,
    settings: Settings,
    bus: MessageBus,
    changes_tx: mpsc::UnboundedSender<PathBuf>,
    watcher: Option<FileWatcher>,
    poller: Option<JoinHandle<()>>,
}

impl Daemon {
    fn start(
        settings_path: PathBuf,
        settings: Settings,
        bus: MessageBus,
        changes_tx: mpsc::UnboundedSender<PathBuf>,
    ) -> Result<Self> {
        let settings_file = watcher::canonical_target(&settings_path)
            .with_context(|| format!("Cannot watch settings file {}", settings_path.display()))?;

        let mut daemon = Self {
            settings_file,
            settings,
            bus,
            changes_tx,
            watcher: None,
            poller: None,
        };
        daemon.watcher = Some(daemon.build_watcher(&daemon.settings.watch)?);
        let updater = daemon.build_updater(daemon.settings.remote.as_ref())?;
        daemon.poller = updater.map(|updater| tokio::spawn(updater.run()));
        Ok(daemon)
    }

    /// Create a file watcher for the settings file plus `watch.paths`
    fn build_watcher(&self, watch: &WatchSettings) -> Result<FileWatcher> {
        let mut targets = vec![self.settings_file.clone()];
        targets.extend(watch.paths.iter().cloned());
        let options = WatchOptions::from_millis(watch.debounce_ms, watch.settle_ms);

        let tx = self.changes_tx.clone();
        FileWatcher::with_options(&targets, options, move |path: &Path| {
            // Closed only while the daemon is shutting down
            let _ = tx.send(path.to_path_buf());
        })
        .context("Failed to start file watcher")
    }

    /// Create the remote config poller, `None` when polling is disabled
    fn build_updater(
        &self,
        remote: Option<&RemoteSettings>,
    ) -> Result<Option<ConfigUpdater<HttpDeviceApi>>> {
        let Some(remote) = remote else {
            info!("No [remote] section, configuration polling disabled");
            return Ok(None);
        };

        let api = HttpDeviceApi::new(remote).context("Failed to create API client")?;
        Ok(Some(ConfigUpdater::new(
            api,
            self.bus.clone(),
            Duration::from_secs(remote.max_delay_secs),
        )))
    }

    fn on_change(&mut self, path: &Path) {
        if path == self.settings_file {
            if let Err(e) = self.reload() {
                warn!("Keeping previous settings: {:#}", e);
            }
        } else {
            self.bus.emit(Message::new(
                FILE_CHANGED,
                json!({ "path": path.display().to_string() }),
            ));
        }
    }

    /// Re-read the settings file and restart what changed
    ///
    /// On error the previous settings, watcher and poller stay in place.
    fn reload(&mut self) -> Result<()> {
        let settings = util::load_settings(&self.settings_file)?;
        if settings == self.settings {
            debug!("Settings file touched without changes");
            return Ok(());
        }

        // Build everything first so a failure leaves the running state untouched
        let watcher = if settings.watch != self.settings.watch {
            Some(self.build_watcher(&settings.watch)?)
        } else {
            None
        };
        let updater = if settings.remote != self.settings.remote {
            Some(self.build_updater(settings.remote.as_ref())?)
        } else {
            None
        };

        if let Some(watcher) = watcher {
            if let Some(mut old) = self.watcher.replace(watcher) {
                if let Err(e) = old.shutdown() {
                    warn!("Previous file watcher shutdown failed: {}", e);
                }
            }
        }
        if let Some(updater) = updater {
            if let Some(old) = self.poller.take() {
                old.abort();
            }
            self.poller = updater.map(|updater| tokio::spawn(updater.run()));
        }
        self.settings = settings;

        info!("Settings reloaded from {}", self.settings_file.display());
        self.bus.emit(Message::new(
            CONFIGURATION_RELOADED,
            serde_json::to_value(&self.settings)?,
        ));
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
        if let Some(mut watcher) = self.watcher.take() {
            if let Err(e) = watcher.shutdown() {
                warn!("File watcher shutdown failed: {}", e);
            }
        }
    }
}

/// Log every message published on the bus
async fn log_messages(mut rx: broadcast::Receiver<Message>) {
    loop {
        match rx.recv().await {
            Ok(message) => info!("bus: {}", message.to_json()),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Message logger lagged, skipped {} messages", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
