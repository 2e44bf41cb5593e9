//! One-shot remote configuration sync

use crate::util;
use anyhow::{Context, Result};
use device_config::{ConfigUpdater, HttpDeviceApi, UpdateOutcome};
use hearth_core::{Fingerprint, MessageBus};
use owo_colors::OwoColorize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub async fn run(config: Option<PathBuf>, print: bool) -> Result<()> {
    let settings_path = util::settings_path(config)?;
    let settings = util::load_settings(&settings_path)?;
    let remote = settings.remote.as_ref().with_context(|| {
        format!("No [remote] section in {}", settings_path.display())
    })?;

    let state_path = util::sync_state_path()?;
    let bus = MessageBus::default();
    let mut messages = bus.subscribe();

    let api = HttpDeviceApi::new(remote).context("Failed to create API client")?;
    let updater = ConfigUpdater::new(api, bus, Duration::from_secs(remote.max_delay_secs))
        .with_last_published(read_fingerprint(&state_path));

    match updater.handle_update_request().await {
        UpdateOutcome::Updated => {
            println!("{} Configuration updated", "✓".green());
            if let Some(fingerprint) = updater.last_published() {
                write_fingerprint(&state_path, &fingerprint)?;
            }
            if print {
                if let Ok(message) = messages.try_recv() {
                    println!("{}", serde_json::to_string_pretty(&message.data)?);
                }
            }
            Ok(())
        }
        UpdateOutcome::NoChange => {
            println!("{}", "Configuration has no changes".dimmed());
            if print {
                println!("{}", serde_json::to_string_pretty(&updater.fetch().await?)?);
            }
            Ok(())
        }
        UpdateOutcome::NotPaired => {
            anyhow::bail!("Device is not paired; the API rejected its credentials")
        }
        UpdateOutcome::Failed(reason) => anyhow::bail!("Configuration update failed: {}", reason),
    }
}

/// Last synced fingerprint; missing or corrupt state counts as none
fn read_fingerprint(path: &Path) -> Option<Fingerprint> {
    let content = fs::read_to_string(path).ok()?;
    Fingerprint::from_hex(&content).ok()
}

fn write_fingerprint(path: &Path, fingerprint: &Fingerprint) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, fingerprint.to_hex())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fingerprint_state_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("hearth/remote.fingerprint");
        assert!(read_fingerprint(&path).is_none());

        let fingerprint = Fingerprint::of_bytes(b"{\"lang\":\"en-us\"}");
        write_fingerprint(&path, &fingerprint).unwrap();
        assert_eq!(read_fingerprint(&path), Some(fingerprint));
    }

    #[test]
    fn test_corrupt_state_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("remote.fingerprint");
        fs::write(&path, "not a fingerprint").unwrap();
        assert!(read_fingerprint(&path).is_none());
    }
}
