//! Local settings file
//!
//! ```toml
//! [watch]
//! paths = ["/etc/hearth/skills.toml"]
//! debounce_ms = 300
//! settle_ms = 100
//!
//! [remote]
//! url = "https://api.example.com"
//! version = "v1"
//! uuid = "device-uuid"
//! token = "access-token"
//! max_delay_secs = 60
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub watch: WatchSettings,

    /// Remote device-configuration API (polling disabled when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteSettings>,
}

/// File watching settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchSettings {
    /// Absolute paths of files to watch
    #[serde(default)]
    pub paths: Vec<PathBuf>,

    /// Minimum interval between two notifications for the same file
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Pause before notifying, letting the writer finish
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

/// Remote device-configuration API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteSettings {
    pub url: String,

    #[serde(default = "default_api_version")]
    pub version: String,

    /// Device identifier
    #[serde(default)]
    pub uuid: String,

    /// Bearer token sent with every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Delay between two scheduled polls
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_settle_ms() -> u64 {
    100
}

fn default_api_version() -> String {
    "v1".to_string()
}

fn default_max_delay_secs() -> u64 {
    60
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            debounce_ms: default_debounce_ms(),
            settle_ms: default_settle_ms(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
        Ok(settings)
    }

    /// Write settings to a TOML file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write settings file {}", path.display()))?;
        Ok(())
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        let watch = &self.watch;
        if !(1..=60_000).contains(&watch.debounce_ms) {
            anyhow::bail!(
                "watch.debounce_ms must be between 1 and 60000 (got {})",
                watch.debounce_ms
            );
        }
        if watch.settle_ms > 10_000 {
            anyhow::bail!(
                "watch.settle_ms must be between 0 and 10000 (got {})",
                watch.settle_ms
            );
        }
        for path in &watch.paths {
            if !path.is_absolute() {
                anyhow::bail!("watch.paths entries must be absolute: {}", path.display());
            }
        }

        if let Some(remote) = &self.remote {
            if remote.url.trim().is_empty() {
                anyhow::bail!("remote.url must not be empty");
            }
            if !(1..=86_400).contains(&remote.max_delay_secs) {
                anyhow::bail!(
                    "remote.max_delay_secs must be between 1 and 86400 (got {})",
                    remote.max_delay_secs
                );
            }
        }

        Ok(())
    }

    /// Commented example settings file
    pub fn example() -> &'static str {
        r#"# Hearth settings

[watch]
# Files to watch for changes (absolute paths)
paths = ["/etc/hearth/skills.toml"]
# Minimum interval between two notifications for the same file
debounce_ms = 300
# Pause before notifying, letting the writer finish
settle_ms = 100

[remote]
# Device-configuration API
url = "https://api.example.com"
version = "v1"
uuid = "00000000-0000-0000-0000-000000000000"
token = "access-token"
# Seconds between two scheduled polls
max_delay_secs = 60
"#
    }
}
