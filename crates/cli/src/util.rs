//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use hearth_core::Settings;
use std::path::{Path, PathBuf};

/// Environment variable overriding the settings file location
pub const CONFIG_ENV: &str = "HEARTH_CONFIG";

/// Resolve the settings file path
///
/// Precedence: explicit `--config`, then `$HEARTH_CONFIG`, then
/// `<config dir>/hearth/hearth.toml`.
pub fn settings_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return absolute(path);
    }
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return absolute(PathBuf::from(path));
    }
    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join("hearth").join("hearth.toml"))
}

/// Load and validate a settings file
pub fn load_settings(path: &Path) -> Result<Settings> {
    let settings = Settings::load(path)?;
    settings
        .validate()
        .with_context(|| format!("Invalid settings in {}", path.display()))?;
    Ok(settings)
}

/// Make `path` absolute against the current directory
pub fn absolute(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    Ok(cwd.join(path))
}

/// Where `hearth sync` remembers the last configuration it saw
pub fn sync_state_path() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir().context("Could not determine cache directory")?;
    Ok(cache_dir.join("hearth").join("remote.fingerprint"))
}

/// Wall-clock timestamp for terminal output
pub fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S%.3f").to_string()
}
