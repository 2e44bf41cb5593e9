//! Settings management command
//!
//! Provides CLI interface to view and validate the settings file.

use crate::util;
use anyhow::Result;
use hearth_core::Settings;
use owo_colors::OwoColorize;
use std::path::PathBuf;

/// Show example settings
pub async fn run_example() -> Result<()> {
    print!("{}", Settings::example());
    Ok(())
}

/// Validate a settings file and summarize it
pub async fn run_check(config: Option<PathBuf>) -> Result<()> {
    let path = util::settings_path(config)?;
    let settings = util::load_settings(&path)?;

    println!("{} {}", "✓".green(), path.display());

    println!("\n{}", "[watch]".yellow());
    println!(
        "  {} = {}",
        "paths".cyan(),
        if settings.watch.paths.is_empty() {
            "(none)".dimmed().to_string()
        } else {
            settings
                .watch
                .paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        }
    );
    println!(
        "  {} = {} {}",
        "debounce_ms".cyan(),
        settings.watch.debounce_ms,
        "(1-60000)".dimmed()
    );
    println!(
        "  {} = {} {}",
        "settle_ms".cyan(),
        settings.watch.settle_ms,
        "(0-10000)".dimmed()
    );

    match &settings.remote {
        Some(remote) => {
            println!("\n{}", "[remote]".yellow());
            println!("  {} = {}", "url".cyan(), remote.url);
            println!("  {} = {}", "version".cyan(), remote.version);
            println!("  {} = {}", "uuid".cyan(), remote.uuid);
            println!(
                "  {} = {}",
                "token".cyan(),
                if remote.token.is_some() { "(set)" } else { "(none)" }
            );
            println!(
                "  {} = {} {}",
                "max_delay_secs".cyan(),
                remote.max_delay_secs,
                "(1-86400)".dimmed()
            );
        }
        None => println!("\n{}", "No [remote] section: polling disabled".dimmed()),
    }

    Ok(())
}

/// Show the settings file path and optionally create it
pub async fn run_path(create: bool) -> Result<()> {
    let path = util::settings_path(None)?;

    if create && !path.exists() {
        Settings::default().save(&path)?;
        println!("{} Created settings file at: {}", "✓".green(), path.display());
    } else if path.exists() {
        println!("{}", path.display());
    } else {
        println!("{}", path.display());
        println!("{}", "File does not exist. Use --create to create it.".yellow());
    }

    Ok(())
}
