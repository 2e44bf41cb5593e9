//! Print debounced file changes

use crate::util;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::thread;
use watcher::{FileWatcher, WatchOptions};

pub async fn run(paths: Vec<PathBuf>, debounce_ms: u64, settle_ms: u64) -> Result<()> {
    let paths = paths
        .into_iter()
        .map(util::absolute)
        .collect::<Result<Vec<_>>>()?;
    let options = WatchOptions::from_millis(debounce_ms, settle_ms);

    let (mut watcher, changes) =
        FileWatcher::with_channel(&paths, options).context("Failed to start file watcher")?;

    println!(
        "{} {} {} {}",
        "Watching".bold(),
        paths.len(),
        if paths.len() == 1 { "file" } else { "files" },
        "(Ctrl-C to stop)".dimmed()
    );
    for dir in watcher.watched_dirs() {
        println!("  {}", dir.display().dimmed());
    }

    // Printing happens off the runtime; the loop ends once the watcher is dropped
    thread::spawn(move || {
        for path in changes {
            println!("{} {}", util::timestamp().dimmed(), path.display().cyan());
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    watcher.shutdown().context("Failed to stop file watcher")?;
    println!("{}", "Stopped".dimmed());
    Ok(())
}
