//! Watcher error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("watch target must be an absolute file path: {0}")]
    RelativePath(PathBuf),

    #[error("directory for watch target {target} is missing or inaccessible: {dir}")]
    MissingDirectory {
        target: PathBuf,
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start file watcher: {0}")]
    Backend(#[source] notify::Error),

    #[error("failed to watch directory {dir}: {source}")]
    Setup {
        dir: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("failed to stop watching {dir}: {source}")]
    Teardown {
        dir: PathBuf,
        #[source]
        source: notify::Error,
    },
}
