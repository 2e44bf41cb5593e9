//! Debounced file change notifier
//!
//! The OS notifies per directory, so each distinct parent directory of the
//! watched files gets one non-recursive watch. Incoming events are filtered
//! down to the exact files of interest, debounced per file and handed to the
//! callback on the `notify` delivery thread.

use crate::debounce::{DebounceState, WatchOptions};
use crate::error::WatchError;
use crate::filter;
use crate::Result;
use crossbeam_channel::Receiver;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

type Callback = Box<dyn Fn(&Path) + Send + Sync>;

/// Routes raw events to the debounce state of the file they concern
pub(crate) struct Dispatcher {
    /// Watched file -> its debounce state (fixed after construction)
    targets: HashMap<PathBuf, DebounceState>,
    callback: Callback,
    options: WatchOptions,
    active: AtomicBool,
}

impl Dispatcher {
    pub(crate) fn new(targets: Vec<PathBuf>, options: WatchOptions, callback: Callback) -> Self {
        Self {
            targets: targets
                .into_iter()
                .map(|path| (path, DebounceState::new()))
                .collect(),
            callback,
            options,
            active: AtomicBool::new(true),
        }
    }

    pub(crate) fn handle(&self, event: &Event) {
        if !self.is_active() {
            return;
        }

        let Some(kind) = filter::classify(event) else {
            trace!("Ignoring {:?} event for {:?}", event.kind, event.paths);
            return;
        };

        for path in &event.paths {
            let Some(state) = self.targets.get(path) else {
                continue;
            };
            if filter::is_directory_event(event, path) {
                continue;
            }

            let accepted = state.run_debounced(&self.options, || {
                // Re-checked under the lock so a concurrent shutdown wins
                if self.is_active() {
                    (self.callback)(path);
                }
            });

            if accepted {
                debug!("Change detected ({:?}): {}", kind, path.display());
            } else {
                trace!("Debounced {:?} event for {}", kind, path.display());
            }
        }
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Stop dispatching and wait for in-flight notifications to finish
    fn stop(&self) {
        self.active.store(false, Ordering::Release);
        for state in self.targets.values() {
            state.wait_idle();
        }
    }
}

/// Watches a fixed set of files and reports debounced changes
///
/// Reported paths have their parent directory canonicalized (symlinks in
/// the directory part resolved). The callback runs on the watcher's
/// delivery thread; it must not call `shutdown` on the same watcher.
pub struct FileWatcher {
    watcher: Option<RecommendedWatcher>,
    dispatcher: Arc<Dispatcher>,
    watched_dirs: Vec<PathBuf>,
}

impl FileWatcher {
    /// Start watching `paths` with default timing (300ms debounce, 100ms settle)
    pub fn new<I, P, F>(paths: I, callback: F) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
        F: Fn(&Path) + Send + Sync + 'static,
    {
        Self::with_options(paths, WatchOptions::default(), callback)
    }

    /// Start watching `paths` with explicit timing
    ///
    /// Fails if a path is relative or its directory does not exist. Events
    /// may be delivered before this returns.
    pub fn with_options<I, P, F>(paths: I, options: WatchOptions, callback: F) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
        F: Fn(&Path) + Send + Sync + 'static,
    {
        let mut targets = Vec::new();
        let mut dirs = BTreeSet::new();

        for path in paths {
            let (dir, target) = resolve_target(path.as_ref())?;
            dirs.insert(dir);
            if !targets.contains(&target) {
                targets.push(target);
            }
        }

        let dispatcher = Arc::new(Dispatcher::new(targets, options, Box::new(callback)));

        let handler = Arc::clone(&dispatcher);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => handler.handle(&event),
            Err(e) => warn!("File watch error: {}", e),
        })
        .map_err(WatchError::Backend)?;

        for dir in &dirs {
            watcher
                .watch(dir, RecursiveMode::NonRecursive)
                .map_err(|source| WatchError::Setup {
                    dir: dir.clone(),
                    source,
                })?;
            debug!("Watching directory {}", dir.display());
        }

        info!(
            "Watching {} files in {} directories",
            dispatcher.targets.len(),
            dirs.len()
        );

        Ok(Self {
            watcher: Some(watcher),
            dispatcher,
            watched_dirs: dirs.into_iter().collect(),
        })
    }

    /// Start watching `paths`, delivering changed paths on a channel
    pub fn with_channel<I, P>(paths: I, options: WatchOptions) -> Result<(Self, Receiver<PathBuf>)>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let (tx, rx) = crossbeam_channel::unbounded();
        let watcher = Self::with_options(paths, options, move |path: &Path| {
            // Receiver gone means nobody is listening anymore
            let _ = tx.send(path.to_path_buf());
        })?;
        Ok((watcher, rx))
    }

    /// Cancel all directory watches and stop notifying
    ///
    /// Waits for an in-flight notification to finish. Once this returns the
    /// callback is never invoked again. Calling it again is a no-op.
    pub fn shutdown(&mut self) -> Result<()> {
        let Some(mut watcher) = self.watcher.take() else {
            return Ok(());
        };

        self.dispatcher.stop();

        let mut result = Ok(());
        for dir in &self.watched_dirs {
            match watcher.unwatch(dir) {
                Ok(()) => {}
                Err(e) if is_already_unwatched(&e) => {
                    debug!("Watch on {} already gone", dir.display());
                }
                Err(source) => {
                    warn!("Failed to unwatch {}: {}", dir.display(), source);
                    if result.is_ok() {
                        result = Err(WatchError::Teardown {
                            dir: dir.clone(),
                            source,
                        });
                    }
                }
            }
        }
        drop(watcher);

        info!("Stopped watching {} directories", self.watched_dirs.len());
        result
    }

    /// Whether `shutdown` has not been called yet
    pub fn is_running(&self) -> bool {
        self.watcher.is_some()
    }

    /// Watched files
    pub fn targets(&self) -> impl Iterator<Item = &Path> {
        self.dispatcher.targets.keys().map(PathBuf::as_path)
    }

    /// Directories registered with the OS
    pub fn watched_dirs(&self) -> &[PathBuf] {
        &self.watched_dirs
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("File watcher shutdown failed: {}", e);
        }
    }
}

/// Path as it will be reported for the watch target `path`
pub fn canonical_target(path: &Path) -> Result<PathBuf> {
    resolve_target(path).map(|(_, target)| target)
}

/// Split a target into its canonical parent directory and canonical path
fn resolve_target(path: &Path) -> Result<(PathBuf, PathBuf)> {
    if !path.is_absolute() {
        return Err(WatchError::RelativePath(path.to_path_buf()));
    }
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return Err(WatchError::RelativePath(path.to_path_buf()));
    };

    let dir = fs::canonicalize(parent).map_err(|source| WatchError::MissingDirectory {
        target: path.to_path_buf(),
        dir: parent.to_path_buf(),
        source,
    })?;
    if !dir.is_dir() {
        return Err(WatchError::MissingDirectory {
            target: path.to_path_buf(),
            dir,
            source: std::io::Error::new(std::io::ErrorKind::Other, "not a directory"),
        });
    }

    let target = dir.join(name);
    Ok((dir, target))
}

fn is_already_unwatched(error: &notify::Error) -> bool {
    matches!(
        error.kind,
        notify::ErrorKind::WatchNotFound | notify::ErrorKind::PathNotFound
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, ModifyKind, RemoveKind};
    use notify::EventKind;
    use parking_lot::Mutex;
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    type Calls = Arc<Mutex<Vec<PathBuf>>>;

    fn dispatcher(targets: &[&str]) -> (Dispatcher, Calls) {
        dispatcher_with(targets, WatchOptions::default())
    }

    fn dispatcher_with(targets: &[&str], options: WatchOptions) -> (Dispatcher, Calls) {
        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let dispatcher = Dispatcher::new(
            targets.iter().map(PathBuf::from).collect(),
            options,
            Box::new(move |path: &Path| sink.lock().push(path.to_path_buf())),
        );
        (dispatcher, calls)
    }

    fn modified(path: &str) -> Event {
        Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(PathBuf::from(path))
    }

    #[test]
    fn test_rapid_saves_notify_once_per_target() {
        let (dispatcher, calls) = dispatcher(&["/a/config.yml", "/a/other.yml"]);

        dispatcher.handle(&modified("/a/config.yml"));
        thread::sleep(Duration::from_millis(50));
        dispatcher.handle(&modified("/a/config.yml"));
        assert_eq!(*calls.lock(), vec![PathBuf::from("/a/config.yml")]);

        // Independent debounce state per target
        thread::sleep(Duration::from_millis(10));
        dispatcher.handle(&modified("/a/other.yml"));
        assert_eq!(
            *calls.lock(),
            vec![PathBuf::from("/a/config.yml"), PathBuf::from("/a/other.yml")]
        );
    }

    #[test]
    fn test_burst_of_events_notifies_once() {
        let (dispatcher, calls) = dispatcher(&["/a/config.yml"]);

        dispatcher.handle(
            &Event::new(EventKind::Create(CreateKind::File)).add_path(PathBuf::from("/a/config.yml")),
        );
        for _ in 0..5 {
            dispatcher.handle(&modified("/a/config.yml"));
        }

        assert_eq!(calls.lock().len(), 1);
    }

    #[test]
    fn test_spaced_saves_notify_in_order() {
        let (dispatcher, calls) = dispatcher(&["/a/config.yml"]);

        dispatcher.handle(&modified("/a/config.yml"));
        thread::sleep(Duration::from_millis(500));
        dispatcher.handle(&modified("/a/config.yml"));

        assert_eq!(
            *calls.lock(),
            vec![PathBuf::from("/a/config.yml"), PathBuf::from("/a/config.yml")]
        );
    }

    #[test]
    fn test_sibling_file_is_ignored() {
        let (dispatcher, calls) = dispatcher(&["/a/config.yml"]);

        dispatcher.handle(&modified("/a/config.yml.swp"));
        dispatcher.handle(&modified("/a/notes.txt"));

        assert!(calls.lock().is_empty());
    }

    #[test]
    fn test_directory_and_delete_events_are_ignored() {
        let (dispatcher, calls) = dispatcher(&["/a/config.yml"]);

        dispatcher.handle(
            &Event::new(EventKind::Create(CreateKind::Folder)).add_path(PathBuf::from("/a/config.yml")),
        );
        dispatcher.handle(
            &Event::new(EventKind::Remove(RemoveKind::File)).add_path(PathBuf::from("/a/config.yml")),
        );

        assert!(calls.lock().is_empty());
    }

    #[test]
    fn test_stopped_dispatcher_ignores_events() {
        let (dispatcher, calls) = dispatcher(&["/a/config.yml"]);

        dispatcher.stop();
        dispatcher.handle(&modified("/a/config.yml"));

        assert!(calls.lock().is_empty());
    }

    #[test]
    fn test_stop_during_settle_pause_suppresses_callback() {
        let (dispatcher, calls) =
            dispatcher_with(&["/a/config.yml"], WatchOptions::from_millis(300, 300));
        let dispatcher = Arc::new(dispatcher);

        let handler = {
            let dispatcher = Arc::clone(&dispatcher);
            thread::spawn(move || dispatcher.handle(&modified("/a/config.yml")))
        };

        // Let the handler accept the event and enter the settle pause
        thread::sleep(Duration::from_millis(50));

        dispatcher.stop();
        assert!(calls.lock().is_empty());

        handler.join().unwrap();
        assert!(calls.lock().is_empty());
    }

    #[test]
    fn test_relative_path_is_rejected() {
        let result = FileWatcher::new(["config.yml"], |_: &Path| {});
        assert!(matches!(result, Err(WatchError::RelativePath(_))));
    }

    #[test]
    fn test_missing_directory_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing/config.yml");

        let result = FileWatcher::new([&path], |_: &Path| {});
        assert!(matches!(result, Err(WatchError::MissingDirectory { .. })));
    }

    #[test]
    fn test_one_watch_per_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("skills")).unwrap();

        let watcher = FileWatcher::new(
            [
                root.join("config.yml"),
                root.join("other.yml"),
                root.join("skills/weather.yml"),
            ],
            |_: &Path| {},
        )
        .unwrap();

        assert_eq!(watcher.watched_dirs().len(), 2);
        assert_eq!(watcher.targets().count(), 3);
    }

    #[test]
    fn test_canonical_target_resolves_parent() {
        let temp_dir = TempDir::new().unwrap();
        let target = canonical_target(&temp_dir.path().join("config.yml")).unwrap();

        assert_eq!(
            target,
            fs::canonicalize(temp_dir.path()).unwrap().join("config.yml")
        );
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let mut watcher =
            FileWatcher::new([temp_dir.path().join("config.yml")], |_: &Path| {}).unwrap();

        assert!(watcher.is_running());
        watcher.shutdown().unwrap();
        assert!(!watcher.is_running());
        watcher.shutdown().unwrap();
    }
}
