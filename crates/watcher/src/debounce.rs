//! Per-path debouncing logic
//!
//! A single save often produces several raw events (create, write, close).
//! Each watched path keeps the time of its last accepted event and drops
//! anything arriving within the debounce window.

use parking_lot::Mutex;
use std::thread;
use std::time::{Duration, Instant};

/// Timing knobs for a `FileWatcher`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    /// Minimum interval between two accepted events for the same path
    pub debounce: Duration,
    /// Pause after accepting an event, before notifying
    pub settle: Duration,
}

impl WatchOptions {
    pub fn from_millis(debounce_ms: u64, settle_ms: u64) -> Self {
        Self {
            debounce: Duration::from_millis(debounce_ms),
            settle: Duration::from_millis(settle_ms),
        }
    }
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self::from_millis(300, 100)
    }
}

/// Debounce state of one watched path
///
/// The lock is held for the whole accept path (timestamp update, settle
/// pause and notification), so notifications for one path never overlap.
#[derive(Debug, Default)]
pub struct DebounceState {
    last_change: Mutex<Option<Instant>>,
}

impl DebounceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `notify` unless an event was accepted less than `debounce` ago
    ///
    /// Returns whether the event was accepted. Rejected events leave the
    /// state untouched.
    pub fn run_debounced<F>(&self, options: &WatchOptions, notify: F) -> bool
    where
        F: FnOnce(),
    {
        let mut last_change = self.last_change.lock();
        let now = Instant::now();

        if let Some(previous) = *last_change {
            if now.duration_since(previous) <= options.debounce {
                return false;
            }
        }

        *last_change = Some(now);
        if !options.settle.is_zero() {
            thread::sleep(options.settle);
        }
        notify();
        true
    }

    /// Time of the last accepted event
    pub fn last_change(&self) -> Option<Instant> {
        *self.last_change.lock()
    }

    /// Block until any in-flight notification for this path has finished
    pub(crate) fn wait_idle(&self) {
        drop(self.last_change.lock());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn fast() -> WatchOptions {
        WatchOptions::from_millis(300, 0)
    }

    #[test]
    fn test_first_event_is_accepted() {
        let state = DebounceState::new();
        assert!(state.last_change().is_none());

        let mut called = false;
        assert!(state.run_debounced(&fast(), || called = true));
        assert!(called);
        assert!(state.last_change().is_some());
    }

    #[test]
    fn test_event_within_window_is_dropped() {
        let state = DebounceState::new();
        assert!(state.run_debounced(&fast(), || {}));
        let accepted_at = state.last_change();

        thread::sleep(Duration::from_millis(50));
        let mut called = false;
        assert!(!state.run_debounced(&fast(), || called = true));
        assert!(!called);
        // Dropped events do not extend the window
        assert_eq!(state.last_change(), accepted_at);
    }

    #[test]
    fn test_event_after_window_is_accepted() {
        let options = WatchOptions::from_millis(50, 0);
        let state = DebounceState::new();
        assert!(state.run_debounced(&options, || {}));

        thread::sleep(Duration::from_millis(80));
        assert!(state.run_debounced(&options, || {}));
    }

    #[test]
    fn test_settle_pause_runs_before_notify() {
        let options = WatchOptions::from_millis(300, 100);
        let state = DebounceState::new();

        let start = Instant::now();
        let mut waited = Duration::ZERO;
        state.run_debounced(&options, || waited = start.elapsed());
        assert!(waited >= Duration::from_millis(100));
    }

    #[test]
    fn test_concurrent_events_notify_once() {
        let options = WatchOptions::from_millis(300, 50);
        let state = Arc::new(DebounceState::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let state = Arc::clone(&state);
                let calls = Arc::clone(&calls);
                thread::spawn(move || {
                    state.run_debounced(&options, || {
                        calls.fetch_add(1, Ordering::SeqCst);
                    });
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
