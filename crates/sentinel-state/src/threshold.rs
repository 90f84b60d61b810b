//! Per-(conversation, rule) threshold window tracking.
//!
//! A rule with `threshold: N, window: W` only fires on its Nth qualifying
//! match within a rolling W-second window. Firing drains the counter and the
//! next match starts a fresh window ("drain and restart" rather than a
//! sliding count). Windows are anchored at the first match.

use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tokio::sync::Notify;
use tracing::debug;

use crate::state::ConversationKey;
use sentinel_core::now_ms;

/// One active counting window, anchored at its first match.
#[derive(Debug, Clone)]
struct WindowEntry {
    count: u32,
    window_end_ms: u64,
}

/// Sliding-window counters keyed by `(conversation tuple, rule id)`.
///
/// Counters for distinct tuples are fully isolated. Entries expire lazily on
/// the next access past their window end; a background sweep prunes the rest.
pub struct ThresholdTracker {
    entries: Arc<RwLock<FxHashMap<(ConversationKey, String), WindowEntry>>>,
    /// Notify for shutdown of the cleanup task.
    shutdown: Arc<Notify>,
}

impl ThresholdTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(FxHashMap::default())),
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Check whether a rule should fire on this invocation.
    ///
    /// Rules without a threshold policy always fire.
    pub fn check(
        &self,
        key: &ConversationKey,
        rule_id: &str,
        threshold: Option<u32>,
        window_secs: Option<u64>,
    ) -> bool {
        self.check_at(key, rule_id, threshold, window_secs, now_ms())
    }

    /// [`check`](Self::check) with an explicit clock, used by tests.
    pub fn check_at(
        &self,
        key: &ConversationKey,
        rule_id: &str,
        threshold: Option<u32>,
        window_secs: Option<u64>,
        now_ms: u64,
    ) -> bool {
        let (Some(threshold), Some(window_secs)) = (threshold, window_secs) else {
            return true;
        };

        let map_key = (key.clone(), rule_id.to_string());
        let fresh = WindowEntry {
            count: 1,
            window_end_ms: now_ms + window_secs * 1000,
        };
        let mut entries = self.entries.write();

        match entries.entry(map_key) {
            Entry::Occupied(mut occupied) => {
                if now_ms > occupied.get().window_end_ms {
                    // Previous window lapsed; start over.
                    occupied.insert(fresh);
                    return threshold == 1;
                }
                let entry = occupied.get_mut();
                entry.count += 1;
                if entry.count >= threshold {
                    // Drain: the window restarts at the next match.
                    occupied.remove();
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(fresh);
                threshold == 1
            }
        }
    }

    /// Remove entries whose window has lapsed.
    pub fn cleanup_expired(&self) {
        let now = now_ms();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| now <= entry.window_end_ms);
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, remaining = entries.len(), "threshold windows cleaned up");
        }
    }

    /// Start the background cleanup task.
    pub fn start_cleanup_task(&self, cleanup_interval: Duration) {
        let entries = self.entries.clone();
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.notified() => {
                        debug!("threshold cleanup task shutting down");
                        break;
                    }
                    _ = tokio::time::sleep(cleanup_interval) => {
                        let now = now_ms();
                        let mut map = entries.write();
                        map.retain(|_, entry| now <= entry.window_end_ms);
                    }
                }
            }
        });
    }

    /// Number of active windows.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True when no windows are active.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop all windows.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Signal shutdown to the cleanup task.
    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}

impl Default for ThresholdTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ThresholdTracker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for ThresholdTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThresholdTracker")
            .field("windows", &self.len())
            .finish()
    }
}
