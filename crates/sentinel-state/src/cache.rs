//! Conversation state cache with TTL and write-behind batching.
//!
//! Caches hydrated conversation states to keep repeat evaluations off the
//! persistence provider. Also provides:
//! - **LRU-by-access eviction**: at capacity, the entry with the oldest
//!   access time is evicted; a dirty victim is flushed to the provider
//!   before it is dropped
//! - **Write-behind batching**: mutations are marked dirty and persisted by
//!   a debounced background flush instead of one write per mutation

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::provider::StateProvider;
use crate::state::{ConversationKey, ConversationState};
use sentinel_core::defaults::{
    DEFAULT_FLUSH_DEBOUNCE_MS, DEFAULT_STATE_CACHE_MAX_SIZE, DEFAULT_STATE_CACHE_TTL_MS,
};

/// Cache tuning parameters.
#[derive(Debug, Clone)]
pub struct StateCacheConfig {
    /// Entry lifetime measured from the last access, in milliseconds.
    pub ttl_ms: u64,
    /// Maximum number of cached states (soft bound during eviction).
    pub max_size: usize,
    /// Debounce between the first dirty mark in an idle window and the flush.
    pub flush_debounce_ms: u64,
}

impl Default for StateCacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_STATE_CACHE_TTL_MS,
            max_size: DEFAULT_STATE_CACHE_MAX_SIZE,
            flush_debounce_ms: DEFAULT_FLUSH_DEBOUNCE_MS,
        }
    }
}

/// Cache entry with access bookkeeping.
struct CacheEntry {
    state: Arc<ConversationState>,
    last_access: Instant,
}

/// In-memory conversation state cache.
///
/// States are stored as `Arc` snapshots: a mutation replaces the whole entry
/// rather than editing it in place, so snapshots already handed out are
/// never torn. Concurrent evaluations of the same tuple observe the latest
/// inserted snapshot (read-your-writes within the process).
pub struct StateCache {
    entries: RwLock<HashMap<ConversationKey, CacheEntry>>,
    /// Tuples awaiting persistence.
    dirty: Mutex<HashSet<ConversationKey>>,
    /// Wakes the flush task when an idle window gets its first dirty mark.
    dirty_notify: Arc<Notify>,
    /// Notify for shutdown of the flush task.
    shutdown: Arc<Notify>,
    provider: Option<Arc<dyn StateProvider>>,
    ttl: Duration,
    max_size: usize,
    flush_debounce: Duration,

    /// Cache hit counter.
    hits: AtomicU64,
    /// Cache miss counter.
    misses: AtomicU64,
}

impl StateCache {
    /// Create a new cache. The provider, when present, receives dirty
    /// entries on flush and on evict.
    pub fn new(config: StateCacheConfig, provider: Option<Arc<dyn StateProvider>>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            dirty: Mutex::new(HashSet::new()),
            dirty_notify: Arc::new(Notify::new()),
            shutdown: Arc::new(Notify::new()),
            provider,
            ttl: Duration::from_millis(config.ttl_ms),
            max_size: config.max_size,
            flush_debounce: Duration::from_millis(config.flush_debounce_ms),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    // ── Lookup and insert ───────────────────────────────────────

    /// Get the cached state for a tuple.
    ///
    /// Returns `Some` iff the entry exists and was accessed within the TTL;
    /// a hit refreshes the access time.
    pub fn get(&self, key: &ConversationKey) -> Option<Arc<ConversationState>> {
        let mut entries = self.entries.write();
        if let Some(entry) = entries.get_mut(key)
            && entry.last_access.elapsed() < self.ttl
        {
            entry.last_access = Instant::now();
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Some(entry.state.clone());
        }
        drop(entries);

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Insert or replace the state for a tuple.
    ///
    /// At capacity the oldest-accessed entry is evicted first; a dirty
    /// victim is persisted before it is dropped, so batching never loses a
    /// write. Capacity is a soft bound: the cache is back under `max_size`
    /// before this call returns.
    pub async fn insert(&self, key: ConversationKey, state: Arc<ConversationState>) {
        loop {
            let victim = {
                let entries = self.entries.read();
                if entries.len() < self.max_size || entries.contains_key(&key) {
                    None
                } else {
                    entries
                        .iter()
                        .min_by_key(|(_, e)| e.last_access)
                        .map(|(k, _)| k.clone())
                }
            };
            let Some(victim) = victim else { break };
            self.evict(&victim).await;
        }

        self.entries.write().insert(
            key,
            CacheEntry {
                state,
                last_access: Instant::now(),
            },
        );
    }

    /// Flush-before-evict: persist a dirty victim, then drop it.
    async fn evict(&self, key: &ConversationKey) {
        let was_dirty = self.dirty.lock().remove(key);
        if was_dirty && let Some(provider) = &self.provider {
            // Clone the snapshot so no lock is held across the await.
            let state = self.entries.read().get(key).map(|e| e.state.clone());
            if let Some(state) = state {
                if let Err(e) = provider.save(&state).await {
                    warn!(key = %key, error = %e, "failed to persist evicted state");
                }
            }
        }
        self.entries.write().remove(key);
    }

    // ── Write-behind ────────────────────────────────────────────

    /// Record a tuple as needing persistence and nudge the flush task.
    pub fn mark_dirty(&self, key: &ConversationKey) {
        self.dirty.lock().insert(key.clone());
        self.dirty_notify.notify_one();
    }

    /// Persist all dirty entries via the provider; clears the dirty set.
    ///
    /// Returns the number of records persisted. Without a provider the
    /// dirty set is still cleared, otherwise it would grow without bound.
    pub async fn flush_writes(&self) -> usize {
        let keys: Vec<ConversationKey> = {
            let mut dirty = self.dirty.lock();
            dirty.drain().collect()
        };
        if keys.is_empty() {
            return 0;
        }
        let Some(provider) = &self.provider else {
            return 0;
        };

        let mut flushed = 0;
        for key in keys {
            let state = self.entries.read().get(&key).map(|e| e.state.clone());
            if let Some(state) = state {
                match provider.save(&state).await {
                    Ok(()) => flushed += 1,
                    Err(e) => warn!(key = %key, error = %e, "state flush failed"),
                }
            }
        }
        flushed
    }

    /// Start the background flush task.
    ///
    /// The task sleeps until the first `mark_dirty` of an idle window, waits
    /// out the debounce so further mutations can pile on, then flushes the
    /// batch. Stops on [`shutdown`](Self::shutdown).
    pub fn start_flush_task(self: &Arc<Self>) {
        // Weak reference: the task must not keep a dropped cache alive.
        let cache = Arc::downgrade(self);
        let shutdown = self.shutdown.clone();
        let dirty_notify = self.dirty_notify.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.notified() => {
                        debug!("state flush task shutting down");
                        break;
                    }
                    _ = dirty_notify.notified() => {
                        let Some(cache) = cache.upgrade() else { break };
                        tokio::time::sleep(cache.flush_debounce).await;
                        let flushed = cache.flush_writes().await;
                        if flushed > 0 {
                            debug!(flushed, "flushed dirty conversation states");
                        }
                    }
                }
            }
        });
    }

    /// Signal shutdown to the flush task.
    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }

    // ── Maintenance and statistics ──────────────────────────────

    /// Drop all entries and pending writes.
    pub fn clear(&self) {
        self.entries.write().clear();
        self.dirty.lock().clear();
    }

    /// Number of cached states.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Get cache statistics.
    pub fn stats(&self) -> StateCacheStats {
        StateCacheStats {
            size: self.entries.read().len(),
            dirty: self.dirty.lock().len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Drop for StateCache {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for StateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateCache")
            .field("size", &self.len())
            .field("max_size", &self.max_size)
            .finish_non_exhaustive()
    }
}

/// Cache statistics.
#[derive(Debug, Clone)]
pub struct StateCacheStats {
    /// Number of cached states.
    pub size: usize,
    /// Number of tuples awaiting persistence.
    pub dirty: usize,
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
}

impl StateCacheStats {
    /// Calculate hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
