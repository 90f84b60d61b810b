//! Engine configuration.

use serde::{Deserialize, Serialize};

use sentinel_core::defaults;
use sentinel_state::StateCacheConfig;

/// Tuning knobs for the inspection engine.
///
/// All fields default to the centralized constants in `sentinel-core`, so a
/// `{}` config deserializes to the production defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// State cache entry lifetime, measured from last access (ms).
    #[serde(default = "default_state_cache_ttl_ms")]
    pub state_cache_ttl_ms: u64,
    /// Maximum number of cached conversation states.
    #[serde(default = "default_state_cache_max_size")]
    pub state_cache_max_size: usize,
    /// Debounce before a batched state flush runs (ms).
    #[serde(default = "default_flush_debounce_ms")]
    pub flush_debounce_ms: u64,
    /// Interval between background sweeps of lapsed threshold windows (s).
    #[serde(default = "default_threshold_cleanup_secs")]
    pub threshold_cleanup_secs: u64,
}

fn default_state_cache_ttl_ms() -> u64 {
    defaults::DEFAULT_STATE_CACHE_TTL_MS
}

fn default_state_cache_max_size() -> usize {
    defaults::DEFAULT_STATE_CACHE_MAX_SIZE
}

fn default_flush_debounce_ms() -> u64 {
    defaults::DEFAULT_FLUSH_DEBOUNCE_MS
}

fn default_threshold_cleanup_secs() -> u64 {
    defaults::DEFAULT_THRESHOLD_CLEANUP_SECS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            state_cache_ttl_ms: default_state_cache_ttl_ms(),
            state_cache_max_size: default_state_cache_max_size(),
            flush_debounce_ms: default_flush_debounce_ms(),
            threshold_cleanup_secs: default_threshold_cleanup_secs(),
        }
    }
}

impl EngineConfig {
    /// Derive the state cache configuration.
    pub fn state_cache_config(&self) -> StateCacheConfig {
        StateCacheConfig {
            ttl_ms: self.state_cache_ttl_ms,
            max_size: self.state_cache_max_size,
            flush_debounce_ms: self.flush_debounce_ms,
        }
    }
}
