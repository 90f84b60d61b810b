//! Default configuration values.
//!
//! Centralized default constants for use across all crates.

// ============================================================================
// State Cache Defaults
// ============================================================================

/// Default state cache entry lifetime in milliseconds (5 minutes).
pub const DEFAULT_STATE_CACHE_TTL_MS: u64 = 300_000;
/// Default maximum number of cached conversation states.
pub const DEFAULT_STATE_CACHE_MAX_SIZE: usize = 10_000;
/// Default debounce before a batched flush runs, in milliseconds.
pub const DEFAULT_FLUSH_DEBOUNCE_MS: u64 = 100;

// ============================================================================
// Conversation State Defaults
// ============================================================================

/// Default lifetime of a freshly synthesized conversation state, in seconds.
pub const DEFAULT_STATE_TTL_SECS: u64 = 86_400;
/// Default lifetime applied by a rule's flag directives, in seconds.
pub const DEFAULT_FLAG_TTL_SECS: u64 = 86_400;

// ============================================================================
// Threshold Tracker Defaults
// ============================================================================

/// Default interval between background sweeps of expired window entries.
pub const DEFAULT_THRESHOLD_CLEANUP_SECS: u64 = 300;

// ============================================================================
// Semantic Matcher Defaults
// ============================================================================

/// Default similarity floor for semantic rule stages.
pub const DEFAULT_SEMANTIC_THRESHOLD: f64 = 0.85;
/// Default connect timeout for the HTTP semantic backend, in milliseconds.
pub const DEFAULT_SEMANTIC_CONNECT_TIMEOUT_MS: u64 = 500;
/// Default request timeout for the HTTP semantic backend, in milliseconds.
pub const DEFAULT_SEMANTIC_REQUEST_TIMEOUT_MS: u64 = 1_500;
