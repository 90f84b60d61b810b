//! Metrics collection and Prometheus exporter for sentinel.
//!
//! This module provides metrics instrumentation for the inspection engine,
//! including evaluation counts, match rates, cache behavior and external
//! backend error rates.

use std::net::SocketAddr;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Initialize Prometheus metrics exporter.
///
/// Starts an HTTP server on the given address to expose metrics.
/// Returns an error message if binding fails.
pub fn init_prometheus(listen: &str) -> Result<(), String> {
    let addr: SocketAddr = listen
        .parse()
        .map_err(|e| format!("invalid metrics listen address: {}", e))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("failed to install prometheus exporter: {}", e))?;

    Ok(())
}

// ============================================================================
// Metric Names
// ============================================================================

/// Total number of evaluations performed.
pub const EVALUATIONS_TOTAL: &str = "sentinel_evaluations_total";
/// Evaluation duration histogram (seconds).
pub const EVALUATION_DURATION_SECONDS: &str = "sentinel_evaluation_duration_seconds";
/// Total number of rule matches, labeled by action.
pub const RULE_MATCHES_TOTAL: &str = "sentinel_rule_matches_total";
/// Total number of matches withheld by a threshold gate.
pub const THRESHOLD_GATED_TOTAL: &str = "sentinel_threshold_gated_total";
/// Total number of evaluations ended early by a critical block.
pub const EARLY_EXITS_TOTAL: &str = "sentinel_early_exits_total";
/// Total number of external/component errors, labeled by type.
pub const ERRORS_TOTAL: &str = "sentinel_errors_total";
/// Total state cache hits.
pub const STATE_CACHE_HITS_TOTAL: &str = "sentinel_state_cache_hits_total";
/// Total state cache misses.
pub const STATE_CACHE_MISSES_TOTAL: &str = "sentinel_state_cache_misses_total";
/// Number of rules currently loaded.
pub const RULES_LOADED: &str = "sentinel_rules_loaded";
/// Size of the last write-behind flush batch.
pub const FLUSH_BATCH_SIZE: &str = "sentinel_flush_batch_size";

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Record one completed evaluation and its duration.
#[inline]
pub fn record_evaluation(duration_secs: f64) {
    counter!(EVALUATIONS_TOTAL).increment(1);
    histogram!(EVALUATION_DURATION_SECONDS).record(duration_secs);
}

/// Record a rule match (action: "allow", "block", "flag", ...).
#[inline]
pub fn record_rule_match(action: &'static str) {
    counter!(RULE_MATCHES_TOTAL, "action" => action).increment(1);
}

/// Record a match withheld by the threshold gate.
#[inline]
pub fn record_threshold_gated() {
    counter!(THRESHOLD_GATED_TOTAL).increment(1);
}

/// Record an evaluation cut short by a critical block.
#[inline]
pub fn record_early_exit() {
    counter!(EARLY_EXITS_TOTAL).increment(1);
}

/// Record an error by type.
#[inline]
pub fn record_error(error_type: &'static str) {
    counter!(ERRORS_TOTAL, "type" => error_type).increment(1);
}

/// Record a state cache hit.
#[inline]
pub fn record_state_cache_hit() {
    counter!(STATE_CACHE_HITS_TOTAL).increment(1);
}

/// Record a state cache miss.
#[inline]
pub fn record_state_cache_miss() {
    counter!(STATE_CACHE_MISSES_TOTAL).increment(1);
}

/// Set the loaded-rules gauge after a reload.
#[inline]
pub fn set_rules_loaded(count: usize) {
    gauge!(RULES_LOADED).set(count as f64);
}

/// Record the size of a write-behind flush batch.
#[inline]
pub fn record_flush_batch(size: usize) {
    histogram!(FLUSH_BATCH_SIZE).record(size as f64);
}

// ============================================================================
// Error Type Constants (re-exported from sentinel-core)
// ============================================================================

pub use sentinel_core::{ERROR_CONFIG, ERROR_PROVIDER, ERROR_REGEX, ERROR_SEMANTIC};
