//! Wall-clock helpers.
//!
//! Conversation state and threshold windows are persisted with Unix
//! millisecond timestamps, so all components share this one clock.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as Unix milliseconds.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
