//! Compile-once regex cache.
//!
//! Patterns come from untrusted-adjacent rule files and run against hostile
//! messages, so the linear-time `regex` engine is used (no backtracking).
//! Both successful compiles and failures are memoized: a broken pattern is
//! reported the first time it is encountered and every lookup after that
//! returns the same error without recompiling.

use std::sync::Arc;

use parking_lot::RwLock;
use regex::{Regex, RegexBuilder};
use rustc_hash::FxHashMap;
use tracing::warn;

use crate::error::RulesError;

/// Memoizing cache keyed by `(pattern, nocase)`.
///
/// Unbounded: rule sets are bounded by policy, so the distinct pattern count
/// is too.
pub struct RegexCache {
    map: RwLock<FxHashMap<(String, bool), Result<Arc<Regex>, String>>>,
}

impl RegexCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            map: RwLock::new(FxHashMap::default()),
        }
    }

    /// Fetch a compiled regex, compiling and memoizing on first use.
    pub fn get(&self, pattern: &str, nocase: bool) -> Result<Arc<Regex>, RulesError> {
        let key = (pattern.to_string(), nocase);

        if let Some(cached) = self.map.read().get(&key) {
            return Self::unpack(pattern, cached);
        }

        let compiled = RegexBuilder::new(pattern)
            .case_insensitive(nocase)
            .build()
            .map(Arc::new)
            .map_err(|e| e.to_string());
        if let Err(ref msg) = compiled {
            warn!(pattern, error = %msg, "regex compilation failed");
        }

        let mut map = self.map.write();
        // A racing compile of the same key is idempotent; keep the winner.
        let entry = map.entry(key).or_insert(compiled);
        Self::unpack(pattern, entry)
    }

    fn unpack(
        pattern: &str,
        cached: &Result<Arc<Regex>, String>,
    ) -> Result<Arc<Regex>, RulesError> {
        match cached {
            Ok(re) => Ok(re.clone()),
            Err(msg) => Err(RulesError::InvalidPattern {
                pattern: pattern.to_string(),
                message: msg.clone(),
            }),
        }
    }

    /// Number of memoized entries (including failed compiles).
    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }

    /// Drop all memoized entries.
    pub fn clear(&self) {
        self.map.write().clear();
    }
}

impl Default for RegexCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RegexCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegexCache")
            .field("entries", &self.len())
            .finish()
    }
}
