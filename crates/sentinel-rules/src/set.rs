//! Priority-sorted rule set with atomic reload.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::debug;

use crate::rule::Rule;

/// The active rule list, shared between loads and in-flight evaluations.
///
/// Loading replaces the entire list: disabled rules are filtered out and the
/// remainder is stably sorted by [`Rule::priority`] so that equal-priority
/// rules retain author order. Reads are lock-free (`ArcSwap`); an evaluation
/// takes one snapshot and never observes a partial reload.
pub struct RuleSet {
    inner: ArcSwap<Vec<Arc<Rule>>>,
}

impl RuleSet {
    /// Create an empty rule set.
    pub fn new() -> Self {
        Self {
            inner: ArcSwap::new(Arc::new(Vec::new())),
        }
    }

    /// Replace the entire rule list.
    ///
    /// Returns the number of rules loaded (enabled only).
    pub fn load(&self, rules: Vec<Rule>) -> usize {
        let total = rules.len();
        let mut loaded: Vec<Arc<Rule>> = rules
            .into_iter()
            .filter(|r| r.enabled)
            .map(Arc::new)
            .collect();
        // Stable sort: author order is the tie-break among equal priorities.
        loaded.sort_by_key(|r| r.priority());

        let count = loaded.len();
        debug!(total, loaded = count, "rule set loaded");
        self.inner.store(Arc::new(loaded));
        count
    }

    /// Snapshot of the current rule list for one evaluation pass.
    pub fn snapshot(&self) -> Arc<Vec<Arc<Rule>>> {
        self.inner.load_full()
    }

    /// Number of loaded (enabled) rules.
    pub fn len(&self) -> usize {
        self.inner.load().len()
    }

    /// True when no rules are loaded.
    pub fn is_empty(&self) -> bool {
        self.inner.load().is_empty()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("rules", &self.len())
            .finish()
    }
}
