//! The inspection engine: staged matching over priority-ordered rules.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::context::{EvaluationContext, EvaluationResult};
use sentinel_core::{ERROR_PROVIDER, ERROR_REGEX, ERROR_SEMANTIC, now_ms};
use sentinel_metrics as metrics;
use sentinel_rules::{RegexCache, Rule, RuleSet, Severity};
use sentinel_semantic::SemanticMatcher;
use sentinel_state::{
    ConversationKey, ConversationState, StateCache, StateProvider, ThresholdTracker,
};

/// Cross-cutting collaborators, passed at construction.
///
/// Neither is required; the engine degrades gracefully. Without a semantic
/// matcher, rules declaring a semantic stage cannot match; without a state
/// provider, conversation state lives only in the in-process cache.
#[derive(Default)]
pub struct EngineOptions {
    pub semantic_matcher: Option<Arc<dyn SemanticMatcher>>,
    pub state_provider: Option<Arc<dyn StateProvider>>,
    pub config: EngineConfig,
}

impl EngineOptions {
    /// Options with production defaults and no external collaborators.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a semantic similarity backend.
    pub fn with_semantic_matcher(mut self, matcher: Arc<dyn SemanticMatcher>) -> Self {
        self.semantic_matcher = Some(matcher);
        self
    }

    /// Attach a persistent state store.
    pub fn with_state_provider(mut self, provider: Arc<dyn StateProvider>) -> Self {
        self.state_provider = Some(provider);
        self
    }

    /// Override the engine configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }
}

/// Engine statistics snapshot.
#[derive(Debug, Clone)]
pub struct EngineStats {
    pub rules_loaded: usize,
    pub cache_size: usize,
    pub regex_cache_size: usize,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub dirty_pending: usize,
}

/// Message-inspection engine.
///
/// Shared via `Arc` between the proxy plugin and admin surfaces; all
/// methods take `&self`. Rule loads swap the list atomically and never
/// interleave with an in-flight evaluation's snapshot.
pub struct InspectionEngine {
    rules: RuleSet,
    regex_cache: RegexCache,
    thresholds: ThresholdTracker,
    state_cache: Arc<StateCache>,
    semantic: Option<Arc<dyn SemanticMatcher>>,
    provider: Option<Arc<dyn StateProvider>>,
}

impl InspectionEngine {
    /// Create an engine from options.
    ///
    /// Background maintenance (debounced state flush, threshold window
    /// sweep) starts only when called inside a tokio runtime; outside one,
    /// writes are flushed on demand via [`shutdown`](Self::shutdown) or the
    /// cache's explicit flush.
    pub fn new(options: EngineOptions) -> Self {
        let state_cache = Arc::new(StateCache::new(
            options.config.state_cache_config(),
            options.state_provider.clone(),
        ));
        let thresholds = ThresholdTracker::new();

        if Handle::try_current().is_ok() {
            state_cache.start_flush_task();
            thresholds
                .start_cleanup_task(Duration::from_secs(options.config.threshold_cleanup_secs));
        } else {
            debug!("no async runtime at construction; background maintenance disabled");
        }

        Self {
            rules: RuleSet::new(),
            regex_cache: RegexCache::new(),
            thresholds,
            state_cache,
            semantic: options.semantic_matcher,
            provider: options.state_provider,
        }
    }

    /// Replace the entire rule list. Returns the number of enabled rules
    /// loaded.
    pub fn load_rules(&self, rules: Vec<Rule>) -> usize {
        let count = self.rules.load(rules);
        metrics::set_rules_loaded(count);
        count
    }

    /// Number of loaded (enabled) rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Evaluate a message against the loaded rules.
    ///
    /// Returns results in rule priority order. Never returns an error:
    /// configuration and transient failures surface as result diagnostics
    /// or warnings, per the failure contract.
    pub async fn evaluate(&self, ctx: &EvaluationContext) -> Vec<EvaluationResult> {
        let pass_start = Instant::now();
        let now = now_ms();
        let key = ctx.key();

        let mut current = self.hydrate(ctx, &key, now).await;
        let rules = self.rules.snapshot();
        let mut results = Vec::new();
        // Lowered once per pass, on the first nocase content stage.
        let mut lower_message: Option<String> = None;

        'rules: for rule in rules.iter() {
            if rule.is_inert() {
                continue;
            }

            // Flag gate: every checked flag must currently be true.
            let check = rule.check_flags();
            if !check.is_empty() && !current.all_set(check) {
                continue;
            }

            let rule_start = Instant::now();
            let mut matched_pattern: Option<String> = None;
            let mut similarity: Option<f64> = None;

            // Content stage: every keyword must be a substring.
            if rule.has_content() {
                let passed = if rule.nocase {
                    let lower =
                        lower_message.get_or_insert_with(|| ctx.message.to_lowercase());
                    rule.content.iter().all(|k| lower.contains(&k.to_lowercase()))
                } else {
                    rule.content.iter().all(|k| ctx.message.contains(k.as_str()))
                };
                if !passed {
                    continue;
                }
                matched_pattern = Some(rule.content.join(", "));
            }

            // Pcre stage: every pattern must find at least one match.
            if rule.has_pcre() {
                for pattern in &rule.pcre {
                    match self.regex_cache.get(pattern, rule.nocase) {
                        Ok(re) => match re.find(&ctx.message) {
                            Some(found) => {
                                // Keyword patterns take precedence in the report.
                                if matched_pattern.is_none() {
                                    matched_pattern = Some(found.as_str().to_string());
                                }
                            }
                            None => continue 'rules,
                        },
                        Err(e) => {
                            metrics::record_error(ERROR_REGEX);
                            results.push(EvaluationResult::withheld(
                                rule.clone(),
                                e.to_string(),
                                elapsed_ms(rule_start),
                            ));
                            continue 'rules;
                        }
                    }
                }
            }

            // Semantic stage: at least one exemplar of this rule at or
            // above its similarity floor. Backend errors and an absent
            // matcher both read as "no hits".
            if rule.has_semantic() {
                let hits = match &self.semantic {
                    Some(matcher) => {
                        match matcher.query_rules(&ctx.message, rule.semantic_floor()).await {
                            Ok(hits) => hits,
                            Err(e) => {
                                metrics::record_error(ERROR_SEMANTIC);
                                warn!(rule_id = %rule.id, error = %e, "semantic backend error");
                                Vec::new()
                            }
                        }
                    }
                    None => Vec::new(),
                };

                let best = hits
                    .iter()
                    .filter(|h| h.rule_id == rule.id)
                    .map(|h| h.similarity)
                    .max_by(f64::total_cmp);
                match best {
                    Some(sim) => {
                        similarity = Some(sim);
                        matched_pattern = Some(format!("semantic match ({:.1}%)", sim * 100.0));
                    }
                    None => continue,
                }
            }

            // Every declared stage passed (a purely stateful rule arrives
            // here straight from its flag gate). Threshold gate next.
            if !self
                .thresholds
                .check_at(&key, &rule.id, rule.threshold, rule.window, now)
            {
                metrics::record_threshold_gated();
                results.push(EvaluationResult::withheld(
                    rule.clone(),
                    format!(
                        "Threshold not met ({} in {}s)",
                        rule.threshold.unwrap_or_default(),
                        rule.window.unwrap_or_default()
                    ),
                    elapsed_ms(rule_start),
                ));
                continue;
            }

            // Fire: copy-on-write state mutation, visible to later rules in
            // this pass and to concurrent evaluations via the cache.
            let empty: &[String] = &[];
            let (set, unset) = rule
                .flags
                .as_ref()
                .map_or((empty, empty), |f| (f.set.as_slice(), f.unset.as_slice()));
            let next = Arc::new(current.apply(&rule.id, set, unset, rule.flag_ttl_secs(), now));
            self.state_cache.insert(key.clone(), next.clone()).await;
            self.state_cache.mark_dirty(&key);
            current = next;

            metrics::record_rule_match(rule.action.as_str());
            results.push(EvaluationResult::fired(
                rule.clone(),
                current.clone(),
                matched_pattern,
                similarity,
                elapsed_ms(rule_start),
            ));

            if rule.action.is_block() && rule.severity == Severity::Critical {
                debug!(rule_id = %rule.id, "critical block, ending pass early");
                metrics::record_early_exit();
                break;
            }
        }

        // Post-evaluation: persist each fired state, sequentially. Errors
        // are logged, not retried; the write-behind flush is the backstop.
        if let Some(provider) = &self.provider {
            for result in &results {
                let Some(state) = &result.state else { continue };
                if let Err(e) = provider.save(state).await {
                    metrics::record_error(ERROR_PROVIDER);
                    warn!(key = %key, error = %e, "state save failed");
                }
            }
        }

        metrics::record_evaluation(pass_start.elapsed().as_secs_f64());
        results
    }

    /// Resolve the conversation state for this call.
    ///
    /// Order: context override → cache → provider → fresh synthesis. A
    /// synthesized or provider-loaded state is cached immediately so that
    /// concurrent evaluations of the same tuple share one record.
    async fn hydrate(
        &self,
        ctx: &EvaluationContext,
        key: &ConversationKey,
        now: u64,
    ) -> Arc<ConversationState> {
        if let Some(state) = &ctx.state {
            return Arc::new(state.clone());
        }

        if let Some(state) = self.state_cache.get(key) {
            metrics::record_state_cache_hit();
            return state;
        }
        metrics::record_state_cache_miss();

        if let Some(provider) = &self.provider {
            match provider.get(key).await {
                Ok(Some(state)) => {
                    let state = Arc::new(state);
                    self.state_cache.insert(key.clone(), state.clone()).await;
                    return state;
                }
                Ok(None) => {}
                Err(e) => {
                    metrics::record_error(ERROR_PROVIDER);
                    warn!(key = %key, error = %e, "state provider read failed");
                }
            }
        }

        let state = Arc::new(ConversationState::fresh(key, now));
        self.state_cache.insert(key.clone(), state.clone()).await;
        state
    }

    /// Engine statistics snapshot.
    pub fn stats(&self) -> EngineStats {
        let cache = self.state_cache.stats();
        EngineStats {
            rules_loaded: self.rules.len(),
            cache_size: cache.size,
            regex_cache_size: self.regex_cache.len(),
            cache_hits: cache.hits,
            cache_misses: cache.misses,
            dirty_pending: cache.dirty,
        }
    }

    /// Flush pending writes, stop background tasks and clear caches.
    ///
    /// Idempotent; the engine can be dropped afterwards or reloaded fresh.
    pub async fn shutdown(&self) {
        let flushed = self.state_cache.flush_writes().await;
        if flushed > 0 {
            metrics::record_flush_batch(flushed);
        }
        self.state_cache.shutdown();
        self.thresholds.shutdown();
        self.state_cache.clear();
        self.thresholds.clear();
        self.regex_cache.clear();
        debug!("inspection engine shut down");
    }
}

impl std::fmt::Debug for InspectionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InspectionEngine")
            .field("rules", &self.rules.len())
            .field("cache", &self.state_cache.len())
            .finish_non_exhaustive()
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
