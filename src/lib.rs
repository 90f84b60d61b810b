//! # sentinel
//!
//! A message-inspection rules engine for conversational security middleware.
//!
//! This crate provides a modular engine that classifies incoming
//! conversational messages against a library of threat rules, suitable for
//! embedding in a proxy plugin or a test/admin backend.
//!
//! ## Crates
//!
//! - [`sentinel_core`] - Core constants and default configurations
//! - [`sentinel_rules`] - Rule model, priority-sorted rule set, regex cache
//! - [`sentinel_state`] - Conversation state, write-behind cache, thresholds
//! - [`sentinel_semantic`] - Semantic similarity backend interface
//! - [`sentinel_metrics`] - Prometheus-compatible metrics
//! - [`sentinel_engine`] - The staged evaluation engine

pub use sentinel_core as core;
pub use sentinel_engine as engine;
pub use sentinel_metrics as metrics;
pub use sentinel_rules as rules;
pub use sentinel_semantic as semantic;
pub use sentinel_state as state;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use sentinel_engine::{EngineConfig, EngineOptions, EvaluationContext, InspectionEngine};
    pub use sentinel_rules::{Action, Category, Rule, Severity, rules_from_json};
    pub use sentinel_semantic::{HttpSemanticMatcher, SemanticMatcher, StaticSemanticMatcher};
    pub use sentinel_state::{MemoryStateProvider, StateProvider};
}
