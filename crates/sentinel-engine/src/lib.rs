//! Message-inspection engine for sentinel.
//!
//! Orchestrates the end-to-end evaluation pipeline:
//! 1. Hydrates conversation state (context override → cache → provider →
//!    fresh synthesis, cached immediately)
//! 2. Pre-filters rules on their `flags.check` gate
//! 3. Runs the staged matcher per rule: content → pcre → semantic, with
//!    cheap stages first and early exit on the first failing stage
//! 4. Applies the threshold gate and, on fire, mutates state copy-on-write
//! 5. Emits results in priority order, ending the pass early on a
//!    critical block
//!
//! The engine is designed for cooperative concurrency: `evaluate` suspends
//! only at provider and semantic-backend calls, and many evaluations may be
//! in flight per process. Evaluations of distinct conversation tuples are
//! fully isolated; the rule list is swapped atomically on reload.

pub mod config;
pub mod context;
pub mod engine;

pub use config::EngineConfig;
pub use context::{EvaluationContext, EvaluationResult};
pub use engine::{EngineOptions, EngineStats, InspectionEngine};
