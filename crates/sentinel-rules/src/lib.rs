//! Threat rule model and matching primitives for sentinel.
//!
//! Provides the structured [`Rule`] record evaluated by the engine, the
//! priority-sorted [`RuleSet`] with lock-free atomic reload, and the
//! memoizing [`RegexCache`].
//!
//! # Architecture
//!
//! - **Rules**: structured records (no DSL) with optional content, pcre and
//!   semantic stages plus flag directives and threshold policy
//! - **Rule set**: enabled-filtered, stable-sorted by priority key, swapped
//!   atomically via `ArcSwap` so reloads never interleave with evaluation
//! - **Regex cache**: compiles each `(pattern, nocase)` pair once and
//!   memoizes both successes and failures
//!
//! # Example
//!
//! ```
//! use sentinel_rules::RuleSet;
//!
//! let json = r#"[{
//!     "id": "sql-1",
//!     "content": ["DROP", "TABLE"],
//!     "category": "malicious_code",
//!     "severity": "critical",
//!     "action": "block"
//! }]"#;
//!
//! let set = RuleSet::new();
//! set.load(sentinel_rules::rules_from_json(json).unwrap());
//! assert_eq!(set.len(), 1);
//! ```

pub mod error;
pub mod regex_cache;
pub mod rule;
pub mod set;

pub use error::RulesError;
pub use regex_cache::RegexCache;
pub use rule::{Action, Category, FlagDirectives, Rule, Severity, rules_from_json};
pub use set::RuleSet;
