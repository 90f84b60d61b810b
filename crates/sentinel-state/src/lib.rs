//! Conversation state tracking for sentinel.
//!
//! Multi-message attacks are recognized by correlating flags across a
//! conversation. This crate owns everything stateful:
//!
//! - [`ConversationState`]: per-conversation flags and flag history
//! - [`StateCache`]: in-memory cache with TTL, LRU-by-access eviction and
//!   debounced write-behind batching to a [`StateProvider`]
//! - [`ThresholdTracker`]: per-(conversation, rule) drain-and-restart
//!   window counters for rate-limited rules
//! - [`StateProvider`]: async trait for the external persistence store,
//!   plus an in-memory implementation for tests and admin surfaces

pub mod cache;
pub mod error;
pub mod memory;
pub mod provider;
pub mod state;
pub mod threshold;

pub use cache::{StateCache, StateCacheConfig, StateCacheStats};
pub use error::StateError;
pub use memory::MemoryStateProvider;
pub use provider::StateProvider;
pub use state::{ConversationKey, ConversationState, FlagAction, FlagEvent};
pub use threshold::ThresholdTracker;
