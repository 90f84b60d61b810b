//! State persistence provider trait.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StateError;
use crate::state::{ConversationKey, ConversationState};

/// Trait for external conversation-state stores.
///
/// Implementations must be thread-safe (`Send + Sync`) as they may be
/// called concurrently from many in-flight evaluations. Both operations
/// may fail; the engine logs failures and continues.
#[async_trait]
pub trait StateProvider: Send + Sync {
    /// Fetch the state for a conversation tuple, if any is persisted.
    async fn get(&self, key: &ConversationKey) -> Result<Option<ConversationState>, StateError>;

    /// Persist a state record.
    async fn save(&self, state: &ConversationState) -> Result<(), StateError>;
}

/// Blanket implementation for `Arc<P>` where `P: StateProvider`.
///
/// This allows passing `Arc<dyn StateProvider>` directly to functions
/// expecting `impl StateProvider`.
#[async_trait]
impl<P: StateProvider + ?Sized> StateProvider for Arc<P> {
    #[inline]
    async fn get(&self, key: &ConversationKey) -> Result<Option<ConversationState>, StateError> {
        (**self).get(key).await
    }

    #[inline]
    async fn save(&self, state: &ConversationState) -> Result<(), StateError> {
        (**self).save(state).await
    }
}

/// Blanket implementation for `Box<P>` where `P: StateProvider`.
#[async_trait]
impl<P: StateProvider + ?Sized> StateProvider for Box<P> {
    #[inline]
    async fn get(&self, key: &ConversationKey) -> Result<Option<ConversationState>, StateError> {
        (**self).get(key).await
    }

    #[inline]
    async fn save(&self, state: &ConversationState) -> Result<(), StateError> {
        (**self).save(state).await
    }
}
