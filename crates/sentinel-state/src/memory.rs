//! In-memory state provider.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::StateError;
use crate::provider::StateProvider;
use crate::state::{ConversationKey, ConversationState};

/// Simple in-memory state provider keyed by storage id.
///
/// Suitable for the test/admin backend and single-process deployments.
/// For cross-process persistence, use a database-backed provider.
#[derive(Debug, Default)]
pub struct MemoryStateProvider {
    records: RwLock<HashMap<String, ConversationState>>,
}

impl MemoryStateProvider {
    /// Create a new empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Check if no records are persisted.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Check if a record exists for a storage id.
    pub fn contains(&self, storage_id: &str) -> bool {
        self.records.read().contains_key(storage_id)
    }

    /// Fetch a record synchronously (test convenience).
    pub fn get_sync(&self, storage_id: &str) -> Option<ConversationState> {
        self.records.read().get(storage_id).cloned()
    }

    /// Drop all records.
    pub fn clear(&self) {
        self.records.write().clear();
    }
}

#[async_trait]
impl StateProvider for MemoryStateProvider {
    async fn get(&self, key: &ConversationKey) -> Result<Option<ConversationState>, StateError> {
        Ok(self.records.read().get(&key.storage_id()).cloned())
    }

    async fn save(&self, state: &ConversationState) -> Result<(), StateError> {
        self.records
            .write()
            .insert(state.id.clone(), state.clone());
        Ok(())
    }
}
