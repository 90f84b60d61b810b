//! Conversation identity and flag state records.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use sentinel_core::defaults::DEFAULT_STATE_TTL_SECS;

/// The tuple identifying one conversation context.
///
/// State records, threshold counters and cache entries are all keyed by
/// this triple; two distinct tuples never share state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey {
    pub token_id: String,
    pub conversation_id: String,
    pub account_id: Option<String>,
}

impl ConversationKey {
    /// Create a key without an account component.
    pub fn new(token_id: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        Self {
            token_id: token_id.into(),
            conversation_id: conversation_id.into(),
            account_id: None,
        }
    }

    /// Attach an account component.
    pub fn with_account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    /// Stable storage identifier: `"{tokenId}:{conversationId}:{accountId|""}"`.
    pub fn storage_id(&self) -> String {
        format!(
            "{}:{}:{}",
            self.token_id,
            self.conversation_id,
            self.account_id.as_deref().unwrap_or("")
        )
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.token_id,
            self.conversation_id,
            self.account_id.as_deref().unwrap_or("")
        )
    }
}

/// Whether a history entry asserted or cleared a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagAction {
    Set,
    Unset,
}

/// One append-only history entry recording a flag mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagEvent {
    pub flag: String,
    pub action: FlagAction,
    pub rule_id: String,
    pub timestamp_ms: u64,
}

/// Per-conversation flag state.
///
/// Treated as immutable once shared: mutations go through [`apply`], which
/// returns a fresh record, so a snapshot handed out in one evaluation result
/// is never changed underneath its holder.
///
/// [`apply`]: ConversationState::apply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    /// Storage identifier, see [`ConversationKey::storage_id`].
    pub id: String,
    /// Flag name (case-sensitive) to current value.
    pub flags: HashMap<String, bool>,
    /// Append-only within a single state lifetime.
    pub flag_history: Vec<FlagEvent>,
    /// Expiry wall-clock time, Unix ms.
    pub expires_at: u64,
    /// Creation wall-clock time, Unix ms.
    pub created_at: u64,
    /// Last mutation wall-clock time, Unix ms.
    pub updated_at: u64,
}

impl ConversationState {
    /// Synthesize a fresh state for a conversation that has none yet.
    pub fn fresh(key: &ConversationKey, now_ms: u64) -> Self {
        Self {
            id: key.storage_id(),
            flags: HashMap::new(),
            flag_history: Vec::new(),
            expires_at: now_ms + DEFAULT_STATE_TTL_SECS * 1000,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    /// Current value of a flag; unknown flags read as false.
    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    /// True when every named flag is currently set.
    pub fn all_set(&self, names: &[String]) -> bool {
        names.iter().all(|n| self.flag(n))
    }

    /// True when the record is past its expiry.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    /// Copy-on-write mutation: returns a new record with `set` flags
    /// asserted and `unset` flags cleared, each recorded in the history,
    /// with `expires_at` pushed out by `ttl_secs` and `updated_at` set to
    /// `now_ms`. `self` is left untouched.
    pub fn apply(
        &self,
        rule_id: &str,
        set: &[String],
        unset: &[String],
        ttl_secs: u64,
        now_ms: u64,
    ) -> Self {
        let mut next = self.clone();

        for flag in set {
            next.flags.insert(flag.clone(), true);
            next.flag_history.push(FlagEvent {
                flag: flag.clone(),
                action: FlagAction::Set,
                rule_id: rule_id.to_string(),
                timestamp_ms: now_ms,
            });
        }
        for flag in unset {
            next.flags.insert(flag.clone(), false);
            next.flag_history.push(FlagEvent {
                flag: flag.clone(),
                action: FlagAction::Unset,
                rule_id: rule_id.to_string(),
                timestamp_ms: now_ms,
            });
        }

        next.expires_at = now_ms + ttl_secs * 1000;
        next.updated_at = now_ms;
        next
    }
}
