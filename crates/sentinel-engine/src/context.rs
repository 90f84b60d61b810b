//! Evaluation input and output types.

use std::sync::Arc;

use sentinel_rules::{Action, Rule};
use sentinel_state::{ConversationKey, ConversationState};

/// Input for one evaluation call.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    pub token_id: String,
    pub conversation_id: String,
    pub account_id: Option<String>,
    /// The message under inspection.
    pub message: String,
    /// Override: when supplied, cache and provider hydration are skipped
    /// for this call (used by test/admin surfaces).
    pub state: Option<ConversationState>,
}

impl EvaluationContext {
    /// Build a context for a message in a conversation.
    pub fn new(
        token_id: impl Into<String>,
        conversation_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            token_id: token_id.into(),
            conversation_id: conversation_id.into(),
            account_id: None,
            message: message.into(),
            state: None,
        }
    }

    /// Attach an account component to the conversation tuple.
    pub fn with_account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    /// Supply the conversation state directly, bypassing hydration.
    pub fn with_state(mut self, state: ConversationState) -> Self {
        self.state = Some(state);
        self
    }

    /// The conversation tuple this context addresses.
    pub fn key(&self) -> ConversationKey {
        ConversationKey {
            token_id: self.token_id.clone(),
            conversation_id: self.conversation_id.clone(),
            account_id: self.account_id.clone(),
        }
    }
}

/// One evaluation outcome.
///
/// `matched == false` results are emitted only when a rule passed its match
/// stages but was withheld by a gate (threshold, broken pattern); `reason`
/// explains why. `matched == true` results carry the post-mutation state
/// snapshot.
#[derive(Debug, Clone)]
pub struct EvaluationResult {
    pub matched: bool,
    pub rule: Option<Arc<Rule>>,
    pub action: Option<Action>,
    pub state: Option<Arc<ConversationState>>,
    pub reason: Option<String>,
    pub eval_time_ms: Option<f64>,
    pub similarity: Option<f64>,
    pub matched_pattern: Option<String>,
}

impl EvaluationResult {
    /// A fired rule with its post-mutation state snapshot.
    pub(crate) fn fired(
        rule: Arc<Rule>,
        state: Arc<ConversationState>,
        matched_pattern: Option<String>,
        similarity: Option<f64>,
        eval_time_ms: f64,
    ) -> Self {
        let action = rule.action;
        Self {
            matched: true,
            rule: Some(rule),
            action: Some(action),
            state: Some(state),
            reason: None,
            eval_time_ms: Some(eval_time_ms),
            similarity,
            matched_pattern,
        }
    }

    /// A rule that passed its stages but was withheld, with the reason.
    pub(crate) fn withheld(rule: Arc<Rule>, reason: String, eval_time_ms: f64) -> Self {
        Self {
            matched: false,
            rule: Some(rule),
            action: None,
            state: None,
            reason: Some(reason),
            eval_time_ms: Some(eval_time_ms),
            similarity: None,
            matched_pattern: None,
        }
    }

    /// Rule id, when the result names a rule.
    pub fn rule_id(&self) -> Option<&str> {
        self.rule.as_ref().map(|r| r.id.as_str())
    }
}
