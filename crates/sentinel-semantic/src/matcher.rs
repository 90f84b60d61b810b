//! Semantic matcher trait.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SemanticError;

/// One exemplar at or above the queried similarity floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticHit {
    /// Rule the matching exemplar belongs to.
    pub rule_id: String,
    /// Similarity in [0, 1] (1 = identical).
    pub similarity: f64,
}

/// Trait for semantic similarity backends.
///
/// Implementations must be thread-safe (`Send + Sync`) as they may be
/// queried concurrently from many in-flight evaluations.
#[async_trait]
pub trait SemanticMatcher: Send + Sync {
    /// Return all exemplars (across all rules) whose similarity to
    /// `message` is at or above `threshold`. The engine filters the result
    /// by rule identity.
    async fn query_rules(
        &self,
        message: &str,
        threshold: f64,
    ) -> Result<Vec<SemanticHit>, SemanticError>;

    /// Optional: embed raw text.
    ///
    /// The core engine never calls this; it exists for callers that manage
    /// exemplar stores. Default implementation reports the capability as
    /// unsupported.
    async fn generate_embedding(&self, _text: &str) -> Result<Vec<f32>, SemanticError> {
        Err(SemanticError::Unsupported)
    }
}

/// Blanket implementation for `Arc<M>` where `M: SemanticMatcher`.
#[async_trait]
impl<M: SemanticMatcher + ?Sized> SemanticMatcher for Arc<M> {
    #[inline]
    async fn query_rules(
        &self,
        message: &str,
        threshold: f64,
    ) -> Result<Vec<SemanticHit>, SemanticError> {
        (**self).query_rules(message, threshold).await
    }

    #[inline]
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, SemanticError> {
        (**self).generate_embedding(text).await
    }
}

/// Blanket implementation for `Box<M>` where `M: SemanticMatcher`.
#[async_trait]
impl<M: SemanticMatcher + ?Sized> SemanticMatcher for Box<M> {
    #[inline]
    async fn query_rules(
        &self,
        message: &str,
        threshold: f64,
    ) -> Result<Vec<SemanticHit>, SemanticError> {
        (**self).query_rules(message, threshold).await
    }

    #[inline]
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, SemanticError> {
        (**self).generate_embedding(text).await
    }
}
