//! In-memory exemplar matcher.

use async_trait::async_trait;

use crate::error::SemanticError;
use crate::matcher::{SemanticHit, SemanticMatcher};

/// One registered exemplar phrase.
#[derive(Debug, Clone)]
struct Exemplar {
    rule_id: String,
    phrase: String,
    similarity: f64,
}

/// Semantic matcher over a fixed in-memory exemplar table.
///
/// A message "matches" an exemplar when it contains the phrase
/// (case-insensitive); the reported similarity is the value registered with
/// the exemplar. This stands in for a real embedding backend in tests and
/// small admin deployments.
#[derive(Debug, Default)]
pub struct StaticSemanticMatcher {
    exemplars: Vec<Exemplar>,
}

impl StaticSemanticMatcher {
    /// Create an empty matcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an exemplar phrase for a rule with a fixed similarity.
    pub fn add_exemplar(
        &mut self,
        rule_id: impl Into<String>,
        phrase: impl Into<String>,
        similarity: f64,
    ) -> &mut Self {
        self.exemplars.push(Exemplar {
            rule_id: rule_id.into(),
            phrase: phrase.into().to_lowercase(),
            similarity,
        });
        self
    }

    /// Number of registered exemplars.
    pub fn len(&self) -> usize {
        self.exemplars.len()
    }

    /// True when no exemplars are registered.
    pub fn is_empty(&self) -> bool {
        self.exemplars.is_empty()
    }
}

#[async_trait]
impl SemanticMatcher for StaticSemanticMatcher {
    async fn query_rules(
        &self,
        message: &str,
        threshold: f64,
    ) -> Result<Vec<SemanticHit>, SemanticError> {
        let lower = message.to_lowercase();
        let mut hits: Vec<SemanticHit> = self
            .exemplars
            .iter()
            .filter(|e| e.similarity >= threshold && lower.contains(&e.phrase))
            .map(|e| SemanticHit {
                rule_id: e.rule_id.clone(),
                similarity: e.similarity,
            })
            .collect();
        hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> StaticSemanticMatcher {
        let mut m = StaticSemanticMatcher::new();
        m.add_exemplar("phish-1", "reset your password", 0.92)
            .add_exemplar("phish-1", "account suspended", 0.88)
            .add_exemplar("exfil-1", "send me the database", 0.95);
        m
    }

    #[tokio::test]
    async fn matches_contained_phrase() {
        let m = matcher();
        let hits = m
            .query_rules("Please RESET your PASSWORD now", 0.85)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].rule_id, "phish-1");
        assert!((hits[0].similarity - 0.92).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn threshold_filters_hits() {
        let m = matcher();
        let hits = m
            .query_rules("your account suspended today", 0.90)
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn hits_sorted_by_similarity() {
        let m = matcher();
        let hits = m
            .query_rules("reset your password or account suspended", 0.85)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].similarity >= hits[1].similarity);
    }

    #[tokio::test]
    async fn embedding_unsupported() {
        let m = matcher();
        assert!(matches!(
            m.generate_embedding("text").await,
            Err(SemanticError::Unsupported)
        ));
    }
}
