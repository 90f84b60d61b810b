//! HTTP-backed semantic matcher.
//!
//! Client for a remote embedding/search service. The service owns the
//! exemplar vectors; this client only ships the message and similarity
//! floor and maps the response.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};

use crate::error::SemanticError;
use crate::matcher::{SemanticHit, SemanticMatcher};
use sentinel_core::defaults::{
    DEFAULT_SEMANTIC_CONNECT_TIMEOUT_MS, DEFAULT_SEMANTIC_REQUEST_TIMEOUT_MS,
};

#[derive(Serialize)]
struct QueryRequest<'a> {
    message: &'a str,
    threshold: f64,
}

#[derive(Deserialize)]
struct QueryResponse {
    results: Vec<SemanticHit>,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    vector: Vec<f32>,
}

/// Semantic matcher backed by an HTTP service.
pub struct HttpSemanticMatcher {
    endpoint: String,
    /// Shared HTTP client (reqwest + rustls).
    client: Client,
}

impl HttpSemanticMatcher {
    /// Create a matcher for the given base endpoint with default timeouts.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, SemanticError> {
        Self::with_timeouts(
            endpoint,
            Duration::from_millis(DEFAULT_SEMANTIC_CONNECT_TIMEOUT_MS),
            Duration::from_millis(DEFAULT_SEMANTIC_REQUEST_TIMEOUT_MS),
        )
    }

    /// Create a matcher with explicit connect/request timeouts.
    pub fn with_timeouts(
        endpoint: impl Into<String>,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, SemanticError> {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(|e| SemanticError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { endpoint, client })
    }

    /// Base endpoint this matcher queries.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl SemanticMatcher for HttpSemanticMatcher {
    async fn query_rules(
        &self,
        message: &str,
        threshold: f64,
    ) -> Result<Vec<SemanticHit>, SemanticError> {
        let url = self.url("/query");

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .json(&QueryRequest { message, threshold })
            .send()
            .await
            .map_err(|e| SemanticError::Http(format!("query request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unavailable>".to_string());
            return Err(SemanticError::Http(format!("query returned {status}: {body}")));
        }

        let payload: QueryResponse = response
            .json()
            .await
            .map_err(|e| SemanticError::Http(format!("failed to parse query response: {e}")))?;

        tracing::debug!(
            hits = payload.results.len(),
            threshold,
            "semantic backend query"
        );
        Ok(payload.results)
    }

    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, SemanticError> {
        let url = self.url("/embed");

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .json(&EmbedRequest { text })
            .send()
            .await
            .map_err(|e| SemanticError::Http(format!("embed request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SemanticError::Http(format!("embed returned {status}")));
        }

        let payload: EmbedResponse = response
            .json()
            .await
            .map_err(|e| SemanticError::Http(format!("failed to parse embed response: {e}")))?;
        Ok(payload.vector)
    }
}

impl std::fmt::Debug for HttpSemanticMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSemanticMatcher")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}
