//! Semantic backend error types.

use thiserror::Error;

/// Errors from a semantic similarity backend.
#[derive(Error, Debug)]
pub enum SemanticError {
    #[error("http error: {0}")]
    Http(String),

    #[error("backend error: {0}")]
    Backend(String),

    /// The implementation does not expose this capability.
    #[error("operation not supported by this matcher")]
    Unsupported,
}
