//! State persistence error types.

/// State provider error.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// Backend error (database, network, etc.).
    #[error("provider error: {0}")]
    Provider(String),

    /// Stored record could not be decoded.
    #[error("corrupt state record: {0}")]
    Corrupt(String),
}

impl StateError {
    /// Create a provider error from any error type.
    #[inline]
    pub fn provider<E: std::fmt::Display>(err: E) -> Self {
        Self::Provider(err.to_string())
    }
}
