//! Error types for the rules crate.

use thiserror::Error;

/// Errors that can occur while loading or compiling rules.
#[derive(Error, Debug, Clone)]
pub enum RulesError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },
}
