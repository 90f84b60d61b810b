//! Error type constants for consistent metrics labels and log fields.

/// Semantic backend query failed.
pub const ERROR_SEMANTIC: &str = "semantic";
/// State provider read/write failed.
pub const ERROR_PROVIDER: &str = "provider";
/// Regex pattern failed to compile.
pub const ERROR_REGEX: &str = "regex";
/// Invalid configuration or malformed rule.
pub const ERROR_CONFIG: &str = "config";
