//! Core types and constants shared across sentinel crates.
//!
//! This crate provides:
//! - Default configuration values
//! - Error type constants for metrics/logging
//! - The Unix-millisecond clock used by state and threshold bookkeeping
//! - Common project metadata

pub mod clock;
pub mod defaults;
pub mod errors;

// Re-export commonly used items at crate root
pub use clock::now_ms;
pub use defaults::*;
pub use errors::*;

/// Project name.
pub const PROJECT_NAME: &str = "sentinel";
/// Project version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
