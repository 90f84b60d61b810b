//! Semantic similarity backend interface for sentinel.
//!
//! The engine never embeds text or stores vectors itself; it consumes a
//! [`SemanticMatcher`] that, given a message and a similarity floor,
//! returns the rule exemplars at or above that floor.
//!
//! Two implementations ship here:
//! - [`HttpSemanticMatcher`]: client for a remote embedding/search service
//! - [`StaticSemanticMatcher`]: in-memory exemplar table for tests and the
//!   admin backend

pub mod error;
pub mod exemplar;
pub mod http;
pub mod matcher;

pub use error::SemanticError;
pub use exemplar::StaticSemanticMatcher;
pub use http::HttpSemanticMatcher;
pub use matcher::{SemanticHit, SemanticMatcher};
