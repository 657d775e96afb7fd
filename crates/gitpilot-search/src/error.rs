//! Error types for gitpilot-search

use thiserror::Error;

/// Retrieval backend error type
#[derive(Debug, Error)]
pub enum Error {
    /// Backend is unreachable or misbehaving
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Query could not be processed
    #[error("query failed: {0}")]
    Query(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
