//! Error types for gitpilot-llm

use thiserror::Error;

/// Model backend error type
#[derive(Debug, Error)]
pub enum Error {
    /// Backend not configured
    #[error("backend not configured: {0}")]
    NotConfigured(String),

    /// API error reported by the backend
    #[error("api error: {0}")]
    Api(String),

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Timeout
    #[error("timeout after {0}ms")]
    Timeout(u64),

    /// Backend returned an unusable payload
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
