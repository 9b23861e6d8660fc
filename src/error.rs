//! Error types for discovery operations.

use thiserror::Error;

/// Unified error type for configuration, transport, and store failures.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("metadata API returned HTTP {status} for {url}")]
    ApiStatus { status: u16, url: String },

    #[error("object store error: {0}")]
    ObjectStore(String),

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
