//! Error types for AtlasMap
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using MapError
pub type Result<T> = std::result::Result<T, MapError>;

/// Unified error type for AtlasMap operations
#[derive(Debug, Error)]
pub enum MapError {
    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    /// The value cannot be represented as a supported value.
    /// Raised before any remote command is issued.
    #[error("Encode error: {0}")]
    Encode(String),

    /// Stored bytes do not parse as the requested kind
    #[error("Decode error: {0}")]
    Decode(String),

    // -------------------------------------------------------------------------
    // Map Errors
    // -------------------------------------------------------------------------
    #[error("Key not found")]
    KeyNotFound,

    // -------------------------------------------------------------------------
    // Remote Store Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Error reported by the store server
    #[error("Remote error: {0}")]
    Remote(String),

    #[cfg(feature = "redis")]
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MapError {
    pub(crate) fn encode(message: impl Into<String>) -> Self {
        MapError::Encode(message.into())
    }

    pub(crate) fn decode(message: impl Into<String>) -> Self {
        MapError::Decode(message.into())
    }
}
