//! Storage error types.

use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested item was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A stored object failed to decode or verify.
    #[error("corruption detected: {0}")]
    Corruption(String),

    /// An object id or payload is malformed.
    #[error("invalid object: {0}")]
    InvalidObject(String),

    /// Compression or decompression failed.
    #[error("compression error: {0}")]
    Compression(String),

    /// The ref map could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    /// Returns true if this error means the item does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
