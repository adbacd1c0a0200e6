//! Error types for envelope encryption.

use thiserror::Error;

/// Errors that can occur during envelope operations.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// Wrapping the post key for a recipient failed.
    #[error("key wrap error: {0}")]
    Wrap(String),

    /// Unwrapping failed: wrong recipient key, or tampered ciphertext/nonce.
    /// The post key stays locked; nothing partial is returned.
    #[error("key unwrap failed")]
    Unwrap,

    /// An envelope field did not parse.
    #[error("malformed envelope: {0}")]
    Malformed(String),

    /// Hex decoding error.
    #[error("hex decoding error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// JSON error (tags/categories are JSON-encoded before encryption).
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Core error.
    #[error("core error: {0}")]
    Core(#[from] lockpress_core::CoreError),
}

/// Result type for envelope operations.
pub type Result<T> = std::result::Result<T, EnvelopeError>;
