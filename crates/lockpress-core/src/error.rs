//! Error types for Lockpress core primitives.

use thiserror::Error;

/// Errors that can occur in core key and field operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A key had the wrong byte length.
    #[error("invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    /// A nonce had the wrong byte length.
    #[error("invalid nonce length: expected {expected}, got {got}")]
    InvalidNonceLength { expected: usize, got: usize },

    /// A generation nonce was not valid lowercase hex of the right size.
    #[error("invalid generation nonce: {0}")]
    InvalidGenerationNonce(String),

    /// An address failed validation.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// An unknown key scheme identifier.
    #[error("unknown key scheme: {0}")]
    UnknownScheme(String),

    /// Hex decoding failed.
    #[error("hex decoding error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// An encrypted field string did not match `<nonce>:<ciphertext>`.
    #[error("malformed encrypted field: {0}")]
    MalformedField(String),

    /// AEAD encryption failed.
    #[error("encryption failed")]
    EncryptFailed,

    /// AEAD tag mismatch: the ciphertext or nonce was tampered with, or the
    /// key is wrong. No plaintext is ever returned in this case.
    #[error("decryption failed")]
    DecryptFailed,
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
