//! Error types for key derivation.

use thiserror::Error;

/// Errors that can occur during reading-key derivation.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The wallet returned a signature of the wrong byte length.
    #[error("invalid signature length: expected {expected}, got {got}")]
    InvalidSignatureLength { expected: usize, got: usize },

    /// The external wallet signer failed or was rejected by the user.
    #[error("wallet signer error: {0}")]
    Signer(String),

    /// Recovery reproduced a keypair whose public half does not match the
    /// published one. The wallet likely uses randomized signatures; the
    /// reading key cannot be reconstructed and must be rotated.
    #[error("recovered key does not match the published public key")]
    RecoveredKeyMismatch,

    /// Core error.
    #[error("core error: {0}")]
    Core(#[from] lockpress_core::CoreError),
}

/// Result type for key derivation operations.
pub type Result<T> = std::result::Result<T, KeyError>;
