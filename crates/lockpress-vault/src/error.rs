//! Error types for the vault.
//!
//! Vault failures are recoverable: callers can proceed without persisting,
//! at the cost of re-signing to re-derive keys in future sessions.

use thiserror::Error;

/// Errors that can occur during vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Record serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// An export blob failed shape validation; nothing was overwritten.
    #[error("invalid export blob: {0}")]
    InvalidExport(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;
