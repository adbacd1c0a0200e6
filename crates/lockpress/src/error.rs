//! Error types for the publish and read flows.

use lockpress_core::{Address, CoreError};
use lockpress_envelope::EnvelopeError;
use lockpress_keys::KeyError;
use lockpress_resolver::{DirectoryError, ResolveError};
use lockpress_vault::VaultError;
use thiserror::Error;

/// Errors that can occur during publish and read operations.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Key derivation error.
    #[error("key error: {0}")]
    Key(#[from] KeyError),

    /// Recipient resolution error. The envelope is never partially emitted.
    #[error("resolution error: {0}")]
    Resolve(#[from] ResolveError),

    /// Envelope encryption error.
    #[error("envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    /// Core error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Vault error on a path where persistence is required (export/import).
    #[error("vault error: {0}")]
    Vault(#[from] VaultError),

    /// Directory error while publishing a key.
    #[error("directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// The signer has no wrapped key in this envelope.
    #[error("address {0} is not a recipient of this envelope")]
    NotARecipient(Address),
}

/// Result type for publish and read operations.
pub type Result<T> = std::result::Result<T, PublishError>;
