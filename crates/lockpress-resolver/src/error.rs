//! Error types for recipient resolution.

use thiserror::Error;

use lockpress_core::Address;

/// Errors from the external reading-key directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The directory could not be reached or returned a transport error.
    #[error("directory unavailable: {0}")]
    Unavailable(String),

    /// The directory rejected the request.
    #[error("directory rejected request: {0}")]
    Rejected(String),
}

/// Errors from the external subscription ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The ledger could not be reached or returned a transport error.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Errors that abort recipient resolution.
///
/// A resolution error means no envelope is produced at all; a partial
/// envelope is never emitted.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No eligible keyed audience recipients and purchase access is disabled.
    #[error("no eligible keyed recipients and purchase access is disabled")]
    NoRecipients,

    /// One or more configured moderators lack a published reading key.
    /// Every offending address is listed.
    #[error("moderator reading keys missing for: {}", format_addresses(.0))]
    MissingModeratorKeys(Vec<Address>),

    /// The payment processor has no published reading key. Fatal for the
    /// purchase feature, which is fatal for a purchase-enabled post.
    #[error("payment processor {0} has no published reading key")]
    ProcessorKeyMissing(Address),

    /// Purchase access is enabled but no processor address is configured.
    #[error("purchase access enabled but no processor address configured")]
    ProcessorUnconfigured,

    /// The signer has no published reading key yet; the caller must run the
    /// on-demand generate-and-publish flow first.
    #[error("signer {0} has no published reading key")]
    SignerKeyUnpublished(Address),

    /// Ledger error while querying sponsors.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Directory error in a mandatory category.
    #[error("directory error: {0}")]
    Directory(#[from] DirectoryError),
}

fn format_addresses(addresses: &[Address]) -> String {
    addresses
        .iter()
        .map(Address::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for resolution operations.
pub type Result<T> = std::result::Result<T, ResolveError>;
