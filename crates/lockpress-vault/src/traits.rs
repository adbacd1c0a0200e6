//! Vault trait: the abstract interface for reading-key persistence.
//!
//! The trait keeps the crypto core storage-agnostic: a browser target backs
//! it with local storage, a desktop target with SQLite or an OS keychain,
//! tests with memory. Records are keyed by `(address, generation nonce)`;
//! the nonce is the unique key per address generation.

use async_trait::async_trait;

use lockpress_core::{Address, GenerationNonce, ReadingKeyRecord, X25519SecretKey};

use crate::error::Result;
use crate::export::VaultExport;

/// Result of upserting a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new generation was prepended.
    Inserted,
    /// A record with the same nonce existed and was overwritten in place.
    Replaced,
}

/// The Vault trait: async interface for reading-key persistence.
///
/// # Design Notes
///
/// - **Idempotent upserts**: Upserting the same record twice leaves exactly
///   one stored record for that nonce.
/// - **Generation ordering**: `list_for` returns most-recent-first; a fresh
///   rotation lands at the head.
/// - **Recoverable failures**: Every error here is survivable — keys can be
///   re-derived from a fresh wallet signature.
#[async_trait]
pub trait Vault: Send + Sync {
    /// List all key generations for an address, most-recent-first.
    async fn list_for(&self, address: &Address) -> Result<Vec<ReadingKeyRecord>>;

    /// Insert or overwrite a record.
    ///
    /// If a record with the same generation nonce exists it is overwritten in
    /// place; otherwise the record is prepended as the newest generation.
    async fn upsert(&self, record: &ReadingKeyRecord) -> Result<UpsertOutcome>;

    /// Find the secret key for a specific generation nonce.
    async fn find_secret_by_nonce(
        &self,
        address: &Address,
        nonce: &GenerationNonce,
    ) -> Result<Option<X25519SecretKey>>;

    /// Delete every generation for an address. Returns the number removed.
    async fn delete_all(&self, address: &Address) -> Result<usize>;

    /// Delete a single generation. Returns whether it existed.
    async fn delete_one(&self, address: &Address, nonce: &GenerationNonce) -> Result<bool>;

    /// Number of stored generations for an address.
    async fn count(&self, address: &Address) -> Result<usize>;

    /// Export the whole vault as a versioned backup blob.
    async fn export(&self) -> Result<VaultExport>;

    /// Replace the vault contents with an export blob.
    ///
    /// The blob's shape is validated before anything is overwritten; an
    /// invalid blob leaves the vault untouched.
    async fn import(&self, export: &VaultExport) -> Result<()>;
}
