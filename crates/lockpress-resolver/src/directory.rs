//! Reading-key directory boundary.
//!
//! The directory is backed by an on-chain profile registry: one published
//! reading key per (address, domain). Lockpress only ever reads and writes
//! through this trait; the registry mechanics live outside the core.

use async_trait::async_trait;

use lockpress_core::{Address, GenerationNonce, KeyScheme, X25519PublicKey};

use crate::error::DirectoryError;

/// A reading key as published in the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedKey {
    /// The public half of the reading key.
    pub public_key: X25519PublicKey,

    /// Scheme the key was generated under.
    pub scheme: KeyScheme,

    /// Generation nonce, so holders can re-derive the secret half.
    pub nonce: GenerationNonce,
}

/// Typed outcome of a single recipient-key lookup.
///
/// "No key published" and "lookup failed" are different facts: best-effort
/// categories drop both, mandatory categories abort on both, but logs and
/// errors must not conflate them.
#[derive(Debug, Clone)]
pub enum KeyLookup {
    /// The address has a published key.
    Found(PublishedKey),
    /// The directory answered: no key published.
    NotFound,
    /// The lookup itself failed (network, registry error).
    Failed(String),
}

impl KeyLookup {
    /// The key, if found.
    pub fn found(self) -> Option<PublishedKey> {
        match self {
            KeyLookup::Found(key) => Some(key),
            _ => None,
        }
    }
}

/// The external reading-key directory.
///
/// Implementations must be thread-safe (Send + Sync). Lookups are
/// independent per address and may be issued concurrently.
#[async_trait]
pub trait ReadingKeyDirectory: Send + Sync {
    /// Publish (or republish) an address's reading key for a domain.
    async fn publish(
        &self,
        domain: &str,
        address: &Address,
        key: &PublishedKey,
    ) -> Result<(), DirectoryError>;

    /// Fetch the published reading key for an address, if any.
    async fn fetch(
        &self,
        domain: &str,
        address: &Address,
    ) -> Result<Option<PublishedKey>, DirectoryError>;

    /// Fetch as a typed lookup, folding transport errors into the result.
    async fn lookup(&self, domain: &str, address: &Address) -> KeyLookup {
        match self.fetch(domain, address).await {
            Ok(Some(key)) => KeyLookup::Found(key),
            Ok(None) => KeyLookup::NotFound,
            Err(e) => KeyLookup::Failed(e.to_string()),
        }
    }
}
