//! In-memory implementation of the Vault trait.
//!
//! Used for tests and ephemeral sessions. Same semantics as SQLite but keeps
//! everything in memory with no persistence.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use lockpress_core::{Address, GenerationNonce, ReadingKeyRecord, X25519SecretKey};

use crate::error::Result;
use crate::export::VaultExport;
use crate::traits::{UpsertOutcome, Vault};

/// In-memory vault implementation.
///
/// All data is lost when the vault is dropped. Thread-safe via RwLock.
pub struct MemoryVault {
    /// Generations per canonical address, most-recent-first.
    inner: RwLock<BTreeMap<String, Vec<ReadingKeyRecord>>>,
}

impl MemoryVault {
    /// Create a new empty in-memory vault.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for MemoryVault {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Vault for MemoryVault {
    async fn list_for(&self, address: &Address) -> Result<Vec<ReadingKeyRecord>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.get(&address.canonical()).cloned().unwrap_or_default())
    }

    async fn upsert(&self, record: &ReadingKeyRecord) -> Result<UpsertOutcome> {
        let mut inner = self.inner.write().unwrap();
        let records = inner.entry(record.address.canonical()).or_default();

        if let Some(existing) = records.iter_mut().find(|r| r.nonce == record.nonce) {
            *existing = record.clone();
            Ok(UpsertOutcome::Replaced)
        } else {
            records.insert(0, record.clone());
            Ok(UpsertOutcome::Inserted)
        }
    }

    async fn find_secret_by_nonce(
        &self,
        address: &Address,
        nonce: &GenerationNonce,
    ) -> Result<Option<X25519SecretKey>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .get(&address.canonical())
            .and_then(|records| records.iter().find(|r| r.nonce == *nonce))
            .map(|r| r.secret_key.clone()))
    }

    async fn delete_all(&self, address: &Address) -> Result<usize> {
        let mut inner = self.inner.write().unwrap();
        Ok(inner
            .remove(&address.canonical())
            .map(|records| records.len())
            .unwrap_or(0))
    }

    async fn delete_one(&self, address: &Address, nonce: &GenerationNonce) -> Result<bool> {
        let mut inner = self.inner.write().unwrap();
        let Some(records) = inner.get_mut(&address.canonical()) else {
            return Ok(false);
        };

        let before = records.len();
        records.retain(|r| r.nonce != *nonce);
        let removed = records.len() < before;

        if records.is_empty() {
            inner.remove(&address.canonical());
        }
        Ok(removed)
    }

    async fn count(&self, address: &Address) -> Result<usize> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .get(&address.canonical())
            .map(|records| records.len())
            .unwrap_or(0))
    }

    async fn export(&self) -> Result<VaultExport> {
        let inner = self.inner.read().unwrap();
        Ok(VaultExport::new(inner.clone()))
    }

    async fn import(&self, export: &VaultExport) -> Result<()> {
        export.validate()?;
        let mut inner = self.inner.write().unwrap();
        *inner = export.entries.clone();
        Ok(())
    }
}
