//! In-memory directory and ledger implementations.
//!
//! Primarily for testing. Both are thread-safe and support scripting
//! failures to exercise the best-effort/mandatory split.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;

use lockpress_core::Address;

use crate::directory::{PublishedKey, ReadingKeyDirectory};
use crate::error::{DirectoryError, LedgerError};
use crate::ledger::{Sponsor, SubscriptionLedger};

/// In-memory reading-key directory.
pub struct MemoryDirectory {
    /// (domain, canonical address) -> published key.
    keys: RwLock<HashMap<(String, String), PublishedKey>>,

    /// Canonical addresses whose lookups fail with a transport error.
    failing: RwLock<HashSet<String>>,
}

impl MemoryDirectory {
    /// Create a new empty directory.
    pub fn new() -> Self {
        Self {
            keys: RwLock::new(HashMap::new()),
            failing: RwLock::new(HashSet::new()),
        }
    }

    /// Script a transport failure for an address's lookups.
    pub fn set_failing(&self, address: &Address) {
        self.failing.write().unwrap().insert(address.canonical());
    }

    /// Remove a published key.
    pub fn remove(&self, domain: &str, address: &Address) {
        self.keys
            .write()
            .unwrap()
            .remove(&(domain.to_string(), address.canonical()));
    }
}

impl Default for MemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReadingKeyDirectory for MemoryDirectory {
    async fn publish(
        &self,
        domain: &str,
        address: &Address,
        key: &PublishedKey,
    ) -> Result<(), DirectoryError> {
        self.keys
            .write()
            .unwrap()
            .insert((domain.to_string(), address.canonical()), key.clone());
        Ok(())
    }

    async fn fetch(
        &self,
        domain: &str,
        address: &Address,
    ) -> Result<Option<PublishedKey>, DirectoryError> {
        if self.failing.read().unwrap().contains(&address.canonical()) {
            return Err(DirectoryError::Unavailable("scripted failure".into()));
        }
        Ok(self
            .keys
            .read()
            .unwrap()
            .get(&(domain.to_string(), address.canonical()))
            .cloned())
    }
}

/// In-memory subscription ledger.
pub struct MemoryLedger {
    /// (domain, canonical address) -> sponsors.
    sponsors: RwLock<HashMap<(String, String), Vec<Sponsor>>>,
}

impl MemoryLedger {
    /// Create a new empty ledger.
    pub fn new() -> Self {
        Self {
            sponsors: RwLock::new(HashMap::new()),
        }
    }

    /// Add a sponsor of `address` on `domain`.
    pub fn add_sponsor(&self, domain: &str, address: &Address, sponsor: Sponsor) {
        self.sponsors
            .write()
            .unwrap()
            .entry((domain.to_string(), address.canonical()))
            .or_default()
            .push(sponsor);
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubscriptionLedger for MemoryLedger {
    async fn sponsors_of(
        &self,
        domain: &str,
        address: &Address,
    ) -> Result<Vec<Sponsor>, LedgerError> {
        Ok(self
            .sponsors
            .read()
            .unwrap()
            .get(&(domain.to_string(), address.canonical()))
            .cloned()
            .unwrap_or_default())
    }
}
