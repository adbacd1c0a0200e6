//! Versioned vault backup blob.
//!
//! The export is a JSON document keyed by canonical (lowercased) address,
//! each holding the full generation list most-recent-first. Import validates
//! the top-level shape before any overwrite happens.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use lockpress_core::ReadingKeyRecord;

use crate::error::{Result, VaultError};

/// Current export blob version.
pub const EXPORT_VERSION: u32 = 1;

/// A full vault backup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultExport {
    /// Blob format version.
    pub version: u32,

    /// Generations per canonical address, most-recent-first.
    pub entries: BTreeMap<String, Vec<ReadingKeyRecord>>,
}

impl VaultExport {
    /// Build an export from per-address generation lists.
    pub fn new(entries: BTreeMap<String, Vec<ReadingKeyRecord>>) -> Self {
        Self {
            version: EXPORT_VERSION,
            entries,
        }
    }

    /// Serialize to the opaque blob form.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| VaultError::Serialization(e.to_string()))
    }

    /// Parse and validate a blob.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let export: VaultExport = serde_json::from_slice(bytes)
            .map_err(|e| VaultError::InvalidExport(e.to_string()))?;
        export.validate()?;
        Ok(export)
    }

    /// Top-level shape validation.
    pub fn validate(&self) -> Result<()> {
        if self.version != EXPORT_VERSION {
            return Err(VaultError::InvalidExport(format!(
                "unsupported export version: {}",
                self.version
            )));
        }
        for (key, records) in &self.entries {
            if key.is_empty() {
                return Err(VaultError::InvalidExport("empty address key".into()));
            }
            for record in records {
                if !record.address.matches(key) {
                    return Err(VaultError::InvalidExport(format!(
                        "record address {} filed under {}",
                        record.address, key
                    )));
                }
            }
        }
        Ok(())
    }

    /// Total number of records across all addresses.
    pub fn record_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}
