//! # Lockpress Vault
//!
//! Durable local store for the user's own private reading keys. Address-keyed
//! and multi-generation: each rotation prepends a new record, old generations
//! stay available so older envelopes remain decryptable.
//!
//! ## Key Types
//!
//! - [`Vault`] - The async trait for all vault operations
//! - [`SqliteVault`] - SQLite-backed persistent storage
//! - [`MemoryVault`] - In-memory storage for tests and ephemeral sessions
//! - [`VaultExport`] - Versioned backup blob for export/import
//!
//! ## Known Narrow Race
//!
//! The vault is the only shared mutable resource in the system. Two
//! concurrent writers (e.g. two open sessions for the same user) race on
//! read-modify-write of an address's generation list. Write frequency is a
//! handful of operations per key rotation, so this is accepted and documented
//! rather than guarded; the loser of the race re-derives its key from a fresh
//! signature on next use.

pub mod error;
pub mod export;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, VaultError};
pub use export::{VaultExport, EXPORT_VERSION};
pub use memory::MemoryVault;
pub use sqlite::SqliteVault;
pub use traits::{UpsertOutcome, Vault};
