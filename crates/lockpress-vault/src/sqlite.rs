//! SQLite implementation of the Vault trait.
//!
//! The durable local backend for desktop targets. Uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use lockpress_core::{
    Address, GenerationNonce, KeyScheme, ReadingKeyRecord, X25519PublicKey, X25519SecretKey,
};

use crate::error::{Result, VaultError};
use crate::export::VaultExport;
use crate::migration;
use crate::traits::{UpsertOutcome, Vault};

/// SQLite-based vault implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking to
/// avoid blocking the async runtime.
pub struct SqliteVault {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteVault {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path.as_ref())?;
        migration::migrate(&mut conn)?;
        tracing::debug!(path = %path.as_ref().display(), "opened sqlite vault");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking closure against the connection off the async runtime.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|e| {
                VaultError::Serialization(format!("vault mutex poisoned: {}", e))
            })?;
            f(&mut conn)
        })
        .await
        .map_err(|e| VaultError::Serialization(format!("vault task join error: {}", e)))?
    }
}

/// Convert a row to a ReadingKeyRecord.
fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, String, String, String, String, i64)> {
    Ok((
        row.get("display_address")?,
        row.get("nonce")?,
        row.get("public_key")?,
        row.get("secret_key")?,
        row.get("scheme")?,
        row.get("created_at")?,
    ))
}

/// Parse the raw column tuple into a typed record.
fn parse_record(
    (display_address, nonce, public_key, secret_key, scheme, created_at): (
        String,
        String,
        String,
        String,
        String,
        i64,
    ),
) -> Result<ReadingKeyRecord> {
    let bad = |what: &str| VaultError::Serialization(format!("stored record has bad {what}"));

    Ok(ReadingKeyRecord {
        address: Address::new(display_address).map_err(|_| bad("address"))?,
        nonce: GenerationNonce::new(nonce).map_err(|_| bad("nonce"))?,
        public_key: X25519PublicKey::from_hex(&public_key).map_err(|_| bad("public key"))?,
        secret_key: X25519SecretKey::from_hex(&secret_key).map_err(|_| bad("secret key"))?,
        scheme: scheme.parse::<KeyScheme>().map_err(|_| bad("scheme"))?,
        created_at,
    })
}

/// Insert records for one canonical address, oldest-first, continuing the
/// insertion sequence from `next_seq`.
fn insert_records(
    conn: &Connection,
    records: &[ReadingKeyRecord],
    next_seq: &mut i64,
) -> Result<()> {
    for record in records.iter().rev() {
        conn.execute(
            "INSERT INTO reading_keys
                 (address, nonce, display_address, public_key, secret_key,
                  scheme, created_at, inserted_seq)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.address.canonical(),
                record.nonce.as_str(),
                record.address.as_str(),
                record.public_key.to_hex(),
                record.secret_key.to_hex(),
                record.scheme.as_str(),
                record.created_at,
                *next_seq,
            ],
        )?;
        *next_seq += 1;
    }
    Ok(())
}

#[async_trait]
impl Vault for SqliteVault {
    async fn list_for(&self, address: &Address) -> Result<Vec<ReadingKeyRecord>> {
        let canonical = address.canonical();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT display_address, nonce, public_key, secret_key, scheme, created_at
                 FROM reading_keys WHERE address = ?1
                 ORDER BY inserted_seq DESC",
            )?;
            let rows = stmt
                .query_map(params![canonical], row_to_record)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            rows.into_iter().map(parse_record).collect()
        })
        .await
    }

    async fn upsert(&self, record: &ReadingKeyRecord) -> Result<UpsertOutcome> {
        let record = record.clone();
        self.with_conn(move |conn| {
            let canonical = record.address.canonical();

            let exists: Option<i64> = conn
                .query_row(
                    "SELECT inserted_seq FROM reading_keys WHERE address = ?1 AND nonce = ?2",
                    params![canonical, record.nonce.as_str()],
                    |row| row.get(0),
                )
                .optional()?;

            if exists.is_some() {
                // Overwrite in place; the generation keeps its position
                conn.execute(
                    "UPDATE reading_keys
                     SET display_address = ?3, public_key = ?4, secret_key = ?5,
                         scheme = ?6, created_at = ?7
                     WHERE address = ?1 AND nonce = ?2",
                    params![
                        canonical,
                        record.nonce.as_str(),
                        record.address.as_str(),
                        record.public_key.to_hex(),
                        record.secret_key.to_hex(),
                        record.scheme.as_str(),
                        record.created_at,
                    ],
                )?;
                Ok(UpsertOutcome::Replaced)
            } else {
                let mut next_seq: i64 = conn.query_row(
                    "SELECT COALESCE(MAX(inserted_seq), 0) + 1 FROM reading_keys",
                    [],
                    |row| row.get(0),
                )?;
                insert_records(conn, std::slice::from_ref(&record), &mut next_seq)?;
                Ok(UpsertOutcome::Inserted)
            }
        })
        .await
    }

    async fn find_secret_by_nonce(
        &self,
        address: &Address,
        nonce: &GenerationNonce,
    ) -> Result<Option<X25519SecretKey>> {
        let canonical = address.canonical();
        let nonce = nonce.as_str().to_string();
        self.with_conn(move |conn| {
            let hex: Option<String> = conn
                .query_row(
                    "SELECT secret_key FROM reading_keys WHERE address = ?1 AND nonce = ?2",
                    params![canonical, nonce],
                    |row| row.get(0),
                )
                .optional()?;

            hex.map(|h| {
                X25519SecretKey::from_hex(&h)
                    .map_err(|_| VaultError::Serialization("stored record has bad secret key".into()))
            })
            .transpose()
        })
        .await
    }

    async fn delete_all(&self, address: &Address) -> Result<usize> {
        let canonical = address.canonical();
        self.with_conn(move |conn| {
            let removed =
                conn.execute("DELETE FROM reading_keys WHERE address = ?1", params![canonical])?;
            Ok(removed)
        })
        .await
    }

    async fn delete_one(&self, address: &Address, nonce: &GenerationNonce) -> Result<bool> {
        let canonical = address.canonical();
        let nonce = nonce.as_str().to_string();
        self.with_conn(move |conn| {
            let removed = conn.execute(
                "DELETE FROM reading_keys WHERE address = ?1 AND nonce = ?2",
                params![canonical, nonce],
            )?;
            Ok(removed > 0)
        })
        .await
    }

    async fn count(&self, address: &Address) -> Result<usize> {
        let canonical = address.canonical();
        self.with_conn(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM reading_keys WHERE address = ?1",
                params![canonical],
                |row| row.get(0),
            )?;
            Ok(count as usize)
        })
        .await
    }

    async fn export(&self) -> Result<VaultExport> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT display_address, nonce, public_key, secret_key, scheme, created_at, address
                 FROM reading_keys ORDER BY address, inserted_seq DESC",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    let canonical: String = row.get("address")?;
                    Ok((canonical, row_to_record(row)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let mut entries: BTreeMap<String, Vec<ReadingKeyRecord>> = BTreeMap::new();
            for (canonical, raw) in rows {
                entries.entry(canonical).or_default().push(parse_record(raw)?);
            }
            Ok(VaultExport::new(entries))
        })
        .await
    }

    async fn import(&self, export: &VaultExport) -> Result<()> {
        export.validate()?;
        let export = export.clone();
        let imported = export.record_count();

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM reading_keys", [])?;

            let mut next_seq: i64 = 1;
            for records in export.entries.values() {
                insert_records(&tx, records, &mut next_seq)?;
            }

            tx.commit()?;
            Ok(())
        })
        .await?;

        tracing::debug!(records = imported, "imported vault export");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockpress_core::X25519Keypair;

    fn addr(s: &str) -> Address {
        Address::new(s).unwrap()
    }

    fn record(address: &str, nonce: &str, created_at: i64) -> ReadingKeyRecord {
        let keypair = X25519Keypair::generate();
        ReadingKeyRecord {
            address: addr(address),
            nonce: GenerationNonce::new(nonce).unwrap(),
            public_key: keypair.public,
            secret_key: keypair.secret,
            scheme: KeyScheme::default(),
            created_at,
        }
    }

    const N1: &str = "aabbccddeeff00112233";
    const N2: &str = "99bbccddeeff00112233";
    const N3: &str = "88bbccddeeff00112233";

    #[tokio::test]
    async fn test_sqlite_upsert_and_order() {
        let vault = SqliteVault::open_memory().unwrap();
        vault.upsert(&record("0xAA", N1, 1)).await.unwrap();
        vault.upsert(&record("0xaa", N2, 2)).await.unwrap();
        vault.upsert(&record("0xaa", N3, 3)).await.unwrap();

        let records = vault.list_for(&addr("0xaa")).await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].nonce.as_str(), N3);
        assert_eq!(records[2].nonce.as_str(), N1);
    }

    #[tokio::test]
    async fn test_sqlite_upsert_idempotent() {
        let vault = SqliteVault::open_memory().unwrap();
        let rec = record("0xaa", N1, 1);

        assert_eq!(vault.upsert(&rec).await.unwrap(), UpsertOutcome::Inserted);
        assert_eq!(vault.upsert(&rec).await.unwrap(), UpsertOutcome::Replaced);
        assert_eq!(vault.count(&addr("0xaa")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sqlite_secret_roundtrip() {
        let vault = SqliteVault::open_memory().unwrap();
        let rec = record("0xAbCd", N1, 1);
        vault.upsert(&rec).await.unwrap();

        let secret = vault
            .find_secret_by_nonce(&addr("0xabcd"), &rec.nonce)
            .await
            .unwrap()
            .expect("secret present");
        assert_eq!(secret.to_bytes(), rec.secret_key.to_bytes());
    }

    #[tokio::test]
    async fn test_sqlite_delete() {
        let vault = SqliteVault::open_memory().unwrap();
        vault.upsert(&record("0xaa", N1, 1)).await.unwrap();
        vault.upsert(&record("0xaa", N2, 2)).await.unwrap();

        assert!(vault
            .delete_one(&addr("0xaa"), &GenerationNonce::new(N2).unwrap())
            .await
            .unwrap());
        assert_eq!(vault.delete_all(&addr("0xaa")).await.unwrap(), 1);
        assert_eq!(vault.count(&addr("0xaa")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sqlite_export_import() {
        let vault = SqliteVault::open_memory().unwrap();
        vault.upsert(&record("0xaa", N1, 1)).await.unwrap();
        vault.upsert(&record("0xaa", N2, 2)).await.unwrap();
        vault.upsert(&record("0xbb", N1, 3)).await.unwrap();

        let export = vault.export().await.unwrap();
        assert_eq!(export.record_count(), 3);

        let restored = SqliteVault::open_memory().unwrap();
        restored.import(&export).await.unwrap();

        let records = restored.list_for(&addr("0xaa")).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].nonce.as_str(), N2);
    }

    #[tokio::test]
    async fn test_sqlite_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.db");

        {
            let vault = SqliteVault::open(&path).unwrap();
            vault.upsert(&record("0xaa", N1, 1)).await.unwrap();
        }

        let vault = SqliteVault::open(&path).unwrap();
        assert_eq!(vault.count(&addr("0xaa")).await.unwrap(), 1);
    }
}
