//! The Publisher: unified API for sealing and opening gated posts.
//!
//! A thin boundary layer that combines key derivation, recipient resolution,
//! envelope crypto, and the vault with the external directory and ledger
//! lookups. All policy decisions live in the resolver; all cryptography in
//! the component crates.

use std::sync::Arc;

use lockpress_core::{Address, Audience, ReadingKeyRecord, X25519SecretKey};
use lockpress_envelope::{
    decrypt_locale, encrypt_locale, generate_post_key, wrap_post_key_for, EncryptionEnvelope,
    PostLocale, SealedLocale, WrappedKeyEntry,
};
use lockpress_keys::{generate_reading_key, recover_reading_key, WalletSigner};
use lockpress_resolver::{
    PostPolicy, Principal, PublishedKey, ReadingKeyDirectory, RecipientEntry, RecipientResolver,
    ResolverConfig, SubscriptionLedger,
};
use lockpress_vault::Vault;

use crate::error::{PublishError, Result};

/// Configuration for the Publisher.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Recipient resolution configuration (domain, moderators, processor).
    pub resolver: ResolverConfig,
}

impl PublisherConfig {
    /// Wrap a resolver configuration.
    pub fn new(resolver: ResolverConfig) -> Self {
        Self { resolver }
    }
}

/// A post ready to publish: locale fields plus access policy.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub locale: PostLocale,
    pub policy: PostPolicy,
}

/// The publishable result of sealing a post.
#[derive(Debug, Clone)]
pub enum SealedPost {
    /// Public post: locale unchanged, no envelope.
    Public(PostLocale),

    /// Gated post: encrypted locale plus the encryption envelope for the
    /// post descriptor.
    Gated {
        locale: SealedLocale,
        encryption: EncryptionEnvelope,
    },
}

impl SealedPost {
    /// The envelope, for gated posts.
    pub fn encryption(&self) -> Option<&EncryptionEnvelope> {
        match self {
            SealedPost::Public(_) => None,
            SealedPost::Gated { encryption, .. } => Some(encryption),
        }
    }

    /// Whether the post is gated.
    pub fn is_gated(&self) -> bool {
        matches!(self, SealedPost::Gated { .. })
    }
}

/// The main Publisher struct.
///
/// Provides a unified API for:
/// - Ensuring the acting signer has a published reading key
/// - Sealing posts and comments into envelopes
/// - Re-sealing edits under the same post key
/// - Opening envelopes back into post secrets and locales
pub struct Publisher<V: Vault> {
    /// Who is acting and who signs.
    principal: Principal,
    /// The external wallet signer.
    signer: Arc<dyn WalletSigner>,
    /// The external reading-key directory.
    directory: Arc<dyn ReadingKeyDirectory>,
    /// Recipient resolution over directory + ledger.
    resolver: RecipientResolver,
    /// Local private-key persistence.
    vault: Arc<V>,
    /// Configuration.
    config: PublisherConfig,
}

impl<V: Vault> Publisher<V> {
    /// Create a new publisher for a principal.
    pub fn new(
        principal: Principal,
        signer: Arc<dyn WalletSigner>,
        directory: Arc<dyn ReadingKeyDirectory>,
        ledger: Arc<dyn SubscriptionLedger>,
        vault: Arc<V>,
        config: PublisherConfig,
    ) -> Self {
        let resolver = RecipientResolver::new(
            Arc::clone(&directory),
            ledger,
            config.resolver.clone(),
        );
        Self {
            principal,
            signer,
            directory,
            resolver,
            vault,
            config,
        }
    }

    /// The acting principal.
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// The vault reference.
    pub fn vault(&self) -> &V {
        &self.vault
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reading Key Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Make sure the signer has a usable reading key, generating and
    /// publishing one on demand.
    ///
    /// Order of preference: vault record for the published generation, then
    /// recovery via a fresh signature, then a brand-new generation (which is
    /// published to the directory). Vault write failures are logged and
    /// tolerated: the key still works this session, it just has to be
    /// re-derived next time.
    pub async fn ensure_reading_key(&self) -> Result<ReadingKeyRecord> {
        let address = &self.principal.signer;
        let domain = &self.config.resolver.domain;

        match self.directory.fetch(domain, address).await? {
            Some(published) => {
                if let Some(record) = self.vault_record_for(address, &published).await {
                    return Ok(record);
                }

                // Published but not held locally: re-derive from a signature
                let keypair = recover_reading_key(
                    self.signer.as_ref(),
                    address,
                    published.scheme,
                    &published.nonce,
                    Some(&published.public_key),
                )
                .await?;

                let record = ReadingKeyRecord {
                    address: address.clone(),
                    nonce: published.nonce,
                    public_key: keypair.public,
                    secret_key: keypair.secret,
                    scheme: published.scheme,
                    created_at: now_millis(),
                };
                self.persist_best_effort(&record).await;
                Ok(record)
            }
            None => {
                let record = generate_reading_key(self.signer.as_ref(), address).await?;
                self.persist_best_effort(&record).await;

                let published = PublishedKey {
                    public_key: record.public_key,
                    scheme: record.scheme,
                    nonce: record.nonce.clone(),
                };
                self.directory.publish(domain, address, &published).await?;
                Ok(record)
            }
        }
    }

    /// Look for the published generation in the vault.
    async fn vault_record_for(
        &self,
        address: &Address,
        published: &PublishedKey,
    ) -> Option<ReadingKeyRecord> {
        let records = match self.vault.list_for(address).await {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!(error = %err, "vault read failed, falling back to recovery");
                return None;
            }
        };
        records.into_iter().find(|r| r.nonce == published.nonce)
    }

    /// Persist a record, tolerating storage failure.
    async fn persist_best_effort(&self, record: &ReadingKeyRecord) {
        if let Err(err) = self.vault.upsert(record).await {
            tracing::warn!(
                error = %err,
                "vault write failed; key must be re-derived next session"
            );
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Publish Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Seal a post for publishing.
    ///
    /// Public posts pass through unchanged. Gated posts get a fresh post key,
    /// an envelope wrapping it for every resolved recipient, and an encrypted
    /// locale. Any failure aborts with zero partial envelope.
    pub async fn seal_post(&self, draft: &PostDraft) -> Result<SealedPost> {
        self.seal_with_policy(&draft.locale, &draft.policy).await
    }

    /// Seal a comment on a gated post.
    ///
    /// Recipients are the parent envelope's address set, never recomputed
    /// from subscriptions. The comment gets its own fresh post key.
    pub async fn seal_comment(
        &self,
        parent: &EncryptionEnvelope,
        locale: &PostLocale,
    ) -> Result<SealedPost> {
        let mut policy = PostPolicy::inheriting(parent.recipient_addresses());
        policy.min_weekly_pay = parent.min_weekly_pay;
        self.seal_with_policy(locale, &policy).await
    }

    /// Re-seal an edited post under its existing post key.
    ///
    /// The post key is never regenerated for edits: the existing secret is
    /// recovered, the locale re-encrypted under it, and the recipient set
    /// freshly resolved and re-wrapped.
    pub async fn reseal(
        &self,
        envelope: &EncryptionEnvelope,
        locale: &PostLocale,
    ) -> Result<SealedPost> {
        let post_secret = self.open_envelope(envelope).await?;
        let post_public = envelope.post_public_key()?;

        let policy = PostPolicy {
            audience: envelope.access_type,
            min_weekly_pay: envelope.min_weekly_pay,
            allow_purchase: envelope.allow_purchase,
            purchase_price: envelope.purchase_price,
            purchase_token: envelope.purchase_token.clone(),
            inherit_from: None,
        };

        self.ensure_reading_key().await?;
        let recipients = self.resolver.resolve(&self.principal, &policy).await?;

        let encryption =
            self.build_envelope(&post_public, &policy, &recipients, &post_secret)?;
        let sealed = encrypt_locale(locale, &post_secret)?;

        Ok(SealedPost::Gated {
            locale: sealed,
            encryption,
        })
    }

    async fn seal_with_policy(
        &self,
        locale: &PostLocale,
        policy: &PostPolicy,
    ) -> Result<SealedPost> {
        if policy.audience == Audience::Public && policy.inherit_from.is_none() {
            return Ok(SealedPost::Public(locale.clone()));
        }

        // The resolver requires the signer's key to be published already
        self.ensure_reading_key().await?;

        let recipients = self.resolver.resolve(&self.principal, policy).await?;
        if recipients.is_empty() {
            return Ok(SealedPost::Public(locale.clone()));
        }

        let post_key = generate_post_key();
        let encryption =
            self.build_envelope(&post_key.public, policy, &recipients, &post_key.secret)?;
        let sealed = encrypt_locale(locale, &post_key.secret)?;

        Ok(SealedPost::Gated {
            locale: sealed,
            encryption,
        })
    }

    /// Wrap the post secret for every recipient into a fresh envelope.
    fn build_envelope(
        &self,
        post_public: &lockpress_core::X25519PublicKey,
        policy: &PostPolicy,
        recipients: &[RecipientEntry],
        post_secret: &X25519SecretKey,
    ) -> Result<EncryptionEnvelope> {
        let processor_address = policy
            .allow_purchase
            .then(|| {
                self.config
                    .resolver
                    .processor_address
                    .as_ref()
                    .map(|a| a.as_str().to_string())
            })
            .flatten();

        let mut envelope = EncryptionEnvelope::new(
            post_public,
            Audience::Subscribers,
            policy.min_weekly_pay,
            policy.allow_purchase,
            policy.purchase_price,
            processor_address,
            policy.purchase_token.clone(),
        );

        for recipient in recipients {
            let wrapped = wrap_post_key_for(&recipient.public_key, post_secret)?;
            envelope.insert_recipient(
                &recipient.address,
                WrappedKeyEntry::new(
                    &wrapped,
                    &recipient.public_key,
                    recipient.scheme,
                    recipient.nonce.clone(),
                ),
            );
        }

        Ok(envelope)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Read Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Recover the post secret key from an envelope.
    ///
    /// Finds the signer's wrapped entry (case-insensitive), supplies the
    /// matching reading secret from the vault or re-derives it via a fresh
    /// signature, then unwraps.
    pub async fn open_envelope(&self, envelope: &EncryptionEnvelope) -> Result<X25519SecretKey> {
        let address = &self.principal.signer;
        let entry = envelope
            .entry_for(address)
            .ok_or_else(|| PublishError::NotARecipient(address.clone()))?;

        let reading_secret = self.reading_secret_for(address, entry).await?;
        Ok(entry.unwrap_with(&reading_secret)?)
    }

    /// Open an envelope and decrypt the locale with it.
    pub async fn open_locale(
        &self,
        envelope: &EncryptionEnvelope,
        sealed: &SealedLocale,
    ) -> Result<PostLocale> {
        let post_secret = self.open_envelope(envelope).await?;
        Ok(decrypt_locale(sealed, &post_secret)?)
    }

    /// Vault-first lookup of the reading secret an entry was wrapped for,
    /// falling back to re-derivation through the signer.
    async fn reading_secret_for(
        &self,
        address: &Address,
        entry: &WrappedKeyEntry,
    ) -> Result<X25519SecretKey> {
        match self
            .vault
            .find_secret_by_nonce(address, &entry.reading_key_nonce)
            .await
        {
            Ok(Some(secret)) => return Ok(secret),
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(error = %err, "vault read failed, falling back to recovery");
            }
        }

        let expected = entry.reading_public_key()?;
        let keypair = recover_reading_key(
            self.signer.as_ref(),
            address,
            entry.reading_key_scheme,
            &entry.reading_key_nonce,
            Some(&expected),
        )
        .await?;

        let record = ReadingKeyRecord {
            address: address.clone(),
            nonce: entry.reading_key_nonce.clone(),
            public_key: keypair.public,
            secret_key: keypair.secret.clone(),
            scheme: entry.reading_key_scheme,
            created_at: now_millis(),
        };
        self.persist_best_effort(&record).await;

        Ok(keypair.secret)
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}
