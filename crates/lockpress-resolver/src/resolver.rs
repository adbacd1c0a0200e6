//! The recipient resolution algorithm.
//!
//! Produces the final recipient list for a post given the acting principal
//! and the post's access policy. Best-effort lookups fan out concurrently
//! with bounded width; mandatory lookups abort the whole resolution on
//! failure, and no partial result is ever returned.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use lockpress_core::{Address, Audience, GenerationNonce, KeyScheme, X25519PublicKey};

use crate::directory::{KeyLookup, PublishedKey, ReadingKeyDirectory};
use crate::error::{ResolveError, Result};
use crate::ledger::SubscriptionLedger;
use crate::principal::Principal;

/// Configuration for recipient resolution.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// The platform domain sponsorships and keys are scoped to.
    pub domain: String,

    /// Moderator addresses that must retain decrypt access to all gated
    /// content. Mandatory: a missing key aborts resolution.
    pub big_brothers: Vec<Address>,

    /// The payment-processor address for purchase access.
    pub processor_address: Option<Address>,

    /// Bound on concurrent directory lookups.
    pub max_concurrent_lookups: usize,
}

impl ResolverConfig {
    /// Config for a domain with no moderators and no purchase processor.
    pub fn for_domain(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            big_brothers: Vec::new(),
            processor_address: None,
            max_concurrent_lookups: 8,
        }
    }
}

/// Access policy of a single post.
#[derive(Debug, Clone)]
pub struct PostPolicy {
    /// Who the post is readable by.
    pub audience: Audience,

    /// Minimum weekly sponsorship for eligibility.
    pub min_weekly_pay: u64,

    /// Whether one-time purchase access is enabled.
    pub allow_purchase: bool,

    /// One-time purchase price.
    pub purchase_price: Option<u64>,

    /// Token the purchase is denominated in.
    pub purchase_token: Option<String>,

    /// For comments on a gated post: the parent envelope's address set.
    /// When present, the audience is inherited, never recomputed from
    /// subscriptions.
    pub inherit_from: Option<Vec<Address>>,
}

impl PostPolicy {
    /// A public post: no encryption.
    pub fn public() -> Self {
        Self {
            audience: Audience::Public,
            min_weekly_pay: 0,
            allow_purchase: false,
            purchase_price: None,
            purchase_token: None,
            inherit_from: None,
        }
    }

    /// A subscriber-gated post with a weekly-pay floor.
    pub fn subscribers(min_weekly_pay: u64) -> Self {
        Self {
            audience: Audience::Subscribers,
            min_weekly_pay,
            allow_purchase: false,
            purchase_price: None,
            purchase_token: None,
            inherit_from: None,
        }
    }

    /// Enable one-time purchase access.
    pub fn with_purchase(mut self, price: u64, token: impl Into<String>) -> Self {
        self.allow_purchase = true;
        self.purchase_price = Some(price);
        self.purchase_token = Some(token.into());
        self
    }

    /// Inherit the audience from a parent envelope's address set.
    pub fn inheriting(addresses: Vec<Address>) -> Self {
        Self {
            audience: Audience::Subscribers,
            min_weekly_pay: 0,
            allow_purchase: false,
            purchase_price: None,
            purchase_token: None,
            inherit_from: Some(addresses),
        }
    }
}

/// One resolved recipient: an address plus its published key material.
#[derive(Debug, Clone)]
pub struct RecipientEntry {
    pub address: Address,
    pub public_key: X25519PublicKey,
    pub scheme: KeyScheme,
    pub nonce: GenerationNonce,

    /// Weekly sponsorship amount at resolution time (0 for non-sponsors).
    pub amount: u64,

    /// Remaining paid weeks at resolution time (0 for non-sponsors).
    pub weeks: u32,
}

impl RecipientEntry {
    fn from_published(address: Address, key: PublishedKey, amount: u64, weeks: u32) -> Self {
        Self {
            address,
            public_key: key.public_key,
            scheme: key.scheme,
            nonce: key.nonce,
            amount,
            weeks,
        }
    }
}

/// Resolves the recipient set for a post.
pub struct RecipientResolver {
    directory: Arc<dyn ReadingKeyDirectory>,
    ledger: Arc<dyn SubscriptionLedger>,
    config: ResolverConfig,
}

impl RecipientResolver {
    /// Create a resolver over the given boundaries.
    pub fn new(
        directory: Arc<dyn ReadingKeyDirectory>,
        ledger: Arc<dyn SubscriptionLedger>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            directory,
            ledger,
            config,
        }
    }

    /// The resolver's configuration.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve the final recipient list for a post.
    ///
    /// Returns an empty list (no encryption) only for public posts. Any
    /// error means no envelope is produced at all.
    pub async fn resolve(
        &self,
        principal: &Principal,
        policy: &PostPolicy,
    ) -> Result<Vec<RecipientEntry>> {
        // Audience candidates: inherited set, or gated sponsors
        let candidates = match &policy.inherit_from {
            Some(parent) => parent
                .iter()
                .map(|address| (address.clone(), 0u64, 0u32))
                .collect(),
            None => match policy.audience {
                Audience::Public => return Ok(Vec::new()),
                Audience::Subscribers => self.eligible_sponsors(principal, policy).await?,
            },
        };

        // Best-effort: look up keys concurrently, drop candidates without one
        let mut recipients = self.keyed_audience(candidates).await;

        if recipients.is_empty() && policy.inherit_from.is_none() && !policy.allow_purchase {
            return Err(ResolveError::NoRecipients);
        }

        // Mandatory: the signer must be able to decrypt their own post
        if !recipients.iter().any(|r| r.address == principal.signer) {
            recipients.push(self.signer_entry(&principal.signer).await?);
        }

        // Mandatory: moderators, all or nothing
        recipients.extend(self.moderator_entries().await?);

        // Mandatory for the purchase feature: the payment processor
        if policy.allow_purchase {
            recipients.push(self.processor_entry().await?);
        }

        Ok(dedup_by_address(recipients))
    }

    /// Query the ledger and apply the eligibility gate.
    async fn eligible_sponsors(
        &self,
        principal: &Principal,
        policy: &PostPolicy,
    ) -> Result<Vec<(Address, u64, u32)>> {
        let sponsors = self
            .ledger
            .sponsors_of(&self.config.domain, &principal.acting_as)
            .await?;

        Ok(sponsors
            .into_iter()
            .filter(|s| s.is_eligible(policy.min_weekly_pay))
            .map(|s| (s.address, s.amount, s.weeks))
            .collect())
    }

    /// Best-effort key lookup over the audience candidates.
    ///
    /// Lookups run concurrently with bounded fan-out; candidate order is
    /// preserved. Candidates without a usable key are logged and dropped.
    async fn keyed_audience(&self, candidates: Vec<(Address, u64, u32)>) -> Vec<RecipientEntry> {
        let lookups = self
            .lookup_many(candidates.iter().map(|(address, _, _)| address.clone()))
            .await;

        candidates
            .into_iter()
            .zip(lookups)
            .filter_map(|((address, amount, weeks), lookup)| match lookup {
                KeyLookup::Found(key) => {
                    Some(RecipientEntry::from_published(address, key, amount, weeks))
                }
                KeyLookup::NotFound => {
                    tracing::warn!(%address, "recipient has no published reading key, dropping");
                    None
                }
                KeyLookup::Failed(err) => {
                    tracing::warn!(%address, error = %err, "reading key lookup failed, dropping");
                    None
                }
            })
            .collect()
    }

    /// Mandatory lookup for the signer.
    async fn signer_entry(&self, signer: &Address) -> Result<RecipientEntry> {
        match self.directory.lookup(&self.config.domain, signer).await {
            KeyLookup::Found(key) => {
                Ok(RecipientEntry::from_published(signer.clone(), key, 0, 0))
            }
            KeyLookup::NotFound => Err(ResolveError::SignerKeyUnpublished(signer.clone())),
            KeyLookup::Failed(err) => {
                Err(ResolveError::Directory(crate::error::DirectoryError::Unavailable(err)))
            }
        }
    }

    /// Mandatory lookups for all configured moderators.
    ///
    /// Collects every offending address before failing so the error names
    /// all of them at once.
    async fn moderator_entries(&self) -> Result<Vec<RecipientEntry>> {
        let lookups = self
            .lookup_many(self.config.big_brothers.iter().cloned())
            .await;

        let mut entries = Vec::with_capacity(lookups.len());
        let mut offending = Vec::new();

        for (address, lookup) in self.config.big_brothers.iter().zip(lookups) {
            match lookup {
                KeyLookup::Found(key) => {
                    entries.push(RecipientEntry::from_published(address.clone(), key, 0, 0));
                }
                KeyLookup::NotFound => offending.push(address.clone()),
                KeyLookup::Failed(err) => {
                    tracing::error!(%address, error = %err, "moderator key lookup failed");
                    offending.push(address.clone());
                }
            }
        }

        if !offending.is_empty() {
            return Err(ResolveError::MissingModeratorKeys(offending));
        }
        Ok(entries)
    }

    /// Mandatory lookup for the payment processor.
    async fn processor_entry(&self) -> Result<RecipientEntry> {
        let processor = self
            .config
            .processor_address
            .as_ref()
            .ok_or(ResolveError::ProcessorUnconfigured)?;

        match self.directory.lookup(&self.config.domain, processor).await {
            KeyLookup::Found(key) => {
                Ok(RecipientEntry::from_published(processor.clone(), key, 0, 0))
            }
            KeyLookup::NotFound => Err(ResolveError::ProcessorKeyMissing(processor.clone())),
            KeyLookup::Failed(err) => {
                Err(ResolveError::Directory(crate::error::DirectoryError::Unavailable(err)))
            }
        }
    }

    /// Run directory lookups concurrently with bounded fan-out, preserving
    /// input order in the output.
    async fn lookup_many(&self, addresses: impl Iterator<Item = Address>) -> Vec<KeyLookup> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_lookups.max(1)));
        let mut join_set = JoinSet::new();
        let mut count = 0usize;

        for (index, address) in addresses.enumerate() {
            count += 1;
            let directory = Arc::clone(&self.directory);
            let domain = self.config.domain.clone();
            let semaphore = Arc::clone(&semaphore);

            join_set.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("lookup semaphore closed");
                (index, directory.lookup(&domain, &address).await)
            });
        }

        let mut results: Vec<KeyLookup> = vec![KeyLookup::Failed("lookup aborted".into()); count];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, lookup)) => results[index] = lookup,
                Err(err) => tracing::error!(error = %err, "lookup task failed"),
            }
        }
        results
    }
}

/// Deduplicate by lowercased address, first occurrence wins.
fn dedup_by_address(entries: Vec<RecipientEntry>) -> Vec<RecipientEntry> {
    let mut seen = std::collections::HashSet::new();
    entries
        .into_iter()
        .filter(|entry| seen.insert(entry.address.canonical()))
        .collect()
}
