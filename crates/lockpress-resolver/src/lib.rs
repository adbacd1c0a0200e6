//! # Lockpress Resolver
//!
//! Computes the deduplicated set of addresses (and their published reading
//! keys) that must receive a wrapped post key.
//!
//! ## Recipient Categories
//!
//! - **Audience** (best-effort): eligible sponsors, or the parent envelope's
//!   address set for comments. A candidate without a published key is
//!   dropped with a log line; one candidate's lookup failure never blocks
//!   the others.
//! - **Signer** (mandatory): the acting signer must always be able to
//!   decrypt their own post.
//! - **Big brothers** (mandatory): configured moderator addresses that retain
//!   decrypt access to all gated content. Any missing key aborts resolution
//!   with every offending address listed.
//! - **Payment processor** (mandatory when purchase access is enabled).
//!
//! Deduplication is by lowercased address, first occurrence wins.

pub mod directory;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod principal;
pub mod resolver;

pub use directory::{KeyLookup, PublishedKey, ReadingKeyDirectory};
pub use error::{DirectoryError, LedgerError, ResolveError, Result};
pub use ledger::{Sponsor, SubscriptionLedger};
pub use memory::{MemoryDirectory, MemoryLedger};
pub use principal::Principal;
pub use resolver::{PostPolicy, RecipientEntry, RecipientResolver, ResolverConfig};
