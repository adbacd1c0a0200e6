//! # Lockpress
//!
//! The unified API for the Lockpress reading-key infrastructure: gate posts
//! to paying subscribers, moderators, and one-time purchasers without any
//! server ever holding plaintext keys.
//!
//! ## Overview
//!
//! - **Reading keys**: per-user X25519 keypairs derived deterministically
//!   from a wallet signature; the public half is published to a directory,
//!   the secret half stays in the local vault (or is re-derived on demand).
//! - **Post keys**: one fresh random keypair per gated post; the secret half
//!   encrypts every gated text field.
//! - **Envelopes**: the post key is wrapped per recipient via NaCl box, so
//!   each recipient decrypts independently and the server stores only
//!   ciphertext.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lockpress::{Publisher, PublisherConfig};
//! use lockpress::core::Address;
//! use lockpress::resolver::{Principal, ResolverConfig};
//! use lockpress::vault::MemoryVault;
//!
//! async fn example(
//!     signer: Arc<dyn lockpress::keys::WalletSigner>,
//!     directory: Arc<dyn lockpress::resolver::ReadingKeyDirectory>,
//!     ledger: Arc<dyn lockpress::resolver::SubscriptionLedger>,
//! ) {
//!     let author = Address::new("0xauthor").unwrap();
//!     let publisher = Publisher::new(
//!         Principal::individual(author),
//!         signer,
//!         directory,
//!         ledger,
//!         Arc::new(MemoryVault::new()),
//!         PublisherConfig::new(ResolverConfig::for_domain("press.example")),
//!     );
//!
//!     // let sealed = publisher.seal_post(&draft).await.unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `lockpress::core` - Addresses, nonces, key material, field encryption
//! - `lockpress::keys` - Deterministic key derivation and the wallet boundary
//! - `lockpress::envelope` - Envelope crypto and the wire format
//! - `lockpress::resolver` - Recipient resolution and directory/ledger boundaries
//! - `lockpress::vault` - Local private-key persistence

pub mod error;
pub mod publisher;

// Re-export component crates
pub use lockpress_core as core;
pub use lockpress_envelope as envelope;
pub use lockpress_keys as keys;
pub use lockpress_resolver as resolver;
pub use lockpress_vault as vault;

// Re-export main types for convenience
pub use error::{PublishError, Result};
pub use publisher::{PostDraft, Publisher, PublisherConfig, SealedPost};

// Re-export commonly used component types
pub use lockpress_core::{Address, Audience, GenerationNonce, KeyScheme, ReadingKeyRecord};
pub use lockpress_envelope::{EncryptionEnvelope, PostLocale, SealedLocale};
pub use lockpress_resolver::{PostPolicy, Principal};
