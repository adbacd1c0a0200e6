//! # Lockpress Core
//!
//! Pure primitives for the Lockpress reading-key infrastructure: addresses,
//! generation nonces, X25519 key material, and authenticated field encryption.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over cryptographic data structures; everything here is
//! synchronous and safe to call from any concurrent context.
//!
//! ## Key Types
//!
//! - [`Address`] - A wallet address, compared case-insensitively
//! - [`GenerationNonce`] - Random hex nonce that tracks a key generation
//! - [`X25519PublicKey`] / [`X25519SecretKey`] - Reading and post key halves
//! - [`ReadingKeyRecord`] - One derived reading key generation for an address
//! - [`EncryptedField`] - The `<nonce-hex>:<ciphertext-hex>` field format

pub mod crypto;
pub mod error;
pub mod field;
pub mod types;

pub use crypto::{SecretBoxKey, SecretBoxNonce, X25519Keypair, X25519PublicKey, X25519SecretKey};
pub use error::{CoreError, Result};
pub use field::{decrypt_field, encrypt_field, EncryptedField};
pub use types::{Address, Audience, GenerationNonce, KeyScheme, ReadingKeyRecord};
