//! # Lockpress Envelope
//!
//! Envelope encryption for gated posts and the persisted wire format.
//!
//! ## Encryption Model
//!
//! Gated content uses a two-layer key model:
//!
//! 1. **Post key**: a fresh random X25519 keypair per gated post. Its secret
//!    half is the actual content-encryption key for every text field.
//! 2. **Wrapped keys**: the post secret is wrapped per recipient via NaCl box
//!    (one-time ephemeral X25519 + XSalsa20-Poly1305), so each recipient can
//!    unwrap independently.
//!
//! This allows adding recipients on edit without re-encrypting content, and
//! keeps every wrapped entry independently decryptable.
//!
//! ## Wire Format
//!
//! [`EncryptionEnvelope`] serializes with the stable field names persisted in
//! the post descriptor (`type`, `key_exchange_pub_key`, `recipients[address]`
//! with `pass` / `pass_nonce` / `pass_ephemeral_pub_key`, ...). Encrypted text
//! fields use the literal `<24B-nonce-hex>:<ciphertext-hex>` format from
//! `lockpress-core`.

pub mod error;
pub mod locale;
pub mod wire;
pub mod wrap;

pub use error::{EnvelopeError, Result};
pub use locale::{decrypt_locale, encrypt_locale, Chapter, PostLocale, SealedChapter, SealedLocale};
pub use wire::{EncryptionEnvelope, WrappedKeyEntry, ENVELOPE_TYPE, KEY_EXCHANGE_ALG};
pub use wrap::{generate_post_key, unwrap_post_key, wrap_post_key_for, WrappedPostKey};
