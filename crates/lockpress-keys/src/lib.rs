//! # Lockpress Keys
//!
//! Deterministic reading-key derivation from wallet signatures.
//!
//! ## Overview
//!
//! A reading key is an X25519 keypair derived from a wallet signature over a
//! canonical message. Because the derivation is a pure function of
//! `(signature, nonce)`, the same wallet can reconstruct the same keypair on
//! any device without the secret ever being stored server-side.
//!
//! ## Derivation Pipeline
//!
//! 1. [`SignableMessage`] - canonical bytes of `{context, scheme, nonce}`
//! 2. The external wallet signs those bytes (65-byte recoverable signature)
//! 3. [`derive_seed`] - HKDF-SHA256 over `r‖s` with domain-separated salt
//! 4. [`keypair_from_seed`] - X25519 clamping + basepoint multiplication
//!
//! ## Caveat: signature determinism
//!
//! Recovery assumes the wallet reproduces byte-identical signatures for
//! identical input. A wallet using randomized ECDSA breaks this; when the
//! caller knows the previously published public key, [`recover_reading_key`]
//! detects the mismatch and reports [`KeyError::RecoveredKeyMismatch`] instead
//! of handing back a silently wrong key.

pub mod derive;
pub mod error;
pub mod message;
pub mod signer;

pub use derive::{derive_seed, generate_reading_key, keypair_from_seed, recover_reading_key};
pub use error::{KeyError, Result};
pub use message::{SignableMessage, SIGNING_CONTEXT};
pub use signer::{WalletSignature, WalletSigner, SIGNATURE_LEN};
