//! The derivation pipeline: wallet signature → HKDF seed → X25519 keypair.
//!
//! Everything here is a pure function of its inputs. The only side effect in
//! this module is the external sign call inside [`generate_reading_key`] and
//! [`recover_reading_key`], which each invoke the signer exactly once.

use hkdf::Hkdf;
use sha2::Sha256;

use lockpress_core::{
    Address, GenerationNonce, KeyScheme, ReadingKeyRecord, X25519Keypair, X25519PublicKey,
    X25519SecretKey,
};

use crate::error::{KeyError, Result};
use crate::message::{SignableMessage, SIGNING_CONTEXT};
use crate::signer::{WalletSignature, WalletSigner};

/// Domain-separation salt for the seed HKDF.
const HKDF_SALT: &[u8] = b"lockpress.reading-key.hkdf.v1";

/// Derive the 32-byte keypair seed from a wallet signature and nonce.
///
/// The recovery byte is stripped; `r ‖ s` (64 bytes) is the input key
/// material. The info string binds context, scheme, and nonce so a signature
/// can never yield a key for a different generation or scheme.
///
/// Pure: identical inputs always produce identical output. HKDF with a
/// 32-byte output cannot fail.
pub fn derive_seed(signature: &WalletSignature, scheme: KeyScheme, nonce: &GenerationNonce) -> [u8; 32] {
    let ikm = signature.r_s();
    let info = format!("{}|{}|{}", SIGNING_CONTEXT, scheme.as_str(), nonce.as_str());

    let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), &ikm);
    let mut seed = [0u8; 32];
    hk.expand(info.as_bytes(), &mut seed)
        .expect("32 bytes is a valid HKDF-SHA256 output length");
    seed
}

/// Build an X25519 keypair from a seed.
///
/// X25519 scalar clamping is applied by the secret-key construction; the
/// public half is the clamped scalar times the basepoint. Pure math, never
/// fails.
pub fn keypair_from_seed(seed: [u8; 32]) -> X25519Keypair {
    X25519Keypair::from_secret(X25519SecretKey::from_bytes(seed))
}

/// Generate a brand-new reading key for an address.
///
/// Draws a fresh generation nonce, asks the wallet to sign the canonical
/// message (exactly one sign call), and derives the keypair from the
/// signature.
pub async fn generate_reading_key(
    signer: &dyn WalletSigner,
    address: &Address,
) -> Result<ReadingKeyRecord> {
    let scheme = KeyScheme::default();
    let nonce = GenerationNonce::generate();

    let keypair = sign_and_derive(signer, address, scheme, &nonce).await?;

    Ok(ReadingKeyRecord {
        address: address.clone(),
        nonce,
        public_key: keypair.public,
        secret_key: keypair.secret,
        scheme,
        created_at: now_millis(),
    })
}

/// Reconstruct the reading key for an existing generation nonce.
///
/// Re-signs the same canonical message; a deterministic wallet reproduces the
/// identical keypair. When `expected_public` is supplied (the directory-
/// published half), a mismatch is reported as [`KeyError::RecoveredKeyMismatch`]
/// rather than returning a key that cannot decrypt anything.
pub async fn recover_reading_key(
    signer: &dyn WalletSigner,
    address: &Address,
    scheme: KeyScheme,
    nonce: &GenerationNonce,
    expected_public: Option<&X25519PublicKey>,
) -> Result<X25519Keypair> {
    let keypair = sign_and_derive(signer, address, scheme, nonce).await?;

    if let Some(expected) = expected_public {
        if keypair.public != *expected {
            return Err(KeyError::RecoveredKeyMismatch);
        }
    }

    Ok(keypair)
}

/// One sign call, then the pure pipeline.
async fn sign_and_derive(
    signer: &dyn WalletSigner,
    address: &Address,
    scheme: KeyScheme,
    nonce: &GenerationNonce,
) -> Result<X25519Keypair> {
    let message = SignableMessage::new(scheme, nonce.clone()).canonical_bytes();
    let signature = signer.sign(address, &message).await?;
    let seed = derive_seed(&signature, scheme, nonce);
    Ok(keypair_from_seed(seed))
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}
