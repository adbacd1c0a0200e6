//! Post-key generation and per-recipient wrapping.
//!
//! Wrapping is NaCl box: generate a one-time ephemeral X25519 keypair, run
//! ECDH against the recipient's reading public key, and encrypt the 32-byte
//! post secret under the box key with a fresh 24-byte nonce.

use crypto_box::{
    aead::{Aead, AeadCore},
    PublicKey, SalsaBox, SecretKey,
};
use rand::rngs::OsRng;

use lockpress_core::{SecretBoxNonce, X25519Keypair, X25519PublicKey, X25519SecretKey};

use crate::error::{EnvelopeError, Result};

/// Generate a fresh post encryption key.
///
/// Always random, never derived, never reused across posts. Exactly one
/// exists per gated post; edits re-wrap under the same key.
pub fn generate_post_key() -> X25519Keypair {
    X25519Keypair::generate()
}

/// A post key wrapped for a single recipient.
///
/// Every wrapped copy of a post's key unwraps to the same post secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedPostKey {
    /// The encrypted post secret (includes the authentication tag).
    pub ciphertext: Vec<u8>,

    /// Nonce used for this wrap (unique per wrap).
    pub nonce: SecretBoxNonce,

    /// Ephemeral X25519 public key (sender's side of ECDH).
    pub ephemeral_public: X25519PublicKey,
}

/// Wrap a post secret key for a recipient's reading public key.
pub fn wrap_post_key_for(
    recipient_public: &X25519PublicKey,
    post_secret: &X25519SecretKey,
) -> Result<WrappedPostKey> {
    // One-time ephemeral keypair; the secret is dropped after the ECDH
    let ephemeral = SecretKey::generate(&mut OsRng);
    let ephemeral_public = X25519PublicKey::from_bytes(*ephemeral.public_key().as_bytes());

    let sbox = SalsaBox::new(&PublicKey::from(*recipient_public.as_bytes()), &ephemeral);

    let nonce = SalsaBox::generate_nonce(&mut OsRng);
    let ciphertext = sbox
        .encrypt(&nonce, post_secret.to_bytes().as_slice())
        .map_err(|_| EnvelopeError::Wrap("box encryption failed".into()))?;

    Ok(WrappedPostKey {
        ciphertext,
        nonce: SecretBoxNonce::from_bytes(nonce.into()),
        ephemeral_public,
    })
}

/// Unwrap a post key with the recipient's reading secret key.
///
/// Succeeds only for the matching recipient keypair; any other key, or any
/// tampering with the ciphertext or nonce, fails rather than silently
/// producing a different key.
pub fn unwrap_post_key(
    wrapped: &WrappedPostKey,
    recipient_secret: &X25519SecretKey,
) -> Result<X25519SecretKey> {
    let sbox = SalsaBox::new(
        &PublicKey::from(*wrapped.ephemeral_public.as_bytes()),
        &SecretKey::from(recipient_secret.to_bytes()),
    );

    let nonce = crypto_box::Nonce::from(*wrapped.nonce.as_bytes());
    let plaintext = sbox
        .decrypt(&nonce, wrapped.ciphertext.as_slice())
        .map_err(|_| EnvelopeError::Unwrap)?;

    X25519SecretKey::from_slice(&plaintext).map_err(|_| EnvelopeError::Unwrap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_unwrap_roundtrip() {
        let recipient = X25519Keypair::generate();
        let post_key = generate_post_key();

        let wrapped = wrap_post_key_for(&recipient.public, &post_key.secret).unwrap();
        let unwrapped = unwrap_post_key(&wrapped, &recipient.secret).unwrap();

        assert_eq!(unwrapped.to_bytes(), post_key.secret.to_bytes());
    }

    #[test]
    fn test_unwrap_wrong_recipient_fails() {
        let recipient = X25519Keypair::generate();
        let wrong = X25519Keypair::generate();
        let post_key = generate_post_key();

        let wrapped = wrap_post_key_for(&recipient.public, &post_key.secret).unwrap();

        assert!(matches!(
            unwrap_post_key(&wrapped, &wrong.secret),
            Err(EnvelopeError::Unwrap)
        ));
    }

    #[test]
    fn test_unwrap_tampered_ciphertext_fails() {
        let recipient = X25519Keypair::generate();
        let post_key = generate_post_key();

        let mut wrapped = wrap_post_key_for(&recipient.public, &post_key.secret).unwrap();
        wrapped.ciphertext[0] ^= 0x01;

        assert!(unwrap_post_key(&wrapped, &recipient.secret).is_err());
    }

    #[test]
    fn test_unwrap_tampered_nonce_fails() {
        let recipient = X25519Keypair::generate();
        let post_key = generate_post_key();

        let mut wrapped = wrap_post_key_for(&recipient.public, &post_key.secret).unwrap();
        let mut nonce = *wrapped.nonce.as_bytes();
        nonce[23] ^= 0x80;
        wrapped.nonce = SecretBoxNonce::from_bytes(nonce);

        assert!(unwrap_post_key(&wrapped, &recipient.secret).is_err());
    }

    #[test]
    fn test_every_wrap_unwraps_to_same_secret() {
        let post_key = generate_post_key();
        let recipients: Vec<X25519Keypair> = (0..4).map(|_| X25519Keypair::generate()).collect();

        for recipient in &recipients {
            let wrapped = wrap_post_key_for(&recipient.public, &post_key.secret).unwrap();
            let unwrapped = unwrap_post_key(&wrapped, &recipient.secret).unwrap();
            assert_eq!(unwrapped.to_bytes(), post_key.secret.to_bytes());
        }
    }

    #[test]
    fn test_wraps_use_fresh_ephemerals() {
        let recipient = X25519Keypair::generate();
        let post_key = generate_post_key();

        let w1 = wrap_post_key_for(&recipient.public, &post_key.secret).unwrap();
        let w2 = wrap_post_key_for(&recipient.public, &post_key.secret).unwrap();

        assert_ne!(w1.ephemeral_public, w2.ephemeral_public);
        assert_ne!(w1.nonce, w2.nonce);
        assert_ne!(w1.ciphertext, w2.ciphertext);
    }
}
