//! X25519 key material and XSalsa20-Poly1305 field encryption.
//!
//! Wraps x25519-dalek key types and the secretbox AEAD with strong types.
//! Secret halves never leave the device except through the vault export path.

use std::fmt;

use crypto_secretbox::{
    aead::{Aead, KeyInit},
    Nonce, XSalsa20Poly1305,
};
use rand::{rngs::OsRng, RngCore};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use x25519_dalek::{PublicKey, StaticSecret};

use crate::error::{CoreError, Result};

/// An X25519 public key (32 bytes).
///
/// Serializes as a lowercase hex string, matching the wire format.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct X25519PublicKey(pub [u8; 32]);

impl X25519PublicKey {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)?;
        let got = bytes.len();
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CoreError::InvalidKeyLength { expected: 32, got })?;
        Ok(Self(arr))
    }

    /// Convert to x25519-dalek PublicKey.
    pub fn to_dalek(&self) -> PublicKey {
        PublicKey::from(self.0)
    }
}

impl From<PublicKey> for X25519PublicKey {
    fn from(pk: PublicKey) -> Self {
        Self(*pk.as_bytes())
    }
}

impl fmt::Debug for X25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X25519Pub({})", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for X25519PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for X25519PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for X25519PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}

/// An X25519 secret key.
///
/// X25519 keys are only for key agreement, not signing. The secret half is
/// local-only: it is persisted by the vault and never published.
#[derive(Clone)]
pub struct X25519SecretKey(StaticSecret);

impl X25519SecretKey {
    /// Generate a new random secret.
    pub fn generate() -> Self {
        Self(StaticSecret::random_from_rng(OsRng))
    }

    /// Create from seed bytes (X25519 clamping applies).
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(StaticSecret::from(bytes))
    }

    /// Create from a byte slice, validating the length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let got = bytes.len();
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CoreError::InvalidKeyLength { expected: 32, got })?;
        Ok(Self::from_bytes(arr))
    }

    /// Get the raw secret bytes.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Convert to hex string. Vault-export path only.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }

    /// Derive the public key.
    pub fn public_key(&self) -> X25519PublicKey {
        X25519PublicKey::from(PublicKey::from(&self.0))
    }
}

impl fmt::Debug for X25519SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print secret bytes.
        write!(f, "X25519Secret(..)")
    }
}

impl Serialize for X25519SecretKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for X25519SecretKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}

/// An X25519 keypair.
///
/// Used both for reading keys (derived from a wallet signature) and for
/// per-post encryption keys (always freshly random, never derived).
#[derive(Clone)]
pub struct X25519Keypair {
    pub public: X25519PublicKey,
    pub secret: X25519SecretKey,
}

impl X25519Keypair {
    /// Generate a fresh random keypair.
    pub fn generate() -> Self {
        Self::from_secret(X25519SecretKey::generate())
    }

    /// Build a keypair from an existing secret.
    pub fn from_secret(secret: X25519SecretKey) -> Self {
        Self {
            public: secret.public_key(),
            secret,
        }
    }
}

impl fmt::Debug for X25519Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X25519Keypair({:?})", self.public)
    }
}

/// A 256-bit symmetric key for XSalsa20-Poly1305.
///
/// Gated content is keyed directly by the 32-byte post secret key.
#[derive(Clone)]
pub struct SecretBoxKey([u8; 32]);

impl SecretBoxKey {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Encrypt data with this key.
    pub fn encrypt(&self, plaintext: &[u8], nonce: &SecretBoxNonce) -> Result<Vec<u8>> {
        let cipher =
            XSalsa20Poly1305::new_from_slice(&self.0).map_err(|_| CoreError::EncryptFailed)?;

        let nonce = Nonce::from_slice(&nonce.0);
        cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| CoreError::EncryptFailed)
    }

    /// Decrypt data with this key.
    ///
    /// Fails on any tag mismatch; corrupted or partial plaintext is never
    /// returned.
    pub fn decrypt(&self, ciphertext: &[u8], nonce: &SecretBoxNonce) -> Result<Vec<u8>> {
        let cipher =
            XSalsa20Poly1305::new_from_slice(&self.0).map_err(|_| CoreError::DecryptFailed)?;

        let nonce = Nonce::from_slice(&nonce.0);
        cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CoreError::DecryptFailed)
    }
}

impl From<&X25519SecretKey> for SecretBoxKey {
    fn from(secret: &X25519SecretKey) -> Self {
        Self(secret.to_bytes())
    }
}

impl fmt::Debug for SecretBoxKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBoxKey(..)")
    }
}

/// A 192-bit nonce for XSalsa20-Poly1305.
///
/// This is the per-encryption AEAD nonce, distinct from the generation nonce
/// that tracks reading-key rotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretBoxNonce(pub [u8; 24]);

impl SecretBoxNonce {
    /// Generate a new random nonce.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 24];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 24]) -> Self {
        Self(bytes)
    }

    /// Create from a byte slice, validating the length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let got = bytes.len();
        let arr: [u8; 24] = bytes
            .try_into()
            .map_err(|_| CoreError::InvalidNonceLength { expected: 24, got })?;
        Ok(Self(arr))
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 24] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }
}
