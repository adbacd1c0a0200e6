//! Encrypted text fields.
//!
//! Gated text fields (title, preview, tags, chapter titles) are stored as the
//! literal string `<24B-nonce-hex>:<ciphertext-hex>`, keyed directly by the
//! 32-byte post secret key.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::crypto::{SecretBoxKey, SecretBoxNonce};
use crate::error::{CoreError, Result};

/// An encrypted field: a fresh random 24-byte nonce plus the AEAD ciphertext.
///
/// Round-trips through its string form `<nonce-hex>:<ciphertext-hex>`.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedField {
    nonce: SecretBoxNonce,
    ciphertext: Vec<u8>,
}

impl EncryptedField {
    /// Encrypt a plaintext under the given key with a fresh random nonce.
    pub fn seal(plaintext: &[u8], key: &SecretBoxKey) -> Result<Self> {
        let nonce = SecretBoxNonce::generate();
        let ciphertext = key.encrypt(plaintext, &nonce)?;
        Ok(Self { nonce, ciphertext })
    }

    /// Decrypt with the given key.
    ///
    /// Fails with [`CoreError::DecryptFailed`] on tag mismatch; never returns
    /// corrupted or partial plaintext.
    pub fn open(&self, key: &SecretBoxKey) -> Result<Vec<u8>> {
        key.decrypt(&self.ciphertext, &self.nonce)
    }

    /// Decrypt and interpret as UTF-8.
    pub fn open_string(&self, key: &SecretBoxKey) -> Result<String> {
        let bytes = self.open(key)?;
        String::from_utf8(bytes).map_err(|_| CoreError::DecryptFailed)
    }

    /// The nonce half.
    pub fn nonce(&self) -> &SecretBoxNonce {
        &self.nonce
    }

    /// The ciphertext half (includes the authentication tag).
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }
}

impl fmt::Display for EncryptedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.nonce.to_hex(), hex::encode(&self.ciphertext))
    }
}

impl fmt::Debug for EncryptedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptedField({}..)", &self.nonce.to_hex()[..8])
    }
}

impl FromStr for EncryptedField {
    type Err = CoreError;

    /// Split on the first `:`; both halves must be valid hex.
    fn from_str(s: &str) -> Result<Self> {
        let (nonce_hex, ct_hex) = s
            .split_once(':')
            .ok_or_else(|| CoreError::MalformedField("missing ':' separator".into()))?;
        let nonce = SecretBoxNonce::from_hex(nonce_hex)?;
        let ciphertext = hex::decode(ct_hex)?;
        Ok(Self { nonce, ciphertext })
    }
}

impl Serialize for EncryptedField {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EncryptedField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Encrypt a text field to its combined `<nonce>:<ciphertext>` string.
pub fn encrypt_field(plaintext: &str, key: &SecretBoxKey) -> Result<String> {
    Ok(EncryptedField::seal(plaintext.as_bytes(), key)?.to_string())
}

/// Decrypt a combined `<nonce>:<ciphertext>` string back to text.
pub fn decrypt_field(combined: &str, key: &SecretBoxKey) -> Result<String> {
    let field: EncryptedField = combined.parse()?;
    field.open_string(key)
}
