//! Strong type definitions for the Lockpress reading-key infrastructure.
//!
//! Identifiers are newtypes to prevent misuse at compile time. Addresses are
//! compared case-insensitively everywhere; the original casing is preserved
//! for display.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use rand::{rngs::OsRng, RngCore};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::crypto::{X25519PublicKey, X25519SecretKey};
use crate::error::{CoreError, Result};

/// A wallet address.
///
/// Equality, hashing, and deduplication are case-insensitive; `as_str`
/// preserves the casing the address arrived with.
#[derive(Clone)]
pub struct Address(String);

impl Address {
    /// Create a new address, rejecting empty or whitespace-containing input.
    pub fn new(address: impl Into<String>) -> Result<Self> {
        let address = address.into();
        if address.is_empty() {
            return Err(CoreError::InvalidAddress("empty".into()));
        }
        if address.chars().any(char::is_whitespace) {
            return Err(CoreError::InvalidAddress(address));
        }
        Ok(Self(address))
    }

    /// The address as it arrived.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The canonical (lowercased) form used for comparison and map keys.
    pub fn canonical(&self) -> String {
        self.0.to_lowercase()
    }

    /// Case-insensitive comparison against a raw string.
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(de::Error::custom)
    }
}

/// Byte length of a generation nonce.
pub const GENERATION_NONCE_LEN: usize = 10;

/// A reading-key generation nonce: 10 random bytes as 20 lowercase hex chars.
///
/// Mixed into key derivation for domain separation and rotation tracking.
/// Distinct from the per-encryption AEAD nonce.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct GenerationNonce(String);

impl GenerationNonce {
    /// Generate a fresh random nonce.
    pub fn generate() -> Self {
        let mut bytes = [0u8; GENERATION_NONCE_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Validate an existing nonce string. Uppercase hex is normalized.
    pub fn new(nonce: impl Into<String>) -> Result<Self> {
        let nonce = nonce.into().to_lowercase();
        if nonce.len() != GENERATION_NONCE_LEN * 2 {
            return Err(CoreError::InvalidGenerationNonce(nonce));
        }
        if hex::decode(&nonce).is_err() {
            return Err(CoreError::InvalidGenerationNonce(nonce));
        }
        Ok(Self(nonce))
    }

    /// The hex form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for GenerationNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GenerationNonce({})", self.0)
    }
}

impl fmt::Display for GenerationNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for GenerationNonce {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for GenerationNonce {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(de::Error::custom)
    }
}

/// Identifier of the key scheme a reading key was generated under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyScheme {
    /// NaCl box: X25519 key agreement + XSalsa20-Poly1305 AEAD.
    #[serde(rename = "x25519-xsalsa20-poly1305")]
    X25519XSalsa20Poly1305,
}

impl KeyScheme {
    /// The wire identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyScheme::X25519XSalsa20Poly1305 => "x25519-xsalsa20-poly1305",
        }
    }
}

impl Default for KeyScheme {
    fn default() -> Self {
        KeyScheme::X25519XSalsa20Poly1305
    }
}

impl fmt::Display for KeyScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyScheme {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "x25519-xsalsa20-poly1305" => Ok(KeyScheme::X25519XSalsa20Poly1305),
            other => Err(CoreError::UnknownScheme(other.into())),
        }
    }
}

/// Who a post is readable by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    /// Everyone; no encryption is applied.
    Public,
    /// Paying sponsors above the post's weekly-pay floor.
    Subscribers,
}

/// One reading-key generation for an address.
///
/// Created on first generation or rotation, never mutated afterwards. The
/// public half is the only part that ever leaves the device; the secret half
/// lives in the vault (or is re-derived from a fresh wallet signature).
#[derive(Clone, Serialize, Deserialize)]
pub struct ReadingKeyRecord {
    /// The wallet address this key belongs to.
    pub address: Address,

    /// Generation nonce; unique key per (address, generation).
    pub nonce: GenerationNonce,

    /// The published public half.
    pub public_key: X25519PublicKey,

    /// The local-only secret half.
    pub secret_key: X25519SecretKey,

    /// Scheme the key was generated under.
    pub scheme: KeyScheme,

    /// When the generation was created (Unix ms).
    pub created_at: i64,
}

impl fmt::Debug for ReadingKeyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadingKeyRecord")
            .field("address", &self.address)
            .field("nonce", &self.nonce)
            .field("public_key", &self.public_key)
            .field("scheme", &self.scheme)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_case_insensitive_eq() {
        let a = Address::new("0xAbCd01").unwrap();
        let b = Address::new("0xabcd01").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.canonical(), b.canonical());
        assert_eq!(a.as_str(), "0xAbCd01");
    }

    #[test]
    fn test_address_rejects_empty_and_whitespace() {
        assert!(Address::new("").is_err());
        assert!(Address::new("0x12 34").is_err());
    }

    #[test]
    fn test_generation_nonce_shape() {
        let nonce = GenerationNonce::generate();
        assert_eq!(nonce.as_str().len(), 20);
        assert!(hex::decode(nonce.as_str()).is_ok());
    }

    #[test]
    fn test_generation_nonce_normalizes_case() {
        let nonce = GenerationNonce::new("AABBCCDDEEFF00112233").unwrap();
        assert_eq!(nonce.as_str(), "aabbccddeeff00112233");
    }

    #[test]
    fn test_generation_nonce_rejects_bad_input() {
        assert!(GenerationNonce::new("abcd").is_err());
        assert!(GenerationNonce::new("zzbbccddeeff00112233").is_err());
    }

    #[test]
    fn test_key_scheme_roundtrip() {
        let scheme: KeyScheme = "x25519-xsalsa20-poly1305".parse().unwrap();
        assert_eq!(scheme, KeyScheme::X25519XSalsa20Poly1305);
        assert!("rsa-oaep".parse::<KeyScheme>().is_err());
    }

    #[test]
    fn test_audience_serde() {
        assert_eq!(
            serde_json::to_string(&Audience::Subscribers).unwrap(),
            "\"subscribers\""
        );
        let back: Audience = serde_json::from_str("\"public\"").unwrap();
        assert_eq!(back, Audience::Public);
    }

    #[test]
    fn test_record_debug_hides_secret() {
        let record = ReadingKeyRecord {
            address: Address::new("0xaa").unwrap(),
            nonce: GenerationNonce::generate(),
            public_key: crate::crypto::X25519Keypair::generate().public,
            secret_key: X25519SecretKey::from_bytes([0x77; 32]),
            scheme: KeyScheme::default(),
            created_at: 0,
        };
        let debug = format!("{:?}", record);
        assert!(!debug.contains(&record.secret_key.to_hex()));
    }
}
