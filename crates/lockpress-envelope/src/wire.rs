//! The persisted envelope wire format.
//!
//! Field names are stable: they are what lands in the post descriptor and
//! what every reader implementation parses. Addresses key the recipients map
//! in lowercased form; the first occurrence of an address wins.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use lockpress_core::{
    Address, Audience, GenerationNonce, KeyScheme, X25519PublicKey, X25519SecretKey,
};

use crate::error::{EnvelopeError, Result};
use crate::wrap::{unwrap_post_key, WrappedPostKey};

/// Wire identifier of the envelope construction.
pub const ENVELOPE_TYPE: &str = "x25519-xsalsa20-poly1305";

/// Wire identifier of the key-exchange algorithm.
pub const KEY_EXCHANGE_ALG: &str = "x25519";

/// One recipient's independently decryptable copy of the post key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedKeyEntry {
    /// The wrapped post secret key, hex.
    pub pass: String,

    /// Nonce used for the wrap, hex.
    pub pass_nonce: String,

    /// Ephemeral X25519 public key used for the wrap, hex.
    pub pass_ephemeral_pub_key: String,

    /// The recipient reading public key this entry was wrapped for, hex.
    pub reading_public_key: String,

    /// Scheme of the recipient's reading key.
    pub reading_key_scheme: KeyScheme,

    /// Generation nonce of the recipient's reading key. Readers use this to
    /// locate (or re-derive) the matching secret.
    pub reading_key_nonce: GenerationNonce,
}

impl WrappedKeyEntry {
    /// Build a wire entry from a wrap result and the recipient's key metadata.
    pub fn new(
        wrapped: &WrappedPostKey,
        reading_public_key: &X25519PublicKey,
        reading_key_scheme: KeyScheme,
        reading_key_nonce: GenerationNonce,
    ) -> Self {
        Self {
            pass: hex::encode(&wrapped.ciphertext),
            pass_nonce: wrapped.nonce.to_hex(),
            pass_ephemeral_pub_key: wrapped.ephemeral_public.to_hex(),
            reading_public_key: reading_public_key.to_hex(),
            reading_key_scheme,
            reading_key_nonce,
        }
    }

    /// Parse the wire hex back into a typed wrapped key.
    pub fn wrapped(&self) -> Result<WrappedPostKey> {
        Ok(WrappedPostKey {
            ciphertext: hex::decode(&self.pass)?,
            nonce: lockpress_core::SecretBoxNonce::from_hex(&self.pass_nonce)?,
            ephemeral_public: X25519PublicKey::from_hex(&self.pass_ephemeral_pub_key)?,
        })
    }

    /// The reading public key this entry was wrapped for.
    pub fn reading_public_key(&self) -> Result<X25519PublicKey> {
        Ok(X25519PublicKey::from_hex(&self.reading_public_key)?)
    }

    /// Unwrap the post secret with the recipient's reading secret key.
    pub fn unwrap_with(&self, reading_secret: &X25519SecretKey) -> Result<X25519SecretKey> {
        unwrap_post_key(&self.wrapped()?, reading_secret)
    }
}

/// The encryption envelope persisted in the post descriptor.
///
/// Holds the post public key, access-policy metadata, and one wrapped key per
/// recipient. Policy fields are metadata, not cryptographic material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncryptionEnvelope {
    /// Envelope construction identifier; always [`ENVELOPE_TYPE`].
    #[serde(rename = "type")]
    pub kind: String,

    /// Key-exchange algorithm; always [`KEY_EXCHANGE_ALG`].
    pub key_exchange_alg: String,

    /// The post public key, hex.
    pub key_exchange_pub_key: String,

    /// Who this post is gated to.
    pub access_type: Audience,

    /// Minimum weekly sponsorship for eligibility.
    pub min_weekly_pay: u64,

    /// Whether one-time purchase access is enabled.
    pub allow_purchase: bool,

    /// One-time purchase price, if purchase access is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<u64>,

    /// Payment-processor address, if purchase access is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processor_address: Option<String>,

    /// Token the purchase is denominated in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_token: Option<String>,

    /// Wrapped post key per recipient, keyed by lowercased address.
    pub recipients: BTreeMap<String, WrappedKeyEntry>,
}

impl EncryptionEnvelope {
    /// Start an envelope for a post public key with the given policy metadata.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        post_public_key: &X25519PublicKey,
        access_type: Audience,
        min_weekly_pay: u64,
        allow_purchase: bool,
        purchase_price: Option<u64>,
        processor_address: Option<String>,
        purchase_token: Option<String>,
    ) -> Self {
        Self {
            kind: ENVELOPE_TYPE.into(),
            key_exchange_alg: KEY_EXCHANGE_ALG.into(),
            key_exchange_pub_key: post_public_key.to_hex(),
            access_type,
            min_weekly_pay,
            allow_purchase,
            purchase_price,
            processor_address,
            purchase_token,
            recipients: BTreeMap::new(),
        }
    }

    /// The post public key.
    pub fn post_public_key(&self) -> Result<X25519PublicKey> {
        Ok(X25519PublicKey::from_hex(&self.key_exchange_pub_key)?)
    }

    /// Insert a recipient's wrapped key. First occurrence of an address wins;
    /// a duplicate (case-insensitive) is ignored and reported as `false`.
    pub fn insert_recipient(&mut self, address: &Address, entry: WrappedKeyEntry) -> bool {
        let key = address.canonical();
        if self.recipients.contains_key(&key) {
            return false;
        }
        self.recipients.insert(key, entry);
        true
    }

    /// Look up the wrapped entry for an address, case-insensitively.
    pub fn entry_for(&self, address: &Address) -> Option<&WrappedKeyEntry> {
        self.recipients.get(&address.canonical())
    }

    /// Whether an address has a wrapped entry.
    pub fn contains(&self, address: &Address) -> bool {
        self.entry_for(address).is_some()
    }

    /// The recipient address set, as stored (lowercased).
    ///
    /// Comments on a gated post inherit exactly this set.
    pub fn recipient_addresses(&self) -> Vec<Address> {
        self.recipients
            .keys()
            .filter_map(|k| Address::new(k.clone()).ok())
            .collect()
    }

    /// Number of recipients.
    pub fn recipient_count(&self) -> usize {
        self.recipients.len()
    }

    /// Structural sanity check on a parsed envelope.
    pub fn validate(&self) -> Result<()> {
        if self.kind != ENVELOPE_TYPE {
            return Err(EnvelopeError::Malformed(format!(
                "unsupported envelope type: {}",
                self.kind
            )));
        }
        if self.key_exchange_alg != KEY_EXCHANGE_ALG {
            return Err(EnvelopeError::Malformed(format!(
                "unsupported key exchange: {}",
                self.key_exchange_alg
            )));
        }
        self.post_public_key()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wrap::{generate_post_key, wrap_post_key_for};
    use lockpress_core::X25519Keypair;

    fn wire_entry(recipient: &X25519Keypair, post_secret: &X25519SecretKey) -> WrappedKeyEntry {
        let wrapped = wrap_post_key_for(&recipient.public, post_secret).unwrap();
        WrappedKeyEntry::new(
            &wrapped,
            &recipient.public,
            KeyScheme::default(),
            GenerationNonce::generate(),
        )
    }

    fn test_envelope(post_public: &X25519PublicKey) -> EncryptionEnvelope {
        EncryptionEnvelope::new(post_public, Audience::Subscribers, 1000, false, None, None, None)
    }

    #[test]
    fn test_entry_wire_roundtrip() {
        let recipient = X25519Keypair::generate();
        let post_key = generate_post_key();

        let entry = wire_entry(&recipient, &post_key.secret);
        let unwrapped = entry.unwrap_with(&recipient.secret).unwrap();

        assert_eq!(unwrapped.to_bytes(), post_key.secret.to_bytes());
    }

    #[test]
    fn test_envelope_json_field_names() {
        let post_key = generate_post_key();
        let recipient = X25519Keypair::generate();

        let mut envelope = test_envelope(&post_key.public);
        envelope.insert_recipient(
            &Address::new("0xAbCd").unwrap(),
            wire_entry(&recipient, &post_key.secret),
        );

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["type"], ENVELOPE_TYPE);
        assert_eq!(json["key_exchange_alg"], "x25519");
        assert_eq!(json["access_type"], "subscribers");

        let entry = &json["recipients"]["0xabcd"];
        for field in [
            "pass",
            "pass_nonce",
            "pass_ephemeral_pub_key",
            "reading_public_key",
            "reading_key_scheme",
            "reading_key_nonce",
        ] {
            assert!(entry.get(field).is_some(), "missing field {field}");
        }
    }

    #[test]
    fn test_envelope_serde_roundtrip() {
        let post_key = generate_post_key();
        let recipient = X25519Keypair::generate();

        let mut envelope = test_envelope(&post_key.public);
        envelope.insert_recipient(
            &Address::new("0xaa01").unwrap(),
            wire_entry(&recipient, &post_key.secret),
        );

        let json = serde_json::to_string(&envelope).unwrap();
        let parsed: EncryptionEnvelope = serde_json::from_str(&json).unwrap();

        assert_eq!(envelope, parsed);
        parsed.validate().unwrap();
    }

    #[test]
    fn test_duplicate_recipient_first_wins() {
        let post_key = generate_post_key();
        let first = X25519Keypair::generate();
        let second = X25519Keypair::generate();

        let mut envelope = test_envelope(&post_key.public);
        let first_entry = wire_entry(&first, &post_key.secret);

        assert!(envelope.insert_recipient(&Address::new("0xAAAA").unwrap(), first_entry.clone()));
        assert!(!envelope.insert_recipient(
            &Address::new("0xaaaa").unwrap(),
            wire_entry(&second, &post_key.secret)
        ));

        assert_eq!(envelope.recipient_count(), 1);
        assert_eq!(
            envelope.entry_for(&Address::new("0xAaAa").unwrap()),
            Some(&first_entry)
        );
    }

    #[test]
    fn test_entry_lookup_case_insensitive() {
        let post_key = generate_post_key();
        let recipient = X25519Keypair::generate();

        let mut envelope = test_envelope(&post_key.public);
        envelope.insert_recipient(
            &Address::new("0xDeadBeef").unwrap(),
            wire_entry(&recipient, &post_key.secret),
        );

        assert!(envelope.contains(&Address::new("0xdeadbeef").unwrap()));
        assert!(envelope.contains(&Address::new("0xDEADBEEF").unwrap()));
        assert!(!envelope.contains(&Address::new("0xffff").unwrap()));
    }

    #[test]
    fn test_validate_rejects_foreign_type() {
        let post_key = generate_post_key();
        let mut envelope = test_envelope(&post_key.public);
        envelope.kind = "rsa-oaep".into();

        assert!(matches!(
            envelope.validate(),
            Err(EnvelopeError::Malformed(_))
        ));
    }
}
