//! Canonical encoding for the wallet-signable message.
//!
//! The wallet signs `{context, scheme, nonce}`. Since the signature bytes are
//! the key material for derivation, the message must serialize identically
//! across runs and platforms for a given nonce. We use RFC 8949 Core
//! Deterministic Encoding: integer map keys in sorted order, smallest valid
//! integer encoding, definite lengths only.

use ciborium::value::Value;

use lockpress_core::{GenerationNonce, KeyScheme};

/// Domain context embedded in every signable message.
pub const SIGNING_CONTEXT: &str = "lockpress reading key v1";

/// Message field keys (integer keys for compact encoding).
///
/// Keys 0-23 encode as single bytes in CBOR.
mod keys {
    pub const CONTEXT: u64 = 0;
    pub const SCHEME: u64 = 1;
    pub const NONCE: u64 = 2;
}

/// The structured message a wallet signs to derive a reading key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignableMessage {
    scheme: KeyScheme,
    nonce: GenerationNonce,
}

impl SignableMessage {
    /// Build the message for a scheme and generation nonce.
    pub fn new(scheme: KeyScheme, nonce: GenerationNonce) -> Self {
        Self { scheme, nonce }
    }

    /// The scheme field.
    pub fn scheme(&self) -> KeyScheme {
        self.scheme
    }

    /// The nonce field.
    pub fn nonce(&self) -> &GenerationNonce {
        &self.nonce
    }

    /// Convert to a CBOR Value (map with integer keys, already sorted).
    fn to_cbor_value(&self) -> Value {
        Value::Map(vec![
            (
                Value::Integer(keys::CONTEXT.into()),
                Value::Text(SIGNING_CONTEXT.into()),
            ),
            (
                Value::Integer(keys::SCHEME.into()),
                Value::Text(self.scheme.as_str().into()),
            ),
            (
                Value::Integer(keys::NONCE.into()),
                Value::Text(self.nonce.as_str().into()),
            ),
        ])
    }

    /// Encode to canonical CBOR bytes.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(
            SIGNING_CONTEXT.len() + self.scheme.as_str().len() + self.nonce.as_str().len() + 16,
        );
        encode_value_to(&mut buf, &self.to_cbor_value());
        buf
    }
}

/// Recursively encode a CBOR value with deterministic rules.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(i) => {
            let n: i128 = (*i).into();
            // Only non-negative keys occur in signable messages
            encode_uint(buf, 0, n as u64);
        }
        Value::Text(s) => {
            encode_uint(buf, 3, s.len() as u64);
            buf.extend_from_slice(s.as_bytes());
        }
        Value::Map(entries) => {
            encode_uint(buf, 5, entries.len() as u64);
            for (key, val) in entries {
                encode_value_to(buf, key);
                encode_value_to(buf, val);
            }
        }
        _ => unreachable!("signable messages contain only integers, text, and maps"),
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffffffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}
