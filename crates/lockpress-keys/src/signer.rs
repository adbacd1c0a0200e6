//! Wallet signer boundary.
//!
//! The wallet is external: user-interactive, unbounded latency, no
//! programmatic cancel. Callers apply their own timeout or UX fallback.

use std::fmt;

use async_trait::async_trait;

use lockpress_core::Address;

use crate::error::{KeyError, Result};

/// Byte length of a recoverable wallet signature (r ‖ s ‖ recovery id).
pub const SIGNATURE_LEN: usize = 65;

/// A 65-byte recoverable signature as produced by the wallet.
///
/// Lockpress never verifies these; the signature bytes are key material for
/// the derivation pipeline, nothing more.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct WalletSignature([u8; SIGNATURE_LEN]);

impl WalletSignature {
    /// Create from raw bytes, validating the length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let got = bytes.len();
        let arr: [u8; SIGNATURE_LEN] =
            bytes
                .try_into()
                .map_err(|_| KeyError::InvalidSignatureLength {
                    expected: SIGNATURE_LEN,
                    got,
                })?;
        Ok(Self(arr))
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    /// The 64-byte `r ‖ s` half, with the recovery byte stripped.
    pub fn r_s(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out.copy_from_slice(&self.0[..64]);
        out
    }
}

impl fmt::Debug for WalletSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WalletSignature({}...)", &hex::encode(&self.0[..8]))
    }
}

/// The external wallet signer.
///
/// Implementations must be thread-safe (Send + Sync). The sign call suspends
/// for as long as the user takes to approve it.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Sign a structured message with the key behind `address`.
    ///
    /// Must return exactly 65 bytes; anything else is rejected by the caller
    /// before any derivation happens.
    async fn sign(&self, address: &Address, message: &[u8]) -> Result<WalletSignature>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_length_validation() {
        assert!(WalletSignature::from_slice(&[0u8; 65]).is_ok());

        let err = WalletSignature::from_slice(&[0u8; 64]).unwrap_err();
        assert!(matches!(
            err,
            KeyError::InvalidSignatureLength {
                expected: 65,
                got: 64
            }
        ));
    }

    #[test]
    fn test_r_s_strips_recovery_byte() {
        let mut bytes = [0xaau8; 65];
        bytes[64] = 0x1b;
        let sig = WalletSignature::from_bytes(bytes);

        let rs = sig.r_s();
        assert_eq!(rs.len(), 64);
        assert!(rs.iter().all(|&b| b == 0xaa));
    }
}
