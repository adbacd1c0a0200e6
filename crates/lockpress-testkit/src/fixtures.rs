//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: a deterministic fake wallet and
//! a fully in-memory platform (directory + ledger + vaults).

use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha512};

use lockpress::{Publisher, PublisherConfig};
use lockpress_core::Address;
use lockpress_keys::{KeyError, WalletSignature, WalletSigner};
use lockpress_resolver::{
    MemoryDirectory, MemoryLedger, Principal, ResolverConfig, Sponsor,
};
use lockpress_vault::MemoryVault;

/// A deterministic fake wallet.
///
/// Signatures are 65 bytes of SHA-512(seed ‖ message) plus a recovery byte:
/// byte-identical for identical input, like a deterministic-signing wallet.
/// Nothing ever verifies these; the derivation pipeline only consumes bytes.
pub struct TestWallet {
    /// The wallet's address.
    pub address: Address,
    seed: [u8; 32],
    refuse: std::sync::atomic::AtomicBool,
}

impl TestWallet {
    /// Create a wallet for an address, seeded from the address itself.
    pub fn new(address: &str) -> Self {
        let address = Address::new(address).expect("fixture address");
        let mut seed = [0u8; 32];
        let digest = Sha512::digest(address.canonical().as_bytes());
        seed.copy_from_slice(&digest[..32]);
        Self {
            address,
            seed,
            refuse: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Make every subsequent sign call fail, simulating a user rejection.
    pub fn refuse_signing(&self) {
        self.refuse.store(true, std::sync::atomic::Ordering::SeqCst);
    }
}

#[async_trait]
impl WalletSigner for TestWallet {
    async fn sign(
        &self,
        _address: &Address,
        message: &[u8],
    ) -> lockpress_keys::Result<WalletSignature> {
        if self.refuse.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(KeyError::Signer("user rejected the request".into()));
        }

        let mut hasher = Sha512::new();
        hasher.update(self.seed);
        hasher.update(message);
        let digest = hasher.finalize();

        let mut bytes = [0u8; 65];
        bytes[..64].copy_from_slice(&digest);
        bytes[64] = 27;
        Ok(WalletSignature::from_bytes(bytes))
    }
}

/// A fully in-memory platform: directory, ledger, and per-user vaults.
pub struct TestPlatform {
    pub domain: String,
    pub directory: Arc<MemoryDirectory>,
    pub ledger: Arc<MemoryLedger>,
    /// Moderator addresses applied to every publisher built from this platform.
    pub big_brothers: Vec<Address>,
    /// Processor address applied to every publisher built from this platform.
    pub processor_address: Option<Address>,
}

impl TestPlatform {
    /// Create an empty platform for a domain.
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            directory: Arc::new(MemoryDirectory::new()),
            ledger: Arc::new(MemoryLedger::new()),
            big_brothers: Vec::new(),
            processor_address: None,
        }
    }

    /// A deterministic wallet for an address.
    pub fn wallet(&self, address: &str) -> Arc<TestWallet> {
        Arc::new(TestWallet::new(address))
    }

    /// Record a sponsorship of `creator` by `sponsor`.
    pub fn add_sponsor(&self, creator: &Address, sponsor: &Address, amount: u64, weeks: u32) {
        self.ledger.add_sponsor(
            &self.domain,
            creator,
            Sponsor {
                address: sponsor.clone(),
                amount,
                weeks,
                banned: false,
            },
        );
    }

    /// The resolver configuration this platform implies.
    pub fn resolver_config(&self) -> ResolverConfig {
        let mut config = ResolverConfig::for_domain(self.domain.clone());
        config.big_brothers = self.big_brothers.clone();
        config.processor_address = self.processor_address.clone();
        config
    }

    /// Build a publisher (with its own fresh vault) for a wallet.
    pub fn publisher_for(&self, wallet: &Arc<TestWallet>) -> Publisher<MemoryVault> {
        self.publisher_with_vault(wallet, Arc::new(MemoryVault::new()))
    }

    /// Build a publisher over an existing vault.
    pub fn publisher_with_vault(
        &self,
        wallet: &Arc<TestWallet>,
        vault: Arc<MemoryVault>,
    ) -> Publisher<MemoryVault> {
        Publisher::new(
            Principal::individual(wallet.address.clone()),
            Arc::clone(wallet) as Arc<dyn WalletSigner>,
            Arc::clone(&self.directory) as _,
            Arc::clone(&self.ledger) as _,
            vault,
            PublisherConfig::new(self.resolver_config()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wallet_is_deterministic() {
        let wallet = TestWallet::new("0xAA");
        let addr = wallet.address.clone();

        let s1 = wallet.sign(&addr, b"message").await.unwrap();
        let s2 = wallet.sign(&addr, b"message").await.unwrap();
        assert_eq!(s1, s2);

        let s3 = wallet.sign(&addr, b"other").await.unwrap();
        assert_ne!(s1, s3);
    }

    #[tokio::test]
    async fn test_wallet_refusal() {
        let wallet = TestWallet::new("0xAA");
        wallet.refuse_signing();

        let err = wallet
            .sign(&wallet.address, b"message")
            .await
            .unwrap_err();
        assert!(matches!(err, KeyError::Signer(_)));
    }

    #[tokio::test]
    async fn test_distinct_wallets_differ() {
        let a = TestWallet::new("0xAA");
        let b = TestWallet::new("0xBB");

        let sa = a.sign(&a.address, b"m").await.unwrap();
        let sb = b.sign(&b.address, b"m").await.unwrap();
        assert_ne!(sa, sb);
    }
}
