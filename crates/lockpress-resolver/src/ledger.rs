//! Subscription ledger boundary.
//!
//! The ledger answers one question: who sponsors an address on a domain, at
//! what weekly amount, for how many remaining weeks, and whether they are
//! banned.

use async_trait::async_trait;

use lockpress_core::Address;

use crate::error::LedgerError;

/// One sponsor of an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sponsor {
    /// The sponsoring address.
    pub address: Address,

    /// Weekly sponsorship amount, in the platform's smallest unit.
    pub amount: u64,

    /// Remaining paid weeks. Zero means the sponsorship has lapsed.
    pub weeks: u32,

    /// Banned sponsors never receive keys.
    pub banned: bool,
}

impl Sponsor {
    /// Whether this sponsor clears a post's weekly-pay floor.
    pub fn is_eligible(&self, min_weekly_pay: u64) -> bool {
        self.weeks > 0 && self.amount >= min_weekly_pay && !self.banned
    }
}

/// The external subscription ledger.
#[async_trait]
pub trait SubscriptionLedger: Send + Sync {
    /// All sponsors of `address` on `domain`.
    async fn sponsors_of(
        &self,
        domain: &str,
        address: &Address,
    ) -> Result<Vec<Sponsor>, LedgerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sponsor(amount: u64, weeks: u32, banned: bool) -> Sponsor {
        Sponsor {
            address: Address::new("0xaa").unwrap(),
            amount,
            weeks,
            banned,
        }
    }

    #[test]
    fn test_eligibility_gate() {
        assert!(sponsor(2000, 3, false).is_eligible(1000));
        assert!(!sponsor(500, 2, false).is_eligible(1000)); // below floor
        assert!(!sponsor(2000, 0, false).is_eligible(1000)); // lapsed
        assert!(!sponsor(2000, 3, true).is_eligible(1000)); // banned
        assert!(sponsor(1000, 1, false).is_eligible(1000)); // floor inclusive
    }
}
