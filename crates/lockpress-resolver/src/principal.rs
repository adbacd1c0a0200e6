//! Acting principal.
//!
//! "Who is acting" and "who signs" are distinct: an author may post as an
//! organization while signing with their own wallet. Both halves are carried
//! explicitly instead of being looked up from ambient state.

use lockpress_core::Address;

/// The identity pair behind a publish or read operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Whose behalf the action is on (e.g. an organization account).
    /// Sponsorships are resolved against this address.
    pub acting_as: Address,

    /// Who signs and therefore who must be able to decrypt.
    pub signer: Address,
}

impl Principal {
    /// Act on behalf of one address, signing with another.
    pub fn new(acting_as: Address, signer: Address) -> Self {
        Self { acting_as, signer }
    }

    /// The common case: acting for oneself.
    pub fn individual(address: Address) -> Self {
        Self {
            acting_as: address.clone(),
            signer: address,
        }
    }

    /// Whether the actor signs for themselves.
    pub fn is_individual(&self) -> bool {
        self.acting_as == self.signer
    }
}
