use std::fmt;

use alloy::primitives::{Address, U256};

/// Identifier of a proposal in the marketplace registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProposalId(U256);

impl ProposalId {
    pub fn new(value: U256) -> Self {
        Self(value)
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }
}

impl From<u64> for ProposalId {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One registry row, mapped from the on-chain tuple exactly once at the
/// chain reader boundary. Read-only to this system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalRecord {
    pub id: ProposalId,
    pub proposer: Address,
    pub metadata_uri: String,
    pub starting_bid: U256,
    pub min_increment: U256,
    pub approved: bool,
    /// Zero until the auction contract is instantiated.
    pub live_auction: Address,
}

impl ProposalRecord {
    /// The zero address is the documented "no live auction yet" sentinel,
    /// not an error.
    pub fn has_live_auction(&self) -> bool {
        self.live_auction != Address::ZERO
    }
}
