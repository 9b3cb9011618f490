use alloy::primitives::{Address, U256};

/// One decoded `Bid` event, in the order the log stream emitted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBidEntry {
    pub bidder: Address,
    pub amount: U256,
    pub block_number: u64,
    pub log_index: u64,
}

/// A placed bid. A bidder appears once per bid placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bid {
    pub bidder: Address,
    pub amount: U256,
}

/// State read from the per-auction contract. Defaults apply while no live
/// auction exists or after a degraded batch read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveAuctionState {
    pub highest_bid: U256,
    /// Zero address while no bid has been placed.
    pub highest_bidder: Address,
    pub end_time: u64,
    pub bid_history: Vec<Bid>,
}

/// Whether the live portion of a snapshot comes from a fresh batch read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LiveStateHealth {
    #[default]
    Fresh,
    /// The batch failed; values are carried over from the previous snapshot
    /// or defaulted.
    Degraded,
}
