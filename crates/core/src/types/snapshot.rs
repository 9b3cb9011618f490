use alloy::primitives::{U256, utils::format_ether};

use super::{
    live::{LiveAuctionState, LiveStateHealth},
    metadata::AuctionMetadata,
    proposal::ProposalRecord,
};

/// Point-in-time merged view of one auction: registry row + resolved
/// metadata + live contract state + derived display fields. Replaced
/// wholesale on every rebuild; never mutated field-by-field by consumers.
#[derive(Debug, Clone)]
pub struct AuctionSnapshot {
    pub proposal: ProposalRecord,
    pub metadata: AuctionMetadata,
    pub live: LiveAuctionState,
    pub health: LiveStateHealth,
    pub time_left: String,
    pub is_finished: bool,
}

impl AuctionSnapshot {
    /// The highest bid once one exists, the listed starting bid before that.
    pub fn display_price(&self) -> U256 {
        if self.live.highest_bid > U256::ZERO {
            self.live.highest_bid
        } else {
            self.proposal.starting_bid
        }
    }

    pub fn formatted_price(&self) -> String {
        format_ether(self.display_price())
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{Address, U256};

    use super::*;
    use crate::types::ProposalId;

    fn snapshot(starting_bid: u64, highest_bid: u64) -> AuctionSnapshot {
        AuctionSnapshot {
            proposal: ProposalRecord {
                id: ProposalId::from(1),
                proposer: Address::repeat_byte(0x11),
                metadata_uri: String::new(),
                starting_bid: U256::from(starting_bid),
                min_increment: U256::ZERO,
                approved: true,
                live_auction: Address::ZERO,
            },
            metadata: AuctionMetadata::default(),
            live: LiveAuctionState {
                highest_bid: U256::from(highest_bid),
                ..LiveAuctionState::default()
            },
            health: LiveStateHealth::Fresh,
            time_left: String::new(),
            is_finished: false,
        }
    }

    #[test]
    fn display_price_prefers_highest_bid_when_positive() {
        // Property over a spread of values: highest bid wins iff > 0.
        for (starting, highest) in [(10, 0), (10, 1), (0, 0), (0, 7), (5, 5), (1_000, 999)] {
            let snap = snapshot(starting, highest);
            let expected = if highest > 0 { highest } else { starting };
            assert_eq!(snap.display_price(), U256::from(expected));
        }
    }

    #[test]
    fn formatted_price_renders_ether() {
        let mut snap = snapshot(0, 0);
        snap.live.highest_bid = U256::from(10u64).pow(U256::from(18u64));
        assert_eq!(snap.formatted_price(), "1.000000000000000000");
    }
}
