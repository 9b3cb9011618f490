use alloy::sol;

sol! {
    /// Marketplace directory mapping proposal ids to auction listings.
    ///
    /// `proposals` returns a fixed-position tuple; downstream code relies on
    /// slot 1 (metadata URI), slot 2 (starting bid) and slot 5 (live auction
    /// address, zero until the auction is instantiated).
    #[sol(rpc)]
    interface IAuctionRegistry {
        function proposals(uint256 id)
            external
            view
            returns (
                address proposer,
                string memory metadataUri,
                uint256 startingBid,
                uint256 minIncrement,
                bool approved,
                address liveAuction
            );

        function proposalCount() external view returns (uint256);
    }
}
