use alloy::sol;

sol! {
    /// Per-auction contract tracking the current highest bid and deadline.
    #[sol(rpc)]
    interface ILiveAuction {
        event Bid(address indexed bidder, uint256 amount);

        function highestBid() external view returns (uint256);
        function highestBidder() external view returns (address);
        function endTime() external view returns (uint256);
    }
}
