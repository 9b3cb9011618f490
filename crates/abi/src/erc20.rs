use alloy::sol;

sol! {
    /// Minimal ERC20 surface used for wallet token balances.
    #[sol(rpc)]
    interface IERC20Minimal {
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
    }
}
