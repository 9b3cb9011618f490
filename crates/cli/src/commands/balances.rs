use std::sync::Arc;

use alloy::primitives::Address;
use eyre::Result;
use gavel_core::{
    feed::{RpcBalanceReader, WalletFeed, resolve_token_address},
    types::WalletBalances,
};

use crate::provider;

/// Wallet balances for one account; the token contract is picked by the
/// network the RPC URL points at.
pub async fn balances(
    rpc_url: &str,
    account: Address,
    local_token: Option<Address>,
) -> Result<WalletBalances> {
    let provider = provider::connect(rpc_url).await?;
    let token = resolve_token_address(provider::rpc_host(rpc_url), local_token);

    let reader = Arc::new(RpcBalanceReader::new(provider));
    let mut feed = WalletFeed::new(reader, token);
    feed.set_account(Some(account));

    let mut rx = feed.subscribe();
    let state = rx.wait_for(|balances| !balances.is_loading).await?.clone();

    Ok(state)
}
