use std::sync::Arc;

use alloy::primitives::Address;
use eyre::Result;
use gavel_core::{
    feed::{AuctionFeed, FeedPhase, FeedState},
    metadata::IpfsResolver,
    reader::RpcChainReader,
    types::ProposalId,
};

use crate::provider;

pub struct SnapshotArgs {
    pub registry: Address,
    pub proposal: ProposalId,
    pub gateway: Option<String>,
}

/// One-shot snapshot: build the feed and wait for the first terminal phase.
pub async fn status(rpc_url: &str, args: SnapshotArgs) -> Result<FeedState> {
    // 1. Provider and collaborators
    let provider = provider::connect(rpc_url).await?;
    let reader = Arc::new(RpcChainReader::new(provider, args.registry));
    let resolver = Arc::new(IpfsResolver::new(args.gateway));

    // 2. Select the proposal; this kicks off the build
    let mut feed = AuctionFeed::new(reader, resolver);
    feed.set_proposal(Some(args.proposal));

    // 3. First terminal phase wins
    let mut rx = feed.subscribe();
    let state = rx
        .wait_for(|state| matches!(state.phase, FeedPhase::Ready | FeedPhase::Failed))
        .await?
        .clone();

    Ok(state)
}
