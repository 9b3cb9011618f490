use std::sync::Arc;

use eyre::Result;
use gavel_core::{
    feed::{AuctionFeed, FeedPhase},
    metadata::IpfsResolver,
    reader::RpcChainReader,
};
use tracing::info;

use crate::{commands::status::SnapshotArgs, provider};

/// Follow one auction: print each published snapshot plus countdown ticks
/// until the deadline passes or the build fails.
pub async fn watch(rpc_url: &str, args: SnapshotArgs) -> Result<()> {
    let provider = provider::connect(rpc_url).await?;
    let reader = Arc::new(RpcChainReader::new(provider, args.registry));
    let resolver = Arc::new(IpfsResolver::new(args.gateway));

    let mut feed = AuctionFeed::new(reader, resolver);
    feed.set_proposal(Some(args.proposal));

    let mut rx = feed.subscribe();
    loop {
        let state = rx.borrow_and_update().clone();
        match state.phase {
            FeedPhase::Idle => {}
            FeedPhase::Loading => info!(proposal = %args.proposal, "building snapshot"),
            FeedPhase::Failed => {
                eprintln!("error: {}", state.error.as_deref().unwrap_or("unknown"));
                break;
            }
            FeedPhase::Ready => {
                if let Some(snapshot) = state.snapshot.as_ref() {
                    println!(
                        "{} | {} ETH | {} bids | {}",
                        snapshot.metadata.name,
                        snapshot.formatted_price(),
                        snapshot.live.bid_history.len(),
                        snapshot.time_left,
                    );
                    if snapshot.is_finished {
                        break;
                    }
                }
            }
        }
        rx.changed().await?;
    }

    Ok(())
}
