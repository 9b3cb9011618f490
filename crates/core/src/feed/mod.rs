pub mod auction;
pub mod state;
pub mod wallet;

pub use auction::AuctionFeed;
pub use state::{FeedPhase, FeedState};
pub use wallet::{
    BALANCES_ERROR, BalanceReader, DEPLOYED_TOKEN, RpcBalanceReader, WalletFeed,
    resolve_token_address,
};
