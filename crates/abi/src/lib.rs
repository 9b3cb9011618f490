pub mod auction;
pub mod erc20;
pub mod registry;

pub use auction::ILiveAuction;
pub use erc20::IERC20Minimal;
pub use registry::IAuctionRegistry;
