pub mod bids;
pub mod countdown;
pub mod error;
pub mod feed;
pub mod metadata;
pub mod reader;
pub mod types;

pub use error::*;
pub use feed::*;
pub use metadata::*;
pub use reader::*;
pub use types::*;
