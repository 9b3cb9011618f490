pub mod live;
pub mod metadata;
pub mod proposal;
pub mod snapshot;
pub mod wallet;

pub use live::*;
pub use metadata::*;
pub use proposal::*;
pub use snapshot::*;
pub use wallet::*;
