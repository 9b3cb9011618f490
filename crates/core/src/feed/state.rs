use crate::types::AuctionSnapshot;

/// Lifecycle of an auction subscription.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeedPhase {
    /// No proposal selected, or no chain reader attached yet.
    #[default]
    Idle,
    /// A snapshot build is in flight. A previous snapshot may still be
    /// published alongside during a refetch.
    Loading,
    /// The mandatory registry read completed and a snapshot is published.
    Ready,
    /// The mandatory registry read failed; no snapshot is available.
    Failed,
}

/// Published subscription state, replaced atomically on every transition.
#[derive(Debug, Clone, Default)]
pub struct FeedState {
    pub phase: FeedPhase,
    pub snapshot: Option<AuctionSnapshot>,
    pub error: Option<String>,
}

impl FeedState {
    pub fn is_loading(&self) -> bool {
        self.phase == FeedPhase::Loading
    }
}
