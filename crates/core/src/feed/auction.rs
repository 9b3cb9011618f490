use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicU64, Ordering},
};

use alloy::primitives::Address;
use futures::{join, try_join};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{
    bids,
    countdown::{self, Countdown},
    error::{LiveStateError, RegistryError},
    feed::state::{FeedPhase, FeedState},
    metadata::MetadataSource,
    reader::{ChainReader, ScalarField},
    types::{
        AuctionMetadata, AuctionSnapshot, LiveAuctionState, LiveStateHealth, ProposalId,
        ProposalRecord,
    },
};

/// State shared between the feed handle, in-flight build tasks and the
/// countdown task.
struct Shared {
    state: watch::Sender<FeedState>,
    generation: AtomicU64,
    countdown: Mutex<Option<Countdown>>,
}

impl Shared {
    /// Apply `update` to the published state unless `generation` has been
    /// superseded by a newer build. Returns whether the update applied.
    fn publish_if_current(&self, generation: u64, update: impl FnOnce(&mut FeedState)) -> bool {
        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) == generation {
                update(state);
                true
            } else {
                false
            }
        })
    }

    fn countdown_slot(&self) -> MutexGuard<'_, Option<Countdown>> {
        self.countdown.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn clear_countdown(&self) {
        *self.countdown_slot() = None;
    }
}

/// Aggregated read model for a single auction.
///
/// One feed owns one subscription: it rebuilds the snapshot wholesale on
/// proposal change or refresh, publishes through a watch channel, and runs
/// a one-second countdown until the deadline passes. Every build carries a
/// generation; results arriving for a superseded generation are discarded,
/// so overlapping refreshes and rapid proposal changes are safe.
pub struct AuctionFeed<R, M> {
    reader: Option<Arc<R>>,
    resolver: Arc<M>,
    proposal: Option<ProposalId>,
    shared: Arc<Shared>,
}

impl<R, M> AuctionFeed<R, M>
where
    R: ChainReader + 'static,
    M: MetadataSource + 'static,
{
    pub fn new(reader: Arc<R>, resolver: Arc<M>) -> Self {
        Self::assemble(Some(reader), resolver)
    }

    /// A feed with no chain access yet (provider still connecting). Stays
    /// `Idle` until a reader is attached.
    pub fn detached(resolver: Arc<M>) -> Self {
        Self::assemble(None, resolver)
    }

    fn assemble(reader: Option<Arc<R>>, resolver: Arc<M>) -> Self {
        let (state, _) = watch::channel(FeedState::default());
        Self {
            reader,
            resolver,
            proposal: None,
            shared: Arc::new(Shared {
                state,
                generation: AtomicU64::new(0),
                countdown: Mutex::new(None),
            }),
        }
    }

    /// Observe published states; receivers see whole-state replacements.
    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.shared.state.subscribe()
    }

    pub fn current(&self) -> FeedState {
        self.shared.state.borrow().clone()
    }

    /// Attach chain access once the provider is up. Triggers a build if a
    /// proposal is already selected.
    pub fn attach_reader(&mut self, reader: Arc<R>) {
        self.reader = Some(reader);
        self.spawn_build(false);
    }

    /// Select the proposal this feed follows; `None` clears the feed.
    pub fn set_proposal(&mut self, proposal: Option<ProposalId>) {
        let changed = self.proposal != proposal;
        self.proposal = proposal;
        self.spawn_build(changed);
    }

    /// Rebuild the snapshot from scratch. Safe to call while a build is in
    /// flight: the superseded build is discarded when it arrives.
    pub fn refresh(&self) {
        self.spawn_build(false);
    }

    fn spawn_build(&self, clear_snapshot: bool) {
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        // Any running countdown belongs to a superseded build.
        self.shared.clear_countdown();

        let (Some(reader), Some(proposal)) = (self.reader.clone(), self.proposal) else {
            // Nothing to fetch: no proposal selected or no chain access
            // yet. Not an error; report not-loading with an empty snapshot.
            self.shared
                .publish_if_current(generation, |state| *state = FeedState::default());
            return;
        };

        // Live values from the current snapshot survive a degraded batch
        // read of the same proposal.
        let prior_live = {
            let state = self.shared.state.borrow();
            state
                .snapshot
                .as_ref()
                .filter(|snapshot| snapshot.proposal.id == proposal)
                .map(|snapshot| snapshot.live.clone())
        };

        self.shared.publish_if_current(generation, |state| {
            state.phase = FeedPhase::Loading;
            state.error = None;
            if clear_snapshot {
                state.snapshot = None;
            }
        });

        let resolver = Arc::clone(&self.resolver);
        let shared = Arc::clone(&self.shared);

        tokio::spawn(async move {
            match build_snapshot(reader.as_ref(), resolver.as_ref(), proposal, prior_live).await {
                Ok(snapshot) => {
                    let end_time = snapshot.live.end_time;
                    let finished = snapshot.is_finished;
                    let applied = shared.publish_if_current(generation, |state| {
                        state.phase = FeedPhase::Ready;
                        state.error = None;
                        state.snapshot = Some(snapshot);
                    });
                    // An already-passed deadline gets no timer.
                    if applied && !finished {
                        start_countdown(&shared, generation, end_time);
                    }
                }
                Err(error) => {
                    debug!(%proposal, %error, "registry read failed, snapshot build aborted");
                    shared.publish_if_current(generation, |state| {
                        state.phase = FeedPhase::Failed;
                        state.snapshot = None;
                        state.error = Some(error.to_string());
                    });
                }
            }
        });
    }
}

impl<R, M> Drop for AuctionFeed<R, M> {
    fn drop(&mut self) {
        // Disposed: in-flight builds see a newer generation and discard
        // themselves; the countdown is aborted outright.
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        self.shared.clear_countdown();
    }
}

async fn build_snapshot<R, M>(
    reader: &R,
    resolver: &M,
    proposal: ProposalId,
    prior_live: Option<LiveAuctionState>,
) -> Result<AuctionSnapshot, RegistryError>
where
    R: ChainReader + ?Sized,
    M: MetadataSource + ?Sized,
{
    // Mandatory read: its failure aborts the whole build.
    let record = reader.registry_entry(proposal).await?;

    // Metadata and live state are independent once the record is known;
    // metadata latency must not gate the live-state path, and neither
    // failure blocks Ready.
    let (metadata, (live, health)) = join!(
        resolve_metadata(resolver, &record),
        read_live_state(reader, &record, prior_live),
    );

    let now = countdown::now_unix();
    Ok(AuctionSnapshot {
        time_left: countdown::time_left(now, live.end_time),
        is_finished: now >= live.end_time,
        proposal: record,
        metadata,
        live,
        health,
    })
}

async fn resolve_metadata<M>(resolver: &M, record: &ProposalRecord) -> AuctionMetadata
where
    M: MetadataSource + ?Sized,
{
    if record.metadata_uri.is_empty() {
        return AuctionMetadata::default();
    }

    match resolver.resolve(&record.metadata_uri).await {
        Ok(metadata) => metadata,
        Err(error) => {
            warn!(uri = %record.metadata_uri, %error, "metadata unavailable, using placeholders");
            AuctionMetadata::default()
        }
    }
}

async fn read_live_state<R>(
    reader: &R,
    record: &ProposalRecord,
    prior: Option<LiveAuctionState>,
) -> (LiveAuctionState, LiveStateHealth)
where
    R: ChainReader + ?Sized,
{
    if !record.has_live_auction() {
        // Zero address is the "no live auction yet" sentinel; no scalar or
        // log reads are attempted.
        return (LiveAuctionState::default(), LiveStateHealth::Fresh);
    }

    match fetch_live_state(reader, record.live_auction).await {
        Ok(live) => (live, LiveStateHealth::Fresh),
        Err(error) => {
            warn!(
                auction = %record.live_auction,
                %error,
                "live state batch failed, keeping previous values"
            );
            (prior.unwrap_or_default(), LiveStateHealth::Degraded)
        }
    }
}

async fn fetch_live_state<R>(
    reader: &R,
    auction: Address,
) -> Result<LiveAuctionState, LiveStateError>
where
    R: ChainReader + ?Sized,
{
    // Three scalars plus the full event log, fanned out together. The
    // batch is all-or-nothing: any failure degrades the whole group.
    let (highest_bid, end_time, highest_bidder, raw_bids) = try_join!(
        reader.scalar(auction, ScalarField::HighestBid),
        reader.scalar(auction, ScalarField::EndTime),
        reader.scalar(auction, ScalarField::HighestBidder),
        reader.bid_events(auction, 0),
    )?;

    Ok(LiveAuctionState {
        highest_bid: highest_bid
            .as_uint()
            .ok_or(LiveStateError::Shape(ScalarField::HighestBid))?,
        highest_bidder: highest_bidder
            .as_addr()
            .ok_or(LiveStateError::Shape(ScalarField::HighestBidder))?,
        end_time: end_time
            .as_uint()
            .ok_or(LiveStateError::Shape(ScalarField::EndTime))?
            .saturating_to::<u64>(),
        bid_history: bids::reconstruct(&raw_bids),
    })
}

fn start_countdown(shared: &Arc<Shared>, generation: u64, end_time: u64) {
    let tick_shared = Arc::clone(shared);
    let countdown = Countdown::spawn(end_time, move |time_left, finished| {
        tick_shared.publish_if_current(generation, |state| {
            if let Some(snapshot) = state.snapshot.as_mut() {
                snapshot.time_left = time_left;
                snapshot.is_finished = finished;
            }
        });
    });

    let mut slot = shared.countdown_slot();
    if shared.generation.load(Ordering::SeqCst) == generation {
        *slot = Some(countdown);
    }
    // A superseded generation drops the fresh countdown here, aborting it.
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicBool, AtomicUsize},
        time::Duration,
    };

    use alloy::primitives::U256;
    use async_trait::async_trait;

    use super::*;
    use crate::{
        error::MetadataError,
        reader::ScalarValue,
        types::{MetadataDocument, RawBidEntry},
    };

    const LIVE_AUCTION: Address = Address::repeat_byte(0xaa);

    struct MockReader {
        found: bool,
        live_auction: Address,
        metadata_uri: String,
        highest_bid: U256,
        end_time: u64,
        highest_bidder: Address,
        raw_bids: Vec<RawBidEntry>,
        fail_live: AtomicBool,
        first_call_delay: Duration,
        registry_calls: AtomicUsize,
        scalar_calls: AtomicUsize,
        log_calls: AtomicUsize,
    }

    impl Default for MockReader {
        fn default() -> Self {
            Self {
                found: true,
                live_auction: Address::ZERO,
                metadata_uri: String::new(),
                highest_bid: U256::ZERO,
                end_time: 0,
                highest_bidder: Address::ZERO,
                raw_bids: Vec::new(),
                fail_live: AtomicBool::new(false),
                first_call_delay: Duration::ZERO,
                registry_calls: AtomicUsize::new(0),
                scalar_calls: AtomicUsize::new(0),
                log_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ChainReader for MockReader {
        async fn registry_entry(&self, id: ProposalId) -> Result<ProposalRecord, RegistryError> {
            let call = self.registry_calls.fetch_add(1, Ordering::SeqCst);
            if call == 0 && self.first_call_delay > Duration::ZERO {
                tokio::time::sleep(self.first_call_delay).await;
            }
            if !self.found {
                return Err(RegistryError::NotFound(id));
            }
            Ok(ProposalRecord {
                id,
                proposer: Address::repeat_byte(0x01),
                metadata_uri: self.metadata_uri.clone(),
                starting_bid: U256::from(100u64) + id.as_u256(),
                min_increment: U256::from(1u64),
                approved: true,
                live_auction: self.live_auction,
            })
        }

        async fn scalar(
            &self,
            _auction: Address,
            field: ScalarField,
        ) -> Result<ScalarValue, LiveStateError> {
            self.scalar_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_live.load(Ordering::SeqCst) {
                return Err(LiveStateError::Shape(field));
            }
            Ok(match field {
                ScalarField::HighestBid => ScalarValue::Uint(self.highest_bid),
                ScalarField::EndTime => ScalarValue::Uint(U256::from(self.end_time)),
                ScalarField::HighestBidder => ScalarValue::Addr(self.highest_bidder),
            })
        }

        async fn bid_events(
            &self,
            _auction: Address,
            _from_block: u64,
        ) -> Result<Vec<RawBidEntry>, LiveStateError> {
            self.log_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_live.load(Ordering::SeqCst) {
                return Err(LiveStateError::Shape(ScalarField::HighestBid));
            }
            Ok(self.raw_bids.clone())
        }
    }

    struct MockResolver {
        fail: bool,
        calls: AtomicUsize,
    }

    impl MockResolver {
        fn ok() -> Self {
            Self {
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MetadataSource for MockResolver {
        async fn resolve(&self, _uri: &str) -> Result<AuctionMetadata, MetadataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                let bad_json = serde_json::from_str::<MetadataDocument>("not json").unwrap_err();
                return Err(MetadataError::InvalidDocument(bad_json));
            }
            Ok(AuctionMetadata {
                name: "Vintage clock".to_string(),
                description: "A clock.".to_string(),
                category: "Antiques".to_string(),
                thumbnail_uri: None,
                image_uris: vec!["ipfs://one".to_string()],
            })
        }
    }

    fn raw_bid(bidder: u8, amount: u64, block_number: u64) -> RawBidEntry {
        RawBidEntry {
            bidder: Address::repeat_byte(bidder),
            amount: U256::from(amount),
            block_number,
            log_index: 0,
        }
    }

    #[tokio::test]
    async fn absent_proposal_reports_idle_not_loading() {
        let mut feed = AuctionFeed::new(
            Arc::new(MockReader::default()),
            Arc::new(MockResolver::ok()),
        );
        feed.set_proposal(None);

        let state = feed.current();
        assert_eq!(state.phase, FeedPhase::Idle);
        assert!(!state.is_loading());
        assert!(state.snapshot.is_none());
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn detached_feed_stays_idle_until_reader_attached() {
        let mut feed =
            AuctionFeed::<MockReader, MockResolver>::detached(Arc::new(MockResolver::ok()));
        feed.set_proposal(Some(ProposalId::from(1)));

        assert_eq!(feed.current().phase, FeedPhase::Idle);
    }

    #[tokio::test]
    async fn unknown_proposal_reaches_failed_without_panicking() {
        let reader = Arc::new(MockReader {
            found: false,
            ..Default::default()
        });
        let mut feed = AuctionFeed::new(reader, Arc::new(MockResolver::ok()));
        feed.set_proposal(Some(ProposalId::from(9)));

        let mut rx = feed.subscribe();
        let state = rx
            .wait_for(|state| state.phase == FeedPhase::Failed)
            .await
            .unwrap()
            .clone();

        assert!(!state.is_loading());
        assert!(state.snapshot.is_none());
        assert!(state.error.unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn zero_live_address_skips_live_reads() {
        let reader = Arc::new(MockReader::default());
        let mut feed = AuctionFeed::new(Arc::clone(&reader), Arc::new(MockResolver::ok()));
        feed.set_proposal(Some(ProposalId::from(5)));

        let mut rx = feed.subscribe();
        let state = rx
            .wait_for(|state| state.phase == FeedPhase::Ready)
            .await
            .unwrap()
            .clone();

        let snapshot = state.snapshot.unwrap();
        assert_eq!(snapshot.display_price(), snapshot.proposal.starting_bid);
        assert!(snapshot.live.bid_history.is_empty());
        assert_eq!(snapshot.live.highest_bidder, Address::ZERO);
        assert_eq!(reader.scalar_calls.load(Ordering::SeqCst), 0);
        assert_eq!(reader.log_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_metadata_uri_skips_resolution() {
        let resolver = Arc::new(MockResolver::ok());
        let mut feed = AuctionFeed::new(Arc::new(MockReader::default()), Arc::clone(&resolver));
        feed.set_proposal(Some(ProposalId::from(1)));

        let mut rx = feed.subscribe();
        let state = rx
            .wait_for(|state| state.phase == FeedPhase::Ready)
            .await
            .unwrap()
            .clone();

        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
        assert_eq!(state.snapshot.unwrap().metadata.name, "Untitled");
    }

    #[tokio::test]
    async fn resolved_metadata_is_merged() {
        let resolver = Arc::new(MockResolver::ok());
        let reader = Arc::new(MockReader {
            metadata_uri: "ipfs://abc".to_string(),
            ..Default::default()
        });
        let mut feed = AuctionFeed::new(reader, Arc::clone(&resolver));
        feed.set_proposal(Some(ProposalId::from(1)));

        let mut rx = feed.subscribe();
        let state = rx
            .wait_for(|state| state.phase == FeedPhase::Ready)
            .await
            .unwrap()
            .clone();

        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
        assert_eq!(state.snapshot.unwrap().metadata.name, "Vintage clock");
    }

    #[tokio::test]
    async fn metadata_failure_is_non_fatal() {
        let reader = Arc::new(MockReader {
            metadata_uri: "ipfs://abc".to_string(),
            ..Default::default()
        });
        let mut feed = AuctionFeed::new(reader, Arc::new(MockResolver::failing()));
        feed.set_proposal(Some(ProposalId::from(2)));

        let mut rx = feed.subscribe();
        let state = rx
            .wait_for(|state| state.phase == FeedPhase::Ready)
            .await
            .unwrap()
            .clone();

        let snapshot = state.snapshot.unwrap();
        assert_eq!(snapshot.metadata.name, "Untitled");
        assert_eq!(snapshot.metadata.category, "Uncategorized");
        assert!(snapshot.metadata.image_uris.is_empty());
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn live_batch_failure_degrades_to_prior_values() {
        let reader = Arc::new(MockReader {
            live_auction: LIVE_AUCTION,
            highest_bid: U256::from(40u64),
            end_time: 1,
            highest_bidder: Address::repeat_byte(0x22),
            raw_bids: vec![raw_bid(1, 40, 3)],
            ..Default::default()
        });
        let mut feed = AuctionFeed::new(Arc::clone(&reader), Arc::new(MockResolver::ok()));
        feed.set_proposal(Some(ProposalId::from(3)));

        let mut rx = feed.subscribe();
        rx.wait_for(|state| state.phase == FeedPhase::Ready)
            .await
            .unwrap();

        reader.fail_live.store(true, Ordering::SeqCst);
        feed.refresh();

        let state = rx
            .wait_for(|state| {
                state.phase == FeedPhase::Ready
                    && state
                        .snapshot
                        .as_ref()
                        .is_some_and(|snapshot| snapshot.health == LiveStateHealth::Degraded)
            })
            .await
            .unwrap()
            .clone();

        let snapshot = state.snapshot.unwrap();
        assert_eq!(snapshot.live.highest_bid, U256::from(40u64));
        assert_eq!(snapshot.live.highest_bidder, Address::repeat_byte(0x22));
        assert_eq!(snapshot.live.bid_history.len(), 1);
        assert!(state.error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn bid_history_order_is_stable_across_refreshes() {
        let reader = Arc::new(MockReader {
            live_auction: LIVE_AUCTION,
            end_time: 1,
            raw_bids: vec![raw_bid(1, 10, 3), raw_bid(2, 25, 4), raw_bid(3, 15, 5)],
            ..Default::default()
        });
        let mut feed = AuctionFeed::new(Arc::clone(&reader), Arc::new(MockResolver::ok()));
        feed.set_proposal(Some(ProposalId::from(7)));

        let mut rx = feed.subscribe();
        rx.wait_for(|state| state.phase == FeedPhase::Ready)
            .await
            .unwrap();

        for _ in 0..3 {
            feed.refresh();
        }
        tokio::time::sleep(Duration::from_millis(50)).await;

        let state = feed.current();
        assert_eq!(state.phase, FeedPhase::Ready);
        assert_eq!(reader.log_calls.load(Ordering::SeqCst), 4);

        let amounts: Vec<u64> = state
            .snapshot
            .unwrap()
            .live
            .bid_history
            .iter()
            .map(|bid| bid.amount.to::<u64>())
            .collect();
        assert_eq!(amounts, vec![10, 25, 15]);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_builds_are_discarded() {
        let reader = Arc::new(MockReader {
            first_call_delay: Duration::from_millis(100),
            ..Default::default()
        });
        let mut feed = AuctionFeed::new(reader, Arc::new(MockResolver::ok()));
        // First build is slow; the second supersedes it immediately.
        feed.set_proposal(Some(ProposalId::from(1)));
        feed.set_proposal(Some(ProposalId::from(2)));

        let mut rx = feed.subscribe();
        let state = rx
            .wait_for(|state| state.phase == FeedPhase::Ready)
            .await
            .unwrap()
            .clone();
        assert_eq!(state.snapshot.unwrap().proposal.id, ProposalId::from(2));

        // Let the superseded build land; it must not overwrite.
        tokio::time::sleep(Duration::from_millis(200)).await;

        let state = feed.current();
        assert_eq!(state.phase, FeedPhase::Ready);
        assert_eq!(state.snapshot.unwrap().proposal.id, ProposalId::from(2));
    }

    #[tokio::test]
    async fn past_deadline_is_finished_immediately_with_no_timer() {
        let reader = Arc::new(MockReader {
            live_auction: LIVE_AUCTION,
            end_time: 1,
            highest_bid: U256::from(9u64),
            ..Default::default()
        });
        let mut feed = AuctionFeed::new(reader, Arc::new(MockResolver::ok()));
        feed.set_proposal(Some(ProposalId::from(4)));

        let mut rx = feed.subscribe();
        let state = rx
            .wait_for(|state| state.phase == FeedPhase::Ready)
            .await
            .unwrap()
            .clone();

        let snapshot = state.snapshot.unwrap();
        assert!(snapshot.is_finished);
        assert_eq!(snapshot.time_left, countdown::FINISHED);
        assert!(feed.shared.countdown_slot().is_none());
    }

    #[tokio::test]
    async fn future_deadline_starts_countdown_and_teardown_cancels_it() {
        let reader = Arc::new(MockReader {
            live_auction: LIVE_AUCTION,
            end_time: countdown::now_unix() + 3_600,
            ..Default::default()
        });
        let mut feed = AuctionFeed::new(reader, Arc::new(MockResolver::ok()));
        feed.set_proposal(Some(ProposalId::from(6)));

        let mut rx = feed.subscribe();
        let state = rx
            .wait_for(|state| state.phase == FeedPhase::Ready)
            .await
            .unwrap()
            .clone();

        let snapshot = state.snapshot.unwrap();
        assert!(!snapshot.is_finished);
        assert_ne!(snapshot.time_left, countdown::FINISHED);
        assert!(feed.shared.countdown_slot().is_some());

        feed.set_proposal(None);
        assert!(feed.shared.countdown_slot().is_none());
    }
}
