use crate::types::{Bid, RawBidEntry};

/// Shape raw `Bid` logs into the ordered history shown to consumers.
///
/// Order is the emission order of the log stream (monotonic by block, tx
/// and log index); bids are never re-sorted by amount and never deduped, so
/// a bidder appears once per bid placed. Empty input yields an empty
/// history.
pub fn reconstruct(entries: &[RawBidEntry]) -> Vec<Bid> {
    entries
        .iter()
        .map(|entry| Bid {
            bidder: entry.bidder,
            amount: entry.amount,
        })
        .collect()
}
