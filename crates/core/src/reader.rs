use alloy::{
    primitives::{Address, U256},
    providers::Provider,
    rpc::types::Filter,
    sol_types::SolEvent,
};
use async_trait::async_trait;
use gavel_abi::{IAuctionRegistry, ILiveAuction};

use crate::{
    error::{LiveStateError, RegistryError},
    types::{ProposalId, ProposalRecord, RawBidEntry},
};

/// Named scalar reads issued against a live auction contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarField {
    HighestBid,
    EndTime,
    HighestBidder,
}

/// Result of a scalar read; auction scalars are uints or addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarValue {
    Uint(U256),
    Addr(Address),
}

impl ScalarValue {
    pub fn as_uint(self) -> Option<U256> {
        match self {
            Self::Uint(value) => Some(value),
            Self::Addr(_) => None,
        }
    }

    pub fn as_addr(self) -> Option<Address> {
        match self {
            Self::Addr(value) => Some(value),
            Self::Uint(_) => None,
        }
    }
}

/// Read-only chain access used by the feeds.
///
/// Exactly the operations the aggregators need; implementations own all ABI
/// decoding so callers only ever see named records.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Look up one registry row. An unknown id is an error, not a default
    /// row. No retries are performed at this layer.
    async fn registry_entry(&self, id: ProposalId) -> Result<ProposalRecord, RegistryError>;

    /// One named zero-argument scalar read against a live auction contract.
    async fn scalar(
        &self,
        auction: Address,
        field: ScalarField,
    ) -> Result<ScalarValue, LiveStateError>;

    /// All `Bid` events from `from_block` to the chain head, in emission
    /// order. Callers pass block 0 to guarantee a complete history.
    async fn bid_events(
        &self,
        auction: Address,
        from_block: u64,
    ) -> Result<Vec<RawBidEntry>, LiveStateError>;
}

/// [`ChainReader`] over a live RPC provider.
#[derive(Clone)]
pub struct RpcChainReader<P>
where
    P: Provider + Clone,
{
    provider: P,
    registry: Address,
}

impl<P> RpcChainReader<P>
where
    P: Provider + Clone,
{
    pub fn new(provider: P, registry: Address) -> Self {
        Self { provider, registry }
    }

    pub fn registry_address(&self) -> Address {
        self.registry
    }
}

#[async_trait]
impl<P> ChainReader for RpcChainReader<P>
where
    P: Provider + Clone + 'static,
{
    async fn registry_entry(&self, id: ProposalId) -> Result<ProposalRecord, RegistryError> {
        let registry = IAuctionRegistry::new(self.registry, &self.provider);

        // The on-chain tuple is position-fixed: slot 1 metadata URI, slot 2
        // starting bid, slot 5 live auction address. This is the only place
        // that mapping happens.
        let row = registry.proposals(id.as_u256()).call().await?;

        // Unknown ids return an all-default row rather than reverting.
        if row.proposer == Address::ZERO {
            return Err(RegistryError::NotFound(id));
        }

        Ok(ProposalRecord {
            id,
            proposer: row.proposer,
            metadata_uri: row.metadataUri,
            starting_bid: row.startingBid,
            min_increment: row.minIncrement,
            approved: row.approved,
            live_auction: row.liveAuction,
        })
    }

    async fn scalar(
        &self,
        auction: Address,
        field: ScalarField,
    ) -> Result<ScalarValue, LiveStateError> {
        let contract = ILiveAuction::new(auction, &self.provider);

        let value = match field {
            ScalarField::HighestBid => ScalarValue::Uint(contract.highestBid().call().await?),
            ScalarField::EndTime => ScalarValue::Uint(contract.endTime().call().await?),
            ScalarField::HighestBidder => ScalarValue::Addr(contract.highestBidder().call().await?),
        };

        Ok(value)
    }

    async fn bid_events(
        &self,
        auction: Address,
        from_block: u64,
    ) -> Result<Vec<RawBidEntry>, LiveStateError> {
        let filter = Filter::new()
            .address(auction)
            .event_signature(ILiveAuction::Bid::SIGNATURE_HASH)
            .from_block(from_block);

        let logs = self.provider.get_logs(&filter).await?;

        let mut entries = Vec::with_capacity(logs.len());
        for log in logs {
            let decoded = log.log_decode::<ILiveAuction::Bid>()?;
            entries.push(RawBidEntry {
                bidder: decoded.inner.data.bidder,
                amount: decoded.inner.data.amount,
                block_number: log.block_number.unwrap_or_default(),
                log_index: log.log_index.unwrap_or_default(),
            });
        }

        Ok(entries)
    }
}
