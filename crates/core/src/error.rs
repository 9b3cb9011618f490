use alloy::{contract, transports::TransportError};
use thiserror::Error;

use crate::{reader::ScalarField, types::ProposalId};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    LiveState(#[from] LiveStateError),

    #[error(transparent)]
    Balance(#[from] BalanceError),
}

/// Failures of the mandatory registry read. These abort a snapshot build.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry call failed: {0}")]
    Contract(#[from] contract::Error),

    #[error("proposal {0} not found in registry")]
    NotFound(ProposalId),
}

/// Failures resolving the metadata document. Non-fatal: the snapshot
/// proceeds with placeholder fields.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("metadata document is not valid JSON: {0}")]
    InvalidDocument(#[from] serde_json::Error),
}

/// Failures of the live auction batch (scalar reads + event log). Non-fatal
/// for the snapshot as a whole, but all-or-nothing within the batch.
#[derive(Debug, Error)]
pub enum LiveStateError {
    #[error("failed to query auction logs: {0}")]
    Transport(#[from] TransportError),

    #[error("auction call failed: {0}")]
    Contract(#[from] contract::Error),

    #[error("failed to decode bid log: {0}")]
    LogDecode(#[from] alloy::sol_types::Error),

    #[error("unexpected value shape for {0:?} read")]
    Shape(ScalarField),
}

/// Failures reading wallet balances.
#[derive(Debug, Error)]
pub enum BalanceError {
    #[error("failed to read native balance: {0}")]
    Transport(#[from] TransportError),

    #[error("token balance call failed: {0}")]
    Contract(#[from] contract::Error),
}
