//! Contains the upstream source abstractions consumed by the prefetcher and
//! their online implementations.

use alloy_consensus::Header;
use alloy_eips::eip4844::{BlobTransactionSidecarItem, IndexedBlobHash};
use alloy_primitives::{Bytes, B256};
use alloy_transport::{TransportError, TransportErrorKind};
use async_trait::async_trait;
use thiserror::Error;

mod chain;
pub use chain::{OnlineL1Source, RpcKind};

mod beacon;
pub use beacon::{BeaconGenesisResponse, BeaconSpecResponse, OnlineBeaconClient};

mod blob;
pub use blob::OnlineBlobProvider;

mod retry;
pub use retry::{RetryPolicy, RetryingBlobSource, RetryingL1Source};

/// Errors produced by upstream sources.
///
/// The transient/deterministic split drives the retry decorators: transient
/// failures (network trouble, timeouts, upstream 5xx) are worth another
/// attempt, while deterministic failures (bad requests, JSON-RPC error
/// responses, verification failures) propagate immediately.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The transport failed before a response was received.
    #[error("transport error: {0}")]
    Transport(String),
    /// The upstream responded with a non-success HTTP status.
    #[error("upstream returned HTTP status {0}")]
    Status(u16),
    /// The upstream returned a JSON-RPC error response.
    #[error("upstream RPC error: {0}")]
    Rpc(String),
    /// The requested block is not known to the upstream.
    #[error("block {0} not found")]
    BlockNotFound(B256),
    /// The upstream response could not be decoded or failed validation.
    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),
    /// The requested timestamp precedes the beacon chain genesis.
    #[error("timestamp {timestamp} precedes beacon genesis {genesis}")]
    SlotDerivation {
        /// The timestamp a slot was requested for.
        timestamp: u64,
        /// The beacon chain genesis timestamp.
        genesis: u64,
    },
}

impl SourceError {
    /// Returns `true` if the operation that produced this error is worth
    /// retrying.
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status(status) => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<TransportError> for SourceError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::ErrorResp(payload) => Self::Rpc(payload.to_string()),
            TransportError::Transport(TransportErrorKind::HttpError(http)) => {
                Self::Status(http.status)
            }
            TransportError::Transport(kind) => Self::Transport(kind.to_string()),
            err => Self::InvalidResponse(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// A [Result] over [SourceError].
pub type SourceResult<T> = Result<T, SourceError>;

/// The L1 execution-layer operations the prefetcher depends on.
#[async_trait]
pub trait L1Source {
    /// Fetches the header of the block with the given hash.
    async fn header_by_hash(&self, hash: B256) -> SourceResult<Header>;

    /// Fetches the header and transactions of the block with the given hash.
    async fn block_with_transactions(
        &self,
        hash: B256,
    ) -> SourceResult<(Header, Vec<alloy_consensus::TxEnvelope>)>;

    /// Fetches the header and the wire-encoded receipts of the block with the
    /// given hash.
    async fn receipts_by_hash(&self, hash: B256) -> SourceResult<(Header, Vec<Bytes>)>;
}

/// The L1 beacon-chain operations the prefetcher depends on.
#[async_trait]
pub trait BlobSidecarSource {
    /// Fetches the blob sidecars confirmed in the L1 block with the given
    /// timestamp, filtered and verified against the given indexed hashes.
    async fn blob_sidecars(
        &self,
        timestamp: u64,
        hashes: &[IndexedBlobHash],
    ) -> SourceResult<Vec<BlobTransactionSidecarItem>>;
}
