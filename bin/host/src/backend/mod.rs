//! Backend for the preimage server.

use crate::{kv::KvError, prefetcher::PrefetchError};
use async_trait::async_trait;
use stele_preimage::PreimageKey;
use thiserror::Error;

mod offline;
pub use offline::OfflineHostBackend;

pub(crate) mod util;

/// Errors surfaced to the preimage server by a backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The store does not hold the key, and no recorded hint produced it.
    #[error("preimage not found")]
    NotFound,
    /// A prefetch attempted for the recorded hint failed.
    #[error("prefetch failed: {0}")]
    Prefetch(PrefetchError),
    /// The backing store failed.
    #[error(transparent)]
    Store(KvError),
}

impl From<KvError> for BackendError {
    fn from(err: KvError) -> Self {
        match err {
            KvError::NotFound => Self::NotFound,
            err => Self::Store(err),
        }
    }
}

/// A [HintRouter] delivers fetch hints from the client to the backend.
#[async_trait]
pub trait HintRouter {
    /// Routes a hint to the backend.
    async fn route_hint(&self, hint: String) -> Result<(), BackendError>;
}

/// A [PreimageFetcher] resolves preimage keys to their values.
#[async_trait]
pub trait PreimageFetcher {
    /// Get the preimage for the given key.
    async fn get_preimage(&self, key: PreimageKey) -> Result<Vec<u8>, BackendError>;
}
