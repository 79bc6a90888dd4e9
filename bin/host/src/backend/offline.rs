//! Contains the offline implementations of the [HintRouter] and
//! [PreimageFetcher] traits.

use super::{BackendError, HintRouter, PreimageFetcher};
use crate::kv::SharedKeyValueStore;
use async_trait::async_trait;
use stele_preimage::PreimageKey;
use tracing::debug;

/// A plain [SharedKeyValueStore]-backed backend. Used when no upstream is
/// configured: hints are ignored and missing keys are terminal.
pub struct OfflineHostBackend {
    kv_store: SharedKeyValueStore,
}

impl OfflineHostBackend {
    /// Create a new [OfflineHostBackend] over the given [SharedKeyValueStore].
    pub fn new(kv_store: SharedKeyValueStore) -> Self {
        Self { kv_store }
    }
}

impl core::fmt::Debug for OfflineHostBackend {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OfflineHostBackend").finish_non_exhaustive()
    }
}

#[async_trait]
impl PreimageFetcher for OfflineHostBackend {
    async fn get_preimage(&self, key: PreimageKey) -> Result<Vec<u8>, BackendError> {
        let kv_lock = self.kv_store.read().await;
        kv_lock.get(key.into()).map_err(Into::into)
    }
}

#[async_trait]
impl HintRouter for OfflineHostBackend {
    async fn route_hint(&self, hint: String) -> Result<(), BackendError> {
        debug!(target: "offline-backend", "Ignoring hint in offline mode: {hint}");
        Ok(())
    }
}
