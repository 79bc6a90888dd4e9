//! Contains a concrete implementation of the [KeyValueStore] trait that serves
//! the host-supplied local keys.

use super::{KeyValueStore, KvError, KvResult};
use alloy_primitives::{B256, U256};
use stele_preimage::{PreimageKey, L1_HEAD_LOCAL_INDEX};

/// A read-only [KeyValueStore] over the closed set of local indices. The
/// values are frozen at startup from the host configuration; currently the
/// only local key is the committed L1 head block hash at index 1.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct LocalKeyValueStore {
    l1_head: B256,
}

impl LocalKeyValueStore {
    /// Create a new [LocalKeyValueStore] serving the given L1 head hash.
    pub const fn new(l1_head: B256) -> Self {
        Self { l1_head }
    }
}

impl KeyValueStore for LocalKeyValueStore {
    fn get(&self, key: B256) -> KvResult<Vec<u8>> {
        let preimage_key = PreimageKey::try_from(*key).map_err(|_| KvError::NotFound)?;
        if preimage_key.key_value() == U256::from(L1_HEAD_LOCAL_INDEX) {
            return Ok(self.l1_head.to_vec());
        }
        Err(KvError::NotFound)
    }

    fn set(&mut self, _: B256, _: Vec<u8>) -> KvResult<()> {
        unreachable!("LocalKeyValueStore is read-only")
    }
}
