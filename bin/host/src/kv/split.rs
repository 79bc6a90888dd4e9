//! Contains a concrete implementation of the [KeyValueStore] trait that splits
//! between two separate [KeyValueStore]s depending on [PreimageKeyType].

use super::{KeyValueStore, KvError, KvResult};
use alloy_primitives::B256;
use stele_preimage::PreimageKeyType;

/// A split implementation of the [KeyValueStore] trait that routes local keys
/// to one store and everything else to another. Composing the local source in
/// front of the backing store this way means it is consulted before any disk
/// or memory lookup, and writes never reach it.
#[derive(Clone, Debug)]
pub struct SplitKeyValueStore<L, R>
where
    L: KeyValueStore,
    R: KeyValueStore,
{
    local_store: L,
    remote_store: R,
}

impl<L, R> SplitKeyValueStore<L, R>
where
    L: KeyValueStore,
    R: KeyValueStore,
{
    /// Create a new [SplitKeyValueStore] with the given local and remote
    /// [KeyValueStore]s.
    pub const fn new(local_store: L, remote_store: R) -> Self {
        Self { local_store, remote_store }
    }
}

impl<L, R> KeyValueStore for SplitKeyValueStore<L, R>
where
    L: KeyValueStore,
    R: KeyValueStore,
{
    fn get(&self, key: B256) -> KvResult<Vec<u8>> {
        match PreimageKeyType::try_from(key[0]).map_err(|_| KvError::NotFound)? {
            PreimageKeyType::Local => self.local_store.get(key),
            _ => self.remote_store.get(key),
        }
    }

    fn set(&mut self, key: B256, value: Vec<u8>) -> KvResult<()> {
        self.remote_store.set(key, value)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::kv::{LocalKeyValueStore, MemoryKeyValueStore};
    use alloy_primitives::{b256, keccak256};
    use stele_preimage::{PreimageKey, L1_HEAD_LOCAL_INDEX};

    const L1_HEAD: B256 =
        b256!("deaddeaddeaddeaddeaddeaddeaddeaddeaddeaddeaddeaddeaddeaddeaddead");

    fn split_store() -> SplitKeyValueStore<LocalKeyValueStore, MemoryKeyValueStore> {
        SplitKeyValueStore::new(LocalKeyValueStore::new(L1_HEAD), MemoryKeyValueStore::new())
    }

    #[test]
    fn test_local_keys_routed_to_local_store() {
        let store = split_store();
        let key = PreimageKey::new_local(L1_HEAD_LOCAL_INDEX);
        assert_eq!(store.get(key.into()).unwrap(), L1_HEAD.to_vec());
    }

    #[test]
    fn test_writes_routed_to_remote_store() {
        let mut store = split_store();
        let key = PreimageKey::new_keccak256(*keccak256(b"value"));
        store.set(key.into(), b"value".to_vec()).unwrap();
        assert_eq!(store.get(key.into()).unwrap(), b"value");
    }

    #[test]
    fn test_invalid_tag_not_found() {
        let store = split_store();
        let key = b256!("0000000000000000000000000000000000000000000000000000000000000001");
        assert!(matches!(store.get(key), Err(KvError::NotFound)));
    }
}
