//! Contains a concrete implementation of the [KeyValueStore] trait that stores
//! data in memory.

use super::{KeyValueStore, KvError, KvResult};
use alloy_primitives::B256;
use std::collections::HashMap;

/// A simple, synchronous key-value store that stores data in memory. Used
/// when no data directory is configured, and for testing.
#[derive(Default, Clone, Debug, Eq, PartialEq)]
pub struct MemoryKeyValueStore {
    store: HashMap<B256, Vec<u8>>,
}

impl MemoryKeyValueStore {
    /// Create a new [MemoryKeyValueStore] with an empty store.
    pub fn new() -> Self {
        Self { store: HashMap::new() }
    }

    /// Returns the number of keys held by the store.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: B256) -> KvResult<Vec<u8>> {
        self.store.get(&key).cloned().ok_or(KvError::NotFound)
    }

    fn set(&mut self, key: B256, value: Vec<u8>) -> KvResult<()> {
        if let Some(existing) = self.store.get(&key) {
            if *existing != value {
                return Err(KvError::conflicting_write(key));
            }
            return Ok(());
        }
        self.store.insert(key, value);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use alloy_primitives::b256;

    const KEY: B256 = b256!("0202020202020202020202020202020202020202020202020202020202020202");

    #[test]
    fn test_set_then_get() {
        let mut store = MemoryKeyValueStore::new();
        assert!(matches!(store.get(KEY), Err(KvError::NotFound)));

        store.set(KEY, b"value".to_vec()).unwrap();
        assert_eq!(store.get(KEY).unwrap(), b"value");
    }

    #[test]
    fn test_identical_overwrite_is_idempotent() {
        let mut store = MemoryKeyValueStore::new();
        store.set(KEY, b"value".to_vec()).unwrap();
        store.set(KEY, b"value".to_vec()).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn test_conflicting_overwrite_rejected() {
        let mut store = MemoryKeyValueStore::new();
        store.set(KEY, b"value".to_vec()).unwrap();
        assert!(matches!(store.set(KEY, b"other".to_vec()), Err(KvError::Io(_))));
        assert_eq!(store.get(KEY).unwrap(), b"value");
    }
}
