//! Contains a concrete implementation of the [KeyValueStore] trait that stores
//! data on disk.
//!
//! Data is stored in a flat directory, one regular file per key. The file
//! name is the hex encoding of the 32-byte key with a `.txt` extension, and
//! the contents are the raw value bytes. There is no index file; the
//! filesystem is the index.

use super::{KeyValueStore, KvError, KvResult};
use alloy_primitives::{hex, B256};
use std::{fs, io::Write, path::PathBuf};
use tempfile::NamedTempFile;

/// A simple, synchronous key-value store that stores data on disk.
#[derive(Default, Clone, Debug, Eq, PartialEq)]
pub struct DiskKeyValueStore {
    data_directory: PathBuf,
}

impl DiskKeyValueStore {
    /// Create a new [DiskKeyValueStore] with the given data directory. The
    /// directory must already exist.
    pub fn new(data_directory: PathBuf) -> Self {
        Self { data_directory }
    }

    /// Returns the path of the file backing the given key.
    fn key_path(&self, key: B256) -> PathBuf {
        self.data_directory.join(format!("{}.txt", hex::encode(key)))
    }
}

impl KeyValueStore for DiskKeyValueStore {
    fn get(&self, key: B256) -> KvResult<Vec<u8>> {
        fs::read(self.key_path(key)).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => KvError::NotFound,
            _ => KvError::Io(e),
        })
    }

    fn set(&mut self, key: B256, value: Vec<u8>) -> KvResult<()> {
        match self.get(key) {
            Ok(existing) if existing != value => return Err(KvError::conflicting_write(key)),
            Ok(_) => return Ok(()),
            Err(KvError::NotFound) => {}
            Err(e) => return Err(e),
        }

        // Write to a temporary sibling, then rename into place. Concurrent
        // readers either see the complete value or nothing; a crash leaves
        // only unreferenced temp files behind.
        let mut tmp = NamedTempFile::new_in(&self.data_directory)?;
        tmp.write_all(&value)?;
        tmp.persist(self.key_path(key)).map_err(|e| KvError::Io(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use alloy_primitives::keccak256;

    fn temp_store() -> (tempfile::TempDir, DiskKeyValueStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskKeyValueStore::new(dir.path().to_path_buf());
        (dir, store)
    }

    #[test]
    fn test_set_then_get() {
        let (dir, mut store) = temp_store();
        let key = keccak256(b"value");

        assert!(matches!(store.get(key), Err(KvError::NotFound)));
        store.set(key, b"value".to_vec()).unwrap();
        assert_eq!(store.get(key).unwrap(), b"value");

        // The value lives in a single flat file named after the key.
        let path = dir.path().join(format!("{}.txt", hex::encode(key)));
        assert_eq!(fs::read(path).unwrap(), b"value");
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let (dir, mut store) = temp_store();
        for i in 0u8..16 {
            store.set(keccak256([i]), vec![i; 64]).unwrap();
        }

        let files = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(files.len(), 16);
        assert!(files.iter().all(|f| f.ends_with(".txt")));
    }

    #[test]
    fn test_identical_overwrite_is_idempotent() {
        let (_dir, mut store) = temp_store();
        let key = keccak256(b"value");
        store.set(key, b"value".to_vec()).unwrap();
        store.set(key, b"value".to_vec()).unwrap();
        assert_eq!(store.get(key).unwrap(), b"value");
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn test_conflicting_overwrite_rejected() {
        let (_dir, mut store) = temp_store();
        let key = keccak256(b"value");
        store.set(key, b"value".to_vec()).unwrap();
        assert!(matches!(store.set(key, b"other".to_vec()), Err(KvError::Io(_))));
        assert_eq!(store.get(key).unwrap(), b"value");
    }
}
