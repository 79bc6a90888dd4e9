//! This module contains the [KeyValueStore] trait and concrete implementations
//! of it.

use alloy_primitives::B256;
use std::{io, sync::Arc};
use thiserror::Error;
use tokio::sync::RwLock;

mod mem;
pub use mem::MemoryKeyValueStore;

mod disk;
pub use disk::DiskKeyValueStore;

mod local;
pub use local::LocalKeyValueStore;

mod split;
pub use split::SplitKeyValueStore;

/// Errors surfaced by [KeyValueStore] implementations.
#[derive(Error, Debug)]
pub enum KvError {
    /// The store does not hold the requested key.
    #[error("key not found")]
    NotFound,
    /// The backing storage failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl KvError {
    /// Constructs the error for an attempt to overwrite a key with different
    /// bytes. Keys are content-addressed, so two writers can only ever race
    /// with identical values; anything else is a programming error.
    pub(crate) fn conflicting_write(key: B256) -> Self {
        debug_assert!(false, "conflicting write for key {key}");
        Self::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("conflicting write for key {key}"),
        ))
    }
}

/// A [Result] over [KvError].
pub type KvResult<T> = Result<T, KvError>;

/// Describes the interface of a simple, synchronous key-value store.
///
/// Values are immutable once written: `set` may be repeated for a key only
/// with byte-identical contents.
pub trait KeyValueStore {
    /// Get the value associated with the given key.
    fn get(&self, key: B256) -> KvResult<Vec<u8>>;

    /// Set the value associated with the given key.
    fn set(&mut self, key: B256, value: Vec<u8>) -> KvResult<()>;
}

/// A shared, locked [KeyValueStore]. Reads may proceed in parallel; writes
/// are exclusive.
pub type SharedKeyValueStore = Arc<RwLock<dyn KeyValueStore + Send + Sync>>;
