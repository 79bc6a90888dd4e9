#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod backend;
pub use backend::{BackendError, HintRouter, OfflineHostBackend, PreimageFetcher};

pub mod cli;
pub use cli::{ConfigError, HostCli};

pub mod eth;

pub mod kv;
pub use kv::{
    DiskKeyValueStore, KeyValueStore, KvError, LocalKeyValueStore, MemoryKeyValueStore,
    SharedKeyValueStore, SplitKeyValueStore,
};

pub mod prefetcher;
pub use prefetcher::{PrefetchError, Prefetcher};

pub mod providers;
pub use providers::{
    BlobSidecarSource, L1Source, OnlineBeaconClient, OnlineBlobProvider, OnlineL1Source,
    RetryPolicy, RpcKind, SourceError,
};

pub mod server;
pub use server::PreimageServer;
