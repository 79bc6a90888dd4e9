//! This module contains all CLI-specific code for the host binary.

use crate::{
    backend::OfflineHostBackend,
    eth::http_provider,
    kv::{
        DiskKeyValueStore, LocalKeyValueStore, MemoryKeyValueStore, SharedKeyValueStore,
        SplitKeyValueStore,
    },
    prefetcher::Prefetcher,
    providers::{OnlineBeaconClient, OnlineBlobProvider, OnlineL1Source, RpcKind},
    server::PreimageServer,
};
use alloy_primitives::B256;
use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser};
use serde::Serialize;
use std::{fs, path::PathBuf, sync::Arc};
use thiserror::Error;
use tokio::{net::TcpListener, process::Command, sync::RwLock, task};
use tracing::info;

mod parser;
pub(crate) use parser::parse_b256;

mod tracing_util;
pub use tracing_util::init_tracing_subscriber;

/// The environment variable through which a spawned client program receives
/// the oracle's API address.
const API_ADDRESS_ENV: &str = "STELE_API_ADDRESS";

/// Errors from validating the parsed host configuration.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The required L1 head hash is unset or zero.
    #[error("invalid l1 head")]
    InvalidL1Head,
    /// Offline mode requires a persistent data directory.
    #[error("datadir must be specified when in non-fetching mode")]
    DataDirRequired,
    /// Server mode runs no client program.
    #[error("exec command must not be set when in server mode")]
    NoExecInServerMode,
}

/// The host binary CLI application arguments.
#[derive(Parser, Serialize, Clone, Debug)]
pub struct HostCli {
    /// Verbosity level (0-2)
    #[arg(long, short, action = ArgAction::Count)]
    pub v: u8,
    /// Hash of the L1 head block. Derivation stops after this block is
    /// processed.
    #[clap(long, value_parser = parse_b256, env)]
    pub l1_head: B256,
    /// Address of L1 JSON-RPC endpoint to use (eth namespace required).
    #[clap(long, visible_alias = "l1", requires = "l1_beacon_address", env)]
    pub l1_node_address: Option<String>,
    /// Address of the L1 Beacon API endpoint to use.
    #[clap(long, visible_alias = "beacon", requires = "l1_node_address", env)]
    pub l1_beacon_address: Option<String>,
    /// Trust the L1 RPC, skipping verification of fetched headers and trie
    /// roots. Syncs faster at risk of a malicious or buggy endpoint
    /// poisoning the store.
    #[clap(long, visible_alias = "trust-rpc", env)]
    pub l1_trust_rpc: bool,
    /// The kind of RPC provider, used to inform the optimal receipts
    /// fetching method.
    #[clap(long, visible_alias = "rpc-kind", value_enum, default_value = "standard", env)]
    pub l1_rpc_kind: RpcKind,
    /// Directory to use for preimage data storage. Default uses in-memory
    /// storage.
    #[clap(long, visible_alias = "db", env)]
    pub data_dir: Option<PathBuf>,
    /// Run the specified client program as a separate process detached from
    /// the host.
    #[clap(long, env)]
    pub exec: Option<String>,
    /// Run in pre-image server mode without executing any client program.
    #[clap(long, env)]
    pub server: bool,
    /// Address for the HTTP API to listen on.
    #[clap(long, default_value = "127.0.0.1:9573", env)]
    pub api_address: String,
    /// Clear the recorded hint after a prefetch that does not produce the
    /// requested key, instead of refetching on every subsequent miss.
    #[clap(long, env)]
    pub clear_stale_hint: bool,
}

impl HostCli {
    /// Validates the parsed configuration.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.l1_head.is_zero() {
            return Err(ConfigError::InvalidL1Head);
        }
        if !self.fetching_enabled() && self.data_dir.is_none() {
            return Err(ConfigError::DataDirRequired);
        }
        if self.server && self.exec.is_some() {
            return Err(ConfigError::NoExecInServerMode);
        }
        Ok(())
    }

    /// Returns `true` if the host can fetch missing preimages from upstream.
    pub fn fetching_enabled(&self) -> bool {
        self.l1_node_address.is_some()
    }

    /// Constructs the [SharedKeyValueStore] for the host: the local source
    /// split in front of a disk store when a data directory is configured,
    /// or an in-memory store otherwise.
    pub fn construct_kv_store(&self) -> Result<SharedKeyValueStore> {
        let local_kv_store = LocalKeyValueStore::new(self.l1_head);

        let kv_store: SharedKeyValueStore = if let Some(ref data_dir) = self.data_dir {
            fs::create_dir_all(data_dir)
                .with_context(|| format!("creating datadir {}", data_dir.display()))?;
            let disk_kv_store = DiskKeyValueStore::new(data_dir.clone());
            Arc::new(RwLock::new(SplitKeyValueStore::new(local_kv_store, disk_kv_store)))
        } else {
            let mem_kv_store = MemoryKeyValueStore::new();
            Arc::new(RwLock::new(SplitKeyValueStore::new(local_kv_store, mem_kv_store)))
        };

        Ok(kv_store)
    }

    /// Creates the upstream sources for the prefetcher.
    pub async fn create_providers(&self) -> Result<(OnlineL1Source, OnlineBlobProvider)> {
        let l1_provider = http_provider(
            self.l1_node_address.as_ref().ok_or(anyhow!("L1 node address must be set"))?,
        )?;
        let beacon_client = OnlineBeaconClient::new_http(
            self.l1_beacon_address.clone().ok_or(anyhow!("Beacon API URL must be set"))?,
        );
        let blob_provider = OnlineBlobProvider::init(beacon_client)
            .await
            .context("loading beacon chain configuration")?;

        Ok((OnlineL1Source::new(l1_provider, self.l1_rpc_kind), blob_provider))
    }

    /// Starts the host: binds the API listener, constructs the backend, and
    /// optionally spawns the client program.
    pub async fn start(self) -> Result<()> {
        let listener = TcpListener::bind(&self.api_address)
            .await
            .with_context(|| format!("binding API listener on {}", self.api_address))?;
        let api_address = listener.local_addr()?.to_string();

        let kv_store = self.construct_kv_store()?;
        let server_task = if self.fetching_enabled() {
            let (l1_source, blob_source) = self.create_providers().await?;
            let backend = Prefetcher::new(
                kv_store,
                l1_source,
                blob_source,
                self.l1_trust_rpc,
                self.clear_stale_hint,
            );
            task::spawn(PreimageServer::new(listener, Arc::new(backend)).start())
        } else {
            info!(
                target: "host",
                "Running in offline mode. All required pre-images must be pre-populated."
            );
            let backend = OfflineHostBackend::new(kv_store);
            task::spawn(PreimageServer::new(listener, Arc::new(backend)).start())
        };

        match &self.exec {
            Some(exec) if !self.server => {
                let mut child = Command::new(exec)
                    .env(API_ADDRESS_ENV, &api_address)
                    .spawn()
                    .with_context(|| format!("spawning client program {exec}"))?;

                tokio::select! {
                    server = server_task => server??,
                    status = child.wait() => {
                        let status = status.context("waiting for client program")?;
                        info!(target: "host", "Client program exited with {status}");
                        std::process::exit(status.code().unwrap_or(1));
                    }
                }
            }
            _ => server_task.await??,
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_flags() {
        let one_hash_str =
            "0x0000000000000000000000000000000000000000000000000000000000000001";
        let default_flags = ["stele-host", "--l1-head", one_hash_str];

        let cases = [
            // valid
            (["--data-dir", "dummy"].as_slice(), true),
            (["--server", "--data-dir", "dummy"].as_slice(), true),
            (["--l1", "dummy", "--beacon", "dummy"].as_slice(), true),
            (["--l1", "dummy", "--beacon", "dummy", "--db", "dummy"].as_slice(), true),
            (["--l1", "dummy", "--beacon", "dummy", "--rpc-kind", "debug"].as_slice(), true),
            // invalid: node and beacon addresses must come together
            (["--l1", "dummy"].as_slice(), false),
            (["--beacon", "dummy"].as_slice(), false),
            (["--rpc-kind", "bogus", "--data-dir", "dummy"].as_slice(), false),
        ];

        for (args_ext, valid) in cases.into_iter() {
            let args = default_flags.iter().chain(args_ext.iter()).cloned().collect::<Vec<_>>();

            let parsed = HostCli::try_parse_from(args);
            assert_eq!(parsed.is_ok(), valid, "args: {args_ext:?}");
        }
    }

    #[test]
    fn test_check_rejects_zero_l1_head() {
        let cfg =
            HostCli::try_parse_from(["stele-host", "--l1-head", &B256::ZERO.to_string()])
                .unwrap();
        assert_eq!(cfg.check(), Err(ConfigError::InvalidL1Head));
    }

    #[test]
    fn test_check_requires_datadir_offline() {
        let one_hash_str =
            "0x0000000000000000000000000000000000000000000000000000000000000001";
        let cfg = HostCli::try_parse_from(["stele-host", "--l1-head", one_hash_str]).unwrap();
        assert_eq!(cfg.check(), Err(ConfigError::DataDirRequired));
    }

    #[test]
    fn test_check_rejects_exec_in_server_mode() {
        let one_hash_str =
            "0x0000000000000000000000000000000000000000000000000000000000000001";
        let cfg = HostCli::try_parse_from([
            "stele-host",
            "--l1-head",
            one_hash_str,
            "--data-dir",
            "dummy",
            "--server",
            "--exec",
            "client",
        ])
        .unwrap();
        assert_eq!(cfg.check(), Err(ConfigError::NoExecInServerMode));
    }
}
