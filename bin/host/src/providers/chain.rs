//! Contains an implementation of the [L1Source] trait over a JSON-RPC
//! provider.

use super::{L1Source, SourceError, SourceResult};
use crate::eth::encode_receipts;
use alloy_consensus::{Header, TxEnvelope};
use alloy_eips::BlockId;
use alloy_primitives::{Bytes, B256};
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_types::{Block, BlockTransactions, BlockTransactionsKind};
use async_trait::async_trait;
use clap::ValueEnum;
use serde::Serialize;

/// The kind of RPC provider backing the L1 source, used to inform the
/// optimal receipt-fetching method.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
pub enum RpcKind {
    /// Fetch receipts with `eth_getBlockReceipts` and re-encode them to the
    /// canonical wire form. Works against any standard node.
    #[default]
    Standard,
    /// Fetch raw RLP receipts with `debug_getRawReceipts`. Cheaper, but
    /// requires the debug namespace.
    Debug,
}

/// An [L1Source] over an HTTP JSON-RPC [RootProvider].
#[derive(Debug, Clone)]
pub struct OnlineL1Source {
    /// The L1 chain provider.
    provider: RootProvider,
    /// The receipt-fetching strategy.
    rpc_kind: RpcKind,
}

impl OnlineL1Source {
    /// Creates a new [OnlineL1Source] over the given provider.
    pub const fn new(provider: RootProvider, rpc_kind: RpcKind) -> Self {
        Self { provider, rpc_kind }
    }

    /// Fetches the block with the given hash, with the requested transaction
    /// representation.
    async fn block_by_hash(&self, hash: B256, kind: BlockTransactionsKind) -> SourceResult<Block> {
        self.provider
            .get_block_by_hash(hash, kind)
            .await
            .map_err(SourceError::from)?
            .ok_or(SourceError::BlockNotFound(hash))
    }
}

#[async_trait]
impl L1Source for OnlineL1Source {
    async fn header_by_hash(&self, hash: B256) -> SourceResult<Header> {
        let block = self.block_by_hash(hash, BlockTransactionsKind::Hashes).await?;
        Ok(block.header.inner)
    }

    async fn block_with_transactions(
        &self,
        hash: B256,
    ) -> SourceResult<(Header, Vec<TxEnvelope>)> {
        let block = self.block_by_hash(hash, BlockTransactionsKind::Full).await?;
        let BlockTransactions::Full(transactions) = block.transactions else {
            return Err(SourceError::InvalidResponse(
                "expected full transaction bodies".to_string(),
            ));
        };

        let envelopes = transactions.into_iter().map(|tx| tx.inner).collect();
        Ok((block.header.inner, envelopes))
    }

    async fn receipts_by_hash(&self, hash: B256) -> SourceResult<(Header, Vec<Bytes>)> {
        let header = self.header_by_hash(hash).await?;

        let raw_receipts = match self.rpc_kind {
            RpcKind::Debug => self
                .provider
                .client()
                .request::<_, Vec<Bytes>>("debug_getRawReceipts", [hash])
                .await
                .map_err(SourceError::from)?,
            RpcKind::Standard => {
                let receipts = self
                    .provider
                    .get_block_receipts(BlockId::Hash(hash.into()))
                    .await
                    .map_err(SourceError::from)?
                    .ok_or(SourceError::BlockNotFound(hash))?;
                encode_receipts(&receipts)
            }
        };

        Ok((header, raw_receipts))
    }
}
