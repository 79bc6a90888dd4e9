//! Ethereum utilities for the host binary.

use alloy_consensus::{Receipt, ReceiptEnvelope, ReceiptWithBloom};
use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::Bytes;
use alloy_provider::RootProvider;
use alloy_rpc_client::RpcClient;
use alloy_rpc_types::{Log, TransactionReceipt};
use alloy_transport_http::Http;
use anyhow::{anyhow, Result};
use reqwest::Client;

mod precompiles;
pub(crate) use precompiles::kzg_point_evaluation;

/// Returns an HTTP [RootProvider] for the given URL.
pub fn http_provider(url: &str) -> Result<RootProvider> {
    let url = url.parse().map_err(|e| anyhow!("invalid RPC URL {url}: {e}"))?;
    let http = Http::<Client>::new(url);
    Ok(RootProvider::new(RpcClient::new(http, true)))
}

/// Encodes a list of RPC receipts to their canonical EIP-2718 wire form, the
/// representation the receipt trie is built over.
pub(crate) fn encode_receipts(receipts: &[TransactionReceipt]) -> Vec<Bytes> {
    receipts
        .iter()
        .map(|receipt| consensus_receipt(&receipt.inner).encoded_2718().into())
        .collect()
}

/// Rebuilds a consensus receipt envelope from an RPC one by stripping the
/// per-log RPC metadata.
fn consensus_receipt(envelope: &ReceiptEnvelope<Log>) -> ReceiptEnvelope {
    let remap = |rwb: &ReceiptWithBloom<Receipt<Log>>| ReceiptWithBloom {
        receipt: Receipt {
            status: rwb.receipt.status,
            cumulative_gas_used: rwb.receipt.cumulative_gas_used,
            logs: rwb.receipt.logs.iter().map(|log| log.inner.clone()).collect(),
        },
        logs_bloom: rwb.logs_bloom,
    };

    match envelope {
        ReceiptEnvelope::Legacy(rwb) => ReceiptEnvelope::Legacy(remap(rwb)),
        ReceiptEnvelope::Eip2930(rwb) => ReceiptEnvelope::Eip2930(remap(rwb)),
        ReceiptEnvelope::Eip1559(rwb) => ReceiptEnvelope::Eip1559(remap(rwb)),
        ReceiptEnvelope::Eip4844(rwb) => ReceiptEnvelope::Eip4844(remap(rwb)),
        ReceiptEnvelope::Eip7702(rwb) => ReceiptEnvelope::Eip7702(remap(rwb)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use alloy_primitives::{address, b256, Bloom, LogData};

    #[test]
    fn test_consensus_receipt_strips_rpc_metadata() {
        let prim_log = alloy_primitives::Log {
            address: address!("4200000000000000000000000000000000000015"),
            data: LogData::new_unchecked(
                vec![b256!("00000000000000000000000000000000000000000000000000000000000000aa")],
                vec![0xbe, 0xef].into(),
            ),
        };
        let rpc_log = Log {
            inner: prim_log.clone(),
            block_number: Some(1),
            log_index: Some(0),
            ..Default::default()
        };

        let rpc_envelope = ReceiptEnvelope::Eip1559(ReceiptWithBloom {
            receipt: Receipt {
                status: true.into(),
                cumulative_gas_used: 21_000,
                logs: vec![rpc_log],
            },
            logs_bloom: Bloom::ZERO,
        });
        let expected = ReceiptEnvelope::Eip1559(ReceiptWithBloom {
            receipt: Receipt {
                status: true.into(),
                cumulative_gas_used: 21_000,
                logs: vec![prim_log],
            },
            logs_bloom: Bloom::ZERO,
        });

        let converted = consensus_receipt(&rpc_envelope);
        assert_eq!(converted.encoded_2718(), expected.encoded_2718());
        // EIP-1559 receipts carry the type byte on the wire.
        assert_eq!(converted.encoded_2718()[0], 0x02);
    }
}
