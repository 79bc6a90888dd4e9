//! Contains an implementation of the [BlobSidecarSource] trait over the
//! beacon node API.

use super::{BlobSidecarSource, OnlineBeaconClient, SourceError, SourceResult};
use alloy_eips::eip4844::{kzg_to_versioned_hash, BlobTransactionSidecarItem, IndexedBlobHash};
use async_trait::async_trait;
use c_kzg::{ethereum_kzg_settings, Blob as CKzgBlob, Bytes48, KzgProof};

/// A [BlobSidecarSource] over an [OnlineBeaconClient].
///
/// Blob sidecars are addressed by L1 block timestamp rather than slot, so
/// the provider discovers the beacon genesis time and slot interval at
/// construction and performs the conversion itself.
#[derive(Debug, Clone)]
pub struct OnlineBlobProvider {
    /// The beacon API client.
    beacon_client: OnlineBeaconClient,
    /// Beacon genesis time used for the time to slot conversion.
    genesis_time: u64,
    /// Slot interval used for the time to slot conversion.
    slot_interval: u64,
}

impl OnlineBlobProvider {
    /// Creates a new [OnlineBlobProvider], loading the genesis time and slot
    /// interval from the beacon node.
    pub async fn init(beacon_client: OnlineBeaconClient) -> SourceResult<Self> {
        let genesis_time = beacon_client.beacon_genesis().await?.data.genesis_time;
        let slot_interval = beacon_client.config_spec().await?.data.seconds_per_slot;
        Ok(Self { beacon_client, genesis_time, slot_interval })
    }

    /// Creates a new [OnlineBlobProvider] with a known genesis time and slot
    /// interval.
    pub const fn new_with_timing(
        beacon_client: OnlineBeaconClient,
        genesis_time: u64,
        slot_interval: u64,
    ) -> Self {
        Self { beacon_client, genesis_time, slot_interval }
    }

    /// Computes the slot for the given timestamp.
    fn slot(&self, timestamp: u64) -> SourceResult<u64> {
        if timestamp < self.genesis_time {
            return Err(SourceError::SlotDerivation { timestamp, genesis: self.genesis_time });
        }
        Ok((timestamp - self.genesis_time) / self.slot_interval)
    }
}

#[async_trait]
impl BlobSidecarSource for OnlineBlobProvider {
    async fn blob_sidecars(
        &self,
        timestamp: u64,
        hashes: &[IndexedBlobHash],
    ) -> SourceResult<Vec<BlobTransactionSidecarItem>> {
        if hashes.is_empty() {
            return Ok(Vec::new());
        }

        let slot = self.slot(timestamp)?;
        let bundle = self.beacon_client.beacon_blob_sidecars(slot).await?;

        // Filter the returned sidecars down to the requested indices, in
        // request order, and verify each against its versioned hash and KZG
        // proof before handing it out.
        hashes
            .iter()
            .map(|hash| {
                let sidecar = bundle
                    .data
                    .iter()
                    .find(|sidecar| sidecar.index == hash.index)
                    .ok_or_else(|| {
                        SourceError::InvalidResponse(format!(
                            "no sidecar with index {} in slot {slot}",
                            hash.index
                        ))
                    })?;

                let item = BlobTransactionSidecarItem {
                    index: sidecar.index,
                    blob: sidecar.blob.clone(),
                    kzg_commitment: sidecar.kzg_commitment,
                    kzg_proof: sidecar.kzg_proof,
                };
                verify_sidecar(&item, hash)?;
                Ok(item)
            })
            .collect()
    }
}

/// Verifies a sidecar against the versioned hash it was requested by: the
/// commitment must hash to it, and the KZG blob proof must hold.
fn verify_sidecar(item: &BlobTransactionSidecarItem, hash: &IndexedBlobHash) -> SourceResult<()> {
    let versioned_hash = kzg_to_versioned_hash(item.kzg_commitment.as_slice());
    if versioned_hash != hash.hash {
        return Err(SourceError::InvalidResponse(format!(
            "sidecar {} commits to versioned hash {versioned_hash}, requested {}",
            item.index, hash.hash
        )));
    }

    let blob = CKzgBlob::new(item.blob.0);
    let valid = KzgProof::verify_blob_kzg_proof(
        &blob,
        &Bytes48::new(item.kzg_commitment.0),
        &Bytes48::new(item.kzg_proof.0),
        ethereum_kzg_settings(),
    )
    .map_err(|e| SourceError::InvalidResponse(e.to_string()))?;
    if !valid {
        return Err(SourceError::InvalidResponse(format!(
            "sidecar {} failed KZG blob proof verification",
            item.index
        )));
    }
    Ok(())
}
