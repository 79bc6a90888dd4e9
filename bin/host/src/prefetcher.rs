//! Contains the [Prefetcher], which fetches preimages from upstream L1
//! sources in response to hints and writes them through the key scheme into
//! the key-value store.

use crate::{
    backend::{util::store_ordered_trie, BackendError, HintRouter, PreimageFetcher},
    eth::kzg_point_evaluation,
    kv::{KeyValueStore, KvError},
    providers::{
        BlobSidecarSource, L1Source, RetryPolicy, RetryingBlobSource, RetryingL1Source,
        SourceError,
    },
};
use alloy_consensus::Header;
use alloy_eips::{
    eip2718::Encodable2718,
    eip4844::{IndexedBlobHash, FIELD_ELEMENTS_PER_BLOB},
};
use alloy_primitives::{hex, keccak256, B256};
use async_trait::async_trait;
use std::sync::Arc;
use stele_preimage::{Hint, HintParsingError, HintType, PreimageKey, PreimageKeyType};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{trace, warn};

/// The stored outcome of a successful KZG point evaluation.
const KZG_POINT_EVALUATION_SUCCESS: [u8; 1] = [1];

/// The stored outcome of a failed KZG point evaluation.
const KZG_POINT_EVALUATION_FAILURE: [u8; 1] = [0];

/// Errors that can occur while prefetching data for a hint.
#[derive(Error, Debug)]
pub enum PrefetchError {
    /// The recorded hint could not be parsed.
    #[error(transparent)]
    MalformedHint(#[from] HintParsingError),
    /// The hint payload length does not match its declared type.
    #[error("invalid {hint_type} hint payload length: {len}")]
    InvalidHintPayload {
        /// The type of the hint.
        hint_type: HintType,
        /// The length of the rejected payload.
        len: usize,
    },
    /// The upstream source failed after exhausting retries.
    #[error(transparent)]
    Upstream(#[from] SourceError),
    /// Fetched data failed verification against the requested hash or root.
    #[error("upstream data failed verification: {0}")]
    Verification(String),
    /// Writing through to the store failed.
    #[error(transparent)]
    Store(#[from] KvError),
}

/// The [Prefetcher] is responsible for fetching preimages from upstream
/// sources in response to hints, decomposing them into individually keyed
/// values, and populating the key-value store with them.
///
/// One instance serves one oracle session: the last-hint cell is private to
/// the session, while the store may be shared across sessions. Fetches are
/// idempotent, so sessions racing on the same key write identical bytes.
#[derive(Debug)]
pub struct Prefetcher<L1, B, KV>
where
    L1: L1Source,
    B: BlobSidecarSource,
    KV: KeyValueStore + ?Sized,
{
    /// Key-value store for preimages.
    kv_store: Arc<RwLock<KV>>,
    /// The L1 chain source.
    l1_source: RetryingL1Source<L1>,
    /// The L1 blob sidecar source.
    blob_source: RetryingBlobSource<B>,
    /// Skip verification of fetched headers and trie roots.
    trust_rpc: bool,
    /// Drop the recorded hint once a prefetch completes without producing the
    /// requested key, instead of refetching on every subsequent miss.
    clear_stale_hint: bool,
    /// The last hint that was received. [None] if no hint has been received
    /// yet, or if it was cleared as stale.
    last_hint: RwLock<Option<String>>,
}

impl<L1, B, KV> Prefetcher<L1, B, KV>
where
    L1: L1Source + Send + Sync,
    B: BlobSidecarSource + Send + Sync,
    KV: KeyValueStore + Send + Sync + ?Sized,
{
    /// Create a new [Prefetcher] over the given [KeyValueStore] and upstream
    /// sources. The sources are wrapped with the default [RetryPolicy].
    pub fn new(
        kv_store: Arc<RwLock<KV>>,
        l1_source: L1,
        blob_source: B,
        trust_rpc: bool,
        clear_stale_hint: bool,
    ) -> Self {
        Self::with_retry_policy(
            kv_store,
            l1_source,
            blob_source,
            trust_rpc,
            clear_stale_hint,
            RetryPolicy::default(),
        )
    }

    /// Create a new [Prefetcher] with an explicit [RetryPolicy] for its
    /// upstream sources.
    pub fn with_retry_policy(
        kv_store: Arc<RwLock<KV>>,
        l1_source: L1,
        blob_source: B,
        trust_rpc: bool,
        clear_stale_hint: bool,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            kv_store,
            l1_source: RetryingL1Source::new(l1_source, policy),
            blob_source: RetryingBlobSource::new(blob_source, policy),
            trust_rpc,
            clear_stale_hint,
            last_hint: RwLock::new(None),
        }
    }

    /// Fetch the data for the given hint and insert the resulting preimages
    /// into the key-value store.
    async fn prefetch(&self, hint: &str) -> Result<(), PrefetchError> {
        let Hint { hint_type, hint_data } = hint.parse::<Hint>()?;
        trace!(target: "prefetcher", "Fetching hint: {hint_type} 0x{}", hex::encode(&hint_data));

        match hint_type {
            HintType::L1BlockHeader => {
                let hash = payload_as_hash(hint_type, &hint_data)?;

                let header = self.l1_source.header_by_hash(hash).await?;
                self.verify_header(hash, &header)?;

                let mut kv_lock = self.kv_store.write().await;
                kv_lock.set(
                    PreimageKey::new_keccak256(*hash).into(),
                    alloy_rlp::encode(&header),
                )?;
            }
            HintType::L1Transactions => {
                let hash = payload_as_hash(hint_type, &hint_data)?;

                let (header, transactions) =
                    self.l1_source.block_with_transactions(hash).await?;
                self.verify_header(hash, &header)?;

                let encoded =
                    transactions.iter().map(|tx| tx.encoded_2718()).collect::<Vec<_>>();
                let root = store_ordered_trie(self.kv_store.as_ref(), &encoded).await?;
                self.verify_trie_root("transaction", root, header.transactions_root)?;
            }
            HintType::L1Receipts => {
                let hash = payload_as_hash(hint_type, &hint_data)?;

                let (header, receipts) = self.l1_source.receipts_by_hash(hash).await?;
                self.verify_header(hash, &header)?;

                let root = store_ordered_trie(self.kv_store.as_ref(), &receipts).await?;
                self.verify_trie_root("receipt", root, header.receipts_root)?;
            }
            HintType::L1Blob => {
                if hint_data.len() != 48 {
                    return Err(PrefetchError::InvalidHintPayload {
                        hint_type,
                        len: hint_data.len(),
                    });
                }

                let length_err =
                    || PrefetchError::InvalidHintPayload { hint_type, len: hint_data.len() };
                let hash = B256::from_slice(&hint_data[..32]);
                let index_bytes: [u8; 8] =
                    hint_data[32..40].try_into().map_err(|_| length_err())?;
                let timestamp_bytes: [u8; 8] =
                    hint_data[40..48].try_into().map_err(|_| length_err())?;
                let index = u64::from_be_bytes(index_bytes);
                let timestamp = u64::from_be_bytes(timestamp_bytes);

                let indexed_hash = IndexedBlobHash { index, hash };
                let mut sidecars =
                    self.blob_source.blob_sidecars(timestamp, &[indexed_hash]).await?;
                if sidecars.len() != 1 {
                    return Err(PrefetchError::Verification(format!(
                        "expected 1 blob sidecar, got {}",
                        sidecars.len()
                    )));
                }
                let sidecar = sidecars.remove(0);

                let mut kv_lock = self.kv_store.write().await;

                // The commitment is the sha256 preimage of the versioned hash.
                kv_lock.set(
                    PreimageKey::new(*hash, PreimageKeyType::Sha256).into(),
                    sidecar.kzg_commitment.to_vec(),
                )?;

                // Each of the 4096 field elements is written twice: once under
                // the keccak image of its 80-byte blob key, through which the
                // client discovers it, and once under the blob tag the client
                // re-keys it with.
                let mut blob_key = [0u8; 80];
                blob_key[..48].copy_from_slice(sidecar.kzg_commitment.as_ref());
                for i in 0..FIELD_ELEMENTS_PER_BLOB {
                    blob_key[72..].copy_from_slice(i.to_be_bytes().as_ref());
                    let blob_key_hash = keccak256(blob_key.as_ref());

                    kv_lock.set(
                        PreimageKey::new_keccak256(*blob_key_hash).into(),
                        blob_key.to_vec(),
                    )?;
                    kv_lock.set(
                        PreimageKey::new(*blob_key_hash, PreimageKeyType::Blob).into(),
                        sidecar.blob[(i as usize) << 5..(i as usize + 1) << 5].to_vec(),
                    )?;
                }
            }
            HintType::L1KZGPointEvaluation => {
                let result = if kzg_point_evaluation(&hint_data) {
                    KZG_POINT_EVALUATION_SUCCESS
                } else {
                    KZG_POINT_EVALUATION_FAILURE
                };
                let input_hash = keccak256(hint_data.as_ref());

                let mut kv_lock = self.kv_store.write().await;
                kv_lock
                    .set(PreimageKey::new_keccak256(*input_hash).into(), hint_data.to_vec())?;
                kv_lock.set(
                    PreimageKey::new(*input_hash, PreimageKeyType::KZGPointEvaluation).into(),
                    result.to_vec(),
                )?;
            }
        }

        Ok(())
    }

    /// Checks a fetched header against the hash it was requested by.
    fn verify_header(&self, requested: B256, header: &Header) -> Result<(), PrefetchError> {
        if self.trust_rpc {
            return Ok(());
        }

        let actual = header.hash_slow();
        if actual != requested {
            return Err(PrefetchError::Verification(format!(
                "fetched header hashes to {actual}, requested {requested}"
            )));
        }
        Ok(())
    }

    /// Checks a computed trie root against the corresponding header field.
    fn verify_trie_root(
        &self,
        kind: &str,
        computed: B256,
        expected: B256,
    ) -> Result<(), PrefetchError> {
        if !self.trust_rpc && computed != expected {
            return Err(PrefetchError::Verification(format!(
                "{kind} trie root {computed} does not match header root {expected}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl<L1, B, KV> HintRouter for Prefetcher<L1, B, KV>
where
    L1: L1Source + Send + Sync,
    B: BlobSidecarSource + Send + Sync,
    KV: KeyValueStore + Send + Sync + ?Sized,
{
    /// Records the hint. Hints are never acted on eagerly; all I/O happens on
    /// the first miss that follows.
    async fn route_hint(&self, hint: String) -> Result<(), BackendError> {
        trace!(target: "prefetcher", "Received hint: {hint}");
        self.last_hint.write().await.replace(hint);
        Ok(())
    }
}

#[async_trait]
impl<L1, B, KV> PreimageFetcher for Prefetcher<L1, B, KV>
where
    L1: L1Source + Send + Sync,
    B: BlobSidecarSource + Send + Sync,
    KV: KeyValueStore + Send + Sync + ?Sized,
{
    async fn get_preimage(&self, key: PreimageKey) -> Result<Vec<u8>, BackendError> {
        trace!(target: "prefetcher", "Pre-image requested. Key: {key}");

        // Acquire a read lock on the key-value store, and drop it before the
        // prefetch loop; prefetching takes the write lock.
        let kv_lock = self.kv_store.read().await;
        let mut preimage = kv_lock.get(key.into());
        drop(kv_lock);

        // Keep retrying the prefetch as long as the key is missing and a hint
        // is recorded. A single fetch populates many keys, so one hint can
        // satisfy a run of misses; the loop also covers values lost between
        // write and re-read on a flaky filesystem, since fetches are
        // idempotent.
        while matches!(preimage, Err(KvError::NotFound)) {
            let Some(hint) = self.last_hint.read().await.clone() else {
                break;
            };

            self.prefetch(&hint).await.map_err(BackendError::Prefetch)?;

            let kv_lock = self.kv_store.read().await;
            preimage = kv_lock.get(key.into());
            drop(kv_lock);

            if matches!(preimage, Err(KvError::NotFound)) {
                warn!(
                    target: "prefetcher",
                    "Prefetched hint {hint} without producing key {key}"
                );
                if self.clear_stale_hint {
                    self.last_hint.write().await.take();
                }
            }
        }

        preimage.map_err(Into::into)
    }
}

/// Interprets a hint payload as a 32-byte block hash.
fn payload_as_hash(hint_type: HintType, data: &[u8]) -> Result<B256, PrefetchError> {
    if data.len() != 32 {
        return Err(PrefetchError::InvalidHintPayload { hint_type, len: data.len() });
    }
    Ok(B256::from_slice(data))
}
