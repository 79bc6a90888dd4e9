//! Contains retrying decorators over the upstream source traits.
//!
//! A stalled prefetch stalls the client program with it, so transient
//! upstream failures are retried with bounded exponential backoff before
//! they are surfaced. Deterministic failures propagate immediately.

use super::{BlobSidecarSource, L1Source, SourceError, SourceResult};
use alloy_consensus::{Header, TxEnvelope};
use alloy_eips::eip4844::{BlobTransactionSidecarItem, IndexedBlobHash};
use alloy_primitives::{Bytes, B256};
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use std::time::Duration;
use tracing::debug;

/// The shape of the retry schedule applied to upstream calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: usize,
    /// Initial delay for exponential backoff.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Creates a `backon` [ExponentialBuilder] from this policy.
    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.initial_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries)
            .with_jitter()
    }
}

/// A retrying decorator over an [L1Source].
#[derive(Debug, Clone)]
pub struct RetryingL1Source<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S> RetryingL1Source<S> {
    /// Creates a new [RetryingL1Source] wrapping the given source.
    pub const fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<S> L1Source for RetryingL1Source<S>
where
    S: L1Source + Send + Sync,
{
    async fn header_by_hash(&self, hash: B256) -> SourceResult<Header> {
        (|| async { self.inner.header_by_hash(hash).await })
            .retry(self.policy.backoff())
            .when(SourceError::is_transient)
            .notify(|err, dur| {
                debug!(target: "retrying-source", error = %err, delay = ?dur, "Retrying header_by_hash");
            })
            .await
    }

    async fn block_with_transactions(
        &self,
        hash: B256,
    ) -> SourceResult<(Header, Vec<TxEnvelope>)> {
        (|| async { self.inner.block_with_transactions(hash).await })
            .retry(self.policy.backoff())
            .when(SourceError::is_transient)
            .notify(|err, dur| {
                debug!(target: "retrying-source", error = %err, delay = ?dur, "Retrying block_with_transactions");
            })
            .await
    }

    async fn receipts_by_hash(&self, hash: B256) -> SourceResult<(Header, Vec<Bytes>)> {
        (|| async { self.inner.receipts_by_hash(hash).await })
            .retry(self.policy.backoff())
            .when(SourceError::is_transient)
            .notify(|err, dur| {
                debug!(target: "retrying-source", error = %err, delay = ?dur, "Retrying receipts_by_hash");
            })
            .await
    }
}

/// A retrying decorator over a [BlobSidecarSource].
#[derive(Debug, Clone)]
pub struct RetryingBlobSource<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S> RetryingBlobSource<S> {
    /// Creates a new [RetryingBlobSource] wrapping the given source.
    pub const fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<S> BlobSidecarSource for RetryingBlobSource<S>
where
    S: BlobSidecarSource + Send + Sync,
{
    async fn blob_sidecars(
        &self,
        timestamp: u64,
        hashes: &[IndexedBlobHash],
    ) -> SourceResult<Vec<BlobTransactionSidecarItem>> {
        (|| async { self.inner.blob_sidecars(timestamp, hashes).await })
            .retry(self.policy.backoff())
            .when(SourceError::is_transient)
            .notify(|err, dur| {
                debug!(target: "retrying-source", error = %err, delay = ?dur, "Retrying blob_sidecars");
            })
            .await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// An [L1Source] that fails a configured number of times before
    /// succeeding, counting every call it receives.
    #[derive(Debug)]
    struct FlakySource {
        calls: AtomicUsize,
        failures: usize,
        error: fn() -> SourceError,
    }

    impl FlakySource {
        fn new(failures: usize, error: fn() -> SourceError) -> Self {
            Self { calls: AtomicUsize::new(0), failures, error }
        }
    }

    #[async_trait]
    impl L1Source for FlakySource {
        async fn header_by_hash(&self, _: B256) -> SourceResult<Header> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
                return Err((self.error)());
            }
            Ok(Header::default())
        }

        async fn block_with_transactions(
            &self,
            _: B256,
        ) -> SourceResult<(Header, Vec<TxEnvelope>)> {
            unimplemented!()
        }

        async fn receipts_by_hash(&self, _: B256) -> SourceResult<(Header, Vec<Bytes>)> {
            unimplemented!()
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 5,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn test_transient_errors_retried() {
        let source =
            RetryingL1Source::new(FlakySource::new(2, || SourceError::Status(503)), fast_policy());

        source.header_by_hash(B256::ZERO).await.unwrap();
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_deterministic_errors_propagate_immediately() {
        let source = RetryingL1Source::new(
            FlakySource::new(usize::MAX, || SourceError::Rpc("header not found".to_string())),
            fast_policy(),
        );

        assert!(matches!(
            source.header_by_hash(B256::ZERO).await,
            Err(SourceError::Rpc(_))
        ));
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_attempts_bounded() {
        let source =
            RetryingL1Source::new(FlakySource::new(usize::MAX, || SourceError::Status(500)), fast_policy());

        assert!(matches!(
            source.header_by_hash(B256::ZERO).await,
            Err(SourceError::Status(500))
        ));
        // Initial attempt plus the configured number of retries.
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_transient_classification() {
        assert!(SourceError::Transport("reset".to_string()).is_transient());
        assert!(SourceError::Status(503).is_transient());
        assert!(SourceError::Status(429).is_transient());
        assert!(!SourceError::Status(404).is_transient());
        assert!(!SourceError::Rpc("bad params".to_string()).is_transient());
        assert!(!SourceError::BlockNotFound(B256::ZERO).is_transient());
    }
}
