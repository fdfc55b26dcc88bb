use async_trait::async_trait;
use rendezvous_session::{LocalClock, ProbeError, SystemClock, TimeSource};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Reference clock running `offset_ms` ahead of the local clock, with
/// millisecond precision so the estimate converges on the exact offset.
pub struct OffsetTimeSource {
    offset_ms: i64,
    latency: Duration,
    probes: Arc<AtomicUsize>,
}

impl OffsetTimeSource {
    pub fn new(offset_ms: i64) -> Self {
        Self::with_latency(offset_ms, Duration::ZERO)
    }

    /// Each probe takes `latency` to answer.
    pub fn with_latency(offset_ms: i64, latency: Duration) -> Self {
        Self {
            offset_ms,
            latency,
            probes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of probes answered.
    pub fn probes(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.probes)
    }
}

#[async_trait]
impl TimeSource for OffsetTimeSource {
    async fn fetch_reference_time(&self) -> Result<i64, ProbeError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.probes.fetch_add(1, Ordering::SeqCst);
        Ok(SystemClock.now_ms() + self.offset_ms)
    }

    fn precision_ms(&self) -> i64 {
        0
    }
}

/// Reference clock that is never reachable.
pub struct UnreachableTimeSource {
    latency: Duration,
    attempts: Arc<AtomicUsize>,
}

impl UnreachableTimeSource {
    pub fn new() -> Self {
        Self::with_latency(Duration::ZERO)
    }

    /// Each attempt takes `latency` to fail.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn attempts(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.attempts)
    }
}

#[async_trait]
impl TimeSource for UnreachableTimeSource {
    async fn fetch_reference_time(&self) -> Result<i64, ProbeError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.latency.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.latency).await;
        }
        Err(ProbeError::Request("connection refused".to_owned()))
    }
}
