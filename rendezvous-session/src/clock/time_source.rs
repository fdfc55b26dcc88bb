use crate::error::ProbeError;
use async_trait::async_trait;

/// Reference clock reachable over the network.
#[async_trait]
pub trait TimeSource: Send + Sync + 'static {
    /// Reference time in Unix milliseconds, truncated to `precision_ms`.
    async fn fetch_reference_time(&self) -> Result<i64, ProbeError>;

    /// Granularity of the reported timestamp.
    fn precision_ms(&self) -> i64 {
        1000
    }
}
