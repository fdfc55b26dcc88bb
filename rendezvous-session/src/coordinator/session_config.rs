use rendezvous_core::MediaOptions;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Session settings. Every field has a default, so a partial JSON object is enough.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub app: String,
    pub room: String,
    pub media: MediaOptions,
    /// Number of recent clock samples averaged into the offset.
    pub window_capacity: usize,
    /// Probes run back-to-back before switching to `probe_interval_ms`.
    pub warmup_probes: u64,
    pub probe_interval_ms: u64,
    pub warmup_retry_delay_ms: u64,
    /// Consecutive failed probes after which warm-up gives up.
    pub max_warmup_failures: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            app: "default".to_owned(),
            room: "default".to_owned(),
            media: MediaOptions::default(),
            window_capacity: 10,
            warmup_probes: 10,
            probe_interval_ms: 5 * 60 * 1000,
            warmup_retry_delay_ms: 250,
            max_warmup_failures: 5,
        }
    }
}

impl SessionConfig {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    pub fn warmup_retry_delay(&self) -> Duration {
        Duration::from_millis(self.warmup_retry_delay_ms)
    }
}
