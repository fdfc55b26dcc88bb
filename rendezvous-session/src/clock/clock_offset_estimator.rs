use crate::clock::{LocalClock, OffsetWindow, TimeSource};
use crate::coordinator::SessionConfig;
use crate::error::ProbeError;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Smoothed estimate of `reference_time - local_time`.
///
/// Each probe is a single round trip to the [`TimeSource`]; the estimate is
/// the mean of the last `window_capacity` samples.
pub struct ClockOffsetEstimator {
    source: Arc<dyn TimeSource>,
    clock: Arc<dyn LocalClock>,
    window: RwLock<OffsetWindow>,
    warmup_probes: u64,
    probe_interval: Duration,
    warmup_retry_delay: Duration,
    max_warmup_failures: u32,
}

impl ClockOffsetEstimator {
    pub fn new(
        source: Arc<dyn TimeSource>,
        clock: Arc<dyn LocalClock>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            source,
            clock,
            window: RwLock::new(OffsetWindow::new(config.window_capacity)),
            warmup_probes: config.warmup_probes,
            probe_interval: config.probe_interval(),
            warmup_retry_delay: config.warmup_retry_delay(),
            max_warmup_failures: config.max_warmup_failures.max(1),
        }
    }

    /// Current average offset in milliseconds.
    pub fn average_offset(&self) -> f64 {
        self.window
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .average()
    }

    /// Number of successful probes so far.
    pub fn probe_count(&self) -> u64 {
        self.window
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .recorded()
    }

    pub fn window(&self) -> OffsetWindow {
        self.window
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Local time corrected by the average offset, in Unix milliseconds.
    pub fn estimated_time(&self) -> i64 {
        self.clock.now_ms() + self.average_offset().round() as i64
    }

    /// Delay before the next probe: none during warm-up, the reprobe interval after.
    pub fn next_delay(&self) -> Duration {
        if self.probe_count() <= self.warmup_probes {
            Duration::ZERO
        } else {
            self.probe_interval
        }
    }

    pub fn is_warmed_up(&self) -> bool {
        !self.next_delay().is_zero()
    }

    /// One round trip against the time source. Returns the recorded sample.
    ///
    /// A failed request leaves the window untouched.
    pub async fn probe_once(&self) -> Result<f64, ProbeError> {
        let client_sent = self.clock.now_ms() as f64 + self.average_offset();

        let header_time = self.source.fetch_reference_time().await?;

        // The header is truncated to its precision; assume the midpoint.
        let server_received = header_time as f64 + self.source.precision_ms() as f64 / 2.0;
        let client_received = self.clock.now_ms() as f64;
        let server_time = server_received + (client_received - client_sent) / 2.0;
        let sample = server_time - client_received;

        let (count, average) = {
            let mut window = self.window.write().unwrap_or_else(PoisonError::into_inner);
            window.push(sample);
            (window.recorded(), window.average())
        };

        debug!(
            "Clock probe #{}: sample {:.1}ms, average {:.1}ms",
            count, sample, average
        );
        Ok(sample)
    }

    /// Probe back-to-back until the warm-up burst is done.
    ///
    /// Failed probes are retried after `warmup_retry_delay`; warm-up fails
    /// with the last error after `max_warmup_failures` consecutive failures.
    pub async fn warm_up(&self) -> Result<(), ProbeError> {
        let mut failures = 0;

        while !self.is_warmed_up() {
            match self.probe_once().await {
                Ok(_) => failures = 0,
                Err(e) => {
                    failures += 1;
                    if failures >= self.max_warmup_failures {
                        warn!("Clock warm-up giving up after {} failures", failures);
                        return Err(e);
                    }
                    warn!("Clock probe failed during warm-up ({}): {}", failures, e);
                    tokio::time::sleep(self.warmup_retry_delay).await;
                }
            }
        }

        info!(
            "Clock warm-up complete after {} probes, offset {:.1}ms",
            self.probe_count(),
            self.average_offset()
        );
        Ok(())
    }

    /// Steady-state drift tracking. Never returns; abort the task to stop it.
    pub async fn run_periodic(&self) {
        loop {
            let delay = self.next_delay();
            let delay = if delay.is_zero() {
                self.warmup_retry_delay
            } else {
                delay
            };
            tokio::time::sleep(delay).await;

            if let Err(e) = self.probe_once().await {
                warn!("Periodic clock probe failed: {}", e);
            }
        }
    }
}
