//! Exchange Metrics - write latency sampling
//!
//! Each writer owns one `ExchangeMetrics`; the driver merges them after the
//! barrier. Nothing here is shared while writers run.

use std::time::Duration;

/// Latency samples for write/ack exchanges (nanoseconds)
#[derive(Debug, Default, Clone)]
pub struct ExchangeMetrics {
    pub exchanges: u64,
    pub total_ns: u64,

    // We sample every Nth exchange to keep memory bounded
    pub latency_samples: Vec<u64>,
    sample_rate: usize,
    sample_counter: usize,
}

impl ExchangeMetrics {
    /// Create new metrics collector
    ///
    /// # Arguments
    /// * `sample_rate` - Keep every Nth latency for percentiles (0 is treated as 1)
    pub fn new(sample_rate: usize) -> Self {
        ExchangeMetrics {
            sample_rate: sample_rate.max(1),
            latency_samples: Vec::with_capacity(1_024),
            ..Default::default()
        }
    }

    #[inline]
    pub fn record(&mut self, latency: Duration) {
        let ns = latency.as_nanos().min(u64::MAX as u128) as u64;
        self.exchanges += 1;
        self.total_ns = self.total_ns.saturating_add(ns);

        self.sample_counter += 1;
        if self.sample_counter >= self.sample_rate {
            self.latency_samples.push(ns);
            self.sample_counter = 0;
        }
    }

    /// Fold another worker's metrics into this one.
    pub fn merge(&mut self, other: &ExchangeMetrics) {
        self.exchanges += other.exchanges;
        self.total_ns = self.total_ns.saturating_add(other.total_ns);
        self.latency_samples
            .extend_from_slice(&other.latency_samples);
    }

    /// Calculate percentile from samples
    ///
    /// # Arguments
    /// * `p` - Percentile (0-100), e.g., 50.0 for median, 99.0 for P99
    pub fn percentile(&self, p: f64) -> Option<u64> {
        if self.latency_samples.is_empty() {
            return None;
        }
        let mut sorted = self.latency_samples.clone();
        sorted.sort_unstable();
        let idx = ((p / 100.0) * (sorted.len() - 1) as f64).round() as usize;
        Some(sorted[idx.min(sorted.len() - 1)])
    }

    pub fn min_latency(&self) -> Option<u64> {
        self.latency_samples.iter().copied().min()
    }

    pub fn max_latency(&self) -> Option<u64> {
        self.latency_samples.iter().copied().max()
    }

    /// Mean over every exchange, not just the sampled ones.
    pub fn avg_latency(&self) -> Option<u64> {
        if self.exchanges == 0 {
            return None;
        }
        Some(self.total_ns / self.exchanges)
    }

    /// Emit a one-line summary through `tracing`.
    pub fn log_summary(&self, elapsed: Duration) {
        let secs = elapsed.as_secs_f64();
        let rate = if secs > 0.0 {
            self.exchanges as f64 / secs
        } else {
            0.0
        };
        tracing::info!(
            exchanges = self.exchanges,
            elapsed_ms = elapsed.as_millis() as u64,
            writes_per_sec = rate as u64,
            min_ns = self.min_latency().unwrap_or(0),
            avg_ns = self.avg_latency().unwrap_or(0),
            p50_ns = self.percentile(50.0).unwrap_or(0),
            p99_ns = self.percentile(99.0).unwrap_or(0),
            max_ns = self.max_latency().unwrap_or(0),
            "Write phase latency"
        );
    }
}
