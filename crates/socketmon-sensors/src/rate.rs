//! Throughput estimation from cumulative byte counters.

use crate::BYTES_PER_MB;
use std::time::Instant;
use tracing::debug;

/// One observation of a cumulative counter.
#[derive(Debug, Clone, Copy)]
struct Sample {
    bytes: u64,
    at: Instant,
}

/// Converts successive readings of a monotonic byte counter into MB/s.
#[derive(Debug, Clone, Default)]
pub struct RateEstimator {
    previous: Option<Sample>,
    rate: f64,
}

impl RateEstimator {
    /// Creates an estimator with no prior sample and a rate of 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a new counter reading and returns the current rate in MB/s.
    ///
    /// Without a previous sample, or when no time has elapsed, the stored rate
    /// is kept. The previous sample is replaced on every call. A counter that
    /// went backwards reads as 0 for that cycle.
    pub fn update(&mut self, bytes: u64, now: Instant) -> f64 {
        if let Some(previous) = self.previous {
            let elapsed = now.saturating_duration_since(previous.at).as_secs_f64();
            if elapsed > 0.0 {
                self.rate = match bytes.checked_sub(previous.bytes) {
                    Some(delta) => delta as f64 / elapsed / BYTES_PER_MB,
                    None => {
                        debug!(
                            "Byte counter went backwards ({} -> {}), treating as reset",
                            previous.bytes, bytes
                        );
                        0.0
                    }
                };
            }
        }

        self.previous = Some(Sample { bytes, at: now });
        self.rate
    }

    /// Returns the last computed rate in MB/s.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Returns true once a sample has been recorded.
    pub fn has_sample(&self) -> bool {
        self.previous.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_first_sample_yields_zero() {
        let mut rate = RateEstimator::new();
        assert_eq!(rate.update(1000, Instant::now()), 0.0);
        assert!(rate.has_sample());
    }

    #[test]
    fn test_one_megabyte_per_second() {
        let mut rate = RateEstimator::new();
        let t0 = Instant::now();
        rate.update(1000, t0);
        let mbps = rate.update(1000 + 1_048_576, t0 + Duration::from_secs(1));
        assert_eq!(mbps, 1.0);
    }

    #[test]
    fn test_zero_elapsed_keeps_rate_but_moves_baseline() {
        let mut rate = RateEstimator::new();
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_secs(2);
        rate.update(0, t0);
        assert_eq!(rate.update(4 * 1_048_576, t1), 2.0);

        // Same instant: no new rate, but the baseline becomes 8 MiB.
        assert_eq!(rate.update(8 * 1_048_576, t1), 2.0);

        let mbps = rate.update(9 * 1_048_576, t1 + Duration::from_secs(1));
        assert_eq!(mbps, 1.0);
    }

    #[test]
    fn test_counter_reset_clamps_to_zero() {
        let mut rate = RateEstimator::new();
        let t0 = Instant::now();
        rate.update(10 * 1_048_576, t0);
        assert_eq!(rate.update(1_048_576, t0 + Duration::from_secs(1)), 0.0);
        assert_eq!(
            rate.update(2 * 1_048_576, t0 + Duration::from_secs(2)),
            1.0
        );
    }
}
