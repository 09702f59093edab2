//! Disk throughput sensors.

use super::{field, SensorSource, Tracked};
use crate::platform::Platform;
use crate::rate::RateEstimator;
use std::sync::Arc;
use std::time::Instant;

/// Transfer direction of a disk counter stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskDirection {
    Read,
    Write,
}

/// Throughput of all physical disks in one direction, in MB/s.
pub struct DiskSpeed {
    id: &'static str,
    direction: DiskDirection,
    platform: Arc<dyn Platform>,
    estimator: RateEstimator,
    state: Tracked,
}

impl DiskSpeed {
    pub fn new(platform: Arc<dyn Platform>, direction: DiskDirection) -> Self {
        let id = match direction {
            DiskDirection::Read => "DiskReadSpeed",
            DiskDirection::Write => "DiskWriteSpeed",
        };
        Self {
            id,
            direction,
            platform,
            estimator: RateEstimator::new(),
            state: Tracked::starting_at(0.0),
        }
    }

    /// Reads the counters and feeds them to the estimator as of `now`.
    pub fn sample_at(&mut self, now: Instant) -> f64 {
        let result = self.platform.disk_counters().map(|counters| {
            let bytes = match self.direction {
                DiskDirection::Read => counters.read_bytes,
                DiskDirection::Write => counters.write_bytes,
            };
            self.estimator.update(bytes, now)
        });
        self.state.record(self.id, result)
    }
}

impl SensorSource for DiskSpeed {
    fn id(&self) -> &str {
        self.id
    }

    fn numeric(&mut self) -> f64 {
        self.sample_at(Instant::now())
    }

    fn text(&self) -> String {
        let mbps = self.state.last();
        if mbps >= 1000.0 {
            format!("{} GB/s", field(mbps / 1024.0, 5, 1))
        } else {
            format!("{} MB/s", field(mbps, 5, 1))
        }
    }

    fn history(&self) -> Option<Vec<f64>> {
        Some(self.state.values())
    }
}
