//! Sensor sources consumed by the display renderer.
//!
//! Every source exposes a numeric reading (NaN when unavailable), a
//! fixed-width text rendering of the last reading, and optionally the recent
//! history for line graphs. Failures never escape a source.

mod cpu;
mod disk;
mod memory;
mod nvme;
#[cfg(test)]
pub(crate) mod testing;

pub use cpu::{CpuFanSpeed, CpuFrequency, CpuMaxFrequency, CpuPercentage, CpuTemperature};
pub use disk::{DiskDirection, DiskSpeed};
pub use memory::MemoryClockSpeed;
pub use nvme::NvmeTemperature;

use crate::{History, Result};
use tracing::debug;

/// A metric the renderer can bind to a widget by its id.
pub trait SensorSource: Send {
    /// Returns the stable metric id (e.g. "Cpu0Percentage").
    fn id(&self) -> &str;

    /// Reads the sensor, records the result and returns it (NaN if unavailable).
    fn numeric(&mut self) -> f64;

    /// Formats the last recorded value with its unit.
    fn text(&self) -> String;

    /// Returns the recent values, oldest first, if the metric keeps a history.
    fn history(&self) -> Option<Vec<f64>> {
        None
    }
}

/// Last value plus history, shared by the trending sensors.
#[derive(Debug, Clone)]
pub(crate) struct Tracked {
    last: f64,
    history: History,
}

impl Tracked {
    pub fn new() -> Self {
        Self::starting_at(f64::NAN)
    }

    pub fn starting_at(value: f64) -> Self {
        Self {
            last: value,
            history: History::new(),
        }
    }

    /// Stores a read result, mapping errors to NaN.
    pub fn record(&mut self, id: &str, result: Result<f64>) -> f64 {
        let value = settle(id, result);
        self.last = value;
        self.history.push(value);
        value
    }

    pub fn last(&self) -> f64 {
        self.last
    }

    pub fn values(&self) -> Vec<f64> {
        self.history.values()
    }
}

/// Maps a read result to a number, logging why it is unavailable.
pub(crate) fn settle(id: &str, result: Result<f64>) -> f64 {
    match result {
        Ok(value) => value,
        Err(e) if e.is_transient() => {
            debug!("{}: read failed, retrying next poll: {}", id, e);
            f64::NAN
        }
        Err(e) => {
            debug!("{}: {}", id, e);
            f64::NAN
        }
    }
}

/// Right-aligns `value` in a field of `width` with `precision` decimals.
///
/// NaN renders as "N/A" in the same field so the text never shrinks.
pub(crate) fn field(value: f64, width: usize, precision: usize) -> String {
    if value.is_nan() {
        format!("{:>width$}", "N/A", width = width)
    } else {
        format!("{:>width$.precision$}", value, width = width, precision = precision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_field_padding() {
        assert_eq!(field(7.0, 3, 0), "  7");
        assert_eq!(field(100.0, 3, 0), "100");
        assert_eq!(field(3.456, 4, 2), "3.46");
        assert_eq!(field(f64::NAN, 3, 0), "N/A");
        assert_eq!(field(f64::NAN, 5, 1), "  N/A");
    }

    #[test]
    fn test_tracked_records_failures_as_nan() {
        let mut tracked = Tracked::new();
        assert_eq!(tracked.record("t", Ok(4.0)), 4.0);
        assert!(tracked
            .record("t", Err(Error::unavailable("gone")))
            .is_nan());
        assert!(tracked.last().is_nan());
        let values = tracked.values();
        assert_eq!(values[8], 4.0);
        assert!(values[9].is_nan());
    }
}
