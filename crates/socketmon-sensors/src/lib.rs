//! Socketmon Sensor Library
//!
//! Normalizes platform-specific hardware telemetry (per-socket CPU load,
//! temperature, frequency and fan speed, memory clock, disk throughput, NVMe
//! temperature) into a uniform numeric / text / history interface for display
//! panels.

pub mod error;
pub mod history;
pub mod memo;
pub mod platform;
pub mod rate;
pub mod registry;
pub mod resolver;
pub mod sensors;
pub mod subprocess;
pub mod topology;
pub mod tree;

pub use error::{Error, Result};
pub use history::History;
pub use platform::{Platform, PlatformKind, PlatformOptions};
pub use registry::{Reading, SensorRegistry};
pub use sensors::SensorSource;

/// Number of samples kept for trend display.
pub const HISTORY_LEN: usize = 10;

/// Bytes per megabyte used for throughput figures.
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
