//! Error types for the sensor library.

use std::time::Duration;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading a sensor.
///
/// None of these reach the renderer: sensors map them to NaN. The split
/// between absent and transient kinds only drives logging and retry.
#[derive(Error, Debug)]
pub enum Error {
    /// The platform or binding does not provide this metric.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The hardware unit exists but carries no matching live sensor.
    #[error("no {sensor} sensor on {hardware}")]
    SensorNotFound { hardware: String, sensor: String },

    /// CPU topology metadata could not be read.
    #[error("topology unreadable: {0}")]
    TopologyUnreadable(String),

    /// OS counter file I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// OS counter file had unexpected contents.
    #[error("parse error: {0}")]
    Parse(String),

    /// External command could not be run or exited unsuccessfully.
    #[error("command `{command}` failed: {reason}")]
    CommandFailed { command: String, reason: String },

    /// External command did not finish in time.
    #[error("command `{command}` timed out after {timeout:?}")]
    CommandTimeout { command: String, timeout: Duration },

    /// Hardware-monitor binding query failed.
    #[error("hardware monitor error: {0}")]
    Binding(String),
}

impl Error {
    /// Returns true if the failure may clear up on the next poll.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Io(_)
                | Error::Parse(_)
                | Error::CommandFailed { .. }
                | Error::CommandTimeout { .. }
                | Error::Binding(_)
        )
    }

    pub(crate) fn unavailable(what: impl Into<String>) -> Self {
        Error::Unavailable(what.into())
    }

    pub(crate) fn parse(what: impl Into<String>) -> Self {
        Error::Parse(what.into())
    }
}
