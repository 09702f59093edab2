//! Values that are read once and kept for the process lifetime.

use crate::Result;
use std::sync::OnceLock;
use tracing::info;

/// Caches the first positive reading of an environment-invariant value.
///
/// Failed or non-positive reads are not cached, so the next call retries.
#[derive(Debug, Default)]
pub struct Memoized {
    name: &'static str,
    value: OnceLock<f64>,
}

impl Memoized {
    /// Creates an empty memo; `name` is used for logging.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            value: OnceLock::new(),
        }
    }

    /// Returns the cached value, or runs `read` and caches a positive result.
    pub fn get_or_try<F>(&self, read: F) -> Result<f64>
    where
        F: FnOnce() -> Result<f64>,
    {
        if let Some(value) = self.value.get() {
            return Ok(*value);
        }

        let value = read()?;
        if value.is_finite() && value > 0.0 && self.value.set(value).is_ok() {
            info!("Cached {} = {}", self.name, value);
        }
        Ok(value)
    }

    /// Returns the cached value, if any.
    pub fn get(&self) -> Option<f64> {
        self.value.get().copied()
    }
}
