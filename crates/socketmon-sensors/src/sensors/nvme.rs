//! NVMe drive temperature sensor.

use super::{field, SensorSource, Tracked};
use crate::platform::Platform;
use std::sync::Arc;

/// Temperature of the first NVMe drive in °C.
pub struct NvmeTemperature {
    platform: Arc<dyn Platform>,
    state: Tracked,
}

impl NvmeTemperature {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self {
            platform,
            state: Tracked::new(),
        }
    }
}

impl SensorSource for NvmeTemperature {
    fn id(&self) -> &str {
        "NvmeTemperature"
    }

    fn numeric(&mut self) -> f64 {
        let result = self.platform.nvme_temperature();
        self.state.record("NvmeTemperature", result)
    }

    fn text(&self) -> String {
        format!("{}°C", field(self.state.last(), 3, 0))
    }

    fn history(&self) -> Option<Vec<f64>> {
        Some(self.state.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::testing::ScriptedPlatform;

    #[test]
    fn test_reads_and_formats() {
        let platform = Arc::new(ScriptedPlatform::with_values([38.85]));
        let mut sensor = NvmeTemperature::new(platform);
        assert_eq!(sensor.numeric(), 38.85);
        assert_eq!(sensor.text(), " 39°C");
        assert!(sensor.numeric().is_nan());
        assert_eq!(sensor.history().unwrap()[8], 38.85);
    }
}
