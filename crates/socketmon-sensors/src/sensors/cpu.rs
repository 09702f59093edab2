//! Per-socket CPU sensors.

use super::{field, settle, SensorSource, Tracked};
use crate::memo::Memoized;
use crate::platform::{LoadSampler, Platform};
use std::sync::Arc;

/// Load of one CPU package in percent.
pub struct CpuPercentage {
    id: String,
    package: usize,
    platform: Arc<dyn Platform>,
    sampler: LoadSampler,
    state: Tracked,
}

impl CpuPercentage {
    pub fn new(platform: Arc<dyn Platform>, package: usize) -> Self {
        Self {
            id: format!("Cpu{}Percentage", package),
            package,
            platform,
            sampler: LoadSampler::new(),
            state: Tracked::new(),
        }
    }
}

impl SensorSource for CpuPercentage {
    fn id(&self) -> &str {
        &self.id
    }

    fn numeric(&mut self) -> f64 {
        let result = self.platform.cpu_load(self.package, &mut self.sampler);
        self.state.record(&self.id, result)
    }

    fn text(&self) -> String {
        format!("{}%", field(self.state.last(), 3, 0))
    }

    fn history(&self) -> Option<Vec<f64>> {
        Some(self.state.values())
    }
}

/// Temperature of one CPU package in °C.
pub struct CpuTemperature {
    id: String,
    package: usize,
    platform: Arc<dyn Platform>,
    state: Tracked,
}

impl CpuTemperature {
    pub fn new(platform: Arc<dyn Platform>, package: usize) -> Self {
        Self {
            id: format!("Cpu{}Temperature", package),
            package,
            platform,
            state: Tracked::new(),
        }
    }
}

impl SensorSource for CpuTemperature {
    fn id(&self) -> &str {
        &self.id
    }

    fn numeric(&mut self) -> f64 {
        let result = self.platform.cpu_temperature(self.package);
        self.state.record(&self.id, result)
    }

    fn text(&self) -> String {
        format!("{}°C", field(self.state.last(), 3, 0))
    }

    fn history(&self) -> Option<Vec<f64>> {
        Some(self.state.values())
    }
}

/// Mean core clock of one CPU package in MHz, shown in GHz.
pub struct CpuFrequency {
    id: String,
    package: usize,
    platform: Arc<dyn Platform>,
    state: Tracked,
}

impl CpuFrequency {
    pub fn new(platform: Arc<dyn Platform>, package: usize) -> Self {
        Self {
            id: format!("Cpu{}Frequency", package),
            package,
            platform,
            state: Tracked::new(),
        }
    }
}

impl SensorSource for CpuFrequency {
    fn id(&self) -> &str {
        &self.id
    }

    fn numeric(&mut self) -> f64 {
        let result = self.platform.cpu_frequency(self.package);
        self.state.record(&self.id, result)
    }

    fn text(&self) -> String {
        format!("{} GHz", field(self.state.last() / 1000.0, 4, 2))
    }

    fn history(&self) -> Option<Vec<f64>> {
        Some(self.state.values())
    }
}

/// Maximum core clock of one CPU package in MHz, read once.
pub struct CpuMaxFrequency {
    id: String,
    package: usize,
    platform: Arc<dyn Platform>,
    memo: Memoized,
    last: f64,
}

impl CpuMaxFrequency {
    pub fn new(platform: Arc<dyn Platform>, package: usize) -> Self {
        Self {
            id: format!("Cpu{}MaxFrequency", package),
            package,
            platform,
            memo: Memoized::new("cpu max frequency"),
            last: f64::NAN,
        }
    }
}

impl SensorSource for CpuMaxFrequency {
    fn id(&self) -> &str {
        &self.id
    }

    fn numeric(&mut self) -> f64 {
        let result = self
            .memo
            .get_or_try(|| self.platform.cpu_max_frequency(self.package));
        self.last = settle(&self.id, result);
        self.last
    }

    fn text(&self) -> String {
        format!("{} GHz", field(self.last / 1000.0, 4, 2))
    }
}

/// Speed of the fan attached to one CPU package in RPM.
pub struct CpuFanSpeed {
    id: String,
    package: usize,
    platform: Arc<dyn Platform>,
    state: Tracked,
}

impl CpuFanSpeed {
    pub fn new(platform: Arc<dyn Platform>, package: usize) -> Self {
        Self {
            id: format!("Cpu{}FanSpeed", package),
            package,
            platform,
            state: Tracked::new(),
        }
    }
}

impl SensorSource for CpuFanSpeed {
    fn id(&self) -> &str {
        &self.id
    }

    fn numeric(&mut self) -> f64 {
        let result = self.platform.cpu_fan_speed(self.package);
        self.state.record(&self.id, result)
    }

    fn text(&self) -> String {
        format!("{} RPM", field(self.state.last(), 4, 0))
    }

    fn history(&self) -> Option<Vec<f64>> {
        Some(self.state.values())
    }
}
