//! Registry of sensor sources keyed by metric id.

use crate::platform::Platform;
use crate::sensors::{
    CpuFanSpeed, CpuFrequency, CpuMaxFrequency, CpuPercentage, CpuTemperature, DiskDirection,
    DiskSpeed, MemoryClockSpeed, NvmeTemperature, SensorSource,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Number of CPU packages the default registry exposes.
pub const PACKAGES: usize = 2;

/// One polled metric, ready for serialization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub id: String,
    /// `None` when the metric was unavailable this cycle.
    pub value: Option<f64>,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<Option<f64>>>,
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Sensor sources in registration order.
#[derive(Default)]
pub struct SensorRegistry {
    sensors: Vec<Box<dyn SensorSource>>,
}

impl SensorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every metric the panel knows about against `platform`.
    pub fn with_defaults(platform: Arc<dyn Platform>) -> Self {
        let mut registry = Self::new();
        for package in 0..PACKAGES {
            registry.register(CpuPercentage::new(platform.clone(), package));
            registry.register(CpuTemperature::new(platform.clone(), package));
            registry.register(CpuFrequency::new(platform.clone(), package));
            registry.register(CpuMaxFrequency::new(platform.clone(), package));
            registry.register(CpuFanSpeed::new(platform.clone(), package));
        }
        registry.register(MemoryClockSpeed::new(platform.clone()));
        registry.register(DiskSpeed::new(platform.clone(), DiskDirection::Read));
        registry.register(DiskSpeed::new(platform.clone(), DiskDirection::Write));
        registry.register(NvmeTemperature::new(platform.clone()));
        info!(
            "Registered {} sensors on {} platform",
            registry.len(),
            platform.kind()
        );
        registry
    }

    /// Adds a sensor, replacing any existing one with the same id.
    pub fn register<S: SensorSource + 'static>(&mut self, sensor: S) {
        let sensor: Box<dyn SensorSource> = Box::new(sensor);
        match self.sensors.iter().position(|s| s.id() == sensor.id()) {
            Some(index) => {
                debug!("Replacing sensor {}", sensor.id());
                self.sensors[index] = sensor;
            }
            None => self.sensors.push(sensor),
        }
    }

    pub fn get(&self, id: &str) -> Option<&dyn SensorSource> {
        self.sensors
            .iter()
            .find(|s| s.id() == id)
            .map(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut (dyn SensorSource + 'static)> {
        for sensor in self.sensors.iter_mut() {
            if sensor.id() == id {
                return Some(sensor.as_mut());
            }
        }
        None
    }

    /// Returns metric ids in registration order.
    pub fn ids(&self) -> Vec<String> {
        self.sensors.iter().map(|s| s.id().to_string()).collect()
    }

    /// Keeps only the listed metrics; an empty list keeps everything.
    ///
    /// Returns the requested ids that are not registered.
    pub fn retain(&mut self, ids: &[String]) -> Vec<String> {
        if ids.is_empty() {
            return Vec::new();
        }

        let unknown = ids
            .iter()
            .filter(|id| self.get(id).is_none())
            .cloned()
            .collect();
        self.sensors.retain(|s| ids.iter().any(|id| id == s.id()));
        unknown
    }

    /// Samples every sensor once.
    pub fn poll(&mut self) -> Vec<Reading> {
        self.sensors
            .iter_mut()
            .map(|sensor| {
                let value = sensor.numeric();
                Reading {
                    id: sensor.id().to_string(),
                    value: finite(value),
                    text: sensor.text(),
                    history: sensor
                        .history()
                        .map(|values| values.into_iter().map(finite).collect()),
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }
}
