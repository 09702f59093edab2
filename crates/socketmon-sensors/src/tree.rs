//! Read-only view over a hierarchical hardware-monitor sensor tree.
//!
//! The tree (hardware units containing sensors and optional sub-units) comes
//! from an external binding such as LibreHardwareMonitor. The binding is
//! connected lazily, at most once; if that fails the adapter stays unavailable
//! for the rest of its life and never retries.

use crate::resolver::NamedReading;
use crate::{Error, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};
use tracing::{info, warn};

/// Hardware unit category, as named by the binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HardwareType {
    Cpu,
    Motherboard,
    SuperIo,
    Memory,
    Storage,
    Gpu,
    Other(String),
}

impl From<&str> for HardwareType {
    fn from(s: &str) -> Self {
        match s {
            "Cpu" | "CPU" => HardwareType::Cpu,
            "Motherboard" | "Mainboard" => HardwareType::Motherboard,
            "SuperIO" | "SuperIo" => HardwareType::SuperIo,
            "Memory" | "RAM" => HardwareType::Memory,
            "Storage" | "HDD" => HardwareType::Storage,
            "GpuNvidia" | "GpuAmd" | "GpuIntel" | "Gpu" => HardwareType::Gpu,
            other => HardwareType::Other(other.to_string()),
        }
    }
}

/// Sensor category, as named by the binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorType {
    Load,
    Temperature,
    Clock,
    Fan,
    Voltage,
    Power,
    Throughput,
    Data,
    Other(String),
}

impl From<&str> for SensorType {
    fn from(s: &str) -> Self {
        match s {
            "Load" => SensorType::Load,
            "Temperature" => SensorType::Temperature,
            "Clock" => SensorType::Clock,
            "Fan" => SensorType::Fan,
            "Voltage" => SensorType::Voltage,
            "Power" => SensorType::Power,
            "Throughput" => SensorType::Throughput,
            "Data" | "SmallData" => SensorType::Data,
            other => SensorType::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for SensorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorType::Load => write!(f, "Load"),
            SensorType::Temperature => write!(f, "Temperature"),
            SensorType::Clock => write!(f, "Clock"),
            SensorType::Fan => write!(f, "Fan"),
            SensorType::Voltage => write!(f, "Voltage"),
            SensorType::Power => write!(f, "Power"),
            SensorType::Throughput => write!(f, "Throughput"),
            SensorType::Data => write!(f, "Data"),
            SensorType::Other(name) => write!(f, "{}", name),
        }
    }
}

/// A single sensor on a hardware unit.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorNode {
    pub sensor_type: SensorType,
    pub name: String,
    pub value: Option<f64>,
}

impl SensorNode {
    pub fn new(sensor_type: SensorType, name: impl Into<String>, value: Option<f64>) -> Self {
        Self {
            sensor_type,
            name: name.into(),
            value,
        }
    }
}

impl NamedReading for SensorNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> Option<f64> {
        self.value
    }
}

/// A hardware unit with its sensors and sub-units.
#[derive(Debug, Clone, PartialEq)]
pub struct HardwareNode {
    pub hardware_type: HardwareType,
    pub name: String,
    pub sensors: Vec<SensorNode>,
    pub sub_hardware: Vec<HardwareNode>,
}

impl HardwareNode {
    pub fn new(hardware_type: HardwareType, name: impl Into<String>) -> Self {
        Self {
            hardware_type,
            name: name.into(),
            sensors: Vec::new(),
            sub_hardware: Vec::new(),
        }
    }

    /// Adds a sensor, builder style.
    pub fn with_sensor(
        mut self,
        sensor_type: SensorType,
        name: impl Into<String>,
        value: Option<f64>,
    ) -> Self {
        self.sensors.push(SensorNode::new(sensor_type, name, value));
        self
    }

    /// Adds a sub-unit, builder style.
    pub fn with_sub_hardware(mut self, sub: HardwareNode) -> Self {
        self.sub_hardware.push(sub);
        self
    }

    /// Returns sensors of the given type that currently carry a value.
    pub fn live_sensors<'a>(
        &'a self,
        sensor_type: &'a SensorType,
    ) -> impl Iterator<Item = &'a SensorNode> + Clone + 'a {
        self.sensors
            .iter()
            .filter(move |s| &s.sensor_type == sensor_type && s.value.is_some())
    }
}

/// Optional name constraints for [`TreeAdapter::find_sensor`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NameFilter<'a> {
    pub contains: Option<&'a str>,
    pub starts_with: Option<&'a str>,
}

impl<'a> NameFilter<'a> {
    /// Accepts any name.
    pub fn any() -> Self {
        Self::default()
    }

    /// Requires the name to contain `s`.
    pub fn contains(s: &'a str) -> Self {
        Self {
            contains: Some(s),
            starts_with: None,
        }
    }

    /// Requires the name to start with `s`.
    pub fn starts_with(s: &'a str) -> Self {
        Self {
            contains: None,
            starts_with: Some(s),
        }
    }

    /// Returns true if `name` satisfies every given constraint.
    pub fn matches(&self, name: &str) -> bool {
        self.contains.map_or(true, |c| name.contains(c))
            && self.starts_with.map_or(true, |p| name.starts_with(p))
    }
}

/// The contract consumed from an external hardware-monitor binding.
pub trait HardwareMonitor: Send + Sync {
    /// Refreshes every hardware unit and returns a snapshot of the tree in the
    /// binding's native enumeration order.
    fn update(&self) -> Result<Vec<HardwareNode>>;
}

/// Establishes a binding connection; run at most once per adapter.
pub type Connector = Box<dyn Fn() -> Result<Box<dyn HardwareMonitor>> + Send + Sync>;

enum Binding {
    Connected(Box<dyn HardwareMonitor>),
    Unavailable,
}

/// Lazily connected adapter over a [`HardwareMonitor`].
pub struct TreeAdapter {
    connect: Connector,
    binding: OnceLock<Binding>,
}

impl TreeAdapter {
    /// Creates an adapter that connects on first use.
    pub fn new<F>(connect: F) -> Self
    where
        F: Fn() -> Result<Box<dyn HardwareMonitor>> + Send + Sync + 'static,
    {
        Self {
            connect: Box::new(connect),
            binding: OnceLock::new(),
        }
    }

    /// Creates an adapter around an already connected monitor.
    pub fn with_monitor<M: HardwareMonitor + 'static>(monitor: M) -> Self {
        let adapter = Self::new(|| Err(Error::unavailable("hardware monitor")));
        let _ = adapter.binding.set(Binding::Connected(Box::new(monitor)));
        adapter
    }

    /// Creates an adapter with no binding at all.
    pub fn unavailable() -> Self {
        Self::new(|| Err(Error::unavailable("no hardware monitor on this platform")))
    }

    fn binding(&self) -> &Binding {
        self.binding.get_or_init(|| match (self.connect)() {
            Ok(monitor) => {
                info!("Hardware monitor connected");
                Binding::Connected(monitor)
            }
            Err(e) => {
                warn!("Hardware monitor unavailable: {}", e);
                Binding::Unavailable
            }
        })
    }

    /// Returns true if the binding connected successfully.
    pub fn is_available(&self) -> bool {
        matches!(self.binding(), Binding::Connected(_))
    }

    /// Refreshes and returns every hardware unit.
    pub fn hardware(&self) -> Result<Vec<HardwareNode>> {
        match self.binding() {
            Binding::Connected(monitor) => monitor.update(),
            Binding::Unavailable => Err(Error::unavailable("hardware monitor")),
        }
    }

    /// Refreshes and returns the hardware units of one type.
    pub fn hardware_of(&self, hardware_type: &HardwareType) -> Result<Vec<HardwareNode>> {
        Ok(self
            .hardware()?
            .into_iter()
            .filter(|hw| &hw.hardware_type == hardware_type)
            .collect())
    }

    /// Refreshes and returns every CPU, in enumeration order.
    pub fn cpus(&self) -> Result<Vec<HardwareNode>> {
        self.hardware_of(&HardwareType::Cpu)
    }

    /// Returns the `index`-th CPU, or `None` past the end.
    pub fn cpu_at(&self, index: usize) -> Result<Option<HardwareNode>> {
        Ok(self.cpus()?.into_iter().nth(index))
    }

    /// Returns the first live sensor on `node` of `sensor_type` whose name
    /// passes `filter`. Enumeration order decides ties.
    pub fn find_sensor<'a>(
        node: &'a HardwareNode,
        sensor_type: &SensorType,
        filter: NameFilter<'_>,
    ) -> Option<&'a SensorNode> {
        node.sensors.iter().find(|s| {
            &s.sensor_type == sensor_type && s.value.is_some() && filter.matches(&s.name)
        })
    }
}

/// In-memory [`HardwareMonitor`] serving a fixed tree.
#[derive(Debug, Default)]
pub struct StaticMonitor {
    tree: Mutex<Vec<HardwareNode>>,
    updates: AtomicUsize,
}

impl StaticMonitor {
    pub fn new(tree: Vec<HardwareNode>) -> Self {
        Self {
            tree: Mutex::new(tree),
            updates: AtomicUsize::new(0),
        }
    }

    /// Replaces the served tree.
    pub fn set(&self, tree: Vec<HardwareNode>) {
        if let Ok(mut current) = self.tree.lock() {
            *current = tree;
        }
    }

    /// Returns how many times the tree was refreshed.
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::Relaxed)
    }
}

impl HardwareMonitor for StaticMonitor {
    fn update(&self) -> Result<Vec<HardwareNode>> {
        self.updates.fetch_add(1, Ordering::Relaxed);
        self.tree
            .lock()
            .map(|tree| tree.clone())
            .map_err(|_| Error::Binding("static tree lock poisoned".into()))
    }
}

impl<M: HardwareMonitor + ?Sized> HardwareMonitor for std::sync::Arc<M> {
    fn update(&self) -> Result<Vec<HardwareNode>> {
        (**self).update()
    }
}
