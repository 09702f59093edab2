//! Windows strategy: LibreHardwareMonitor over WMI plus CIM counters.
//!
//! LibreHardwareMonitor publishes its sensor tree in the
//! `root\LibreHardwareMonitor` WMI namespace while it is running, as flat
//! `Hardware` and `Sensor` classes linked by `Identifier` / `Parent`.

use super::{DiskCounters, LoadSampler, Platform, PlatformKind, PlatformOptions, TreePlatform};
use crate::subprocess::run_with_timeout;
use crate::tree::{HardwareMonitor, HardwareNode, SensorNode, TreeAdapter};
use crate::{Error, Result};
use serde::Deserialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;
use wmi::{COMLibrary, WMIConnection};

const LHM_NAMESPACE: &str = "root\\LibreHardwareMonitor";
const CIMV2_NAMESPACE: &str = "root\\CIMV2";

thread_local! {
    // COM objects are bound to the thread that created them.
    static CONNECTIONS: RefCell<HashMap<&'static str, WMIConnection>> =
        RefCell::new(HashMap::new());
}

/// Runs `f` against a per-thread cached connection to `namespace`.
fn with_connection<T>(
    namespace: &'static str,
    f: impl FnOnce(&WMIConnection) -> Result<T>,
) -> Result<T> {
    CONNECTIONS.with(|cell| {
        let mut connections = cell.borrow_mut();
        if !connections.contains_key(namespace) {
            let com = COMLibrary::new().map_err(|e| Error::Binding(format!("COM init: {}", e)))?;
            let conn = WMIConnection::with_namespace_path(namespace, com)
                .map_err(|e| Error::Binding(format!("{}: {}", namespace, e)))?;
            connections.insert(namespace, conn);
        }
        match connections.get(namespace) {
            Some(conn) => f(conn),
            None => Err(Error::Binding(format!("{}: no connection", namespace))),
        }
    })
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct LhmHardware {
    hardware_type: String,
    identifier: String,
    name: String,
    parent: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct LhmSensor {
    name: String,
    sensor_type: String,
    value: Option<f32>,
    parent: String,
    index: Option<i32>,
}

/// [`HardwareMonitor`] over LibreHardwareMonitor's WMI provider.
#[derive(Debug, Default)]
pub struct LhmWmiMonitor;

impl LhmWmiMonitor {
    /// Connects to the provider, failing if LibreHardwareMonitor is not running.
    pub fn connect() -> Result<Box<dyn HardwareMonitor>> {
        let monitor = LhmWmiMonitor;
        let tree = monitor.update()?;
        if tree.is_empty() {
            return Err(Error::unavailable("LibreHardwareMonitor reports no hardware"));
        }
        Ok(Box::new(monitor))
    }

    fn query<T: serde::de::DeserializeOwned>(query: &str) -> Result<Vec<T>> {
        with_connection(LHM_NAMESPACE, |conn| {
            conn.raw_query(query)
                .map_err(|e| Error::Binding(format!("{}: {}", query, e)))
        })
    }
}

impl HardwareMonitor for LhmWmiMonitor {
    fn update(&self) -> Result<Vec<HardwareNode>> {
        let hardware: Vec<LhmHardware> =
            Self::query("SELECT HardwareType, Identifier, Name, Parent FROM Hardware")?;
        let mut sensors: Vec<LhmSensor> =
            Self::query("SELECT Name, SensorType, Value, Parent, Index FROM Sensor")?;
        sensors.sort_by_key(|s| s.index.unwrap_or(i32::MAX));

        let mut by_parent: HashMap<String, Vec<SensorNode>> = HashMap::new();
        for sensor in sensors {
            by_parent.entry(sensor.parent).or_default().push(SensorNode::new(
                sensor.sensor_type.as_str().into(),
                sensor.name,
                sensor.value.map(f64::from),
            ));
        }

        let build = |hw: &LhmHardware, by_parent: &mut HashMap<String, Vec<SensorNode>>| {
            let mut node = HardwareNode::new(hw.hardware_type.as_str().into(), hw.name.clone());
            node.sensors = by_parent.remove(&hw.identifier).unwrap_or_default();
            node
        };

        let is_root = |hw: &LhmHardware| hw.parent.as_deref().map_or(true, str::is_empty);
        let mut roots = Vec::new();
        for hw in hardware.iter().filter(|hw| is_root(hw)) {
            let mut node = build(hw, &mut by_parent);
            for sub in hardware
                .iter()
                .filter(|sub| sub.parent.as_deref() == Some(hw.identifier.as_str()))
            {
                let child = build(sub, &mut by_parent);
                node.sub_hardware.push(child);
            }
            roots.push(node);
        }
        Ok(roots)
    }
}

/// Value that WMI may hand back as a number or as a decimal string (uint64).
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum WmiU64 {
    Number(u64),
    Text(String),
}

impl WmiU64 {
    fn get(&self) -> Result<u64> {
        match self {
            WmiU64::Number(n) => Ok(*n),
            WmiU64::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| Error::parse(format!("not a counter: {}", s))),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct PhysicalDiskCounters {
    disk_read_bytes_persec: WmiU64,
    disk_write_bytes_persec: WmiU64,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct Processor {
    #[serde(rename = "DeviceID")]
    device_id: String,
    max_clock_speed: Option<u32>,
}

/// LibreHardwareMonitor tree plus CIM fallbacks.
pub struct WindowsPlatform {
    tree: TreePlatform,
    command_timeout: Duration,
}

impl WindowsPlatform {
    pub fn new(options: &PlatformOptions) -> Self {
        Self {
            tree: TreePlatform::new(TreeAdapter::new(LhmWmiMonitor::connect)),
            command_timeout: options.command_timeout,
        }
    }

    fn memory_clock_powershell(&self) -> Result<f64> {
        let out = run_with_timeout(
            "powershell",
            &[
                "-NoProfile",
                "-Command",
                "Get-CimInstance Win32_PhysicalMemory | Select-Object -First 1 -ExpandProperty ConfiguredClockSpeed",
            ],
            self.command_timeout,
        )?;
        first_positive_number(&out).ok_or_else(|| Error::parse("no ConfiguredClockSpeed"))
    }

    fn memory_clock_wmic(&self) -> Result<f64> {
        let out = run_with_timeout(
            "wmic",
            &["memorychip", "get", "speed"],
            self.command_timeout,
        )?;
        first_positive_number(&out).ok_or_else(|| Error::parse("no memorychip speed"))
    }
}

impl Platform for WindowsPlatform {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Windows
    }

    fn cpu_load(&self, package: usize, sampler: &mut LoadSampler) -> Result<f64> {
        self.tree.cpu_load(package, sampler)
    }

    fn cpu_temperature(&self, package: usize) -> Result<f64> {
        self.tree.cpu_temperature(package)
    }

    fn cpu_frequency(&self, package: usize) -> Result<f64> {
        self.tree.cpu_frequency(package)
    }

    fn cpu_max_frequency(&self, package: usize) -> Result<f64> {
        let mut processors: Vec<Processor> = with_connection(CIMV2_NAMESPACE, |conn| {
            conn.raw_query("SELECT DeviceID, MaxClockSpeed FROM Win32_Processor")
                .map_err(|e| Error::Binding(e.to_string()))
        })?;
        processors.sort_by(|a, b| a.device_id.cmp(&b.device_id));
        processors
            .get(package)
            .and_then(|p| p.max_clock_speed)
            .map(f64::from)
            .ok_or_else(|| Error::unavailable(format!("Win32_Processor {}", package)))
    }

    fn cpu_fan_speed(&self, package: usize) -> Result<f64> {
        self.tree.cpu_fan_speed(package)
    }

    fn memory_clock(&self) -> Result<f64> {
        self.tree
            .memory_clock()
            .or_else(|e| {
                debug!("LibreHardwareMonitor memory clock failed: {}", e);
                self.memory_clock_powershell()
            })
            .or_else(|e| {
                debug!("PowerShell memory clock failed: {}", e);
                self.memory_clock_wmic()
            })
    }

    fn disk_counters(&self) -> Result<DiskCounters> {
        let rows: Vec<PhysicalDiskCounters> = with_connection(CIMV2_NAMESPACE, |conn| {
            conn.raw_query(
                "SELECT DiskReadBytesPersec, DiskWriteBytesPersec \
                 FROM Win32_PerfRawData_PerfDisk_PhysicalDisk WHERE Name = '_Total'",
            )
            .map_err(|e| Error::Binding(e.to_string()))
        })?;
        let total = rows
            .first()
            .ok_or_else(|| Error::unavailable("no _Total physical disk counters"))?;
        Ok(DiskCounters {
            read_bytes: total.disk_read_bytes_persec.get()?,
            write_bytes: total.disk_write_bytes_persec.get()?,
        })
    }

    fn nvme_temperature(&self) -> Result<f64> {
        self.tree.nvme_temperature()
    }
}

fn first_positive_number(output: &str) -> Option<f64> {
    output
        .split_whitespace()
        .filter_map(|token| token.parse::<f64>().ok())
        .find(|v| *v > 0.0)
}
