//! Strategy backed by a hardware-monitor sensor tree.
//!
//! Sensor names follow LibreHardwareMonitor conventions ("CPU Total",
//! "Core #1", "CPU Package", ...). One CPU hardware unit per socket.

use super::{LoadSampler, Platform, PlatformKind};
use crate::resolver::first_by_prefix;
use crate::tree::{HardwareNode, HardwareType, NameFilter, SensorType, TreeAdapter};
use crate::{Error, Result};

/// Temperature sensor names, most representative first.
pub const CPU_TEMPERATURE_NAMES: &[&str] = &["Core Average", "Core Max", "CPU Package", "Core"];

/// Drive temperature sensor names, most representative first.
const DRIVE_TEMPERATURE_NAMES: &[&str] = &["Composite Temperature", "Temperature"];

/// Reads sensors from a [`TreeAdapter`].
pub struct TreePlatform {
    tree: TreeAdapter,
}

impl TreePlatform {
    pub fn new(tree: TreeAdapter) -> Self {
        Self { tree }
    }

    /// Returns the underlying adapter.
    pub fn tree(&self) -> &TreeAdapter {
        &self.tree
    }

    fn cpu(&self, package: usize) -> Result<HardwareNode> {
        self.tree
            .cpu_at(package)?
            .ok_or_else(|| Error::unavailable(format!("cpu {}", package)))
    }

    fn not_found(hardware: &HardwareNode, sensor: &str) -> Error {
        Error::SensorNotFound {
            hardware: hardware.name.clone(),
            sensor: sensor.to_string(),
        }
    }
}

impl Platform for TreePlatform {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Windows
    }

    fn cpu_load(&self, package: usize, _sampler: &mut LoadSampler) -> Result<f64> {
        let cpu = self.cpu(package)?;
        TreeAdapter::find_sensor(&cpu, &SensorType::Load, NameFilter::starts_with("CPU Total"))
            .and_then(|s| s.value)
            .ok_or_else(|| Self::not_found(&cpu, "CPU Total"))
    }

    fn cpu_temperature(&self, package: usize) -> Result<f64> {
        let cpu = self.cpu(package)?;
        first_by_prefix(
            cpu.live_sensors(&SensorType::Temperature),
            CPU_TEMPERATURE_NAMES,
        )
        .and_then(|s| s.value)
        .ok_or_else(|| Self::not_found(&cpu, "temperature"))
    }

    fn cpu_frequency(&self, package: usize) -> Result<f64> {
        let cpu = self.cpu(package)?;
        let clocks: Vec<f64> = cpu
            .live_sensors(&SensorType::Clock)
            .filter(|s| s.name.contains("Core #") && !s.name.contains("Effective"))
            .filter_map(|s| s.value)
            .collect();
        if clocks.is_empty() {
            return Err(Self::not_found(&cpu, "core clock"));
        }
        Ok(clocks.iter().sum::<f64>() / clocks.len() as f64)
    }

    fn cpu_fan_speed(&self, package: usize) -> Result<f64> {
        let tag = format!("#{}", package + 1);
        let is_match =
            |name: &str| name.contains(tag.as_str()) || (package == 0 && name.contains("CPU"));

        for board in self.tree.hardware_of(&HardwareType::Motherboard)? {
            for chip in &board.sub_hardware {
                if let Some(value) = chip
                    .live_sensors(&SensorType::Fan)
                    .find(|s| is_match(&s.name))
                    .and_then(|s| s.value)
                {
                    return Ok(value);
                }
            }
        }
        Err(Error::SensorNotFound {
            hardware: "motherboard".into(),
            sensor: format!("fan {}", tag),
        })
    }

    fn memory_clock(&self) -> Result<f64> {
        self.tree
            .hardware_of(&HardwareType::Memory)?
            .iter()
            .find_map(|memory| {
                TreeAdapter::find_sensor(memory, &SensorType::Clock, NameFilter::any())
                    .and_then(|s| s.value)
            })
            .ok_or_else(|| Error::SensorNotFound {
                hardware: "memory".into(),
                sensor: "clock".into(),
            })
    }

    fn nvme_temperature(&self) -> Result<f64> {
        self.tree
            .hardware_of(&HardwareType::Storage)?
            .iter()
            .find_map(|drive| {
                first_by_prefix(
                    drive.live_sensors(&SensorType::Temperature),
                    DRIVE_TEMPERATURE_NAMES,
                )
                .and_then(|s| s.value)
            })
            .ok_or_else(|| Error::SensorNotFound {
                hardware: "storage".into(),
                sensor: "temperature".into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::StaticMonitor;

    fn xeon(name: &str, load: f64, clocks: &[f64]) -> HardwareNode {
        let mut cpu = HardwareNode::new(HardwareType::Cpu, name)
            .with_sensor(SensorType::Load, "CPU Core #1", Some(99.0))
            .with_sensor(SensorType::Load, "CPU Total", Some(load))
            .with_sensor(SensorType::Temperature, "CPU Package", Some(58.0))
            .with_sensor(SensorType::Temperature, "Core Max #1", Some(66.0));
        for (i, clock) in clocks.iter().enumerate() {
            cpu = cpu
                .with_sensor(SensorType::Clock, format!("Core #{}", i + 1), Some(*clock))
                .with_sensor(
                    SensorType::Clock,
                    format!("Core #{} (Effective)", i + 1),
                    Some(100.0),
                );
        }
        cpu.with_sensor(SensorType::Clock, "Bus Speed", Some(100.0))
    }

    fn workstation() -> TreePlatform {
        let board = HardwareNode::new(HardwareType::Motherboard, "Z11PA-D8").with_sub_hardware(
            HardwareNode::new(HardwareType::SuperIo, "Nuvoton NCT6796D")
                .with_sensor(SensorType::Fan, "Fan #1", None)
                .with_sensor(SensorType::Fan, "CPU Fan", Some(1100.0))
                .with_sensor(SensorType::Fan, "Fan #2", Some(950.0)),
        );
        let memory = HardwareNode::new(HardwareType::Memory, "Generic Memory")
            .with_sensor(SensorType::Data, "Memory Used", Some(12.0))
            .with_sensor(SensorType::Clock, "Memory Clock", Some(2933.0));
        let drive = HardwareNode::new(HardwareType::Storage, "Samsung SSD 980 PRO")
            .with_sensor(SensorType::Temperature, "Temperature", Some(41.0))
            .with_sensor(SensorType::Temperature, "Composite Temperature", Some(44.0));

        TreePlatform::new(TreeAdapter::with_monitor(StaticMonitor::new(vec![
            board,
            xeon("Intel Xeon Gold #0", 12.0, &[3000.0, 3200.0]),
            memory,
            xeon("Intel Xeon Gold #1", 87.5, &[2000.0, 2400.0, 2600.0]),
            drive,
        ])))
    }

    #[test]
    fn test_per_socket_load() {
        let platform = workstation();
        let mut sampler = LoadSampler::new();
        assert_eq!(platform.cpu_load(0, &mut sampler).unwrap(), 12.0);
        assert_eq!(platform.cpu_load(1, &mut sampler).unwrap(), 87.5);
        assert!(matches!(
            platform.cpu_load(2, &mut sampler),
            Err(Error::Unavailable(_))
        ));
    }

    #[test]
    fn test_temperature_prefers_core_max_over_package() {
        let platform = workstation();
        assert_eq!(platform.cpu_temperature(0).unwrap(), 66.0);
    }

    #[test]
    fn test_frequency_excludes_effective_clocks() {
        let platform = workstation();
        assert_eq!(platform.cpu_frequency(0).unwrap(), 3100.0);
        assert!((platform.cpu_frequency(1).unwrap() - 7000.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_max_frequency_is_not_taken_from_current_clocks() {
        // Only current core clocks are in the tree.
        let platform = workstation();
        assert!(matches!(
            platform.cpu_max_frequency(0),
            Err(Error::Unavailable(_))
        ));
    }

    #[test]
    fn test_fans_from_motherboard_chip() {
        let platform = workstation();
        // "Fan #1" has no value, so the CPU-labelled fan wins for socket 0.
        assert_eq!(platform.cpu_fan_speed(0).unwrap(), 1100.0);
        assert_eq!(platform.cpu_fan_speed(1).unwrap(), 950.0);
    }

    #[test]
    fn test_memory_and_drive() {
        let platform = workstation();
        assert_eq!(platform.memory_clock().unwrap(), 2933.0);
        assert_eq!(platform.nvme_temperature().unwrap(), 44.0);
    }

    #[test]
    fn test_without_binding() {
        let platform = TreePlatform::new(TreeAdapter::unavailable());
        assert!(!platform.tree().is_available());
        assert!(platform.cpu_temperature(0).is_err());
        assert!(platform.cpu_fan_speed(0).is_err());
        assert!(platform.disk_counters().is_err());
    }
}
