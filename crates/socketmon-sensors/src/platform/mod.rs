//! Platform strategies.
//!
//! One strategy is selected at startup and shared by every sensor. Each method
//! returns one raw metric; sensors add history, memoization and formatting on
//! top. Methods a strategy cannot serve report [`Error::Unavailable`].

mod linux;
mod tree;
mod unavailable;
#[cfg(windows)]
mod windows;

pub use linux::LinuxPlatform;
pub use tree::TreePlatform;
pub use unavailable::UnavailablePlatform;
#[cfg(windows)]
pub use windows::{LhmWmiMonitor, WindowsPlatform};

use crate::{Error, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Default timeout for external hardware queries.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Which strategy serves sensor reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformKind {
    /// procfs/sysfs counters and hwmon chips.
    Linux,
    /// LibreHardwareMonitor sensor tree plus WMI counters.
    Windows,
    /// Every metric unavailable.
    Unavailable,
}

impl PlatformKind {
    /// Returns the strategy native to the build target.
    pub fn native() -> Self {
        if cfg!(target_os = "linux") {
            PlatformKind::Linux
        } else if cfg!(windows) {
            PlatformKind::Windows
        } else {
            PlatformKind::Unavailable
        }
    }
}

impl FromStr for PlatformKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(PlatformKind::native()),
            "linux" => Ok(PlatformKind::Linux),
            "windows" | "lhm" => Ok(PlatformKind::Windows),
            "none" | "unavailable" => Ok(PlatformKind::Unavailable),
            _ => Err(Error::parse(format!("unknown platform: {}", s))),
        }
    }
}

impl std::fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformKind::Linux => write!(f, "linux"),
            PlatformKind::Windows => write!(f, "windows"),
            PlatformKind::Unavailable => write!(f, "none"),
        }
    }
}

/// Knobs shared by the strategies.
#[derive(Debug, Clone)]
pub struct PlatformOptions {
    /// Root of the proc filesystem.
    pub proc_root: PathBuf,
    /// Root of the sys filesystem.
    pub sys_root: PathBuf,
    /// Deadline for external commands.
    pub command_timeout: Duration,
}

impl Default for PlatformOptions {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            sys_root: PathBuf::from("/sys"),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

/// Cumulative disk byte counters across all physical disks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskCounters {
    pub read_bytes: u64,
    pub write_bytes: u64,
}

/// Cumulative busy and total scheduler time of one logical CPU.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub busy: u64,
    pub total: u64,
}

/// Previous per-logical-CPU times, owned by the sensor that computes load.
#[derive(Debug, Clone, Default)]
pub struct LoadSampler {
    previous: Option<BTreeMap<usize, CpuTimes>>,
}

impl LoadSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `current` and returns per-logical-CPU busy percentages since the
    /// previous call (since boot on the first call).
    ///
    /// CPUs with no elapsed time report NaN.
    pub fn update(&mut self, current: BTreeMap<usize, CpuTimes>) -> Vec<(usize, f64)> {
        let loads = current
            .iter()
            .map(|(&cpu, now)| {
                let before = self
                    .previous
                    .as_ref()
                    .and_then(|prev| prev.get(&cpu))
                    .copied()
                    .unwrap_or_default();
                let total = now.total.saturating_sub(before.total);
                let busy = now.busy.saturating_sub(before.busy);
                let load = if total > 0 {
                    (100.0 * busy as f64 / total as f64).clamp(0.0, 100.0)
                } else {
                    f64::NAN
                };
                (cpu, load)
            })
            .collect();
        self.previous = Some(current);
        loads
    }
}

/// A source of raw hardware metrics.
pub trait Platform: Send + Sync {
    /// Returns which strategy this is.
    fn kind(&self) -> PlatformKind;

    /// Load percentage of a package (0-100).
    fn cpu_load(&self, package: usize, sampler: &mut LoadSampler) -> Result<f64> {
        let _ = (package, sampler);
        Err(Error::unavailable("cpu load"))
    }

    /// Temperature of a package in °C.
    fn cpu_temperature(&self, package: usize) -> Result<f64> {
        let _ = package;
        Err(Error::unavailable("cpu temperature"))
    }

    /// Mean current core clock of a package in MHz.
    fn cpu_frequency(&self, package: usize) -> Result<f64> {
        let _ = package;
        Err(Error::unavailable("cpu frequency"))
    }

    /// Maximum core clock of a package in MHz.
    fn cpu_max_frequency(&self, package: usize) -> Result<f64> {
        let _ = package;
        Err(Error::unavailable("cpu max frequency"))
    }

    /// Speed of the fan cooling a package in RPM.
    fn cpu_fan_speed(&self, package: usize) -> Result<f64> {
        let _ = package;
        Err(Error::unavailable("cpu fan"))
    }

    /// Memory clock in MHz.
    fn memory_clock(&self) -> Result<f64> {
        Err(Error::unavailable("memory clock"))
    }

    /// Cumulative disk byte counters.
    fn disk_counters(&self) -> Result<DiskCounters> {
        Err(Error::unavailable("disk counters"))
    }

    /// NVMe drive temperature in °C.
    fn nvme_temperature(&self) -> Result<f64> {
        Err(Error::unavailable("nvme temperature"))
    }
}

/// Builds the strategy native to the build target.
pub fn detect(options: &PlatformOptions) -> Arc<dyn Platform> {
    select(PlatformKind::native(), options)
}

/// Builds the given strategy.
pub fn select(kind: PlatformKind, options: &PlatformOptions) -> Arc<dyn Platform> {
    info!("Using {} sensor platform", kind);
    match kind {
        PlatformKind::Linux => Arc::new(LinuxPlatform::new(options)),
        #[cfg(windows)]
        PlatformKind::Windows => Arc::new(WindowsPlatform::new(options)),
        #[cfg(not(windows))]
        PlatformKind::Windows => {
            warn!("Windows sensors are not supported on this build, all sensors unavailable");
            Arc::new(UnavailablePlatform)
        }
        PlatformKind::Unavailable => Arc::new(UnavailablePlatform),
    }
}
