//! Linux strategy: procfs/sysfs counters and hwmon chips.

use super::{CpuTimes, DiskCounters, LoadSampler, Platform, PlatformKind, PlatformOptions};
use crate::resolver::{first_by_prefix, first_chip, NamedReading};
use crate::subprocess::run_with_timeout;
use crate::topology::{Aggregate, Topology};
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Disk sector size used by /proc/diskstats, independent of the device.
const SECTOR_SIZE: u64 = 512;

/// CPU temperature chips in fallback order, with label prefixes per chip.
const CPU_TEMP_CHIPS: &[(&str, &[&str])] = &[
    ("coretemp", &["Package id", "Core"]),
    ("k10temp", &["Tdie", "Tctl", "Tccd"]),
    ("zenpower", &["Tdie", "Tctl"]),
    ("cpu_thermal", &[""]),
];

/// Block devices that would double count physical disk I/O.
const VIRTUAL_DISK_PREFIXES: &[&str] = &["loop", "ram", "zram", "dm-", "md"];

/// One hwmon input (temperature or fan).
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ChipReading {
    pub index: u32,
    pub label: String,
    pub value: Option<f64>,
}

impl NamedReading for ChipReading {
    fn name(&self) -> &str {
        &self.label
    }

    fn value(&self) -> Option<f64> {
        self.value
    }
}

/// One hwmon device.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Chip {
    pub temps: Vec<ChipReading>,
    pub fans: Vec<ChipReading>,
}

/// Chip name to instances, in hwmon enumeration order.
pub(crate) type ChipTable = BTreeMap<String, Vec<Chip>>;

/// Reads sensors from procfs, sysfs and dmidecode/lshw.
#[derive(Debug, Clone)]
pub struct LinuxPlatform {
    proc_root: PathBuf,
    sys_root: PathBuf,
    command_timeout: Duration,
}

impl LinuxPlatform {
    pub fn new(options: &PlatformOptions) -> Self {
        Self {
            proc_root: options.proc_root.clone(),
            sys_root: options.sys_root.clone(),
            command_timeout: options.command_timeout,
        }
    }

    fn cpu_dir(&self) -> PathBuf {
        self.sys_root.join("devices/system/cpu")
    }

    /// Reads per-logical-CPU times from /proc/stat.
    fn read_cpu_times(&self) -> Result<BTreeMap<usize, CpuTimes>> {
        let content = fs::read_to_string(self.proc_root.join("stat"))?;
        let times = parse_cpu_times(&content);
        if times.is_empty() {
            return Err(Error::parse("no per-cpu lines in /proc/stat"));
        }
        Ok(times)
    }

    fn logical_cpus(&self) -> Result<Vec<usize>> {
        Ok(self.read_cpu_times()?.into_keys().collect())
    }

    fn topology(&self, cpus: &[usize]) -> Topology {
        Topology::read(&self.sys_root, cpus)
    }

    /// Reads a cpufreq attribute (kHz) for each CPU and returns MHz.
    fn read_cpufreq(&self, cpus: &[usize], attribute: &str) -> Vec<(usize, f64)> {
        cpus.iter()
            .filter_map(|&cpu| {
                let path = self
                    .cpu_dir()
                    .join(format!("cpu{}/cpufreq/{}", cpu, attribute));
                read_number(&path).map(|khz| (cpu, khz / 1000.0))
            })
            .collect()
    }

    /// Folds readings into the `package`-th socket of the topology spanned by
    /// all logical `cpus`, not just the ones that produced a reading.
    fn package_value(
        &self,
        package: usize,
        cpus: &[usize],
        readings: &[(usize, f64)],
        how: Aggregate,
    ) -> Result<f64> {
        let topology = self.topology(cpus);
        if package >= topology.packages().len() {
            return Err(Error::unavailable(format!("cpu package {}", package)));
        }
        topology
            .package_value(package, readings, how)
            .ok_or_else(|| Error::SensorNotFound {
                hardware: format!("cpu package {}", package),
                sensor: "per-cpu readings".into(),
            })
    }

    /// Reads every hwmon device under /sys/class/hwmon.
    fn read_chips(&self) -> Result<ChipTable> {
        let base = self.sys_root.join("class/hwmon");
        let mut dirs: Vec<(u32, PathBuf)> = fs::read_dir(&base)?
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().to_string();
                let index = name.strip_prefix("hwmon")?.parse().ok()?;
                Some((index, entry.path()))
            })
            .collect();
        dirs.sort_by_key(|(index, _)| *index);

        let mut table = ChipTable::new();
        for (_, dir) in dirs {
            let Ok(name) = fs::read_to_string(dir.join("name")) else {
                continue;
            };
            let chip = Chip {
                temps: read_inputs(&dir, "temp", |v| v / 1000.0),
                fans: read_inputs(&dir, "fan", |v| v),
            };
            table.entry(name.trim().to_string()).or_default().push(chip);
        }
        Ok(table)
    }

    fn memory_clock_dmidecode(&self) -> Result<f64> {
        if !is_root() {
            return Err(Error::unavailable("dmidecode needs root"));
        }
        let out = run_with_timeout("dmidecode", &["--type", "17"], self.command_timeout)?;
        parse_dmidecode_speed(&out)
            .ok_or_else(|| Error::parse("no memory speed in dmidecode output"))
    }

    fn memory_clock_lshw(&self) -> Result<f64> {
        let out = run_with_timeout("lshw", &["-class", "memory"], self.command_timeout)?;
        parse_lshw_clock(&out).ok_or_else(|| Error::parse("no memory clock in lshw output"))
    }
}

impl Platform for LinuxPlatform {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Linux
    }

    fn cpu_load(&self, package: usize, sampler: &mut LoadSampler) -> Result<f64> {
        let times = self.read_cpu_times()?;
        let cpus: Vec<usize> = times.keys().copied().collect();
        let loads = sampler.update(times);
        self.package_value(package, &cpus, &loads, Aggregate::Mean)
    }

    fn cpu_temperature(&self, package: usize) -> Result<f64> {
        let table = self.read_chips()?;
        cpu_temperature_from(&table, package)
    }

    fn cpu_frequency(&self, package: usize) -> Result<f64> {
        let cpus = self.logical_cpus()?;
        let mut freqs = self.read_cpufreq(&cpus, "scaling_cur_freq");
        if freqs.is_empty() {
            let content = fs::read_to_string(self.proc_root.join("cpuinfo"))?;
            freqs = parse_cpuinfo_mhz(&content);
        }
        self.package_value(package, &cpus, &freqs, Aggregate::Mean)
    }

    fn cpu_max_frequency(&self, package: usize) -> Result<f64> {
        let cpus = self.logical_cpus()?;
        let mut freqs = self.read_cpufreq(&cpus, "cpuinfo_max_freq");
        if freqs.is_empty() {
            freqs = self.read_cpufreq(&cpus, "scaling_max_freq");
        }
        self.package_value(package, &cpus, &freqs, Aggregate::Max)
    }

    fn cpu_fan_speed(&self, package: usize) -> Result<f64> {
        let table = self.read_chips()?;
        let fans: Vec<&ChipReading> = table
            .values()
            .flatten()
            .flat_map(|chip| chip.fans.iter())
            .collect();
        cpu_fan_from(&fans, package)
    }

    fn memory_clock(&self) -> Result<f64> {
        self.memory_clock_dmidecode().or_else(|e| {
            debug!("dmidecode memory clock failed: {}", e);
            self.memory_clock_lshw()
        })
    }

    fn disk_counters(&self) -> Result<DiskCounters> {
        let content = fs::read_to_string(self.proc_root.join("diskstats"))?;
        let block = self.sys_root.join("block");
        Ok(parse_diskstats(&content, |name| block.join(name).exists()))
    }

    fn nvme_temperature(&self) -> Result<f64> {
        let table = self.read_chips()?;
        let chip = table
            .get("nvme")
            .and_then(|chips| chips.first())
            .ok_or_else(|| Error::unavailable("no nvme hwmon chip"))?;
        first_by_prefix(&chip.temps, &["Composite", ""])
            .and_then(|r| r.value)
            .ok_or_else(|| Error::SensorNotFound {
                hardware: "nvme".into(),
                sensor: "temperature".into(),
            })
    }
}

#[cfg(unix)]
fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn is_root() -> bool {
    false
}

fn read_number(path: &Path) -> Option<f64> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// Reads `{kind}N_input` / `{kind}N_label` pairs from a hwmon directory.
fn read_inputs(dir: &Path, kind: &str, scale: impl Fn(f64) -> f64) -> Vec<ChipReading> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut readings: Vec<ChipReading> = entries
        .flatten()
        .filter_map(|entry| {
            let file = entry.file_name().to_string_lossy().to_string();
            let index: u32 = file.strip_prefix(kind)?.strip_suffix("_input")?.parse().ok()?;
            let label = fs::read_to_string(dir.join(format!("{}{}_label", kind, index)))
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|_| default_label(kind, index));
            Some(ChipReading {
                index,
                label,
                value: read_number(&entry.path()).map(&scale),
            })
        })
        .collect();
    readings.sort_by_key(|r| r.index);
    readings
}

fn default_label(kind: &str, index: u32) -> String {
    match kind {
        "fan" => format!("Fan #{}", index),
        _ => format!("{}{}", kind, index),
    }
}

/// Picks the package temperature from the first CPU chip family present.
pub(crate) fn cpu_temperature_from(table: &ChipTable, package: usize) -> Result<f64> {
    let chain: Vec<&str> = CPU_TEMP_CHIPS.iter().map(|(chip, _)| *chip).collect();
    let (family, instances) =
        first_chip(table, &chain).ok_or_else(|| Error::unavailable("no cpu temperature chip"))?;

    // Intel exposes one "Package id N" input per socket.
    let package_label = format!("Package id {}", package);
    if let Some(value) = instances
        .iter()
        .flat_map(|chip| chip.temps.iter())
        .find(|r| r.label == package_label)
        .and_then(|r| r.value)
    {
        return Ok(value);
    }

    let prefixes = CPU_TEMP_CHIPS
        .iter()
        .find(|(chip, _)| *chip == family)
        .map(|(_, prefixes)| *prefixes)
        .unwrap_or(&[""]);
    instances
        .get(package)
        .and_then(|chip| first_by_prefix(&chip.temps, prefixes))
        .and_then(|r| r.value)
        .ok_or_else(|| Error::SensorNotFound {
            hardware: format!("{} package {}", family, package),
            sensor: "temperature".into(),
        })
}

/// Matches the fan cooling a package: `#N` or `CPUN` labels first, then any
/// `CPU` label for the first package.
pub(crate) fn cpu_fan_from(fans: &[&ChipReading], package: usize) -> Result<f64> {
    let n = package + 1;
    let by_number = [format!("#{}", n), format!("CPU{}", n)];
    let live = || fans.iter().filter(|f| f.value.is_some());

    live()
        .find(|f| by_number.iter().any(|tag| f.label.contains(tag.as_str())))
        .or_else(|| {
            if package == 0 {
                live().find(|f| f.label.contains("CPU"))
            } else {
                None
            }
        })
        .and_then(|f| f.value)
        .ok_or_else(|| Error::SensorNotFound {
            hardware: format!("cpu package {}", package),
            sensor: "fan".into(),
        })
}

/// Parses per-CPU lines of /proc/stat.
///
/// Busy time excludes idle and iowait. Only the first eight fields count
/// towards the total because guest time is already part of user time.
fn parse_cpu_times(content: &str) -> BTreeMap<usize, CpuTimes> {
    content
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let cpu: usize = parts.next()?.strip_prefix("cpu")?.parse().ok()?;
            let fields: Vec<u64> = parts.take(8).filter_map(|s| s.parse().ok()).collect();
            if fields.len() < 4 {
                return None;
            }
            let total: u64 = fields.iter().sum();
            let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
            Some((
                cpu,
                CpuTimes {
                    busy: total.saturating_sub(idle),
                    total,
                },
            ))
        })
        .collect()
}

/// Parses "processor" / "cpu MHz" pairs from /proc/cpuinfo.
fn parse_cpuinfo_mhz(content: &str) -> Vec<(usize, f64)> {
    let mut current = None;
    let mut freqs = Vec::new();
    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        match key.trim() {
            "processor" => current = value.trim().parse().ok(),
            "cpu MHz" => {
                if let (Some(cpu), Ok(mhz)) = (current, value.trim().parse::<f64>()) {
                    freqs.push((cpu, mhz));
                }
            }
            _ => {}
        }
    }
    freqs
}

/// Sums sector counters of whole physical disks from /proc/diskstats.
///
/// `is_disk` says whether a device name is a whole disk (not a partition).
fn parse_diskstats(content: &str, is_disk: impl Fn(&str) -> bool) -> DiskCounters {
    let mut counters = DiskCounters::default();
    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 10 {
            continue;
        }
        let name = parts[2];
        if VIRTUAL_DISK_PREFIXES.iter().any(|p| name.starts_with(p)) || !is_disk(name) {
            continue;
        }
        let (Ok(read), Ok(written)) = (parts[5].parse::<u64>(), parts[9].parse::<u64>()) else {
            continue;
        };
        counters.read_bytes = counters.read_bytes.saturating_add(read * SECTOR_SIZE);
        counters.write_bytes = counters.write_bytes.saturating_add(written * SECTOR_SIZE);
    }
    counters
}

/// Extracts the memory speed from `dmidecode --type 17` output.
///
/// The configured speed wins over the rated speed; empty slots report
/// "Unknown" and are skipped.
fn parse_dmidecode_speed(output: &str) -> Option<f64> {
    let speed_of = |keys: &[&str]| {
        output.lines().find_map(|line| {
            let (key, value) = line.trim().split_once(':')?;
            if !keys.contains(&key.trim()) {
                return None;
            }
            let mhz: f64 = value.split_whitespace().next()?.parse().ok()?;
            (mhz > 0.0).then_some(mhz)
        })
    };
    speed_of(&["Configured Memory Speed", "Configured Clock Speed"])
        .or_else(|| speed_of(&["Speed"]))
}

/// Extracts the first "clock: 3200MHz" entry from `lshw -class memory`.
fn parse_lshw_clock(output: &str) -> Option<f64> {
    output.lines().find_map(|line| {
        let value = line.trim().strip_prefix("clock:")?.trim();
        let token = value.split_whitespace().next()?;
        let (number, scale) = if let Some(n) = token.strip_suffix("GHz") {
            (n, 1000.0)
        } else if let Some(n) = token.strip_suffix("MHz") {
            (n, 1.0)
        } else {
            return None;
        };
        let mhz = number.parse::<f64>().ok()? * scale;
        (mhz > 0.0).then_some(mhz)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PROC_STAT: &str = "\
cpu  400 0 200 1200 0 0 0 0 0 0
cpu0 10 0 0 90 0 0 0 0 0 0
cpu1 20 0 0 80 0 0 0 0 0 0
cpu2 60 0 0 40 0 0 0 0 0 0
cpu3 80 0 0 20 0 0 0 0 0 0
intr 12345
ctxt 678
";

    /// Fake /proc and /sys for a dual-socket box with two CPUs per socket.
    struct Fixture {
        _tmp: TempDir,
        platform: LinuxPlatform,
        sys: PathBuf,
        proc: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            let proc = tmp.path().join("proc");
            let sys = tmp.path().join("sys");
            fs::create_dir_all(&proc).unwrap();
            fs::write(proc.join("stat"), PROC_STAT).unwrap();
            for (cpu, package) in [(0, 0), (1, 0), (2, 1), (3, 1)] {
                let dir = sys.join(format!("devices/system/cpu/cpu{}", cpu));
                fs::create_dir_all(dir.join("topology")).unwrap();
                fs::create_dir_all(dir.join("cpufreq")).unwrap();
                fs::write(
                    dir.join("topology/physical_package_id"),
                    package.to_string(),
                )
                .unwrap();
            }
            let platform = LinuxPlatform::new(&PlatformOptions {
                proc_root: proc.clone(),
                sys_root: sys.clone(),
                command_timeout: Duration::from_secs(2),
            });
            Self {
                _tmp: tmp,
                platform,
                sys,
                proc,
            }
        }

        fn write_cpufreq(&self, attribute: &str, khz: [u64; 4]) {
            for (cpu, value) in khz.iter().enumerate() {
                let path = self
                    .sys
                    .join(format!("devices/system/cpu/cpu{}/cpufreq/{}", cpu, attribute));
                fs::write(path, format!("{}\n", value)).unwrap();
            }
        }

        fn add_hwmon(&self, index: u32, name: &str, files: &[(&str, &str)]) {
            let dir = self.sys.join(format!("class/hwmon/hwmon{}", index));
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("name"), format!("{}\n", name)).unwrap();
            for (file, contents) in files {
                fs::write(dir.join(file), contents).unwrap();
            }
        }
    }

    #[test]
    fn test_cpu_load_grouped_by_package() {
        let fx = Fixture::new();
        let mut sampler = LoadSampler::new();
        // First read measures since boot: cpu loads are 10, 20, 60, 80.
        assert_eq!(fx.platform.cpu_load(0, &mut sampler).unwrap(), 15.0);
        let mut sampler = LoadSampler::new();
        assert_eq!(fx.platform.cpu_load(1, &mut sampler).unwrap(), 70.0);
        assert!(fx.platform.cpu_load(2, &mut LoadSampler::new()).is_err());
    }

    #[test]
    fn test_cpu_load_missing_proc_stat() {
        let fx = Fixture::new();
        fs::remove_file(fx.proc.join("stat")).unwrap();
        let err = fx.platform.cpu_load(0, &mut LoadSampler::new()).unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn test_frequencies() {
        let fx = Fixture::new();
        fx.write_cpufreq("scaling_cur_freq", [2_000_000, 3_000_000, 1_000_000, 1_200_000]);
        fx.write_cpufreq("cpuinfo_max_freq", [3_900_000, 4_100_000, 3_500_000, 3_700_000]);
        assert_eq!(fx.platform.cpu_frequency(0).unwrap(), 2500.0);
        assert_eq!(fx.platform.cpu_frequency(1).unwrap(), 1100.0);
        assert_eq!(fx.platform.cpu_max_frequency(0).unwrap(), 4100.0);
        assert_eq!(fx.platform.cpu_max_frequency(1).unwrap(), 3700.0);
    }

    #[test]
    fn test_socket_without_cpufreq_keeps_its_index() {
        let fx = Fixture::new();
        for cpu in [2, 3] {
            let path = fx
                .sys
                .join(format!("devices/system/cpu/cpu{}/cpufreq/scaling_cur_freq", cpu));
            fs::write(path, "1500000\n").unwrap();
        }
        let err = fx.platform.cpu_frequency(0).unwrap_err();
        assert!(matches!(err, Error::SensorNotFound { .. }));
        assert_eq!(fx.platform.cpu_frequency(1).unwrap(), 1500.0);
        assert!(matches!(
            fx.platform.cpu_frequency(2),
            Err(Error::Unavailable(_))
        ));
    }

    #[test]
    fn test_frequency_falls_back_to_cpuinfo() {
        let fx = Fixture::new();
        fs::write(
            fx.proc.join("cpuinfo"),
            "processor\t: 0\ncpu MHz\t\t: 1800.000\n\nprocessor\t: 1\ncpu MHz\t\t: 2200.000\n\n\
             processor\t: 2\ncpu MHz\t\t: 3000.000\n\nprocessor\t: 3\ncpu MHz\t\t: 3000.000\n",
        )
        .unwrap();
        assert_eq!(fx.platform.cpu_frequency(0).unwrap(), 2000.0);
        assert_eq!(fx.platform.cpu_frequency(1).unwrap(), 3000.0);
    }

    #[test]
    fn test_coretemp_package_labels() {
        let fx = Fixture::new();
        fx.add_hwmon(
            0,
            "coretemp",
            &[
                ("temp1_input", "52000\n"),
                ("temp1_label", "Package id 0\n"),
                ("temp2_input", "49000\n"),
                ("temp2_label", "Core 0\n"),
            ],
        );
        fx.add_hwmon(
            1,
            "coretemp",
            &[("temp1_input", "61000\n"), ("temp1_label", "Package id 1\n")],
        );
        assert_eq!(fx.platform.cpu_temperature(0).unwrap(), 52.0);
        assert_eq!(fx.platform.cpu_temperature(1).unwrap(), 61.0);
    }

    #[test]
    fn test_k10temp_fallback_chain() {
        let fx = Fixture::new();
        fx.add_hwmon(
            0,
            "k10temp",
            &[
                ("temp1_input", "70500\n"),
                ("temp1_label", "Tctl\n"),
                ("temp2_input", "60500\n"),
                ("temp2_label", "Tdie\n"),
            ],
        );
        fx.add_hwmon(1, "nvme", &[("temp1_input", "38850\n"), ("temp1_label", "Composite\n")]);
        assert_eq!(fx.platform.cpu_temperature(0).unwrap(), 60.5);
        assert!(matches!(
            fx.platform.cpu_temperature(1),
            Err(Error::SensorNotFound { .. })
        ));
        assert_eq!(fx.platform.nvme_temperature().unwrap(), 38.85);
    }

    #[test]
    fn test_no_temperature_chips() {
        let fx = Fixture::new();
        fx.add_hwmon(0, "acpitz", &[("temp1_input", "27800\n")]);
        assert!(matches!(
            fx.platform.cpu_temperature(0),
            Err(Error::Unavailable(_))
        ));
        assert!(fx.platform.nvme_temperature().is_err());
    }

    #[test]
    fn test_hwmon_enumeration_is_numeric() {
        let fx = Fixture::new();
        fx.add_hwmon(10, "nvme", &[("temp1_input", "50000\n")]);
        fx.add_hwmon(2, "nvme", &[("temp1_input", "40000\n")]);
        assert_eq!(fx.platform.nvme_temperature().unwrap(), 40.0);
    }

    #[test]
    fn test_fan_matching() {
        let fx = Fixture::new();
        fx.add_hwmon(
            3,
            "nct6779",
            &[
                ("fan1_input", "1250\n"),
                ("fan2_input", "980\n"),
                ("fan3_input", "0\n"),
            ],
        );
        assert_eq!(fx.platform.cpu_fan_speed(0).unwrap(), 1250.0);
        assert_eq!(fx.platform.cpu_fan_speed(1).unwrap(), 980.0);
    }

    #[test]
    fn test_fan_labels() {
        let reading = |index, label: &str, value| ChipReading {
            index,
            label: label.to_string(),
            value: Some(value),
        };
        let sys = reading(1, "SYS Fan", 700.0);
        let cpu2 = reading(2, "CPU2 FAN", 1500.0);
        let cpu1 = reading(3, "CPU1 FAN", 1400.0);
        let fans = [&sys, &cpu2, &cpu1];
        assert_eq!(cpu_fan_from(&fans, 0).unwrap(), 1400.0);
        assert_eq!(cpu_fan_from(&fans, 1).unwrap(), 1500.0);

        let generic = reading(1, "CPU Fan", 900.0);
        assert_eq!(cpu_fan_from(&[&generic], 0).unwrap(), 900.0);
        assert!(cpu_fan_from(&[&generic], 1).is_err());
    }

    #[test]
    fn test_diskstats_whole_disks_only() {
        let content = "\
 259       0 nvme0n1 100 0 2048 10 50 0 4096 20 0 30 30
 259       1 nvme0n1p1 90 0 2000 10 40 0 4000 20 0 30 30
   8       0 sda 10 0 8 1 5 0 16 2 0 3 3
   7       0 loop0 10 0 999 1 0 0 0 0 0 1 1
 253       0 dm-0 10 0 999 1 5 0 999 2 0 3 3
";
        let disks = ["nvme0n1", "sda", "loop0", "dm-0"];
        let counters = parse_diskstats(content, |name| disks.contains(&name));
        assert_eq!(counters.read_bytes, (2048 + 8) * 512);
        assert_eq!(counters.write_bytes, (4096 + 16) * 512);
    }

    #[test]
    fn test_disk_counters_from_proc() {
        let fx = Fixture::new();
        fs::write(
            fx.proc.join("diskstats"),
            "   8       0 sda 10 0 100 1 5 0 200 2 0 3 3\n   8       1 sda1 10 0 100 1 5 0 200 2 0 3 3\n",
        )
        .unwrap();
        fs::create_dir_all(fx.sys.join("block/sda")).unwrap();
        let counters = fx.platform.disk_counters().unwrap();
        assert_eq!(
            counters,
            DiskCounters {
                read_bytes: 100 * 512,
                write_bytes: 200 * 512
            }
        );
    }

    #[test]
    fn test_parse_dmidecode() {
        let output = "\
Memory Device
\tSize: No Module Installed
\tSpeed: Unknown
\tConfigured Memory Speed: Unknown

Memory Device
\tSize: 32 GB
\tSpeed: 3200 MT/s
\tConfigured Memory Speed: 2933 MT/s
";
        assert_eq!(parse_dmidecode_speed(output), Some(2933.0));
        assert_eq!(parse_dmidecode_speed("\tSpeed: 2400 MHz\n"), Some(2400.0));
        assert_eq!(parse_dmidecode_speed("\tSpeed: Unknown\n"), None);
    }

    #[test]
    fn test_parse_lshw() {
        let output = "\
  *-memory
       description: System Memory
       size: 64GiB
     *-bank:0
          description: DIMM DDR4 Synchronous 3200 MHz (0.3 ns)
          clock: 3200MHz (0.3ns)
";
        assert_eq!(parse_lshw_clock(output), Some(3200.0));
        assert_eq!(parse_lshw_clock("clock: 1GHz\n"), Some(1000.0));
        assert_eq!(parse_lshw_clock("size: 64GiB\n"), None);
    }

    #[test]
    fn test_parse_cpu_times_ignores_aggregate_line() {
        let times = parse_cpu_times(PROC_STAT);
        assert_eq!(times.len(), 4);
        assert_eq!(times[&2], CpuTimes { busy: 60, total: 100 });
    }
}
