//! Logical CPU to physical package grouping.
//!
//! Per-logical-CPU readings (load, frequency) are folded into one value per
//! socket using the package ids the kernel exposes under
//! `devices/system/cpu/cpuN/topology/physical_package_id`.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::debug;

/// How per-logical-CPU readings are combined within a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    /// Arithmetic mean (load, current frequency).
    Mean,
    /// Maximum (max frequency).
    Max,
}

/// Mapping from logical CPU index to physical package id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    packages: BTreeMap<usize, u32>,
}

impl Topology {
    /// Reads package ids for the given logical CPUs.
    ///
    /// CPUs whose topology file is missing or malformed land in package 0.
    /// When nothing is readable every CPU collapses into a single package.
    pub fn read(sys_root: &Path, logical_cpus: &[usize]) -> Self {
        let cpu_dir = sys_root.join("devices/system/cpu");
        let packages = logical_cpus
            .iter()
            .map(|&cpu| {
                let path = cpu_dir.join(format!("cpu{}/topology/physical_package_id", cpu));
                let package = fs::read_to_string(&path)
                    .ok()
                    .and_then(|s| s.trim().parse::<i64>().ok())
                    // Some firmware reports -1 for an unknown package
                    .and_then(|id| u32::try_from(id).ok())
                    .unwrap_or_else(|| {
                        debug!("No package id for cpu{}, assuming package 0", cpu);
                        0
                    });
                (cpu, package)
            })
            .collect();
        Self { packages }
    }

    /// Builds a topology from package ids listed by logical CPU index.
    pub fn from_ids(ids: impl IntoIterator<Item = u32>) -> Self {
        Self {
            packages: ids.into_iter().enumerate().collect(),
        }
    }

    /// Returns the package of a logical CPU (0 when unknown).
    pub fn package_of(&self, cpu: usize) -> u32 {
        self.packages.get(&cpu).copied().unwrap_or(0)
    }

    /// Returns the distinct package ids in ascending order.
    pub fn packages(&self) -> Vec<u32> {
        let set: BTreeSet<u32> = self.packages.values().copied().collect();
        set.into_iter().collect()
    }

    /// Groups `(logical_cpu, value)` readings by package. NaN readings are skipped.
    pub fn aggregate(&self, readings: &[(usize, f64)], how: Aggregate) -> BTreeMap<u32, f64> {
        let mut groups: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
        for &(cpu, value) in readings {
            if value.is_nan() {
                continue;
            }
            groups.entry(self.package_of(cpu)).or_default().push(value);
        }

        groups
            .into_iter()
            .map(|(package, values)| {
                let combined = match how {
                    Aggregate::Mean => values.iter().sum::<f64>() / values.len() as f64,
                    Aggregate::Max => values.iter().copied().fold(f64::MIN, f64::max),
                };
                (package, combined)
            })
            .collect()
    }

    /// Returns the aggregate for the `index`-th package in ascending id order.
    ///
    /// The index counts every package in the topology, so a package whose
    /// CPUs produced no readings yields `None` instead of shifting the rest.
    /// Package ids need not be contiguous.
    pub fn package_value(
        &self,
        index: usize,
        readings: &[(usize, f64)],
        how: Aggregate,
    ) -> Option<f64> {
        let package = *self.packages().get(index)?;
        self.aggregate(readings, how).get(&package).copied()
    }
}
