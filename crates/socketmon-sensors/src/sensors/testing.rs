//! Scripted platform for sensor tests.

use crate::platform::{DiskCounters, LoadSampler, Platform, PlatformKind};
use crate::{Error, Result};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Serves queued results to whichever metric asks; empty queues read as
/// unavailable.
#[derive(Default)]
pub struct ScriptedPlatform {
    values: Mutex<VecDeque<Result<f64>>>,
    disks: Mutex<VecDeque<Result<DiskCounters>>>,
    reads: AtomicUsize,
}

impl ScriptedPlatform {
    pub fn with_values(values: impl IntoIterator<Item = f64>) -> Self {
        let platform = Self::default();
        for value in values {
            platform.push(Ok(value));
        }
        platform
    }

    pub fn push(&self, result: Result<f64>) {
        self.values.lock().unwrap().push_back(result);
    }

    pub fn push_disk(&self, read_bytes: u64, write_bytes: u64) {
        self.disks.lock().unwrap().push_back(Ok(DiskCounters {
            read_bytes,
            write_bytes,
        }));
    }

    pub fn push_disk_error(&self) {
        self.disks
            .lock()
            .unwrap()
            .push_back(Err(Error::Io(std::io::Error::other("diskstats"))));
    }

    /// Number of metric reads served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn next(&self) -> Result<f64> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.values
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::unavailable("script exhausted")))
    }
}

impl Platform for ScriptedPlatform {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Unavailable
    }

    fn cpu_load(&self, _package: usize, _sampler: &mut LoadSampler) -> Result<f64> {
        self.next()
    }

    fn cpu_temperature(&self, _package: usize) -> Result<f64> {
        self.next()
    }

    fn cpu_frequency(&self, _package: usize) -> Result<f64> {
        self.next()
    }

    fn cpu_max_frequency(&self, _package: usize) -> Result<f64> {
        self.next()
    }

    fn cpu_fan_speed(&self, _package: usize) -> Result<f64> {
        self.next()
    }

    fn memory_clock(&self) -> Result<f64> {
        self.next()
    }

    fn disk_counters(&self) -> Result<DiskCounters> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.disks
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::unavailable("script exhausted")))
    }

    fn nvme_temperature(&self) -> Result<f64> {
        self.next()
    }
}
