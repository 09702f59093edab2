//! Configuration management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use socketmon_sensors::platform::DEFAULT_COMMAND_TIMEOUT;
use socketmon_sensors::{PlatformKind, PlatformOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Sensor poll interval in milliseconds
    #[serde(default = "default_poll")]
    pub poll: u64,

    /// Sensor platform: "auto", "linux", "windows" or "none"
    #[serde(default = "default_platform")]
    pub platform: String,

    /// Metric ids to poll (empty polls everything)
    #[serde(default)]
    pub sensors: Vec<String>,

    /// Linux counter file locations
    #[serde(default)]
    pub linux: LinuxConfig,

    /// External command settings
    #[serde(default)]
    pub commands: CommandsConfig,
}

/// Roots of the kernel's virtual filesystems.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinuxConfig {
    #[serde(default = "default_proc_root")]
    pub proc_root: PathBuf,

    #[serde(default = "default_sys_root")]
    pub sys_root: PathBuf,
}

impl Default for LinuxConfig {
    fn default() -> Self {
        Self {
            proc_root: default_proc_root(),
            sys_root: default_sys_root(),
        }
    }
}

/// Subprocess configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandsConfig {
    /// Timeout for hardware query commands in milliseconds
    #[serde(default = "default_command_timeout")]
    pub timeout: u64,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            timeout: default_command_timeout(),
        }
    }
}

// Default value functions
fn default_poll() -> u64 {
    1000
}

fn default_platform() -> String {
    "auto".to_string()
}

fn default_proc_root() -> PathBuf {
    PathBuf::from("/proc")
}

fn default_sys_root() -> PathBuf {
    PathBuf::from("/sys")
}

fn default_command_timeout() -> u64 {
    DEFAULT_COMMAND_TIMEOUT.as_millis() as u64
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read configuration file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse configuration")?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    #[allow(dead_code)]
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        std::fs::write(path.as_ref(), content).context("Failed to write configuration file")?;
        Ok(())
    }

    /// Parses the configured platform name.
    pub fn platform_kind(&self) -> Result<PlatformKind> {
        self.platform
            .parse::<PlatformKind>()
            .with_context(|| format!("Invalid platform '{}'", self.platform))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll.max(1))
    }

    /// Options handed to the platform strategy.
    pub fn platform_options(&self) -> PlatformOptions {
        let command_timeout = match self.commands.timeout {
            0 => DEFAULT_COMMAND_TIMEOUT,
            ms => Duration::from_millis(ms),
        };
        PlatformOptions {
            proc_root: self.linux.proc_root.clone(),
            sys_root: self.linux.sys_root.clone(),
            command_timeout,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll: default_poll(),
            platform: default_platform(),
            sensors: Vec::new(),
            linux: LinuxConfig::default(),
            commands: CommandsConfig::default(),
        }
    }
}
