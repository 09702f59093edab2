//! Socketmon Daemon
//!
//! Polls per-socket CPU, memory, disk and NVMe sensors at a fixed cadence and
//! hands the readings to a display renderer as JSON lines.

mod config;

use anyhow::{Context, Result};
use clap::Parser;
use socketmon_sensors::platform;
use socketmon_sensors::{Reading, SensorRegistry};
use std::path::Path;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use config::Config;

#[derive(Parser)]
#[command(name = "socketmond")]
#[command(about = "Per-socket hardware sensor daemon")]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(default_value = "config/default.toml")]
    config: String,

    /// Poll one cycle and exit
    #[arg(long)]
    once: bool,

    /// Print a JSON snapshot line per cycle to stdout
    #[arg(long)]
    json: bool,

    /// List the registered metric ids and exit
    #[arg(long)]
    list: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging; stdout is reserved for snapshots
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli.config)?;
    let kind = config.platform_kind()?;
    let platform = platform::select(kind, &config.platform_options());

    let mut registry = SensorRegistry::with_defaults(platform);
    for id in registry.retain(&config.sensors) {
        warn!("Unknown sensor '{}' in configuration, ignoring", id);
    }

    if cli.list {
        for id in registry.ids() {
            println!("{}", id);
        }
        return Ok(());
    }

    if registry.is_empty() {
        warn!("No sensors selected, nothing to poll");
        return Ok(());
    }

    let interval = config.poll_interval();

    if cli.once {
        // Rate sensors need two samples to report a delta
        let (registry, _) = poll(registry).await?;
        tokio::time::sleep(interval).await;
        let (_, readings) = poll(registry).await?;
        return emit(&readings, cli.json);
    }

    info!(
        "Polling {} sensors every {} ms",
        registry.len(),
        interval.as_millis()
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let (returned, readings) = poll(registry).await?;
                registry = returned;
                emit(&readings, cli.json)?;
            }
            result = &mut shutdown => {
                result?;
                break;
            }
        }
    }

    Ok(())
}

fn load_config(path: &str) -> Result<Config> {
    if !Path::new(path).exists() {
        warn!("Configuration file {} not found, using defaults", path);
        return Ok(Config::default());
    }

    let config = Config::load(path).context("Failed to load configuration")?;
    info!("Loaded configuration from: {}", path);
    Ok(config)
}

/// Samples every sensor off the async runtime; sensor reads may block on
/// subprocesses or WMI.
async fn poll(mut registry: SensorRegistry) -> Result<(SensorRegistry, Vec<Reading>)> {
    tokio::task::spawn_blocking(move || {
        let readings = registry.poll();
        (registry, readings)
    })
    .await
    .context("Sensor poll task failed")
}

fn emit(readings: &[Reading], json: bool) -> Result<()> {
    for reading in readings {
        debug!("{}: {}", reading.id, reading.text);
    }
    if json {
        let line = serde_json::to_string(readings).context("Failed to serialize readings")?;
        println!("{}", line);
    }
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("Received SIGINT, shutting down"),
    }
    Ok(())
}

#[cfg(not(unix))]
async fn shutdown_signal() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl-C, shutting down");
    Ok(())
}
