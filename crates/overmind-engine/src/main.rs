//! Headless engine binary for the Overmind micro-control engine.
//!
//! Wires the controller to a scripted skirmish host over a command channel
//! and runs the tick loop until the tick limit or Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `overmind-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing) from the `logging` section
//! 3. Build the default skirmish map
//! 4. Create the command channel and the skirmish host
//! 5. Create the controller and install the Ctrl-C stop handler
//! 6. Run the tick loop
//! 7. Log the run summary

mod error;
mod host;

use std::path::Path;

use anyhow::Context as _;
use overmind_core::{
    ChannelSink, MicroConfig, MicroController, RunBounds, StopHandle, log_run_end, run_controller,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::host::{SkirmishConfig, SkirmishHost};

/// Configuration file looked up in the working directory.
const CONFIG_PATH: &str = "overmind-config.yaml";

/// Batches buffered between the controller and the host.
const COMMAND_CHANNEL_CAPACITY: usize = 8;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, logging setup, map construction, or
/// the run loop fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let (config, from_file) = load_config().context("loading engine configuration")?;

    // 2. Initialize structured logging.
    init_logging(&config).context("initializing logging")?;
    info!("overmind-engine starting");
    if !from_file {
        info!(path = CONFIG_PATH, "Config file not found, using defaults");
    }
    info!(
        ticks_per_second = config.schedule.ticks_per_second,
        update_interval = config.schedule.update_interval,
        burrow_check_interval = config.schedule.burrow_check_interval,
        max_ticks = config.schedule.max_ticks,
        tick_interval_ms = config.schedule.tick_interval_ms,
        "Configuration loaded"
    );

    // 3. Build the skirmish map.
    let map = overmind_world::create_skirmish_map().map_err(EngineError::from)?;
    info!(
        own_bases = map.own_bases.len(),
        enemy_bases = map.enemy_bases.len(),
        own_ramp = %map.own_ramp,
        "Skirmish map created"
    );

    // 4. Command channel and host.
    let skirmish = load_skirmish_config()?;
    let (mut sink, commands) = ChannelSink::channel(COMMAND_CHANNEL_CAPACITY);
    let mut host = SkirmishHost::new(&map, skirmish, commands, config.schedule.ticks_per_second);

    // 5. Controller and stop handler.
    let bounds = RunBounds::from_schedule(&config.schedule);
    let mut controller = MicroController::new(config).map_err(EngineError::from)?;
    let stop = StopHandle::new();
    {
        let stop = stop.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl-C received, stopping after the current tick");
                    stop.request_stop();
                }
                Err(e) => warn!(error = %e, "failed to listen for Ctrl-C"),
            }
        });
    }

    // 6. Run.
    let summary =
        run_controller(&mut controller, &mut host, &map.terrain, &mut sink, bounds, &stop)
            .await
            .map_err(EngineError::from)?;

    // 7. Log results.
    log_run_end(&summary, controller.suppressed_log_events());
    match serde_json::to_string(&summary) {
        Ok(json) => info!(summary = %json, "Run summary"),
        Err(e) => warn!(error = %e, "failed to serialize run summary"),
    }
    info!(
        agents_alive = host.agents_alive(),
        enemies_alive = host.enemies_alive(),
        waves = host.waves_spawned(),
        batches = host.batches_applied(),
        "overmind-engine shutdown complete"
    );

    Ok(())
}

/// Load the engine configuration, reporting whether the file was present.
fn load_config() -> Result<(MicroConfig, bool), EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        let config = MicroConfig::from_file(config_path)?;
        Ok((config, true))
    } else {
        let mut config = MicroConfig::default();
        config.logging.apply_env_overrides();
        Ok((config, false))
    }
}

/// Install the global subscriber from the `logging` section.
fn init_logging(config: &MicroConfig) -> Result<(), EngineError> {
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = if config.logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| EngineError::Logging {
        message: format!("{e}"),
    })
}

/// Load the `skirmish` section from `overmind-config.yaml`.
///
/// Missing file or section means defaults.
fn load_skirmish_config() -> Result<SkirmishConfig, EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if !config_path.exists() {
        return Ok(SkirmishConfig::default());
    }
    let contents = std::fs::read_to_string(config_path).map_err(|e| EngineError::Skirmish {
        message: format!("failed to read config file: {e}"),
    })?;
    let raw: serde_yml::Value = serde_yml::from_str(&contents).map_err(|e| EngineError::Skirmish {
        message: format!("failed to parse config YAML: {e}"),
    })?;
    match raw.get("skirmish") {
        Some(section) => serde_yml::from_value(section.clone()).map_err(|e| EngineError::Skirmish {
            message: format!("failed to parse skirmish config: {e}"),
        }),
        None => Ok(SkirmishConfig::default()),
    }
}
