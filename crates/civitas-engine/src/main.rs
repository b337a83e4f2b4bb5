//! Engine binary for the Civitas simulation.
//!
//! This is the entry point that wires the simulation context to real time.
//! It loads configuration, seeds the world, and runs the cycle loop until
//! interrupted or until the configured real-time limit is reached.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `CIVITAS_CONFIG` or `civitas-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build the simulation and found the configured civilizations
//! 4. Open the command queue and start the summary reporter
//! 5. Run the cycle loop
//! 6. Log the result

mod error;
mod event_log;
mod logging;
mod reporter;
mod runner;

use std::path::PathBuf;
use std::time::Duration;

use civitas_core::{CivitasConfig, Simulation, command_channel};
use tracing::{info, warn};

use crate::error::EngineError;
use crate::event_log::LogSubscriber;
use crate::runner::RunOptions;

/// Environment variable naming the configuration file.
const CONFIG_ENV: &str = "CIVITAS_CONFIG";

/// Configuration file used when `CIVITAS_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "civitas-config.yaml";

/// Capacity of the command queue.
const COMMAND_QUEUE_CAPACITY: usize = 256;

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if any initialization step or a simulation cycle fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config_path = config_path();
    let found = config_path.exists();
    let config = CivitasConfig::load_or_default(&config_path).map_err(EngineError::from)?;

    // 2. Initialize structured logging.
    logging::init(&config.logging)?;
    info!("civitas-engine starting");
    if found {
        info!(
            path = %config_path.display(),
            world_name = %config.world.name,
            seed = config.world.seed,
            economic_interval_ms = config.world.economic_interval_ms,
            diplomacy_interval_ms = config.world.diplomacy_interval_ms,
            "Configuration loaded"
        );
    } else {
        warn!(path = %config_path.display(), "Config file not found, using defaults");
    }

    // 3. Build the simulation.
    let mut sim = Simulation::new(&config).map_err(EngineError::from)?;
    sim.subscribe(Box::new(LogSubscriber));
    info!(
        civilizations = sim.profiles().len(),
        resources = sim.economy().registry().len(),
        actions = sim.catalog().len(),
        "World seeded"
    );

    // 4. Command queue and reporter.
    let (handle, mut queue) = command_channel(COMMAND_QUEUE_CAPACITY);
    let reporter = (config.logging.summary_interval_seconds > 0).then(|| {
        reporter::spawn_reporter(
            handle.clone(),
            Duration::from_secs(config.logging.summary_interval_seconds),
        )
    });

    // 5. Run the loop.
    let options = RunOptions::from_world(&config.world);
    let summary = runner::run(&mut sim, &mut queue, options, shutdown_signal()).await?;

    // 6. Log results.
    if let Some(task) = reporter {
        task.abort();
    }
    drop(handle);
    runner::log_run_end(&summary, &sim);
    info!("civitas-engine shutdown complete");

    Ok(())
}

/// Path of the configuration file.
fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV).map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Resolves on Ctrl-C. Never resolves if the signal handler cannot be
/// installed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C, run until the time limit");
        std::future::pending::<()>().await;
    }
}
