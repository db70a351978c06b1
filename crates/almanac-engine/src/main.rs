//! Calendar engine binary for Almanac.
//!
//! Wires a [`CalendarEngine`] to an in-process host world clock over tokio
//! channels and runs the real-time clock until interrupted.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `almanac-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Build and validate the calendar engine
//! 4. Create the channel host and start the host world-clock task
//! 5. Start the real-time clock loop
//! 6. Wait for Ctrl-C, shut both tasks down and log the final snapshot
//!
//! [`CalendarEngine`]: almanac_core::engine::CalendarEngine

mod error;
mod host;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use almanac_core::config::AlmanacConfig;
use almanac_core::sync::{ChannelHost, SyncHost};
use almanac_core::{clock, projection};
use tokio::sync::{Mutex, watch};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::host::WorldClock;

/// Name of the configuration file looked up in the working directory.
const CONFIG_FILE: &str = "almanac-config.yaml";

/// Environment variable holding the combat round period in seconds.
const COMBAT_EVERY_VAR: &str = "ALMANAC_COMBAT_EVERY_SECS";

/// Application entry point for the calendar engine.
///
/// # Errors
///
/// Returns an error if configuration fails to load or validate, or a
/// background task fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("almanac-engine starting");
    info!(
        calendar = config.calendar.name,
        months = config.calendar.months.len(),
        weekdays = config.calendar.weekdays.len(),
        mode = ?config.sync.mode,
        primary = config.sync.primary,
        "Configuration loaded"
    );

    // 3. Build the engine.
    let mut engine = config.build_engine().map_err(EngineError::from)?;
    engine.clock_mut().start();
    let period = engine.clock().update_interval();
    let world = WorldClock::new(engine.world_seconds());
    let engine = Arc::new(Mutex::new(engine));

    // 4. Host world clock.
    let (host, commands) = ChannelHost::new(config.sync.primary, config.sync.elevated);
    let host = Arc::new(host);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let combat_every = combat_period();
    if let Some(every) = combat_every {
        info!(every_secs = every.as_secs(), "Simulated combat enabled");
    }
    let host_handle = tokio::spawn(host::run(
        Arc::clone(&engine),
        Arc::clone(&host),
        commands,
        world,
        combat_every,
        shutdown_rx.clone(),
    ));

    // 5. Real-time clock.
    let clock_host: Arc<dyn SyncHost> = host.clone();
    let clock_handle = tokio::spawn(clock::run(
        Arc::clone(&engine),
        clock_host,
        period,
        shutdown_rx,
    ));
    info!(period_secs = period.as_secs(), "Real-time clock started");

    // 6. Run until interrupted.
    tokio::signal::ctrl_c().await.map_err(|e| EngineError::Signal {
        message: format!("{e}"),
    })?;
    info!("Shutdown requested");
    if shutdown_tx.send(true).is_err() {
        warn!("background tasks already stopped");
    }
    for handle in [clock_handle, host_handle] {
        handle.await.map_err(|e| EngineError::Task {
            message: format!("{e}"),
        })?;
    }

    let snapshot = projection::snapshot(&*engine.lock().await);
    info!(
        date = snapshot.current.text,
        time = snapshot.time,
        season = snapshot.season.name,
        "Final calendar state"
    );
    info!(snapshot = %serde_json::to_string(&snapshot)?, "almanac-engine stopped");
    Ok(())
}

/// Load configuration from `almanac-config.yaml`.
///
/// If the file does not exist, defaults are used.
fn load_config() -> Result<AlmanacConfig, EngineError> {
    let config_path = Path::new(CONFIG_FILE);
    if config_path.exists() {
        Ok(AlmanacConfig::from_file(config_path)?)
    } else {
        let mut config = AlmanacConfig::default();
        config.apply_env_overrides();
        Ok(config)
    }
}

/// Combat round period from the environment, if set to a positive number.
fn combat_period() -> Option<Duration> {
    std::env::var(COMBAT_EVERY_VAR)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}
