//! Demonstration binary for the Delve turn engine.
//!
//! Builds a small seeded dungeon, places a scripted player and a handful
//! of wandering creatures on it, and runs the driver until the player
//! quits, starves, or the dungeon clock hits its ceiling. A JSON session
//! report is printed to stdout; logs go to stderr.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `DELVE_CONFIG` or `delve-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Create the driver and its clock from the time config
//! 4. Build the dungeon and the world
//! 5. Schedule the player and spawn the initial creatures
//! 6. Run the session
//! 7. Log the result and print the report

mod actors;
mod dungeon;
mod error;
mod report;
mod spawner;
mod world;

use std::path::{Path, PathBuf};

use chrono::Utc;
use delve_core::config::DelveConfig;
use delve_core::driver::Driver;
use delve_core::session;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::report::SessionReport;
use crate::world::DemoWorld;

/// Config file looked up in the working directory when `DELVE_CONFIG` is
/// not set.
const DEFAULT_CONFIG_PATH: &str = "delve-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, world construction, or the session
/// itself fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is not up yet, so remember where it
    //    came from and report it afterwards.
    let (config, source) = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!("delve-engine starting");
    match &source {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("Config file not found, using defaults"),
    }
    info!(
        world_name = config.world.name,
        seed = config.world.seed,
        milliticks_per_tick = config.time.milliticks_per_tick,
        tick_ceiling = config.time.tick_ceiling,
        "Session configuration"
    );

    // 3. Create the driver.
    let mut driver: Driver<DemoWorld> = Driver::from_config(&config.time)?;

    // 4. Build the world.
    let mut world = DemoWorld::new(&config)?;

    // 5. Seed the tickouts.
    world
        .populate(driver.scheduler_mut())
        .map_err(EngineError::from)?;
    info!(
        creatures = world.creatures.len(),
        player = %world.player.id,
        "World populated, entering turn loop"
    );

    // 6. Run.
    let started_at = Utc::now();
    let result = driver.run(&mut world).map_err(EngineError::from)?;
    let finished_at = Utc::now();

    // 7. Log and report.
    session::log_session_end(&result);
    let report = SessionReport::new(&config, &world, &result, started_at, finished_at);
    println!("{}", report.to_json().map_err(EngineError::from)?);

    info!(
        end_reason = %result.end_reason,
        final_tick = result.final_tick,
        "delve-engine shutdown complete"
    );

    Ok(())
}

/// Load configuration.
///
/// An explicit `DELVE_CONFIG` path must exist. Otherwise
/// `delve-config.yaml` in the working directory is used if present, and
/// defaults (plus environment overrides) if not.
fn load_config() -> Result<(DelveConfig, Option<PathBuf>), EngineError> {
    if let Some(path) = std::env::var_os("DELVE_CONFIG") {
        let path = PathBuf::from(path);
        let config = DelveConfig::from_file(&path)?;
        return Ok((config, Some(path)));
    }

    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        let config = DelveConfig::from_file(default_path)?;
        Ok((config, Some(default_path.to_path_buf())))
    } else {
        let mut config = DelveConfig::default();
        config.apply_env_overrides();
        Ok((config, None))
    }
}
