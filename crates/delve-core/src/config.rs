//! Configuration loading and typed config structures for a Delve session.
//!
//! The canonical configuration lives in `delve-config.yaml`. This module
//! defines strongly-typed structs that mirror the YAML structure, and
//! provides a loader that reads the file and applies environment overrides.
//! Every field has a default, so an empty document is a valid configuration.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level session configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DelveConfig {
    /// Dungeon layout and seed.
    #[serde(default)]
    pub world: WorldConfig,

    /// Clock granularity and session ceiling.
    #[serde(default)]
    pub time: TimeConfig,

    /// Player speed and scripted input.
    #[serde(default)]
    pub player: PlayerConfig,

    /// Creature population parameters.
    #[serde(default)]
    pub creatures: CreatureConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DelveConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `DELVE_TICK_CEILING` overrides `time.tick_ceiling`
    /// - `DELVE_SEED` overrides `world.seed`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup. Values that do not
    /// parse as numbers are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(ceiling) = lookup("DELVE_TICK_CEILING").and_then(|v| v.trim().parse().ok()) {
            self.time.tick_ceiling = ceiling;
        }
        if let Some(seed) = lookup("DELVE_SEED").and_then(|v| v.trim().parse().ok()) {
            self.world.seed = seed;
        }
    }
}

/// Dungeon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable session name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Dungeon width in cells, including the outer wall.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Dungeon height in cells, including the outer wall.
    #[serde(default = "default_height")]
    pub height: u32,

    /// Number of ice patches scattered over the floor.
    #[serde(default = "default_ice_patches")]
    pub ice_patches: u32,

    /// Number of fountains (points of interest) placed on the floor.
    #[serde(default = "default_fountains")]
    pub fountains: u32,

    /// Coarse ticks without rest before the player starves. Zero disables
    /// hunger.
    #[serde(default)]
    pub hunger_limit_ticks: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            width: default_width(),
            height: default_height(),
            ice_patches: default_ice_patches(),
            fountains: default_fountains(),
            hunger_limit_ticks: 0,
        }
    }
}

/// Clock configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TimeConfig {
    /// Fine milliticks in one coarse tick.
    #[serde(default = "default_milliticks_per_tick")]
    pub milliticks_per_tick: u64,

    /// Coarse tick count that ends the session.
    #[serde(default = "default_tick_ceiling")]
    pub tick_ceiling: u64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            milliticks_per_tick: default_milliticks_per_tick(),
            tick_ceiling: default_tick_ceiling(),
        }
    }
}

/// Player configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlayerConfig {
    /// Player speed; 12 is normal.
    #[serde(default = "default_speed")]
    pub speed: u32,

    /// Commands fed to the player, in the text syntax of
    /// [`delve_types::Command`]. The session quits when they run out.
    #[serde(default)]
    pub script: Vec<String>,

    /// Coarse ticks the player starts out paralysed for.
    #[serde(default)]
    pub held_ticks: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            script: Vec::new(),
            held_ticks: 0,
        }
    }
}

/// Creature population configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatureConfig {
    /// Creatures placed at session start.
    #[serde(default = "default_initial_creatures")]
    pub initial: u32,

    /// Population cap for periodic spawning.
    #[serde(default = "default_max_creatures")]
    pub max: u32,

    /// Coarse ticks between spawn attempts. Zero disables spawning.
    #[serde(default = "default_spawn_interval_ticks")]
    pub spawn_interval_ticks: u64,

    /// Speeds new creatures are drawn from.
    #[serde(default = "default_creature_speeds")]
    pub speeds: Vec<u32>,
}

impl Default for CreatureConfig {
    fn default() -> Self {
        Self {
            initial: default_initial_creatures(),
            max: default_max_creatures(),
            spawn_interval_ticks: default_spawn_interval_ticks(),
            speeds: default_creature_speeds(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset (e.g. `info`, `delve_core=debug`).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    "The Delve".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_width() -> u32 {
    40
}

const fn default_height() -> u32 {
    20
}

const fn default_ice_patches() -> u32 {
    6
}

const fn default_fountains() -> u32 {
    3
}

const fn default_milliticks_per_tick() -> u64 {
    1000
}

const fn default_tick_ceiling() -> u64 {
    99_999
}

const fn default_speed() -> u32 {
    12
}

const fn default_initial_creatures() -> u32 {
    3
}

const fn default_max_creatures() -> u32 {
    8
}

const fn default_spawn_interval_ticks() -> u64 {
    50
}

fn default_creature_speeds() -> Vec<u32> {
    vec![6, 12, 24]
}

fn default_log_level() -> String {
    "info".to_owned()
}
