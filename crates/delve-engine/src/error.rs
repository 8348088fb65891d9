//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup and the run itself so
//! `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: delve_core::config::ConfigError,
    },

    /// Clock construction failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: delve_core::clock::ClockError,
    },

    /// The player script could not be parsed.
    #[error("script error: {source}")]
    Script {
        /// The underlying decision error.
        #[from]
        source: delve_core::decision::DecisionError,
    },

    /// The dungeon could not be built.
    #[error("dungeon error: {source}")]
    Dungeon {
        /// The underlying dungeon error.
        #[from]
        source: crate::dungeon::DungeonError,
    },

    /// The session aborted.
    #[error("driver error: {source}")]
    Driver {
        /// The underlying driver error.
        #[from]
        source: delve_core::driver::DriverError,
    },

    /// The session report could not be serialized.
    #[error("report error: {source}")]
    Report {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}
