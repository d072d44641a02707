//! Error types for the Overmind engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup and the run loop so
//! `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: overmind_core::ConfigError,
    },

    /// Skirmish map construction failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: overmind_world::WorldError,
    },

    /// The run loop stopped on an unrecoverable tick.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: overmind_core::RunnerError,
    },

    /// The `skirmish` section of the config file could not be read.
    #[error("skirmish config error: {message}")]
    Skirmish {
        /// Description of the failure.
        message: String,
    },

    /// The tracing subscriber could not be installed.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },
}
