//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that `main` propagates with
//! `?`. Each variant wraps one subsystem's failure.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: civitas_core::ConfigError,
    },

    /// Building or advancing the simulation failed.
    #[error("simulation error: {source}")]
    Simulation {
        /// The underlying simulation error.
        #[from]
        source: civitas_core::SimulationError,
    },

    /// The log subscriber could not be installed.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },
}
