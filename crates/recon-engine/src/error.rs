//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup and episode execution.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: recon_core::config::ConfigError,
    },

    /// The configured instance could not be built or loaded.
    #[error("instance error: {source}")]
    Instance {
        /// The underlying instance error.
        #[from]
        source: recon_core::recon::InstanceError,
    },

    /// An episode failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: recon_core::runner::RunnerError,
    },

    /// Serializing the final state failed.
    #[error("serialization error: {source}")]
    Serialize {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}
