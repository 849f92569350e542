//! Error types for the Tickflow engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps every failure
//! mode during startup and the run itself.

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
        source: tickflow_core::config::ConfigError,
    },

    /// The scenario could not be assembled.
    #[error("scenario error: {source}")]
    Scenario {
        /// The underlying configuration error.
        #[from]
        source: tickflow_core::error::ConfigurationError,
    },

    /// The run failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: tickflow_core::runner::RunnerError,
    },

    /// Logging could not be initialized.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the logging failure.
        message: String,
    },
}
