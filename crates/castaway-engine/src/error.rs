//! Error types for the engine binary.

/// Top-level error for the engine binary.
///
/// Each variant wraps one subsystem's error so `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: castaway_core::config::ConfigError,
    },

    /// The starting session could not be built.
    #[error("session error: {source}")]
    Session {
        /// The underlying context error.
        #[from]
        source: castaway_core::ContextError,
    },

    /// The run loop failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: castaway_core::RunnerError,
    },

    /// The observer server could not be started.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying server error.
        #[from]
        source: castaway_observer::ServerError,
    },

    /// An environment variable held an unusable value.
    #[error("invalid environment variable {name}: {message}")]
    Env {
        /// The variable name.
        name: &'static str,
        /// What was wrong with it.
        message: String,
    },

    /// Waiting for the interrupt signal failed.
    #[error("signal error: {source}")]
    Signal {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
