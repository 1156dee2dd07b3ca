//! Error types for the LLM collaborator.
//!
//! Uses `thiserror` for typed errors that surface through the whole call
//! pipeline: configuration, prompt rendering, the HTTP backend, and
//! response parsing. Every variant maps onto a [`ReasonerError`] so the
//! engine's bounded executor can substitute a fallback.

use castaway_core::ReasonerError;

/// Errors that can occur while answering a collaborator request.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// Failed to render a prompt template.
    #[error("template render error: {0}")]
    Template(String),

    /// An LLM backend returned an error or was unreachable.
    #[error("LLM backend error: {0}")]
    LlmBackend(String),

    /// The LLM response could not be parsed into a decision.
    #[error("response parse error: {0}")]
    Parse(String),

    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),

    /// Serialization or deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<OracleError> for ReasonerError {
    fn from(error: OracleError) -> Self {
        match error {
            OracleError::Parse(reason) => Self::Malformed { reason },
            OracleError::Serde(source) => Self::Malformed {
                reason: source.to_string(),
            },
            other => Self::Backend {
                message: other.to_string(),
            },
        }
    }
}
