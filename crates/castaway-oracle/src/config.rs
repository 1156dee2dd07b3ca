//! Connection settings for the LLM collaborator.
//!
//! All settings come from the environment so API keys never land in the
//! simulation config file. When the required variables are missing the
//! engine runs the deterministic fallback collaborator instead.

use crate::error::OracleError;

/// Default templates directory, relative to the working directory.
pub const DEFAULT_TEMPLATES_DIR: &str = "templates";

/// Complete collaborator configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// The LLM backend to call.
    pub backend: LlmBackendConfig,
    /// Path to the prompt templates directory.
    pub templates_dir: String,
}

/// Configuration for a single LLM backend.
#[derive(Debug, Clone)]
pub struct LlmBackendConfig {
    /// The backend type (openai, anthropic, gemini).
    pub backend_type: BackendType,
    /// Base API URL (e.g. `https://api.openai.com/v1`).
    pub api_url: String,
    /// API key for authentication.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
}

/// Supported LLM backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// `OpenAI`-compatible API (works with `OpenAI`, `DeepSeek`, Ollama).
    OpenAi,
    /// Anthropic Messages API.
    Anthropic,
    /// Google Gemini `generateContent` API.
    Gemini,
}

impl BackendType {
    /// Parse a backend name as written in `LLM_BACKEND`.
    pub fn parse(name: &str) -> Result<Self, OracleError> {
        match name.to_lowercase().as_str() {
            "openai" | "deepseek" | "ollama" => Ok(Self::OpenAi),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "gemini" | "google" => Ok(Self::Gemini),
            other => Err(OracleError::Config(format!("unknown backend type: {other}"))),
        }
    }

    /// Public endpoint used when `LLM_API_URL` is unset.
    pub const fn default_api_url(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com/v1",
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta",
        }
    }
}

impl OracleConfig {
    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `LLM_API_KEY` -- API key for the backend
    ///
    /// Optional variables:
    /// - `LLM_BACKEND` -- backend type (default `gemini`)
    /// - `LLM_API_URL` -- API base URL (default: the backend's public endpoint)
    /// - `LLM_MODEL` -- model name (default: `default_model`, taken from the
    ///   simulation config)
    /// - `TEMPLATES_DIR` -- path to prompt templates (default `templates`)
    pub fn from_env(default_model: &str) -> Result<Self, OracleError> {
        Self::from_lookup(|name| std::env::var(name).ok(), default_model)
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        default_model: &str,
    ) -> Result<Self, OracleError> {
        let api_key = lookup("LLM_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| OracleError::Config("missing required env var LLM_API_KEY".to_owned()))?;
        let backend_type = lookup("LLM_BACKEND")
            .map_or(Ok(BackendType::Gemini), |name| BackendType::parse(&name))?;
        let api_url = lookup("LLM_API_URL")
            .unwrap_or_else(|| backend_type.default_api_url().to_owned())
            .trim_end_matches('/')
            .to_owned();
        let model = lookup("LLM_MODEL").unwrap_or_else(|| default_model.to_owned());
        let templates_dir =
            lookup("TEMPLATES_DIR").unwrap_or_else(|| DEFAULT_TEMPLATES_DIR.to_owned());

        Ok(Self {
            backend: LlmBackendConfig {
                backend_type,
                api_url,
                api_key,
                model,
            },
            templates_dir,
        })
    }
}
