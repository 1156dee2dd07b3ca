//! LLM backend abstraction and implementations.
//!
//! Defines an enum-based dispatch for LLM backends. Concrete
//! implementations exist for OpenAI-compatible APIs, the Anthropic Messages
//! API, and Gemini `generateContent`. All backends communicate over HTTP
//! via `reqwest` and ask for a JSON reply.
//!
//! The collaborator does not care which model is behind the API: it sends
//! a prompt and expects a text response containing JSON.

use crate::config::{BackendType, LlmBackendConfig};
use crate::error::OracleError;
use crate::prompt::RenderedPrompt;

/// Upper bound on generated tokens per call.
const MAX_TOKENS: u32 = 1024;

// ---------------------------------------------------------------------------
// Unified backend enum
// ---------------------------------------------------------------------------

/// An LLM backend that can process a prompt and return a response.
pub enum LlmBackend {
    /// OpenAI-compatible chat completions API.
    OpenAi(HttpBackend),
    /// Anthropic Messages API.
    Anthropic(HttpBackend),
    /// Gemini `generateContent` API.
    Gemini(HttpBackend),
}

impl LlmBackend {
    /// Send a prompt to the LLM and return the response text.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::LlmBackend`] if the HTTP call fails or the
    /// response text cannot be extracted.
    pub async fn complete(
        &self,
        prompt: &RenderedPrompt,
        temperature: f64,
    ) -> Result<String, OracleError> {
        match self {
            Self::OpenAi(backend) => backend.complete_openai(prompt, temperature).await,
            Self::Anthropic(backend) => backend.complete_anthropic(prompt, temperature).await,
            Self::Gemini(backend) => backend.complete_gemini(prompt, temperature).await,
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::OpenAi(_) => "openai-compatible",
            Self::Anthropic(_) => "anthropic",
            Self::Gemini(_) => "gemini",
        }
    }
}

/// Connection state shared by every backend flavour.
pub struct HttpBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl HttpBackend {
    /// Create a backend connection from configuration.
    pub fn new(config: &LlmBackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    async fn send(
        &self,
        label: &str,
        request: reqwest::RequestBuilder,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, OracleError> {
        let response = request
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| OracleError::LlmBackend(format!("{label} request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_err| "unable to read error body".to_owned());
            return Err(OracleError::LlmBackend(format!(
                "{label} returned {status}: {error_body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| OracleError::LlmBackend(format!("{label} response parse failed: {e}")))
    }

    // -----------------------------------------------------------------------
    // OpenAI-compatible
    // -----------------------------------------------------------------------

    async fn complete_openai(
        &self,
        prompt: &RenderedPrompt,
        temperature: f64,
    ) -> Result<String, OracleError> {
        let url = format!("{}/chat/completions", self.api_url);
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": prompt.system},
                {"role": "user", "content": prompt.user}
            ],
            "temperature": temperature,
            "max_tokens": MAX_TOKENS,
            "response_format": {"type": "json_object"}
        });
        let request = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key));
        let json = self.send("OpenAI", request, &body).await?;
        extract_openai_content(&json)
    }

    // -----------------------------------------------------------------------
    // Anthropic
    // -----------------------------------------------------------------------

    async fn complete_anthropic(
        &self,
        prompt: &RenderedPrompt,
        temperature: f64,
    ) -> Result<String, OracleError> {
        let url = format!("{}/messages", self.api_url);
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "temperature": temperature.clamp(0.0, 1.0),
            "system": prompt.system,
            "messages": [
                {"role": "user", "content": prompt.user}
            ]
        });
        let request = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01");
        let json = self.send("Anthropic", request, &body).await?;
        extract_anthropic_content(&json)
    }

    // -----------------------------------------------------------------------
    // Gemini
    // -----------------------------------------------------------------------

    async fn complete_gemini(
        &self,
        prompt: &RenderedPrompt,
        temperature: f64,
    ) -> Result<String, OracleError> {
        let url = format!("{}/models/{}:generateContent", self.api_url, self.model);
        let body = serde_json::json!({
            "systemInstruction": {"parts": [{"text": prompt.system}]},
            "contents": [
                {"role": "user", "parts": [{"text": prompt.user}]}
            ],
            "generationConfig": {
                "temperature": temperature,
                "maxOutputTokens": MAX_TOKENS,
                "responseMimeType": "application/json"
            }
        });
        let request = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key);
        let json = self.send("Gemini", request, &body).await?;
        extract_gemini_content(&json)
    }
}

/// Extract the text content from an `OpenAI` chat completions response.
fn extract_openai_content(json: &serde_json::Value) -> Result<String, OracleError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            OracleError::LlmBackend("OpenAI response missing choices[0].message.content".to_owned())
        })
}

/// Extract the text content from an Anthropic Messages API response.
fn extract_anthropic_content(json: &serde_json::Value) -> Result<String, OracleError> {
    json.get("content")
        .and_then(|c| c.get(0))
        .and_then(|b| b.get("text"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            OracleError::LlmBackend("Anthropic response missing content[0].text".to_owned())
        })
}

/// Extract the text content from a Gemini `generateContent` response.
fn extract_gemini_content(json: &serde_json::Value) -> Result<String, OracleError> {
    json.get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.get(0))
        .and_then(|p| p.get("text"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            OracleError::LlmBackend(
                "Gemini response missing candidates[0].content.parts[0].text".to_owned(),
            )
        })
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Create an LLM backend from configuration.
pub fn create_backend(config: &LlmBackendConfig) -> LlmBackend {
    let http = HttpBackend::new(config);
    match config.backend_type {
        BackendType::OpenAi => LlmBackend::OpenAi(http),
        BackendType::Anthropic => LlmBackend::Anthropic(http),
        BackendType::Gemini => LlmBackend::Gemini(http),
    }
}
