//! Text generation client
//!
//! Sends prompts to an Ollama-compatible `/api/generate` endpoint and returns
//! the model's raw text. Nothing here interprets that text; see
//! [`crate::repair`] for that.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use schemamap::ai::{OllamaClient, TextGenerator};
//! use schemamap::config::MapperConfig;
//!
//! let config = MapperConfig::from_env()?;
//! let client = OllamaClient::new(&config)?;
//! let text = client.generate("Say hi as JSON", &config.model, config.temperature).await?;
//! ```
//!
//! Exactly one HTTP request is made per call. Retrying is up to the caller.

pub mod prompt;

#[cfg(test)]
pub(crate) mod stub;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::config::MapperConfig;
use crate::error::{ConfigError, GenerationError, GenerationResult};
use crate::logs::{log_debug, log_error};

pub use prompt::{mapping_prompt, mapping_rules_prompt};

/// Longest body excerpt quoted in error messages
const BODY_EXCERPT_LEN: usize = 200;

/// Something that turns a prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Run one generation. `model` and `temperature` are sent as-is.
    async fn generate(&self, prompt: &str, model: &str, temperature: f32) -> GenerationResult<String>;
}

/// Client for an Ollama `/api/generate` endpoint
#[derive(Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    url: String,
}

/// Request body of `/api/generate`
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    temperature: f32,
}

impl OllamaClient {
    /// Create a client for the configured host with the configured per-request timeout
    pub fn new(config: &MapperConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            url: config.generate_url(),
        })
    }

    /// Endpoint this client posts to
    pub fn url(&self) -> &str {
        &self.url
    }

    fn unavailable(&self, model: &str, reason: String) -> GenerationError {
        log_error(format!("Failed to reach generation service at {}: {}", self.url, reason));
        GenerationError::Unavailable {
            url: self.url.clone(),
            model: model.to_string(),
            reason,
        }
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, prompt: &str, model: &str, temperature: f32) -> GenerationResult<String> {
        let body = GenerateRequest {
            model,
            prompt,
            stream: false,
            temperature,
        };

        log_debug(format!("Calling generation service at {} (model {})", self.url, model));
        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.unavailable(model, describe_transport_error(&e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.unavailable(model, describe_transport_error(&e)))?;

        if !status.is_success() {
            return Err(self.unavailable(model, format!("HTTP {}: {}", status, excerpt(&text))));
        }

        log_debug(format!("Received {} bytes from generation service", text.len()));
        extract_response_text(&text)
    }
}

fn describe_transport_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out ({})", err)
    } else if err.is_connect() {
        format!("connection failed ({})", err)
    } else {
        err.to_string()
    }
}

/// Pull the `response` text out of a generate envelope.
pub fn extract_response_text(body: &str) -> GenerationResult<String> {
    if body.trim_start().starts_with('<') {
        return Err(GenerationError::InvalidResponse(
            "service returned HTML instead of JSON. The service may be unavailable or misconfigured.".to_string(),
        ));
    }

    let envelope: Value = serde_json::from_str(body).map_err(|_| {
        GenerationError::InvalidResponse(format!("unexpected response format: {}", excerpt(body)))
    })?;

    match envelope {
        Value::Object(map) => match map.get("response") {
            Some(Value::String(text)) => Ok(text.clone()),
            None | Some(Value::Null) => Err(GenerationError::InvalidResponse(
                "missing 'response' field".to_string(),
            )),
            Some(other) => Ok(other.to_string()),
        },
        other => Err(GenerationError::InvalidResponse(format!(
            "unexpected type {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn excerpt(text: &str) -> String {
    match text.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
