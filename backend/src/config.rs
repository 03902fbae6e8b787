//! Runtime configuration.
//!
//! Values come from the environment (a `.env` file is honoured) and can be
//! overridden one by one with the `with_*` builders. The resulting struct is
//! handed to [`crate::ai::OllamaClient`] and [`crate::mapper::Mapper`] at
//! construction time.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_HOST: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "mistral";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Mapper configuration
#[derive(Debug, Clone, PartialEq)]
pub struct MapperConfig {
    /// Base URL of the generation endpoint (no trailing path)
    pub host: String,
    /// Model name sent with every request
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Per-request timeout
    pub timeout: Duration,
    /// Re-parse string values that look like JSON objects/arrays
    pub unstringify_nested: bool,
    /// Rows mapped at the same time in a batch
    pub concurrency: usize,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            unstringify_nested: true,
            concurrency: 1,
        }
    }
}

impl MapperConfig {
    /// Load configuration from `OLLAMA_HOST`, `OLLAMA_MODEL`, `MAPPER_TEMPERATURE`,
    /// `MAPPER_TIMEOUT_SECS`, `MAPPER_UNSTRINGIFY_NESTED` and `MAPPER_CONCURRENCY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Try loading .env file
        let _ = dotenvy::dotenv();

        let defaults = Self::default();
        let timeout_secs = parse_var("MAPPER_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;

        Ok(Self {
            host: env::var("OLLAMA_HOST").unwrap_or(defaults.host),
            model: env::var("OLLAMA_MODEL").unwrap_or(defaults.model),
            temperature: parse_var("MAPPER_TEMPERATURE", defaults.temperature)?,
            timeout: Duration::from_secs(timeout_secs),
            unstringify_nested: parse_var("MAPPER_UNSTRINGIFY_NESTED", defaults.unstringify_nested)?,
            concurrency: parse_var("MAPPER_CONCURRENCY", defaults.concurrency)?.max(1),
        })
    }

    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_unstringify_nested(mut self, enabled: bool) -> Self {
        self.unstringify_nested = enabled;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Full URL of the generate endpoint
    pub fn generate_url(&self) -> String {
        format!("{}/api/generate", self.host.trim_end_matches('/'))
    }
}

fn parse_var<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            })
        }
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MapperConfig::default();
        assert_eq!(config.model, "mistral");
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert!(config.unstringify_nested);
        assert_eq!(config.concurrency, 1);
    }

    #[test]
    fn test_builders_override() {
        let config = MapperConfig::default()
            .with_host("http://ollama:11434/")
            .with_model("llama3")
            .with_concurrency(0);

        assert_eq!(config.generate_url(), "http://ollama:11434/api/generate");
        assert_eq!(config.model, "llama3");
        assert_eq!(config.concurrency, 1);
    }

    #[test]
    fn test_parse_var_rejects_garbage() {
        // Key used by no other test
        env::set_var("SCHEMAMAP_TEST_BAD_TEMPERATURE", "warm");
        let result: Result<f32, _> = parse_var("SCHEMAMAP_TEST_BAD_TEMPERATURE", 0.3);
        env::remove_var("SCHEMAMAP_TEST_BAD_TEMPERATURE");

        match result {
            Err(ConfigError::InvalidValue { key, value }) => {
                assert_eq!(key, "SCHEMAMAP_TEST_BAD_TEMPERATURE");
                assert_eq!(value, "warm");
            }
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_var_missing_uses_default() {
        let value: usize = parse_var("SCHEMAMAP_TEST_UNSET_VAR", 4).unwrap();
        assert_eq!(value, 4);
    }
}
