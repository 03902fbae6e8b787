//! Single-record mapper.
//!
//! Runs prompt building, generation and repair for one record and folds the
//! outcome into a [`MappingResult`]. Failures of any step become a FAILED
//! result; nothing escapes as an error.

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::ai::{mapping_prompt, mapping_rules_prompt, OllamaClient, TextGenerator};
use crate::config::MapperConfig;
use crate::error::{ConfigError, MapResult};
use crate::logs::{log_debug, log_error, log_info, log_warning};
use crate::models::{MappingOutcome, MappingRequest, MappingResult, Record};
use crate::repair::{repair_with, RepairOptions};

/// Maps records through a text generator
#[derive(Clone)]
pub struct Mapper {
    generator: Arc<dyn TextGenerator>,
    model: String,
    temperature: f32,
    repair_options: RepairOptions,
}

impl Mapper {
    /// Use `generator` with the model, temperature and repair settings from `config`
    pub fn new(generator: impl TextGenerator + 'static, config: &MapperConfig) -> Self {
        Self {
            generator: Arc::new(generator),
            model: config.model.clone(),
            temperature: config.temperature,
            repair_options: RepairOptions {
                unstringify_nested: config.unstringify_nested,
            },
        }
    }

    /// Mapper backed by an [`OllamaClient`] for the configured host
    pub fn from_config(config: &MapperConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(OllamaClient::new(config)?, config))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Map one record. Never fails: errors are reported in the result.
    pub async fn map(&self, request: &MappingRequest) -> MappingResult {
        let started = Instant::now();
        let mapping_id = Uuid::new_v4();
        log_debug(format!("Starting AI mapping {}", mapping_id));

        let outcome = match self.try_map(request, &mapping_id).await {
            Ok((mapped_data, raw)) => {
                if mapped_data.is_empty() {
                    log_warning(format!("AI mapping {} returned an empty object", mapping_id));
                }
                MappingOutcome::Success {
                    mapped_data,
                    transformation_details: raw,
                }
            }
            Err(err) => {
                log_error(format!("AI mapping {} failed: {}", mapping_id, err));
                err.into()
            }
        };

        MappingResult {
            mapping_id,
            outcome,
            processed_at: Utc::now(),
            execution_time_ms: elapsed_ms(started),
        }
    }

    async fn try_map(&self, request: &MappingRequest, mapping_id: &Uuid) -> MapResult<(Record, String)> {
        let prompt = mapping_prompt(request)?;
        let raw = self
            .generator
            .generate(&prompt, &self.model, self.temperature)
            .await?;
        log_debug(format!("AI response for mapping {}: {}", mapping_id, raw));

        let mapped = repair_with(&raw, self.repair_options)?;
        Ok((mapped, raw))
    }

    /// Ask the model for "Map X to Y" rules between two schemas.
    pub async fn generate_mapping_rules(&self, source_schema: &str, target_schema: &str) -> MapResult<String> {
        let started = Instant::now();
        log_info("Generating mapping rules...");

        let prompt = mapping_rules_prompt(source_schema, target_schema);
        let rules = self
            .generator
            .generate(&prompt, &self.model, self.temperature)
            .await?;

        log_info(format!("Mapping rules generated in {}ms", elapsed_ms(started)));
        Ok(rules.trim().to_string())
    }
}

pub(crate) fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
