//! Scripted generators for unit tests.

use async_trait::async_trait;

use super::TextGenerator;
use crate::error::{GenerationError, GenerationResult};

/// Answers every call with the closure's result.
pub(crate) struct FnGenerator<F>(pub F);

#[async_trait]
impl<F> TextGenerator for FnGenerator<F>
where
    F: Fn(&str, &str, f32) -> GenerationResult<String> + Send + Sync,
{
    async fn generate(&self, prompt: &str, model: &str, temperature: f32) -> GenerationResult<String> {
        (self.0)(prompt, model, temperature)
    }
}

/// Always answers with `reply`.
pub(crate) fn replying(reply: &'static str) -> impl TextGenerator {
    FnGenerator(move |_: &str, _: &str, _: f32| -> GenerationResult<String> {
        Ok(reply.to_string())
    })
}

/// Always fails as if the endpoint were down.
pub(crate) fn unreachable_endpoint() -> impl TextGenerator {
    FnGenerator(|_: &str, model: &str, _: f32| -> GenerationResult<String> {
        Err(GenerationError::Unavailable {
            url: "http://127.0.0.1:9/api/generate".to_string(),
            model: model.to_string(),
            reason: "connection refused".to_string(),
        })
    })
}
