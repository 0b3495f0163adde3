//! Text generation for memory summarization
//!
//! Backends:
//! - OpenAI-compatible chat completions - requires `openai` feature
//! - Gemini `generateContent` - requires `gemini` feature

#[cfg(feature = "gemini")]
mod gemini;
#[cfg(feature = "openai")]
mod openai;

#[cfg(feature = "gemini")]
pub use gemini::GeminiGenerator;
#[cfg(feature = "openai")]
pub use openai::OpenAIGenerator;

use std::sync::Arc;

use crate::error::{MemvaultError, Result};
use crate::resilience::{ResilientGenerator, RetryPolicy};
use crate::types::GenerationConfig;

/// Trait for text generators
pub trait Generator: Send + Sync {
    /// Produce a completion for `prompt`
    fn generate(&self, prompt: &str) -> Result<String>;

    fn model_name(&self) -> &str;
}

impl<G: Generator + ?Sized> Generator for Arc<G> {
    fn generate(&self, prompt: &str) -> Result<String> {
        (**self).generate(prompt)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// Create a generator from configuration.
///
/// Returns `Ok(None)` for provider `"none"`; summarization tools then report
/// a `SummarizationError` instead of calling a model.
pub fn create_generator(
    config: &GenerationConfig,
    retry: RetryPolicy,
) -> Result<Option<Arc<dyn Generator>>> {
    match config.provider.as_str() {
        "none" | "" => Ok(None),
        #[cfg(feature = "openai")]
        "openai" => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                MemvaultError::Config(
                    "OPENAI_API_KEY required when generation provider is openai".to_string(),
                )
            })?;
            let generator = OpenAIGenerator::with_config(
                api_key,
                config.base_url.clone(),
                config.model.clone(),
                config.max_output_tokens,
                config.timeout_secs,
            )?;
            Ok(Some(Arc::new(ResilientGenerator::new(generator, retry))))
        }
        #[cfg(feature = "gemini")]
        "gemini" => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                MemvaultError::Config(
                    "GEMINI_API_KEY required when generation provider is gemini".to_string(),
                )
            })?;
            let generator = GeminiGenerator::with_config(
                api_key,
                config.base_url.clone(),
                config.model.clone(),
                config.max_output_tokens,
                config.timeout_secs,
            )?;
            Ok(Some(Arc::new(ResilientGenerator::new(generator, retry))))
        }
        other => Err(MemvaultError::Config(format!(
            "Unknown or disabled generation provider: '{}'. Use 'none', 'openai' or 'gemini'",
            other
        ))),
    }
}
