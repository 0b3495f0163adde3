//! Embedding generation
//!
//! Supports multiple embedding backends:
//! - TF-IDF feature hashing (no external dependencies)
//! - OpenAI-compatible API - requires `openai` feature
//! - Gemini API - requires `gemini` feature
//!
//! All backends sit behind the [`Embedder`] capability trait. The
//! [`EmbeddingGateway`] validates input and output around it and is the only
//! path the engine uses to reach a model.

#[cfg(feature = "gemini")]
mod gemini;
#[cfg(feature = "openai")]
mod openai;
mod tfidf;

#[cfg(feature = "gemini")]
pub(crate) use gemini::GEMINI_BASE_URL;
#[cfg(feature = "gemini")]
pub use gemini::GeminiEmbedder;
#[cfg(feature = "openai")]
pub use openai::OpenAIEmbedder;
pub use tfidf::TfIdfEmbedder;

use std::sync::Arc;

use crate::error::{MemvaultError, Result};
use crate::resilience::{ResilientEmbedder, RetryPolicy};
use crate::types::EmbeddingConfig;

/// What the vector will be used for. Providers that distinguish document
/// and query embeddings (Gemini) use it; others ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedTask {
    /// Text being stored
    Document,
    /// Text being searched for
    Query,
}

/// Trait for embedding generators
pub trait Embedder: Send + Sync {
    /// Generate embedding for a single text
    fn embed(&self, text: &str, task: EmbedTask) -> Result<Vec<f32>>;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Get model name
    fn model_name(&self) -> &str;
}

impl<E: Embedder + ?Sized> Embedder for Arc<E> {
    fn embed(&self, text: &str, task: EmbedTask) -> Result<Vec<f32>> {
        (**self).embed(text, task)
    }

    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// Validating front door to the embedding model.
///
/// Fails fast: empty input and malformed vectors are rejected here and never
/// retried. Transient retries belong to the wrapped embedder.
#[derive(Clone)]
pub struct EmbeddingGateway {
    embedder: Arc<dyn Embedder>,
    max_input_chars: usize,
}

impl EmbeddingGateway {
    pub fn new(embedder: Arc<dyn Embedder>, max_input_chars: usize) -> Self {
        Self {
            embedder,
            max_input_chars,
        }
    }

    pub fn embed(&self, text: &str, task: EmbedTask) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(MemvaultError::embedding("Cannot embed empty text"));
        }
        let chars = text.chars().count();
        if chars > self.max_input_chars {
            return Err(MemvaultError::InvalidArgument(format!(
                "Text is {} characters, limit is {}",
                chars, self.max_input_chars
            )));
        }

        let embedding = self.embedder.embed(text, task)?;

        if embedding.is_empty() {
            return Err(MemvaultError::embedding(format!(
                "Model '{}' returned an empty embedding",
                self.embedder.model_name()
            )));
        }
        if embedding.iter().any(|x| !x.is_finite()) {
            return Err(MemvaultError::embedding(format!(
                "Model '{}' returned non-finite values",
                self.embedder.model_name()
            )));
        }

        Ok(embedding)
    }

    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }
}

/// Create an embedder from configuration
///
/// Available providers depend on enabled features:
/// - `"tfidf"`: Always available, no external dependencies
/// - `"openai"`: Requires `openai` feature and API key
/// - `"gemini"`: Requires `gemini` feature and API key
///
/// Hosted providers are wrapped in a [`ResilientEmbedder`] with `retry`.
pub fn create_embedder(config: &EmbeddingConfig, retry: RetryPolicy) -> Result<Arc<dyn Embedder>> {
    match config.provider.as_str() {
        "tfidf" => Ok(Arc::new(TfIdfEmbedder::new(config.dimensions))),
        #[cfg(feature = "openai")]
        "openai" => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                MemvaultError::Config(
                    "OPENAI_API_KEY required when embedding provider is openai".to_string(),
                )
            })?;
            let embedder = OpenAIEmbedder::with_config(
                api_key,
                config.base_url.clone(),
                config.model.clone(),
                config.dimensions,
                config.timeout_secs,
            )?;
            Ok(Arc::new(ResilientEmbedder::new(embedder, retry)))
        }
        #[cfg(feature = "gemini")]
        "gemini" => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                MemvaultError::Config(
                    "GEMINI_API_KEY required when embedding provider is gemini".to_string(),
                )
            })?;
            let embedder = GeminiEmbedder::with_config(
                api_key,
                config.base_url.clone(),
                config.model.clone(),
                config.dimensions,
                config.timeout_secs,
            )?;
            Ok(Arc::new(ResilientEmbedder::new(embedder, retry)))
        }
        other => Err(MemvaultError::Config(format!(
            "Unknown or disabled embedding provider: '{}'. Use 'tfidf', 'openai' or 'gemini'",
            other
        ))),
    }
}

/// Cosine similarity between two vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Cosine distance in [0, 2]; lower is closer
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    (1.0 - cosine_similarity(a, b)).clamp(0.0, 2.0)
}
