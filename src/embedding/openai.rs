//! OpenAI-compatible embedding client
//!
//! Works against OpenAI, OpenRouter, Azure OpenAI and other services that
//! expose the `/embeddings` endpoint.

use crate::embedding::{EmbedTask, Embedder};
use crate::error::{MemvaultError, Result};
use crate::http::{block_on, build_client, is_transient_error, is_transient_status};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// OpenAI embedding client
pub struct OpenAIEmbedder {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl OpenAIEmbedder {
    /// Create a new OpenAI embedder
    ///
    /// # Arguments
    /// * `api_key` - API key for authentication
    /// * `base_url` - API base URL (e.g., "https://openrouter.ai/api/v1" for OpenRouter)
    /// * `model` - Model name (e.g., "openai/text-embedding-3-small" for OpenRouter)
    /// * `dimensions` - Expected embedding dimensions (must match model output)
    /// * `timeout_secs` - Hard per-request timeout
    pub fn with_config(
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
        dimensions: usize,
        timeout_secs: u64,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout_secs)?,
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            dimensions,
        })
    }

    /// Async embedding call to OpenAI-compatible API
    pub async fn embed_async(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/embeddings", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "input": text,
                "model": self.model,
            }))
            .send()
            .await
            .map_err(|e| {
                if is_transient_error(&e) {
                    MemvaultError::embedding_transient(format!("Embedding request failed: {}", e))
                } else {
                    MemvaultError::embedding(format!("Embedding request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("Embedding API error {}: {}", status, body);
            return Err(if is_transient_status(status) {
                MemvaultError::embedding_transient(message)
            } else {
                MemvaultError::embedding(message)
            });
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| MemvaultError::embedding(format!("Invalid response body: {}", e)))?;

        let embedding: Vec<f32> = data["data"][0]["embedding"]
            .as_array()
            .ok_or_else(|| MemvaultError::embedding("Invalid response format"))?
            .iter()
            .filter_map(|v| v.as_f64().map(|f| f as f32))
            .collect();

        if embedding.len() != self.dimensions {
            return Err(MemvaultError::embedding(format!(
                "Embedding dimensions mismatch: expected {}, got {}. Set MEMVAULT_EMBEDDING_DIMENSIONS={} to match your model.",
                self.dimensions,
                embedding.len(),
                embedding.len()
            )));
        }

        Ok(embedding)
    }
}

impl Embedder for OpenAIEmbedder {
    fn embed(&self, text: &str, _task: EmbedTask) -> Result<Vec<f32>> {
        block_on(self.embed_async(text))?
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
