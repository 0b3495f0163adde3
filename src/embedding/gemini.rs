//! Gemini embedding client (`models/{model}:embedContent`)

use serde::Deserialize;

use crate::embedding::{EmbedTask, Embedder};
use crate::error::{MemvaultError, Result};
use crate::http::{block_on, build_client, is_transient_error, is_transient_status};

pub(crate) const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "embedding-001";

/// Gemini embedding client
pub struct GeminiEmbedder {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: Option<ContentEmbedding>,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

impl GeminiEmbedder {
    pub fn with_config(
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
        dimensions: usize,
        timeout_secs: u64,
    ) -> Result<Self> {
        let model = model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Ok(Self {
            client: build_client(timeout_secs)?,
            api_key,
            base_url: base_url.unwrap_or_else(|| GEMINI_BASE_URL.to_string()),
            // Accept both "embedding-001" and "models/embedding-001"
            model: model.trim_start_matches("models/").to_string(),
            dimensions,
        })
    }

    fn task_type(task: EmbedTask) -> &'static str {
        match task {
            EmbedTask::Document => "RETRIEVAL_DOCUMENT",
            EmbedTask::Query => "RETRIEVAL_QUERY",
        }
    }

    pub async fn embed_async(&self, text: &str, task: EmbedTask) -> Result<Vec<f32>> {
        let url = format!(
            "{}/models/{}:embedContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&serde_json::json!({
                "model": format!("models/{}", self.model),
                "content": {"parts": [{"text": text}]},
                "taskType": Self::task_type(task),
            }))
            .send()
            .await
            .map_err(|e| {
                if is_transient_error(&e) {
                    MemvaultError::embedding_transient(format!("Gemini request failed: {}", e))
                } else {
                    MemvaultError::embedding(format!("Gemini request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("Gemini embedding error {}: {}", status, body);
            return Err(if is_transient_status(status) {
                MemvaultError::embedding_transient(message)
            } else {
                MemvaultError::embedding(message)
            });
        }

        let parsed: EmbedContentResponse = response
            .json()
            .await
            .map_err(|e| MemvaultError::embedding(format!("Invalid Gemini response: {}", e)))?;

        let values = parsed
            .embedding
            .map(|e| e.values)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                MemvaultError::embedding(format!(
                    "Gemini did not return an embedding for task '{}'",
                    Self::task_type(task)
                ))
            })?;

        if values.len() != self.dimensions {
            return Err(MemvaultError::embedding(format!(
                "Embedding dimensions mismatch: expected {}, got {}",
                self.dimensions,
                values.len()
            )));
        }

        Ok(values)
    }
}

impl Embedder for GeminiEmbedder {
    fn embed(&self, text: &str, task: EmbedTask) -> Result<Vec<f32>> {
        block_on(self.embed_async(text, task))?
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
