//! Gemini generation client (`models/{model}:generateContent`)

use serde::Deserialize;

use crate::embedding::GEMINI_BASE_URL;
use crate::error::{MemvaultError, Result};
use crate::generation::Generator;
use crate::http::{block_on, build_client, is_transient_error, is_transient_status};

const DEFAULT_MODEL: &str = "gemini-2.5-pro";

/// Gemini generation client
pub struct GeminiGenerator {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiGenerator {
    pub fn with_config(
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
        max_output_tokens: u32,
        timeout_secs: u64,
    ) -> Result<Self> {
        let model = model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Ok(Self {
            client: build_client(timeout_secs)?,
            api_key,
            base_url: base_url.unwrap_or_else(|| GEMINI_BASE_URL.to_string()),
            model: model.trim_start_matches("models/").to_string(),
            max_output_tokens,
        })
    }

    pub async fn generate_async(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&serde_json::json!({
                "contents": [{"role": "user", "parts": [{"text": prompt}]}],
                "generationConfig": {"maxOutputTokens": self.max_output_tokens},
            }))
            .send()
            .await
            .map_err(|e| {
                if is_transient_error(&e) {
                    MemvaultError::summarization_transient(format!("Gemini request failed: {}", e))
                } else {
                    MemvaultError::summarization(format!("Gemini request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("Gemini generation error {}: {}", status, body);
            return Err(if is_transient_status(status) {
                MemvaultError::summarization_transient(message)
            } else {
                MemvaultError::summarization(message)
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| MemvaultError::summarization(format!("Invalid Gemini response: {}", e)))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(MemvaultError::summarization(
                "Gemini returned no content (blocked or empty response)",
            ));
        }
        Ok(text)
    }
}

impl Generator for GeminiGenerator {
    fn generate(&self, prompt: &str) -> Result<String> {
        block_on(self.generate_async(prompt))?
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
