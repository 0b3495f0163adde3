//! Summarization pipeline
//!
//! Retrieval output is packed into a bounded prompt and sent to the
//! generation model. An empty retrieval short-circuits to a fixed response
//! without calling the model; a model failure is always an error, never an
//! empty summary.

use crate::error::{MemvaultError, Result};
use crate::memory::{validate_collection_name, MemoryEngine, ResolveMode};
use crate::search::{effective_top_k, require_text};
use crate::storage::WhereFilter;
use crate::types::Summary;

/// Response when retrieval produced nothing to summarize
pub const NO_MEMORIES_FOUND: &str = "No relevant memories found.";

/// Joins memory texts inside the prompt
pub const CHUNK_SEPARATOR: &str = "\n---\n";

/// Pack ranked texts into at most `max_chars` characters.
///
/// Whole records are kept in rank order; the least relevant are dropped
/// first. If even the top record is too long it is cut at a character
/// boundary. Returns the context and how many records it draws from.
pub fn fit_context(texts: &[&str], max_chars: usize) -> (String, usize) {
    let separator_len = CHUNK_SEPARATOR.chars().count();
    let mut used = 0;
    let mut total = 0;

    for (i, text) in texts.iter().enumerate() {
        let len = text.chars().count() + if i > 0 { separator_len } else { 0 };
        if total + len > max_chars {
            break;
        }
        total += len;
        used += 1;
    }

    if used == 0 {
        return match texts.first() {
            Some(first) if max_chars > 0 => (first.chars().take(max_chars).collect(), 1),
            _ => (String::new(), 0),
        };
    }

    (texts[..used].join(CHUNK_SEPARATOR), used)
}

/// Prompt for the generation model
pub fn build_prompt(query: Option<&str>, context: &str) -> String {
    let instruction = match query.map(str::trim).filter(|q| !q.is_empty()) {
        Some(query) => format!(
            "Concisely summarize the following text relevant to the query '{}'.",
            query
        ),
        None => "Concisely summarize the key themes of the following text.".to_string(),
    };
    format!(
        "{} Respond ONLY with the precise summary itself, without any introductory or concluding phrases:\n\n---\n{}\n---",
        instruction, context
    )
}

impl MemoryEngine {
    /// Retrieve the `top_k` most relevant memories and summarize them
    /// against `query`
    pub fn summarize_memory(
        &self,
        query: &str,
        top_k: Option<usize>,
        filter: Option<&WhereFilter>,
        collection: Option<&str>,
    ) -> Result<Summary> {
        let query = require_text(query, "query")?;
        let top_k = effective_top_k(top_k, self.config.summarize_top_k)?;

        let hits = self.vector_recall(query, top_k, filter, collection)?;
        let texts: Vec<&str> = hits.iter().map(|h| h.text.as_str()).collect();
        self.summarize_texts(&texts, Some(query))
    }

    /// Summarize a bounded slice of a collection.
    ///
    /// With a query the slice is the most relevant records; without one it is
    /// the first records in store order.
    pub fn summarize_collection(&self, collection: &str, query: Option<&str>) -> Result<Summary> {
        let collection = require_text(collection, "collection_name")?;
        validate_collection_name(collection)?;
        let top_k = self.config.summarize_top_k;
        let query = query.map(str::trim).filter(|q| !q.is_empty());

        match query {
            Some(query) => {
                let hits = self.vector_recall(query, top_k, None, Some(collection))?;
                let texts: Vec<&str> = hits.iter().map(|h| h.text.as_str()).collect();
                self.summarize_texts(&texts, Some(query))
            }
            None => {
                let handle = self.resolve(Some(collection), ResolveMode::Read)?;
                let records = self.with_store("peek", |store| store.peek(handle.name(), top_k))?;
                let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
                self.summarize_texts(&texts, None)
            }
        }
    }

    fn summarize_texts(&self, texts: &[&str], query: Option<&str>) -> Result<Summary> {
        if texts.is_empty() {
            tracing::warn!("No context found for summarization");
            return Ok(Summary {
                summary: NO_MEMORIES_FOUND.to_string(),
                source_count: 0,
                found: false,
            });
        }

        let generator = self.generator.as_ref().ok_or_else(|| {
            MemvaultError::summarization("No generation model is configured")
        })?;

        let (context, source_count) = fit_context(texts, self.config.max_summary_input_chars);
        if source_count < texts.len() {
            tracing::warn!(
                retrieved = texts.len(),
                kept = source_count,
                budget = self.config.max_summary_input_chars,
                "Summarization context truncated"
            );
        }

        let prompt = build_prompt(query, &context);
        let output = generator.generate(&prompt).map_err(|e| match e {
            MemvaultError::Summarization { .. } => e,
            other => MemvaultError::summarization(other.to_string()),
        })?;

        let summary = output.trim();
        if summary.is_empty() {
            return Err(MemvaultError::summarization(format!(
                "Model '{}' returned an empty summary",
                generator.model_name()
            )));
        }

        tracing::info!(source_count, model = generator.model_name(), "Summary generated");
        Ok(Summary {
            summary: summary.to_string(),
            source_count,
            found: true,
        })
    }
}
