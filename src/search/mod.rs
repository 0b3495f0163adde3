//! Retrieval engine
//!
//! Plain vector recall, recall with distances, hybrid keyword fusion and the
//! existence check. Distances are whatever the store reports; lower is more
//! relevant and results are always non-decreasing in distance within a tier.

mod hybrid;

pub use hybrid::fuse_hybrid;

use crate::error::{MemvaultError, Result};
use crate::memory::{MemoryEngine, ResolveMode};
use crate::storage::{QueryRequest, WhereFilter};
use crate::types::{ExistenceCheck, RecallRequest, RetrievalHit};

/// Apply a default and reject non-positive values
pub fn effective_top_k(requested: Option<usize>, default: usize) -> Result<usize> {
    match requested {
        Some(0) => Err(MemvaultError::InvalidArgument(
            "top_k must be a positive integer".to_string(),
        )),
        Some(k) => Ok(k),
        None => Ok(default),
    }
}

/// Reject absent or blank text arguments before any store call
pub(crate) fn require_text<'a>(value: &'a str, field: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(MemvaultError::InvalidArgument(format!("{} is required", field)));
    }
    Ok(trimmed)
}

impl MemoryEngine {
    /// Nearest `top_k` records for `request.query`, ascending by distance.
    ///
    /// `keyword` is ignored here; see [`MemoryEngine::recall_memory_hybrid`].
    pub fn recall_memory(&self, request: &RecallRequest) -> Result<Vec<RetrievalHit>> {
        let top_k = effective_top_k(request.top_k, self.config.recall_top_k)?;
        self.vector_recall(
            &request.query,
            top_k,
            request.filter.as_ref(),
            request.collection.as_deref(),
        )
    }

    /// Same ranking as [`MemoryEngine::recall_memory`]; the distance is part
    /// of the output contract
    pub fn recall_memory_with_distance(&self, request: &RecallRequest) -> Result<Vec<RetrievalHit>> {
        self.recall_memory(request)
    }

    /// Vector recall fused with a case-insensitive keyword match over text
    /// and metadata values. Without a keyword this is plain recall.
    pub fn recall_memory_hybrid(&self, request: &RecallRequest) -> Result<Vec<RetrievalHit>> {
        let query = require_text(&request.query, "query")?;
        let top_k = effective_top_k(request.top_k, self.config.recall_top_k)?;
        let keyword = request
            .keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty());

        let Some(keyword) = keyword else {
            return self.vector_recall(
                query,
                top_k,
                request.filter.as_ref(),
                request.collection.as_deref(),
            );
        };

        let collection = self.resolve(request.collection.as_deref(), ResolveMode::Read)?;
        tracing::debug!(collection = collection.name(), top_k, keyword, "Hybrid recall");

        let embedding = self.embed_query(query)?;
        let filter = request.filter.as_ref();

        let vector = self.with_store("query", |store| {
            store.query(
                collection.name(),
                &QueryRequest::new(&embedding, top_k).with_filter(filter),
            )
        })?;
        let keyword_hits = self.with_store("query", |store| {
            store.query(
                collection.name(),
                &QueryRequest::new(&embedding, top_k)
                    .with_filter(filter)
                    .with_contains(Some(keyword)),
            )
        })?;

        let fused = fuse_hybrid(vector, keyword_hits, top_k);
        tracing::info!(
            collection = collection.name(),
            results = fused.len(),
            "Hybrid recall complete"
        );
        Ok(fused)
    }

    /// Does something close to `topic` exist?
    ///
    /// `exists` is true when the best match's distance is at or below the
    /// configured existence threshold. An empty collection never matches.
    pub fn check_memory(
        &self,
        topic: &str,
        filter: Option<&WhereFilter>,
        collection: Option<&str>,
    ) -> Result<ExistenceCheck> {
        let topic = require_text(topic, "topic")?;
        let best = self.vector_recall(topic, 1, filter, collection)?;

        let check = match best.into_iter().next() {
            Some(hit) => ExistenceCheck {
                exists: hit.distance <= self.config.existence_threshold,
                distance: Some(hit.distance),
                doc_id: Some(hit.doc_id),
            },
            None => ExistenceCheck {
                exists: false,
                distance: None,
                doc_id: None,
            },
        };

        tracing::debug!(
            exists = check.exists,
            distance = ?check.distance,
            threshold = self.config.existence_threshold,
            "Existence check"
        );
        Ok(check)
    }

    pub(crate) fn vector_recall(
        &self,
        query: &str,
        top_k: usize,
        filter: Option<&WhereFilter>,
        collection: Option<&str>,
    ) -> Result<Vec<RetrievalHit>> {
        let query = require_text(query, "query")?;
        let collection = self.resolve(collection, ResolveMode::Read)?;
        tracing::debug!(collection = collection.name(), top_k, "Vector recall");

        let embedding = self.embed_query(query)?;
        let hits = self.with_store("query", |store| {
            store.query(
                collection.name(),
                &QueryRequest::new(&embedding, top_k).with_filter(filter),
            )
        })?;

        tracing::info!(
            collection = collection.name(),
            results = hits.len(),
            "Recall complete"
        );
        Ok(hits)
    }
}
