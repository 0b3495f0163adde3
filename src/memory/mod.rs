//! Memory engine
//!
//! [`MemoryEngine`] owns the collaborators (vector store, embedding gateway,
//! optional generator) and exposes one method per tool. Mutations live in
//! `mutations.rs`; retrieval and summarization add their methods from
//! `crate::search` and `crate::intelligence`.
//!
//! The engine holds no lock across a store or model call. Concurrent calls
//! rely on the store's per-document atomicity only.

mod mutations;
pub mod normalize;
mod resolver;

pub use mutations::{AddedMemory, NewMemory};
pub use resolver::{validate_collection_name, CollectionHandle, CollectionResolver, ResolveMode};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::embedding::{EmbedTask, Embedder, EmbeddingGateway};
use crate::error::{MemvaultError, Result};
use crate::generation::Generator;
use crate::storage::VectorStore;
use crate::types::EngineConfig;

pub struct MemoryEngine {
    pub(crate) store: Arc<dyn VectorStore>,
    pub(crate) embeddings: EmbeddingGateway,
    pub(crate) generator: Option<Arc<dyn Generator>>,
    pub(crate) resolver: CollectionResolver,
    pub(crate) config: EngineConfig,
    privilege_granted: AtomicBool,
}

impl MemoryEngine {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        generator: Option<Arc<dyn Generator>>,
        config: EngineConfig,
    ) -> Result<Self> {
        if config.recall_top_k == 0 || config.summarize_top_k == 0 {
            return Err(MemvaultError::Config(
                "Default top_k values must be positive".to_string(),
            ));
        }
        if !config.existence_threshold.is_finite() || config.existence_threshold < 0.0 {
            return Err(MemvaultError::Config(format!(
                "Existence threshold must be a non-negative number, got {}",
                config.existence_threshold
            )));
        }

        if config.max_summary_input_chars == 0 {
            return Err(MemvaultError::Config(
                "Summary input budget must be positive".to_string(),
            ));
        }

        let resolver = CollectionResolver::new(config.default_collection.clone())?;
        let embeddings = EmbeddingGateway::new(embedder, config.max_embed_input_chars);

        tracing::info!(
            store = store.backend_name(),
            embedding_model = embeddings.model_name(),
            generation_model = generator.as_ref().map(|g| g.model_name()).unwrap_or("none"),
            default_collection = resolver.default_name(),
            "Memory engine ready"
        );

        Ok(Self {
            store,
            embeddings,
            generator,
            resolver,
            config,
            privilege_granted: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn default_collection(&self) -> &str {
        self.resolver.default_name()
    }

    /// Resolve through the configured store retry policy
    pub(crate) fn resolve(&self, requested: Option<&str>, mode: ResolveMode) -> Result<CollectionHandle> {
        self.resolver
            .resolve(self.store.as_ref(), &self.config.store_retry, requested, mode)
    }

    /// Run a store call with the store retry policy
    pub(crate) fn with_store<T, F>(&self, operation: &str, mut call: F) -> Result<T>
    where
        F: FnMut(&dyn VectorStore) -> Result<T>,
    {
        let store = self.store.as_ref();
        self.config.store_retry.run(operation, || call(store))
    }

    pub(crate) fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embeddings.embed(text, EmbedTask::Query)
    }

    pub(crate) fn embed_document(&self, text: &str) -> Result<Vec<f32>> {
        self.embeddings.embed(text, EmbedTask::Document)
    }

    /// Arm the one-shot privilege for the next privileged operation
    pub fn grant_privilege(&self) {
        self.privilege_granted.store(true, Ordering::SeqCst);
        tracing::info!("Privilege granted for next privileged operation");
    }

    /// Consume the privilege grant. No-op when the gate is disabled.
    pub(crate) fn take_privilege(&self, operation: &str) -> Result<()> {
        if !self.config.require_privilege {
            return Ok(());
        }
        if self.privilege_granted.swap(false, Ordering::SeqCst) {
            Ok(())
        } else {
            tracing::warn!(operation, "Privileged operation attempted without grant");
            Err(MemvaultError::PrivilegeRequired(operation.to_string()))
        }
    }
}
