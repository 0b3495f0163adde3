//! Vector store abstraction
//!
//! The engine talks to the store only through [`VectorStore`]. Each method is
//! atomic at the single-document (or single-collection) level; nothing here
//! offers cross-call isolation.

use crate::error::Result;
use crate::storage::filter::WhereFilter;
use crate::types::{MemoryRecord, RetrievalHit};

/// Nearest-neighbour query against one collection
#[derive(Debug, Clone)]
pub struct QueryRequest<'a> {
    pub embedding: &'a [f32],
    pub n_results: usize,
    pub filter: Option<&'a WhereFilter>,
    /// Case-insensitive substring that text or a metadata value must contain
    pub contains: Option<&'a str>,
}

impl<'a> QueryRequest<'a> {
    pub fn new(embedding: &'a [f32], n_results: usize) -> Self {
        Self {
            embedding,
            n_results,
            filter: None,
            contains: None,
        }
    }

    pub fn with_filter(mut self, filter: Option<&'a WhereFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_contains(mut self, contains: Option<&'a str>) -> Self {
        self.contains = contains;
        self
    }
}

/// Named collection as reported by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionInfo {
    pub name: String,
    pub created_at: String,
}

/// Storage collaborator offering upsert, query-by-vector, query-by-id and
/// collection management over named collections
pub trait VectorStore: Send + Sync {
    /// Create a collection if absent. Returns `true` when it was created.
    fn create_collection(&self, name: &str) -> Result<bool>;

    /// Look up a collection; `None` when absent
    fn get_collection(&self, name: &str) -> Result<Option<CollectionInfo>>;

    /// All collection names in store order
    fn list_collections(&self) -> Result<Vec<String>>;

    /// Drop a collection and every record in it. Fails with
    /// `CollectionNotFound` when absent.
    fn delete_collection(&self, name: &str) -> Result<()>;

    /// Insert or overwrite by `doc_id`
    fn upsert(&self, collection: &str, record: &MemoryRecord) -> Result<()>;

    /// Fetch one record including its embedding
    fn get(&self, collection: &str, doc_id: &str) -> Result<Option<MemoryRecord>>;

    /// First `limit` records in insertion order
    fn peek(&self, collection: &str, limit: usize) -> Result<Vec<MemoryRecord>>;

    /// Delete one record. Returns `false` when it did not exist.
    fn delete(&self, collection: &str, doc_id: &str) -> Result<bool>;

    /// Nearest records by ascending distance, ties broken by `doc_id`
    fn query(&self, collection: &str, request: &QueryRequest<'_>) -> Result<Vec<RetrievalHit>>;

    /// Every `doc_id` in insertion order
    fn list_ids(&self, collection: &str) -> Result<Vec<String>>;

    /// Backend name for logs
    fn backend_name(&self) -> &'static str;
}
