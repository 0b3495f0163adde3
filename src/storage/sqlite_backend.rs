//! SQLite implementation of the VectorStore trait
//!
//! Wraps [`Storage`] and delegates to the functions in `queries.rs`. Writes
//! run in a transaction so an upsert never races its own collection check.

use crate::error::Result;
use crate::types::{MemoryRecord, RetrievalHit, StorageConfig};

use super::backend::{CollectionInfo, QueryRequest, VectorStore};
use super::connection::Storage;
use super::queries;

/// SQLite-based vector store
pub struct SqliteBackend {
    storage: Storage,
}

impl SqliteBackend {
    pub fn new(config: StorageConfig) -> Result<Self> {
        let storage = Storage::open(config)?;
        Ok(Self { storage })
    }

    /// In-memory backend (useful for testing)
    pub fn in_memory() -> Result<Self> {
        let storage = Storage::open_in_memory()?;
        Ok(Self { storage })
    }
}

impl From<Storage> for SqliteBackend {
    fn from(storage: Storage) -> Self {
        Self { storage }
    }
}

impl VectorStore for SqliteBackend {
    fn create_collection(&self, name: &str) -> Result<bool> {
        self.storage
            .with_connection(|conn| queries::create_collection(conn, name))
    }

    fn get_collection(&self, name: &str) -> Result<Option<CollectionInfo>> {
        self.storage
            .with_connection(|conn| queries::get_collection(conn, name))
    }

    fn list_collections(&self) -> Result<Vec<String>> {
        self.storage.with_connection(queries::list_collections)
    }

    fn delete_collection(&self, name: &str) -> Result<()> {
        self.storage
            .with_transaction(|conn| queries::delete_collection(conn, name))
    }

    fn upsert(&self, collection: &str, record: &MemoryRecord) -> Result<()> {
        self.storage
            .with_transaction(|conn| queries::upsert_memory(conn, collection, record))
    }

    fn get(&self, collection: &str, doc_id: &str) -> Result<Option<MemoryRecord>> {
        self.storage
            .with_connection(|conn| queries::get_memory(conn, collection, doc_id))
    }

    fn peek(&self, collection: &str, limit: usize) -> Result<Vec<MemoryRecord>> {
        self.storage
            .with_connection(|conn| queries::peek_memories(conn, collection, limit))
    }

    fn delete(&self, collection: &str, doc_id: &str) -> Result<bool> {
        self.storage
            .with_transaction(|conn| queries::delete_memory(conn, collection, doc_id))
    }

    fn query(&self, collection: &str, request: &QueryRequest<'_>) -> Result<Vec<RetrievalHit>> {
        self.storage
            .with_connection(|conn| queries::query_memories(conn, collection, request))
    }

    fn list_ids(&self, collection: &str) -> Result<Vec<String>> {
        self.storage
            .with_connection(|conn| queries::list_doc_ids(conn, collection))
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
