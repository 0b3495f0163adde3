//! Add, update and delete operations

use serde::Serialize;

use super::normalize::{merge_metadata, resolve_doc_id};
use super::resolver::{validate_collection_name, ResolveMode};
use super::MemoryEngine;
use crate::error::{MemvaultError, Result};
use crate::types::{MemoryRecord, Metadata};

/// Input for `add_memory`
#[derive(Debug, Clone, Default)]
pub struct NewMemory {
    pub text: String,
    pub doc_id: Option<String>,
    pub metadata: Metadata,
    pub collection: Option<String>,
}

impl NewMemory {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn doc_id(mut self, doc_id: impl Into<String>) -> Self {
        self.doc_id = Some(doc_id.into());
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }
}

/// Where an added memory landed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddedMemory {
    pub doc_id: String,
    pub collection: String,
}

fn require_doc_id(doc_id: &str) -> Result<&str> {
    let trimmed = doc_id.trim();
    if trimmed.is_empty() {
        return Err(MemvaultError::InvalidArgument(
            "doc_id is required".to_string(),
        ));
    }
    Ok(trimmed)
}

fn require_collection_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(MemvaultError::InvalidArgument(
            "collection_name is required".to_string(),
        ));
    }
    validate_collection_name(trimmed)?;
    Ok(trimmed)
}

impl MemoryEngine {
    /// Embed and upsert one memory, creating the collection if needed.
    ///
    /// Repeating the call with the same `doc_id` overwrites the record.
    pub fn add_memory(&self, input: NewMemory) -> Result<AddedMemory> {
        // Name validation and embedding happen before any store write
        self.resolver.name_for(input.collection.as_deref())?;
        let doc_id = resolve_doc_id(input.doc_id.as_deref());
        let embedding = self.embed_document(&input.text)?;

        let collection = self.resolve(input.collection.as_deref(), ResolveMode::Write)?;
        let record = MemoryRecord {
            doc_id,
            text: input.text,
            metadata: input.metadata,
            embedding,
        };
        self.with_store("upsert", |store| store.upsert(collection.name(), &record))?;

        tracing::info!(
            doc_id = %record.doc_id,
            collection = collection.name(),
            "Memory added"
        );

        Ok(AddedMemory {
            doc_id: record.doc_id,
            collection: collection.name().to_string(),
        })
    }

    /// Delete one memory; absence is reported as `DocumentNotFound`.
    ///
    /// Returns the name of the collection the record was removed from.
    pub fn delete_memory(&self, doc_id: &str, collection: Option<&str>) -> Result<String> {
        let doc_id = require_doc_id(doc_id)?;
        let collection = self.resolve(collection, ResolveMode::Read)?;

        let deleted = self.with_store("delete", |store| store.delete(collection.name(), doc_id))?;
        if !deleted {
            return Err(MemvaultError::DocumentNotFound {
                collection: collection.name().to_string(),
                doc_id: doc_id.to_string(),
            });
        }

        tracing::info!(doc_id, collection = collection.name(), "Memory deleted");
        Ok(collection.name().to_string())
    }

    /// Fetch one memory by id
    pub fn get_memory_by_id(&self, doc_id: &str, collection: Option<&str>) -> Result<MemoryRecord> {
        let doc_id = require_doc_id(doc_id)?;
        let collection = self.resolve(collection, ResolveMode::Read)?;

        self.with_store("get", |store| store.get(collection.name(), doc_id))?
            .ok_or_else(|| MemvaultError::DocumentNotFound {
                collection: collection.name().to_string(),
                doc_id: doc_id.to_string(),
            })
    }

    /// Merge `metadata` into a stored record, keeping its text and embedding.
    ///
    /// Read-merge-write is not isolated: a concurrent overwrite of the same
    /// `doc_id` may be lost.
    pub fn update_memory_metadata(
        &self,
        doc_id: &str,
        metadata: Metadata,
        collection: Option<&str>,
    ) -> Result<Metadata> {
        let doc_id = require_doc_id(doc_id)?;
        if metadata.is_empty() {
            return Err(MemvaultError::InvalidArgument(
                "metadata must contain at least one key".to_string(),
            ));
        }

        let mut record = self.get_memory_by_id(doc_id, collection)?;
        let collection = self.resolver.name_for(collection)?;

        record.metadata = merge_metadata(&record.metadata, metadata);
        self.with_store("upsert", |store| store.upsert(&collection, &record))?;

        tracing::info!(doc_id, collection = %collection, "Memory metadata updated");
        Ok(record.metadata)
    }

    /// Drop a whole collection. Irreversible.
    pub fn delete_collection(&self, name: &str) -> Result<()> {
        let name = require_collection_name(name)?;
        self.take_privilege("delete_collection")?;

        self.with_store("delete_collection", |store| store.delete_collection(name))?;

        tracing::info!(collection = name, "Collection deleted");
        Ok(())
    }

    /// Known collection names, sorted
    pub fn list_collections(&self) -> Result<Vec<String>> {
        self.take_privilege("list_collections")?;

        let mut names = self.with_store("list_collections", |store| store.list_collections())?;
        names.sort();
        Ok(names)
    }

    /// Every `doc_id` in a collection in store iteration order
    pub fn list_collection_ids(&self, name: &str) -> Result<Vec<String>> {
        let name = require_collection_name(name)?;
        let collection = self.resolve(Some(name), ResolveMode::Read)?;

        self.with_store("list_ids", |store| store.list_ids(collection.name()))
    }
}
