//! Collection name resolution

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{MemvaultError, Result};
use crate::resilience::RetryPolicy;
use crate::storage::VectorStore;

static COLLECTION_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,62}$").expect("collection name pattern is valid")
});

/// How a tool intends to use the collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Get-only; absence is `CollectionNotFound`
    Read,
    /// Get-or-create; never fails on absence
    Write,
}

/// A collection known to exist at resolution time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionHandle {
    name: String,
}

impl CollectionHandle {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Maps optional requested names onto existing collections
#[derive(Debug, Clone)]
pub struct CollectionResolver {
    default_name: String,
}

/// Reject names the store would not round-trip cleanly
pub fn validate_collection_name(name: &str) -> Result<()> {
    if COLLECTION_NAME.is_match(name) {
        Ok(())
    } else {
        Err(MemvaultError::InvalidArgument(format!(
            "Invalid collection name '{}': use 1-63 characters from [A-Za-z0-9._-], starting with a letter or digit",
            name
        )))
    }
}

impl CollectionResolver {
    pub fn new(default_name: impl Into<String>) -> Result<Self> {
        let default_name = default_name.into();
        validate_collection_name(&default_name)
            .map_err(|e| MemvaultError::Config(format!("Default collection: {}", e)))?;
        Ok(Self { default_name })
    }

    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    /// Apply the default for absent or blank names, then validate
    pub fn name_for(&self, requested: Option<&str>) -> Result<String> {
        match requested.map(str::trim).filter(|s| !s.is_empty()) {
            Some(name) => {
                validate_collection_name(name)?;
                Ok(name.to_string())
            }
            None => Ok(self.default_name.clone()),
        }
    }

    pub fn resolve(
        &self,
        store: &dyn VectorStore,
        retry: &RetryPolicy,
        requested: Option<&str>,
        mode: ResolveMode,
    ) -> Result<CollectionHandle> {
        let name = self.name_for(requested)?;

        match mode {
            ResolveMode::Write => {
                let created = retry.run("create_collection", || store.create_collection(&name))?;
                if created {
                    tracing::info!(collection = %name, "Created collection");
                }
            }
            ResolveMode::Read => {
                if retry
                    .run("get_collection", || store.get_collection(&name))?
                    .is_none()
                {
                    return Err(MemvaultError::CollectionNotFound(name));
                }
            }
        }

        Ok(CollectionHandle { name })
    }
}
