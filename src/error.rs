//! Error types for Memvault

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for Memvault operations
pub type Result<T> = std::result::Result<T, MemvaultError>;

/// Main error type for Memvault
#[derive(Error, Debug)]
pub enum MemvaultError {
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Document '{doc_id}' not found in collection '{collection}'")]
    DocumentNotFound { collection: String, doc_id: String },

    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Embedding error: {message}")]
    Embedding { message: String, transient: bool },

    #[error("Summarization error: {message}")]
    Summarization { message: String, transient: bool },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Non-transient store failure (constraint violation, corrupt row, ...)
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Operation '{0}' requires privilege. Call 'grant_privilege' first.")]
    PrivilegeRequired(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Protocol stream failure (stdout closed, broken pipe)
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Error kinds surfaced to tool callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    CollectionNotFound,
    DocumentNotFound,
    InvalidMetadata,
    InvalidArgument,
    EmbeddingError,
    SummarizationError,
    StoreUnavailable,
    PrivilegeRequired,
}

impl MemvaultError {
    /// Permanent embedding failure (bad input, malformed response)
    pub fn embedding(message: impl Into<String>) -> Self {
        MemvaultError::Embedding {
            message: message.into(),
            transient: false,
        }
    }

    /// Transient embedding failure (network, timeout, rate limit)
    pub fn embedding_transient(message: impl Into<String>) -> Self {
        MemvaultError::Embedding {
            message: message.into(),
            transient: true,
        }
    }

    /// Permanent summarization failure
    pub fn summarization(message: impl Into<String>) -> Self {
        MemvaultError::Summarization {
            message: message.into(),
            transient: false,
        }
    }

    /// Transient summarization failure (network, timeout, rate limit)
    pub fn summarization_transient(message: impl Into<String>) -> Self {
        MemvaultError::Summarization {
            message: message.into(),
            transient: true,
        }
    }

    /// Check if error is retryable
    ///
    /// Only transient infrastructure failures qualify. Validation and
    /// not-found errors never do.
    pub fn is_retryable(&self) -> bool {
        match self {
            MemvaultError::StoreUnavailable(_) => true,
            MemvaultError::Embedding { transient, .. }
            | MemvaultError::Summarization { transient, .. } => *transient,
            _ => false,
        }
    }

    /// Kind reported to the caller
    pub fn kind(&self) -> ErrorKind {
        match self {
            MemvaultError::CollectionNotFound(_) => ErrorKind::CollectionNotFound,
            MemvaultError::DocumentNotFound { .. } => ErrorKind::DocumentNotFound,
            MemvaultError::InvalidMetadata(_) => ErrorKind::InvalidMetadata,
            // Config and Transport fail the server itself and never reach a tool result
            MemvaultError::InvalidArgument(_)
            | MemvaultError::Config(_)
            | MemvaultError::Transport(_) => ErrorKind::InvalidArgument,
            MemvaultError::Embedding { .. } => ErrorKind::EmbeddingError,
            MemvaultError::Summarization { .. } => ErrorKind::SummarizationError,
            MemvaultError::StoreUnavailable(_) | MemvaultError::Storage(_) => {
                ErrorKind::StoreUnavailable
            }
            MemvaultError::PrivilegeRequired(_) => ErrorKind::PrivilegeRequired,
        }
    }

    /// Get error code for MCP protocol
    pub fn code(&self) -> i64 {
        match self.kind() {
            ErrorKind::CollectionNotFound | ErrorKind::DocumentNotFound => -32001,
            ErrorKind::InvalidMetadata | ErrorKind::InvalidArgument => -32602,
            ErrorKind::PrivilegeRequired => -32003,
            ErrorKind::StoreUnavailable => -32004,
            ErrorKind::EmbeddingError | ErrorKind::SummarizationError => -32000,
        }
    }
}

impl From<rusqlite::Error> for MemvaultError {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;

        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if matches!(
                    e.code,
                    ErrorCode::DatabaseBusy
                        | ErrorCode::DatabaseLocked
                        | ErrorCode::SystemIoFailure
                        | ErrorCode::CannotOpen
                        | ErrorCode::OutOfMemory
                ) =>
            {
                MemvaultError::StoreUnavailable(err.to_string())
            }
            _ => MemvaultError::Storage(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for MemvaultError {
    fn from(err: serde_json::Error) -> Self {
        MemvaultError::Storage(format!("Serialization error: {}", err))
    }
}

impl From<std::io::Error> for MemvaultError {
    fn from(err: std::io::Error) -> Self {
        MemvaultError::StoreUnavailable(format!("IO error: {}", err))
    }
}
