//! Memvault - memory retrieval and ranking for AI agents
//!
//! Stores text memories with embeddings in named collections and serves
//! vector recall, hybrid keyword recall, existence checks and model-backed
//! summarization over MCP.

pub mod embedding;
pub mod error;
pub mod generation;
#[cfg(any(feature = "openai", feature = "gemini"))]
mod http;
pub mod intelligence;
pub mod mcp;
pub mod memory;
pub mod resilience;
pub mod search;
pub mod storage;
pub mod types;

pub use error::{ErrorKind, MemvaultError, Result};
pub use memory::{AddedMemory, MemoryEngine, NewMemory};
pub use storage::{SqliteBackend, Storage, VectorStore, WhereFilter};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
