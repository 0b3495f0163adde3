//! Storage engine for Memvault
//!
//! The [`VectorStore`] trait is the collaborator boundary; [`SqliteBackend`]
//! is the shipped realization on top of SQLite in WAL mode.

pub mod backend;
mod connection;
pub mod filter;
mod migrations;
pub mod queries;
mod sqlite_backend;

pub use backend::{CollectionInfo, QueryRequest, VectorStore};
pub use connection::Storage;
pub use filter::{FilterOp, WhereFilter};
pub use migrations::SCHEMA_VERSION;
pub use sqlite_backend::SqliteBackend;
