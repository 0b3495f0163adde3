//! Intelligence module for model-backed features
//!
//! Provides:
//! - Memory summarization over retrieved context

pub mod summarization;

pub use summarization::{build_prompt, fit_context, CHUNK_SEPARATOR, NO_MEMORIES_FOUND};
