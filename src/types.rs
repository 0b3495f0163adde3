//! Core types for Memvault

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::resilience::RetryPolicy;
use crate::storage::filter::WhereFilter;

/// Collection used when a tool call names none
pub const DEFAULT_COLLECTION_NAME: &str = "agent_memory";

/// Scalar metadata value. Nested structures are rejected before they reach the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl MetadataValue {
    /// Convert a JSON value, returning `None` for anything that is not a scalar
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(MetadataValue::Bool(*b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(MetadataValue::Int)
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(MetadataValue::Float)),
            serde_json::Value::String(s) => Some(MetadataValue::String(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Bool(b) => write!(f, "{}", b),
            MetadataValue::Int(i) => write!(f, "{}", i),
            MetadataValue::Float(x) => write!(f, "{}", x),
            MetadataValue::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::String(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::String(s)
    }
}

impl From<i64> for MetadataValue {
    fn from(i: i64) -> Self {
        MetadataValue::Int(i)
    }
}

impl From<f64> for MetadataValue {
    fn from(f: f64) -> Self {
        MetadataValue::Float(f)
    }
}

impl From<bool> for MetadataValue {
    fn from(b: bool) -> Self {
        MetadataValue::Bool(b)
    }
}

/// Ordered key -> scalar mapping
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A stored unit of memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub doc_id: String,
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
    /// Computed at write time, never returned to tool callers
    #[serde(skip)]
    pub embedding: Vec<f32>,
}

/// One ranked retrieval result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalHit {
    pub doc_id: String,
    pub text: String,
    pub metadata: Metadata,
    /// Store distance; lower is more relevant
    pub distance: f32,
}

/// Ephemeral retrieval request
#[derive(Debug, Clone, Default)]
pub struct RecallRequest {
    pub query: String,
    pub top_k: Option<usize>,
    pub filter: Option<WhereFilter>,
    pub keyword: Option<String>,
    pub collection: Option<String>,
}

impl RecallRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn filter(mut self, filter: WhereFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }
}

/// Outcome of an existence check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistenceCheck {
    pub exists: bool,
    /// Best match distance, `None` when the collection yielded nothing
    pub distance: Option<f32>,
    pub doc_id: Option<String>,
}

/// Output of the summarization pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub summary: String,
    /// Number of memories that made it into the prompt
    pub source_count: usize,
    /// False when nothing relevant was retrieved and the model was not called
    pub found: bool,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database path, or ":memory:"
    pub db_path: String,
    /// SQLite busy timeout in milliseconds
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: ":memory:".to_string(),
            busy_timeout_ms: 5000,
        }
    }
}

/// Embedding model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider to use: "tfidf", "openai", "gemini"
    pub provider: String,
    /// API key for hosted providers
    pub api_key: Option<String>,
    /// API base URL override (OpenRouter, Azure, proxies)
    pub base_url: Option<String>,
    /// Model name override
    pub model: Option<String>,
    /// Embedding dimensions (must match model output)
    pub dimensions: usize,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "tfidf".to_string(),
            api_key: None,
            base_url: None,
            model: None,
            dimensions: 384,
            timeout_secs: 30,
        }
    }
}

/// Text generation model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Provider to use: "none", "openai", "gemini"
    pub provider: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub max_output_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: "none".to_string(),
            api_key: None,
            base_url: None,
            model: None,
            max_output_tokens: 1024,
            timeout_secs: 60,
        }
    }
}

/// Engine behavior knobs
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Collection substituted when a call names none
    pub default_collection: String,
    /// Default result count for recall tools
    pub recall_top_k: usize,
    /// Default result count fed into summarization
    pub summarize_top_k: usize,
    /// Top-1 distance at or below which `check_memory` reports a match
    pub existence_threshold: f32,
    /// Longest text accepted by the embedding gateway
    pub max_embed_input_chars: usize,
    /// Budget for the memory context placed into a summarization prompt
    pub max_summary_input_chars: usize,
    /// Gate `delete_collection` / `list_collections` behind `grant_privilege`
    pub require_privilege: bool,
    /// Retry policy for store calls
    pub store_retry: RetryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_collection: DEFAULT_COLLECTION_NAME.to_string(),
            recall_top_k: 3,
            summarize_top_k: 5,
            existence_threshold: 0.5,
            max_embed_input_chars: 32_000,
            max_summary_input_chars: 24_000,
            require_privilege: false,
            store_retry: RetryPolicy::default(),
        }
    }
}
