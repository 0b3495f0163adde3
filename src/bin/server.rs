//! Memvault MCP Server
//!
//! Run with: memvault-server

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use memvault::embedding::create_embedder;
use memvault::generation::create_generator;
use memvault::mcp::{McpServer, MemoryToolHandler};
use memvault::resilience::RetryPolicy;
use memvault::storage::SqliteBackend;
use memvault::{
    EmbeddingConfig, EngineConfig, GenerationConfig, MemoryEngine, StorageConfig,
    DEFAULT_COLLECTION_NAME,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "memvault-server")]
#[command(about = "Memvault MCP server for agent memory")]
struct Args {
    /// Database path
    #[arg(
        long,
        env = "MEMVAULT_DB_PATH",
        default_value = "~/.local/share/memvault/memories.db"
    )]
    db_path: String,

    /// Collection used when a tool call names none
    #[arg(long, env = "MEMVAULT_DEFAULT_COLLECTION", default_value = DEFAULT_COLLECTION_NAME)]
    default_collection: String,

    /// Embedding provider (tfidf, openai, gemini)
    #[arg(long, env = "MEMVAULT_EMBEDDING_PROVIDER", default_value = "tfidf")]
    embedding_provider: String,

    /// Embedding model override
    #[arg(long, env = "MEMVAULT_EMBEDDING_MODEL")]
    embedding_model: Option<String>,

    /// Embedding dimensions (must match the model)
    #[arg(long, env = "MEMVAULT_EMBEDDING_DIMENSIONS", default_value = "384")]
    embedding_dimensions: usize,

    /// Generation provider for summarization (none, openai, gemini)
    #[arg(long, env = "MEMVAULT_GENERATION_PROVIDER", default_value = "none")]
    generation_provider: String,

    /// Generation model override
    #[arg(long, env = "MEMVAULT_GENERATION_MODEL")]
    generation_model: Option<String>,

    /// API base URL override for hosted providers
    #[arg(long, env = "MEMVAULT_BASE_URL")]
    base_url: Option<String>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,

    /// Per-request timeout for model calls in seconds
    #[arg(long, env = "MEMVAULT_MODEL_TIMEOUT_SECS", default_value = "30")]
    model_timeout_secs: u64,

    /// Delay before the single retry of a transient failure, in ms
    #[arg(long, env = "MEMVAULT_RETRY_BACKOFF_MS", default_value = "250")]
    retry_backoff_ms: u64,

    /// Top-1 distance at or below which check_memory reports a match
    #[arg(long, env = "MEMVAULT_EXISTENCE_THRESHOLD", default_value = "0.5")]
    existence_threshold: f32,

    /// Character budget for memories placed into a summarization prompt
    #[arg(long, env = "MEMVAULT_MAX_SUMMARY_INPUT_CHARS", default_value = "24000")]
    max_summary_input_chars: usize,

    /// Require grant_privilege before delete_collection / list_collections
    #[arg(long, env = "MEMVAULT_REQUIRE_PRIVILEGE")]
    require_privilege: bool,

    /// Log output format
    #[arg(long, env = "MEMVAULT_LOG_FORMAT", value_enum, default_value = "text")]
    log_format: LogFormat,
}

impl Args {
    fn api_key_for(&self, provider: &str) -> Option<String> {
        match provider {
            "openai" => self.openai_api_key.clone(),
            "gemini" => self.gemini_api_key.clone(),
            _ => None,
        }
    }
}

fn init_tracing(format: LogFormat) {
    // stderr only; stdout carries the protocol
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format);

    // Expand ~ in path
    let db_path = shellexpand::tilde(&args.db_path).to_string();

    let retry = RetryPolicy::new(1, Duration::from_millis(args.retry_backoff_ms));

    let store = SqliteBackend::new(StorageConfig {
        db_path: db_path.clone(),
        ..Default::default()
    })
    .with_context(|| format!("opening database {}", db_path))?;

    let embedding_config = EmbeddingConfig {
        provider: args.embedding_provider.clone(),
        api_key: args.api_key_for(&args.embedding_provider),
        base_url: args.base_url.clone(),
        model: args.embedding_model.clone(),
        dimensions: args.embedding_dimensions,
        timeout_secs: args.model_timeout_secs,
    };
    let embedder = create_embedder(&embedding_config, retry).context("creating embedder")?;

    let generation_config = GenerationConfig {
        provider: args.generation_provider.clone(),
        api_key: args.api_key_for(&args.generation_provider),
        base_url: args.base_url.clone(),
        model: args.generation_model.clone(),
        timeout_secs: args.model_timeout_secs,
        ..Default::default()
    };
    let generator = create_generator(&generation_config, retry).context("creating generator")?;

    let engine_config = EngineConfig {
        default_collection: args.default_collection.clone(),
        existence_threshold: args.existence_threshold,
        max_summary_input_chars: args.max_summary_input_chars,
        require_privilege: args.require_privilege,
        store_retry: retry,
        ..Default::default()
    };
    let engine = MemoryEngine::new(Arc::new(store), embedder, generator, engine_config)
        .context("configuring memory engine")?;

    tracing::info!(
        db_path = %db_path,
        default_collection = engine.default_collection(),
        "Memvault MCP server starting..."
    );
    let server = McpServer::new(MemoryToolHandler::new(Arc::new(engine)));

    server.run().await?;
    tracing::info!("stdin closed, shutting down");

    Ok(())
}
