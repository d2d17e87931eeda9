//! Binary entry point: parse CLI args, load configuration, wire the
//! services, optionally index startup projects, then serve the MCP
//! tool surface over stdio.
//!
//! Grounded on the teacher's `server.rs` composition root (clap CLI
//! over a layered config, explicit `Arc`-wired services, stdio
//! transport).

use clap::Parser;
use code_search_mcp::config::ConfigLoader;
use code_search_mcp::domain::error::Result;
use code_search_mcp::embedding::external_model::ExternalModelProvider;
use code_search_mcp::embedding::service::EmbeddingService;
use code_search_mcp::embedding::word_average::WordAverageProvider;
use code_search_mcp::embedding::EmbeddingProvider;
use code_search_mcp::index::VectorIndex;
use code_search_mcp::indexer::{IndexerConfig, ProjectIndexer};
use code_search_mcp::queue::IndexingQueue;
use code_search_mcp::search::SearchService;
use code_search_mcp::server::CodeSearchTools;
use code_search_mcp::store::{ChunkStore, ProjectRegistry};
use rmcp::transport::stdio;
use rmcp::ServiceExt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Semantic code search MCP server.
#[derive(Debug, Parser)]
#[command(name = "code-search-mcp", version, about)]
struct Cli {
    /// Path to a TOML configuration file, layered over the embedded
    /// defaults and overridden by CODE_SEARCH_* environment
    /// variables.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout is reserved for the JSON-RPC transport (spec §6.2); all
    // diagnostic logging goes to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = ConfigLoader::new().load_from(cli.config.as_deref())?;
    tracing::info!(index_dir = %config.index_dir, "configuration loaded");

    let chunk_store = Arc::new(ChunkStore::open(&config.index_dir)?);
    let registry = Arc::new(ProjectRegistry::load(&config.index_dir)?);
    let vector_index = Arc::new(VectorIndex::new());
    vector_index.preload(&chunk_store)?;

    let provider: Arc<dyn EmbeddingProvider> = match config.embedding.provider {
        code_search_mcp::config::EmbeddingProviderKind::WordAverage => Arc::new(WordAverageProvider::new()),
        code_search_mcp::config::EmbeddingProviderKind::ExternalModel => {
            let mut external = ExternalModelProvider::new(config.embedding.external_model_port);
            if let Some(path) = &config.embedding.external_model_executable {
                external = external.with_executable_path(path.clone());
            }
            external.start().await?;
            Arc::new(external)
        }
    };
    let embeddings = Arc::new(EmbeddingService::new(
        provider,
        PathBuf::from(&config.index_dir).join("embedding-cache"),
    )?);

    let indexer_config = IndexerConfig {
        chunk_window: config.chunking.window,
        chunk_overlap: config.chunking.overlap,
        ..IndexerConfig::default()
    };
    let indexer = Arc::new(ProjectIndexer::new(
        indexer_config,
        chunk_store.clone(),
        registry.clone(),
        vector_index.clone(),
        embeddings.clone(),
    ));
    let queue = IndexingQueue::new(config.queue.max_concurrent_jobs);
    let search = Arc::new(SearchService::new(embeddings.clone(), vector_index.clone(), chunk_store.clone()));

    for root in &config.projects {
        let name = project_name_from_path(root);
        tracing::info!(project = %name, root = %root, "indexing startup project");
        match indexer.index_project(&name, std::path::Path::new(root)).await {
            Ok(counts) => tracing::info!(project = %name, files = counts.files, chunks = counts.chunks, "indexed"),
            Err(err) => tracing::error!(project = %name, error = %err, "failed to index startup project"),
        }
    }

    let tools = CodeSearchTools::new(
        config,
        search,
        indexer,
        Arc::new(queue),
        registry,
        embeddings,
        vector_index,
    );

    let service = tools.serve(stdio()).await.inspect_err(|e| {
        tracing::error!(error = %e, "failed to start MCP server");
    })?;
    service.waiting().await?;

    Ok(())
}

/// Derive a project name from a configured root path's final
/// component, falling back to the full path if it has none.
fn project_name_from_path(root: &str) -> String {
    std::path::Path::new(root)
        .file_name()
        .and_then(|n| n.to_str())
        .map(String::from)
        .unwrap_or_else(|| root.to_string())
}
