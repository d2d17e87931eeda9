//! Tool-surface wiring (spec §6.1).
//!
//! The JSON-RPC transport itself is an external collaborator (spec
//! §1); this module is the thinnest possible stdio wrapper around
//! the library-level services declared in [`crate::search`],
//! [`crate::context`], [`crate::indexer`], [`crate::queue`], and
//! [`crate::store`]. Grounded on the teacher's own dependency on
//! `rmcp` (already declared with `server, macros, transport-io`
//! features) and on the real `#[tool_router]`/`#[tool_handler]`
//! usage pattern from the corpus's codeprysm-mcp server.

pub mod args;

use crate::config::Config;
use crate::context::FileContextService;
use crate::domain::error::Error;
use crate::embedding::service::EmbeddingService;
use crate::index::VectorIndex;
use crate::indexer::ProjectIndexer;
use crate::queue::IndexingQueue;
use crate::search::SearchService;
use crate::store::ProjectRegistry;
use args::{ClearIndexArgs, FileContextArgs, FindRelatedArgs, ReloadIndexArgs, SemanticSearchArgs};
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError};
use std::path::Path;
use std::sync::Arc;

/// Map a domain error to an MCP error, by kind rather than an ad-hoc
/// string (spec §7 "Tool-level errors MUST be reported by error kind
/// ... rather than ad-hoc strings"), never leaking internals beyond
/// the error's own `Display` message.
fn to_mcp_error(err: Error) -> McpError {
    let message = format!("{} ({})", err, err.kind());
    match err {
        Error::InvalidParams { .. } | Error::InvalidInput { .. } | Error::InvalidRange { .. } => {
            McpError::invalid_params(message, None)
        }
        Error::ProjectNotFound { .. } | Error::FileNotFound { .. } | Error::ProjectRootNotFound { .. } => {
            McpError::invalid_params(message, None)
        }
        _ => McpError::internal_error(message, None),
    }
}

fn text(body: impl Into<String>) -> CallToolResult {
    CallToolResult::success(vec![Content::text(body.into())])
}

/// Holds the library-level services and exposes them as MCP tools.
#[derive(Clone)]
pub struct CodeSearchTools {
    config: Config,
    search: Arc<SearchService>,
    file_context: FileContextService,
    indexer: Arc<ProjectIndexer>,
    queue: Arc<IndexingQueue>,
    registry: Arc<ProjectRegistry>,
    embeddings: Arc<EmbeddingService>,
    vector_index: Arc<VectorIndex>,
    tool_router: ToolRouter<Self>,
}

impl CodeSearchTools {
    /// Assemble the tool surface over already-constructed services.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Config,
        search: Arc<SearchService>,
        indexer: Arc<ProjectIndexer>,
        queue: Arc<IndexingQueue>,
        registry: Arc<ProjectRegistry>,
        embeddings: Arc<EmbeddingService>,
        vector_index: Arc<VectorIndex>,
    ) -> Self {
        Self {
            config,
            search,
            file_context: FileContextService::new(),
            indexer,
            queue,
            registry,
            embeddings,
            vector_index,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl CodeSearchTools {
    /// Semantic code search across indexed projects (spec §6.1).
    #[tool(description = "Search previously indexed projects for code semantically related to a natural-language or code-snippet query.")]
    async fn semantic_search(
        &self,
        Parameters(args): Parameters<SemanticSearchArgs>,
    ) -> Result<CallToolResult, McpError> {
        let max_results = args.max_results.unwrap_or(self.config.search.default_max_results);
        let project_filter = args.project_filter.or_else(|| self.config.project_name.clone());

        let results = self
            .search
            .search(&args.query, max_results, project_filter.as_deref())
            .await
            .map_err(to_mcp_error)?;

        if results.is_empty() {
            return Ok(text("No matching code found."));
        }

        let mut out = String::new();
        for (i, result) in results.iter().enumerate() {
            out.push_str(&format!(
                "{}. {}:{}-{} [{:?}] relevance={:.2}\n{}\n\n",
                i + 1,
                result.file_path,
                result.start_line,
                result.end_line,
                result.language,
                result.relevance,
                result.content,
            ));
        }
        Ok(text(out))
    }

    /// Read a file excerpt widened by a context window (spec §6.1,
    /// §4.9).
    #[tool(description = "Read a range of lines from a file, widened by a context window on each side.")]
    async fn file_context(
        &self,
        Parameters(args): Parameters<FileContextArgs>,
    ) -> Result<CallToolResult, McpError> {
        let range = match (args.start_line, args.end_line) {
            (Some(start), Some(end)) => Some((start, end)),
            (None, None) => None,
            _ => {
                return Err(to_mcp_error(Error::invalid_params(
                    "start_line and end_line must both be given or both omitted",
                )))
            }
        };
        let context_lines = args.context_lines.unwrap_or(crate::context::DEFAULT_CONTEXT_LINES);

        let ctx = self
            .file_context
            .read(Path::new(&args.file_path), range, context_lines)
            .map_err(to_mcp_error)?;

        Ok(text(format!(
            "{} [{:?}] lines {}-{} (focus {}-{})\n\n{}",
            ctx.file_path,
            ctx.language,
            ctx.start_line,
            ctx.end_line,
            ctx.focus.start_line,
            ctx.focus.end_line,
            ctx.content,
        )))
    }

    /// Placeholder for dependency-graph traversal. Excluded from the
    /// semantic-search core per spec §1 ("symbol/keyword search and
    /// cross-file dependency graph extraction are ... excluded").
    #[tool(description = "Find files related to a file by import relationship. Not implemented: dependency-graph extraction is outside the semantic-search core.")]
    async fn find_related(
        &self,
        Parameters(_args): Parameters<FindRelatedArgs>,
    ) -> Result<CallToolResult, McpError> {
        Err(to_mcp_error(Error::internal(
            "not implemented: dependency graph extraction is outside the semantic-search core",
        )))
    }

    /// Cache stats, embedding model tag, index path, and overall
    /// status (spec §6.1).
    #[tool(description = "Report embedding cache statistics, the active embedding model, and index location.")]
    async fn index_status(&self) -> Result<CallToolResult, McpError> {
        let stats = self.embeddings.stats().map_err(to_mcp_error)?;
        let index_stats = self.vector_index.stats(stats.hit_rate);
        let model_tag = match self.config.embedding.provider {
            crate::config::EmbeddingProviderKind::WordAverage => "word-average (300-dim)",
            crate::config::EmbeddingProviderKind::ExternalModel => "external-sentence-model (384-dim)",
        };

        Ok(text(format!(
            "status: ready\nembedding model: {model_tag}\nindex path: {}\ncache: {} entries, {} hits, {} misses, {:.1}% hit rate\nin-memory index: {} chunks, ~{:.2} MB",
            self.config.index_dir,
            stats.total_cached,
            stats.hits,
            stats.misses,
            stats.hit_rate * 100.0,
            index_stats.total_chunks,
            index_stats.used_mb,
        )))
    }

    /// Reindex one project, or every registered project (spec §6.1,
    /// §4.6).
    #[tool(description = "Reload (reindex) a single project, or every registered project if projectName is omitted.")]
    async fn reload_index(
        &self,
        Parameters(args): Parameters<ReloadIndexArgs>,
    ) -> Result<CallToolResult, McpError> {
        match args.project_name {
            Some(name) => {
                let counts = self.indexer.reindex(&name).await.map_err(to_mcp_error)?;
                Ok(text(format!(
                    "reindexed `{name}`: {} files, {} chunks",
                    counts.files, counts.chunks
                )))
            }
            None => {
                let results = self.indexer.reindex_all().await.map_err(to_mcp_error)?;
                let mut out = String::new();
                for (name, outcome) in results {
                    match outcome {
                        Ok(counts) => out.push_str(&format!(
                            "{name}: ok ({} files, {} chunks)\n",
                            counts.files, counts.chunks
                        )),
                        Err(err) => out.push_str(&format!("{name}: failed ({err})\n")),
                    }
                }
                if out.is_empty() {
                    out.push_str("no registered projects to reload");
                }
                Ok(text(out))
            }
        }
    }

    /// Delete all index state; requires explicit confirmation (spec
    /// §6.1, §7).
    #[tool(description = "Delete all indexed chunks, the registry, and the in-memory index. Requires confirm=true.")]
    async fn clear_index(
        &self,
        Parameters(args): Parameters<ClearIndexArgs>,
    ) -> Result<CallToolResult, McpError> {
        if !args.confirm {
            return Ok(text(
                "Refusing to clear the index without confirm=true. No changes were made.",
            ));
        }
        self.indexer.clear_all().map_err(to_mcp_error)?;
        Ok(text("Index cleared: all chunks, the registry, and the in-memory index were removed."))
    }

    /// Per-project name, path, status, counts, and top languages
    /// (spec §6.1).
    #[tool(description = "List every registered project with its indexing status and statistics.")]
    async fn list_projects(&self) -> Result<CallToolResult, McpError> {
        let mut projects = self.registry.list();
        if projects.is_empty() {
            return Ok(text("No projects indexed yet."));
        }
        projects.sort_by(|a, b| a.name.cmp(&b.name));

        let mut out = String::new();
        for project in projects {
            let mut languages: Vec<(&String, &u64)> = project.languages.iter().collect();
            languages.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            let top_languages: Vec<String> = languages
                .into_iter()
                .take(3)
                .map(|(name, count)| format!("{name} ({count})"))
                .collect();

            out.push_str(&format!(
                "{} [{:?}] {}\n  path: {}\n  files: {}, chunks: {}, lines: {}\n  top languages: {}\n  last updated: {}\n\n",
                project.name,
                project.status,
                project.id,
                project.root_path,
                project.file_count,
                project.chunk_count,
                project.total_lines,
                if top_languages.is_empty() { "none".to_string() } else { top_languages.join(", ") },
                project.last_updated_at.to_rfc3339(),
            ));
        }
        Ok(text(out))
    }
}


#[tool_handler]
impl rmcp::ServerHandler for CodeSearchTools {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Semantic code search over previously indexed projects.\n\n\
                TOOLS:\n\
                - semantic_search: rank indexed code by meaning against a query\n\
                - file_context: read a line range from a file with surrounding context\n\
                - index_status: embedding cache stats and index location\n\
                - reload_index / clear_index: maintain the index\n\
                - list_projects: enumerate registered projects and their stats\n\n\
                WORKFLOW: semantic_search to find candidates, file_context to read more \
                of a promising result."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
