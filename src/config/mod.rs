//! Configuration (ambient module, SPEC_FULL "Configuration"): the
//! settings every component needs at startup — index directory,
//! chunk window/overlap, embedding provider selection, queue
//! concurrency, search defaults — plus the two environment overrides
//! spec §6.2 names.
//!
//! Grounded on the teacher's `infrastructure::config` stack: the
//! `config` crate layered over an embedded TOML default, `serde` for
//! the shape, `validator` for field-level checks. Collapsed from the
//! teacher's sprawling multi-domain `Config` (auth/database/sync/
//! admin — all out of scope for this core) down to the fields this
//! crate actually owns.

pub mod loader;

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use loader::ConfigLoader;

/// Line-window chunking settings (spec §4.6).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChunkingConfig {
    /// Window size in lines.
    #[validate(range(min = 1))]
    pub window: usize,
    /// Overlap in lines between consecutive windows. Must be smaller
    /// than `window`, or every window would advance by zero lines.
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            window: crate::indexer::chunking::DEFAULT_CHUNK_WINDOW,
            overlap: crate::indexer::chunking::DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Which embedding provider variant to construct at startup (spec
/// §4.2). Provider selection is a startup decision and does not
/// change at runtime (Design Notes, "Pluggable provider").
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProviderKind {
    /// Local word-average provider, 300-dim.
    #[default]
    WordAverage,
    /// Out-of-process sentence-model server, 384-dim.
    ExternalModel,
}

/// Embedding provider settings (spec §4.2).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProviderKind,
    /// Loopback port the external-model subordinate listens on, used
    /// only when `provider` is `external_model`.
    #[validate(range(min = 1))]
    pub external_model_port: u16,
    /// Explicit path to the external-model subordinate executable,
    /// overriding the fixed candidate-path search (spec §4.2(a)).
    pub external_model_executable: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::default(),
            external_model_port: 8931,
            external_model_executable: None,
        }
    }
}

/// Indexing queue settings (spec §4.8).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QueueConfig {
    /// Maximum number of concurrently active indexing jobs.
    #[validate(range(min = 1))]
    pub max_concurrent_jobs: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { max_concurrent_jobs: 1 }
    }
}

/// Search defaults (spec §4.7, §6.1).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchConfig {
    /// `maxResults` used when the tool caller omits it.
    #[validate(range(min = 1))]
    pub default_max_results: usize,
    /// Multiplier applied to `maxResults` for the chunk-store
    /// fallback scan, to cover subsequent dedup (spec §4.7,
    /// `OVERSAMPLE >= 3`).
    #[validate(range(min = 3))]
    pub oversample: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_max_results: crate::search::DEFAULT_MAX_RESULTS,
            oversample: 3,
        }
    }
}

/// Root configuration: everything this crate's components need at
/// startup.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Config {
    /// Directory holding the chunk store, embedding cache, and
    /// project registry (spec §4.4).
    #[validate(length(min = 1))]
    pub index_dir: String,
    #[validate(nested)]
    pub chunking: ChunkingConfig,
    #[validate(nested)]
    pub embedding: EmbeddingConfig,
    #[validate(nested)]
    pub queue: QueueConfig,
    #[validate(nested)]
    pub search: SearchConfig,
    /// Default project filter for `semantic_search` when the tool
    /// caller doesn't supply one (spec §6.2,
    /// `CODE_SEARCH_PROJECT_NAME`).
    pub project_name: Option<String>,
    /// Project root paths to index at startup (spec §6.2,
    /// `CODE_SEARCH_PROJECTS`, colon-separated on the wire).
    #[serde(default)]
    pub projects: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index_dir: default_index_dir(),
            chunking: ChunkingConfig::default(),
            embedding: EmbeddingConfig::default(),
            queue: QueueConfig::default(),
            search: SearchConfig::default(),
            project_name: None,
            projects: Vec::new(),
        }
    }
}

fn default_index_dir() -> String {
    dirs::data_dir()
        .map(|d| d.join("code-search-mcp").join("index"))
        .unwrap_or_else(|| std::path::PathBuf::from(".code-search-index"))
        .display()
        .to_string()
}
