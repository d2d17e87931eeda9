//! Core domain entities (spec §3): chunks, embeddings, projects, jobs,
//! search results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

/// Programming/markup language tag attached to a chunk.
///
/// The required minimum from spec §4.6 (`.swift`, `.py`, `.js`,
/// `.ts`, `.java`, `.rs`, `.go`, `.c`/`.h`, `.cpp`/`.hpp`, `.rb`,
/// `.kt`) plus the remainder of languages the teacher's own
/// extension table already recognized.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Java,
    Go,
    C,
    Cpp,
    CSharp,
    Ruby,
    Php,
    Swift,
    Kotlin,
    Scala,
    Haskell,
    Shell,
    Sql,
    Html,
    Xml,
    Json,
    Yaml,
    Toml,
    Markdown,
    PlainText,
    Unknown,
}

impl Language {
    /// Detect a language tag from a file path's extension.
    ///
    /// Unknown extensions return `Language::Unknown`; there is no
    /// content-sniffing fallback (spec §4.6).
    pub fn from_extension(ext: &str) -> Language {
        match ext.to_ascii_lowercase().as_str() {
            "rs" => Language::Rust,
            "py" | "pyw" => Language::Python,
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "ts" | "tsx" => Language::TypeScript,
            "java" => Language::Java,
            "go" => Language::Go,
            "c" | "h" => Language::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hxx" => Language::Cpp,
            "cs" => Language::CSharp,
            "rb" => Language::Ruby,
            "php" => Language::Php,
            "swift" => Language::Swift,
            "kt" | "kts" => Language::Kotlin,
            "scala" => Language::Scala,
            "hs" => Language::Haskell,
            "sh" | "bash" | "zsh" => Language::Shell,
            "sql" => Language::Sql,
            "html" | "htm" => Language::Html,
            "xml" => Language::Xml,
            "json" => Language::Json,
            "yaml" | "yml" => Language::Yaml,
            "toml" => Language::Toml,
            "md" | "markdown" => Language::Markdown,
            "txt" => Language::PlainText,
            _ => Language::Unknown,
        }
    }

    /// Whether this language is indexable. `Unknown` files are
    /// skipped during project discovery (spec §4.6).
    pub fn is_known(&self) -> bool {
        !matches!(self, Language::Unknown)
    }
}

/// The kind tag recorded on a chunk (spec §3).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    Code,
    Function,
    Block,
    File,
}

/// A contiguous line-range of a source file, stored with its
/// embedding for retrieval (spec §3, GLOSSARY).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct Chunk {
    /// Stable identifier, unique across all projects.
    #[validate(length(min = 1))]
    pub id: String,
    /// Name of the owning project.
    #[validate(length(min = 1))]
    pub project_name: String,
    /// Path relative to the project root.
    #[serde(rename = "file_path")]
    #[validate(length(min = 1))]
    pub file_path: String,
    /// Language tag.
    pub language: Language,
    /// 1-indexed start line.
    #[serde(rename = "start_line")]
    #[validate(range(min = 1))]
    pub start_line: u32,
    /// 1-indexed, inclusive end line. Always >= `start_line`.
    #[serde(rename = "end_line")]
    #[validate(range(min = 1))]
    pub end_line: u32,
    /// UTF-8 text of lines `[start_line, end_line]`.
    pub content: String,
    /// Chunk kind tag.
    #[serde(rename = "chunk_type")]
    pub kind: ChunkKind,
    /// Embedding vector, present once the indexing pipeline has run.
    pub embedding: Option<Vec<f32>>,
    /// Optional human-readable description.
    pub description: Option<String>,
}

impl Chunk {
    /// Number of lines this chunk's `content` is expected to cover.
    pub fn expected_line_count(&self) -> u32 {
        self.end_line - self.start_line + 1
    }
}

/// Lightweight metadata copy the in-memory index keeps alongside an
/// embedding, so results can be rendered without reopening the chunk
/// file (spec §4.5).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkMetadata {
    pub project_name: String,
    pub file_path: String,
    pub language: Language,
    pub start_line: u32,
    pub end_line: u32,
    pub content: String,
    pub kind: ChunkKind,
}

impl From<&Chunk> for ChunkMetadata {
    fn from(chunk: &Chunk) -> Self {
        ChunkMetadata {
            project_name: chunk.project_name.clone(),
            file_path: chunk.file_path.clone(),
            language: chunk.language,
            start_line: chunk.start_line,
            end_line: chunk.end_line,
            content: chunk.content.clone(),
            kind: chunk.kind,
        }
    }
}

/// Status of a project in the registry (spec §3).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Pending,
    Indexing,
    Complete,
    Failed,
    Partial,
}

/// Rough per-chunk size statistics recorded for a project.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct ChunkSizeStats {
    pub min_lines: u32,
    pub avg_lines: f64,
    pub max_lines: u32,
    /// A rough complexity score; any monotonic proxy is acceptable
    /// per spec's Open Questions (the in-memory index's memory
    /// figure gets the same "approximate within 2x" allowance).
    pub complexity_score: f64,
}

/// Project metadata owned by the [`crate::store::registry::ProjectRegistry`]
/// (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectMetadata {
    pub id: String,
    pub name: String,
    pub root_path: String,
    pub first_indexed_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    pub file_count: u64,
    pub chunk_count: u64,
    pub total_lines: u64,
    pub languages: HashMap<String, u64>,
    pub stats: ChunkSizeStats,
    pub status: ProjectStatus,
}

/// Priority tier for an indexing job (spec §4.8).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum JobPriority {
    Low,
    Normal,
    High,
}

/// Terminal/intermediate state of an indexing job (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
}

/// Counts reported by a successfully completed indexing job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct IndexCounts {
    pub files: u64,
    pub chunks: u64,
}

/// A ranked retrieval record returned to the tool layer (spec §3,
/// §4.7).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub id: String,
    pub project_name: String,
    pub file_path: String,
    pub language: Language,
    pub start_line: u32,
    pub end_line: u32,
    pub content: String,
    pub kind: String,
    /// Clamped to `[0, 1]` (Testable Property 6).
    pub relevance: f32,
    pub match_reason: String,
    pub metadata: HashMap<String, String>,
}
