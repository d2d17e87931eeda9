//! Project indexer (spec §4.6): file discovery, language detection,
//! line-window chunking, batched embedding, persistence, and registry
//! maintenance.

pub mod chunking;
pub mod discovery;

use crate::domain::error::{Error, Result};
use crate::domain::types::{
    Chunk, ChunkKind, ChunkSizeStats, IndexCounts, Language, ProjectMetadata, ProjectStatus,
};
use crate::embedding::service::EmbeddingService;
use crate::index::VectorIndex;
use crate::store::{ChunkStore, ProjectRegistry};
use chrono::Utc;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Chunk-window/overlap and exclusion configuration for the indexer.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub chunk_window: usize,
    pub chunk_overlap: usize,
    pub excluded_dirs: Vec<String>,
    pub whitelisted_hidden: Vec<String>,
    /// Texts are submitted to the embedding service in batches of at
    /// most this size, to keep request sizes bounded (spec §4.6
    /// "Embedding").
    pub embed_batch_size: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            chunk_window: chunking::DEFAULT_CHUNK_WINDOW,
            chunk_overlap: chunking::DEFAULT_CHUNK_OVERLAP,
            excluded_dirs: discovery::default_excluded_dirs(),
            whitelisted_hidden: Vec::new(),
            embed_batch_size: 64,
        }
    }
}

/// Orchestrates (re)indexing of registered projects.
pub struct ProjectIndexer {
    config: IndexerConfig,
    chunk_store: Arc<ChunkStore>,
    registry: Arc<ProjectRegistry>,
    vector_index: Arc<VectorIndex>,
    embeddings: Arc<EmbeddingService>,
}

impl ProjectIndexer {
    pub fn new(
        config: IndexerConfig,
        chunk_store: Arc<ChunkStore>,
        registry: Arc<ProjectRegistry>,
        vector_index: Arc<VectorIndex>,
        embeddings: Arc<EmbeddingService>,
    ) -> Self {
        Self {
            config,
            chunk_store,
            registry,
            vector_index,
            embeddings,
        }
    }

    /// Index `root_path` under `project_name` from scratch,
    /// registering it if new. On a fatal error mid-pipeline the
    /// registry is left with status `partial` and the error is
    /// surfaced (spec §4.6 "Persistence").
    #[tracing::instrument(skip(self))]
    pub async fn index_project(&self, project_name: &str, root_path: &Path) -> Result<IndexCounts> {
        if !root_path.exists() || !root_path.is_dir() {
            return Err(Error::ProjectRootNotFound {
                path: root_path.display().to_string(),
            });
        }

        let now = Utc::now();
        let existing = self.registry.get(project_name);
        self.registry.upsert(ProjectMetadata {
            id: project_name.to_string(),
            name: project_name.to_string(),
            root_path: root_path.display().to_string(),
            first_indexed_at: existing.as_ref().map(|p| p.first_indexed_at).unwrap_or(now),
            last_updated_at: now,
            file_count: 0,
            chunk_count: 0,
            total_lines: 0,
            languages: HashMap::new(),
            stats: ChunkSizeStats::default(),
            status: ProjectStatus::Indexing,
        })?;

        match self.run_pipeline(project_name, root_path).await {
            Ok((counts, metadata)) => {
                self.registry.upsert(metadata)?;
                Ok(counts)
            }
            Err(err) => {
                if let Some(mut partial) = self.registry.get(project_name) {
                    partial.status = ProjectStatus::Partial;
                    partial.last_updated_at = Utc::now();
                    // Registry write failures abort reindex, leaving
                    // status `partial` (spec §7); if this save also
                    // fails there is nothing further we can do.
                    let _ = self.registry.upsert(partial);
                }
                Err(err)
            }
        }
    }

    async fn run_pipeline(
        &self,
        project_name: &str,
        root_path: &Path,
    ) -> Result<(IndexCounts, ProjectMetadata)> {
        let files = discovery::discover_files(
            root_path,
            &self.config.excluded_dirs,
            &self.config.whitelisted_hidden,
        );

        let mut chunks = Vec::new();
        let mut languages: HashMap<String, u64> = HashMap::new();
        let mut total_lines: u64 = 0;
        let mut chunk_line_counts: Vec<u32> = Vec::new();
        let mut file_count = 0u64;

        for path in &files {
            let content = match std::fs::read_to_string(path) {
                Ok(c) => c,
                Err(err) => {
                    // Chunk-level file-read errors during indexing
                    // are logged and skipped; the job continues
                    // (spec §7).
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable file");
                    continue;
                }
            };
            if content.trim().is_empty() {
                continue;
            }

            let relative_path = path
                .strip_prefix(root_path)
                .unwrap_or(path)
                .to_string_lossy()
                .replace('\\', "/");
            let language = path
                .extension()
                .and_then(|e| e.to_str())
                .map(Language::from_extension)
                .unwrap_or(Language::Unknown);

            let raw_chunks =
                chunking::chunk_lines(&content, self.config.chunk_window, self.config.chunk_overlap);
            file_count += 1;
            total_lines += content.lines().count() as u64;
            *languages.entry(format!("{language:?}")).or_insert(0) += 1;

            for raw in raw_chunks {
                let id = chunking::chunk_id(project_name, &relative_path, raw.start_line);
                let kind = if raw.is_whole_file { ChunkKind::File } else { ChunkKind::Code };
                chunk_line_counts.push(raw.end_line - raw.start_line + 1);
                chunks.push(Chunk {
                    id,
                    project_name: project_name.to_string(),
                    file_path: relative_path.clone(),
                    language,
                    start_line: raw.start_line,
                    end_line: raw.end_line,
                    content: raw.content,
                    kind,
                    embedding: None,
                    description: None,
                });
            }
        }

        // Batched embedding, bounded request sizes (spec §4.6).
        for batch in chunks.chunks_mut(self.config.embed_batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let vectors = self.embeddings.embed_batch(&texts).await?;
            for (chunk, vector) in batch.iter_mut().zip(vectors.into_iter()) {
                chunk.embedding = Some(vector);
            }
        }

        // Reindex isolation (spec §5(b)): delete old entries before
        // any new entry becomes visible.
        self.chunk_store.delete_project(project_name)?;
        self.vector_index.drop_project(project_name);

        self.chunk_store.write_chunks(&chunks)?;
        for chunk in &chunks {
            if let Some(embedding) = chunk.embedding.clone() {
                self.vector_index.upsert(
                    project_name,
                    &chunk.id,
                    embedding,
                    crate::domain::types::ChunkMetadata::from(chunk),
                )?;
            }
        }

        let stats = compute_stats(&chunk_line_counts);
        let metadata = ProjectMetadata {
            id: project_name.to_string(),
            name: project_name.to_string(),
            root_path: root_path.display().to_string(),
            first_indexed_at: self
                .registry
                .get(project_name)
                .map(|p| p.first_indexed_at)
                .unwrap_or_else(Utc::now),
            last_updated_at: Utc::now(),
            file_count,
            chunk_count: chunks.len() as u64,
            total_lines,
            languages,
            stats,
            status: ProjectStatus::Complete,
        };

        Ok((
            IndexCounts {
                files: file_count,
                chunks: chunks.len() as u64,
            },
            metadata,
        ))
    }

    /// Reindex a previously registered project: delete its on-disk
    /// and in-memory shards, then run the normal indexing flow (spec
    /// §4.6). Fails with `ProjectNotFound` for an unregistered
    /// project.
    pub async fn reindex(&self, project_name: &str) -> Result<IndexCounts> {
        let existing = self
            .registry
            .get(project_name)
            .ok_or_else(|| Error::project_not_found(project_name))?;
        let root_path = std::path::PathBuf::from(&existing.root_path);
        self.index_project(project_name, &root_path).await
    }

    /// Reindex every registered project.
    pub async fn reindex_all(&self) -> Result<Vec<(String, Result<IndexCounts>)>> {
        let mut results = Vec::new();
        for project in self.registry.list() {
            let outcome = self.reindex(&project.name).await;
            results.push((project.name, outcome));
        }
        Ok(results)
    }

    /// Delete every chunk, every in-memory shard, and the registry,
    /// then recreate an empty registry (spec §4.6).
    pub fn clear_all(&self) -> Result<()> {
        self.chunk_store.delete_all()?;
        self.vector_index.clear();
        self.registry.clear()?;
        Ok(())
    }
}

fn compute_stats(chunk_line_counts: &[u32]) -> ChunkSizeStats {
    if chunk_line_counts.is_empty() {
        return ChunkSizeStats::default();
    }
    let min_lines = *chunk_line_counts.iter().min().unwrap();
    let max_lines = *chunk_line_counts.iter().max().unwrap();
    let avg_lines = chunk_line_counts.iter().map(|&n| n as f64).sum::<f64>() / chunk_line_counts.len() as f64;
    // Rough complexity proxy: longer average chunks and a wider
    // spread both push the score up. Any monotonic proxy is
    // acceptable per the spec's Open Questions.
    let complexity_score = avg_lines * (1.0 + (max_lines - min_lines) as f64 / 100.0);
    ChunkSizeStats {
        min_lines,
        avg_lines,
        max_lines,
        complexity_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::word_average::WordAverageProvider;

    fn make_indexer(index_dir: &Path) -> ProjectIndexer {
        let chunk_store = Arc::new(ChunkStore::open(index_dir).unwrap());
        let registry = Arc::new(ProjectRegistry::load(index_dir).unwrap());
        let vector_index = Arc::new(VectorIndex::new());
        let embeddings = Arc::new(
            EmbeddingService::new(Arc::new(WordAverageProvider::new()), index_dir.join("embeddings")).unwrap(),
        );
        ProjectIndexer::new(IndexerConfig::default(), chunk_store, registry, vector_index, embeddings)
    }

    #[tokio::test]
    async fn indexing_an_empty_project_yields_zero_chunks() {
        let index_dir = tempfile::tempdir().unwrap();
        let project_dir = tempfile::tempdir().unwrap();
        let indexer = make_indexer(index_dir.path());

        let counts = indexer.index_project("empty", project_dir.path()).await.unwrap();
        assert_eq!(counts.files, 0);
        assert_eq!(counts.chunks, 0);
    }

    #[tokio::test]
    async fn indexing_nonexistent_root_fails() {
        let index_dir = tempfile::tempdir().unwrap();
        let indexer = make_indexer(index_dir.path());
        let err = indexer
            .index_project("ghost", Path::new("/does/not/exist"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ProjectRootNotFound { .. }));
    }

    #[tokio::test]
    async fn reindex_unregistered_project_fails() {
        let index_dir = tempfile::tempdir().unwrap();
        let indexer = make_indexer(index_dir.path());
        let err = indexer.reindex("nonexistent").await.unwrap_err();
        assert!(matches!(err, Error::ProjectNotFound { .. }));
    }

    #[tokio::test]
    async fn indexing_then_reindexing_replaces_chunks() {
        let index_dir = tempfile::tempdir().unwrap();
        let project_dir = tempfile::tempdir().unwrap();
        std::fs::write(project_dir.path().join("a.rs"), "fn a() {}\nfn b() {}\n").unwrap();
        let indexer = make_indexer(index_dir.path());

        let first = indexer.index_project("proj", project_dir.path()).await.unwrap();
        assert_eq!(first.files, 1);
        assert_eq!(first.chunks, 1);

        std::fs::write(project_dir.path().join("c.rs"), "fn c() {}\n").unwrap();
        let second = indexer.reindex("proj").await.unwrap();
        assert_eq!(second.files, 2);
        assert_eq!(second.chunks, 2);
    }
}
