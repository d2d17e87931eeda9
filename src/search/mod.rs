//! Search service (spec §4.7): query embedding, top-K retrieval,
//! dedup by `(file_path, start_line)`, ranking, and projection to
//! [`SearchResult`].

use crate::domain::error::{Error, Result};
use crate::domain::types::{ChunkMetadata, SearchResult};
use crate::embedding::service::EmbeddingService;
use crate::index::VectorIndex;
use crate::store::ChunkStore;
use crate::vectormath;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;

/// Oversampling factor applied to the fallback chunk-store scan, to
/// cover subsequent deduplication (spec §4.7, `OVERSAMPLE >= 3`).
const OVERSAMPLE: usize = 3;

/// Default `maxResults` when the caller doesn't specify one (spec
/// §6.1).
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Semantic search over indexed projects.
pub struct SearchService {
    embeddings: Arc<EmbeddingService>,
    index: Arc<VectorIndex>,
    chunk_store: Arc<ChunkStore>,
}

impl SearchService {
    pub fn new(embeddings: Arc<EmbeddingService>, index: Arc<VectorIndex>, chunk_store: Arc<ChunkStore>) -> Self {
        Self {
            embeddings,
            index,
            chunk_store,
        }
    }

    /// Run a semantic search. Fails `InvalidParams` for an empty or
    /// missing query (spec §4.7). An unknown project filter succeeds
    /// with an empty result list.
    #[tracing::instrument(skip(self, query))]
    pub async fn search(
        &self,
        query: &str,
        max_results: usize,
        project_filter: Option<&str>,
    ) -> Result<Vec<SearchResult>> {
        if query.trim().is_empty() {
            return Err(Error::invalid_params("query must not be empty"));
        }
        let max_results = max_results.max(1);

        let query_vector = self.embeddings.embed(query).await?;

        let candidates: Vec<(String, f32, ChunkMetadata)> = if self.index.total_chunks() > 0 {
            self.index
                .search(&query_vector, max_results * OVERSAMPLE, project_filter)
                .into_iter()
                .map(|hit| (hit.id, hit.score, hit.metadata))
                .collect()
        } else {
            self.fallback_scan(&query_vector, max_results * OVERSAMPLE, project_filter)?
        };

        let deduped = dedup_by_location(candidates);
        let mut ranked = deduped;
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.2.file_path.cmp(&b.2.file_path))
                .then_with(|| a.2.start_line.cmp(&b.2.start_line))
        });
        ranked.truncate(max_results);

        Ok(ranked
            .into_iter()
            .map(|(id, score, metadata)| project_result(id, score, metadata))
            .collect())
    }

    /// Stream the chunk store and score chunks one at a time,
    /// maintaining a bounded top-K heap (spec §4.7 step 2, used when
    /// the in-memory index has not been preloaded).
    fn fallback_scan(
        &self,
        query_vector: &[f32],
        k: usize,
        project_filter: Option<&str>,
    ) -> Result<Vec<(String, f32, ChunkMetadata)>> {
        let chunks = match project_filter {
            Some(name) => self.chunk_store.load_project(name)?,
            None => self.chunk_store.load_all()?,
        };

        struct Candidate {
            score: f32,
            id: String,
            metadata: ChunkMetadata,
        }
        impl PartialEq for Candidate {
            fn eq(&self, other: &Self) -> bool {
                self.score == other.score && self.id == other.id
            }
        }
        impl Eq for Candidate {}
        impl PartialOrd for Candidate {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }
        impl Ord for Candidate {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                other
                    .score
                    .partial_cmp(&self.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| self.id.cmp(&other.id))
            }
        }

        let mut heap: BinaryHeap<Candidate> = BinaryHeap::with_capacity(k + 1);
        for chunk in chunks {
            let Some(embedding) = &chunk.embedding else {
                continue;
            };
            let score = vectormath::cosine(query_vector, embedding);
            heap.push(Candidate {
                score,
                id: chunk.id.clone(),
                metadata: ChunkMetadata::from(&chunk),
            });
            if heap.len() > k {
                heap.pop();
            }
        }

        Ok(heap
            .into_iter()
            .map(|c| (c.id, c.score, c.metadata))
            .collect())
    }
}

/// Collapse overlapping-window duplicates: keep the highest-scoring
/// candidate per `(file_path, start_line)` (spec §4.7 step 3,
/// Testable Property 4).
fn dedup_by_location(candidates: Vec<(String, f32, ChunkMetadata)>) -> Vec<(String, f32, ChunkMetadata)> {
    let mut best: HashMap<(String, u32), (String, f32, ChunkMetadata)> = HashMap::new();
    for (id, score, metadata) in candidates {
        let key = (metadata.file_path.clone(), metadata.start_line);
        match best.get(&key) {
            Some((_, existing_score, _)) if *existing_score >= score => {}
            _ => {
                best.insert(key, (id, score, metadata));
            }
        }
    }
    best.into_values().collect()
}

fn project_result(id: String, score: f32, metadata: ChunkMetadata) -> SearchResult {
    let relevance = score.clamp(0.0, 1.0);
    let mut result_metadata = HashMap::new();
    result_metadata.insert("raw_similarity".to_string(), format!("{score:.3}"));
    SearchResult {
        id,
        project_name: metadata.project_name,
        file_path: metadata.file_path,
        language: metadata.language,
        start_line: metadata.start_line,
        end_line: metadata.end_line,
        content: metadata.content,
        kind: "semantic".to_string(),
        relevance,
        match_reason: "Semantically similar code pattern".to_string(),
        metadata: result_metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{ChunkKind, Language};
    use crate::embedding::word_average::WordAverageProvider;

    fn metadata(file_path: &str, start_line: u32) -> ChunkMetadata {
        ChunkMetadata {
            project_name: "proj".into(),
            file_path: file_path.into(),
            language: Language::Rust,
            start_line,
            end_line: start_line + 9,
            content: "fn calculate_sum() { return 1 + 2 }".into(),
            kind: ChunkKind::Code,
        }
    }

    fn search_service(index_dir: &std::path::Path) -> SearchService {
        let embeddings = Arc::new(
            EmbeddingService::new(Arc::new(WordAverageProvider::new()), index_dir.join("embeddings")).unwrap(),
        );
        let index = Arc::new(VectorIndex::new());
        let chunk_store = Arc::new(ChunkStore::open(index_dir).unwrap());
        SearchService::new(embeddings, index, chunk_store)
    }

    #[tokio::test]
    async fn empty_query_is_invalid_params() {
        let dir = tempfile::tempdir().unwrap();
        let service = search_service(dir.path());
        let err = service.search("", 5, None).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_params");
    }

    #[tokio::test]
    async fn unknown_project_filter_returns_empty_results() {
        let dir = tempfile::tempdir().unwrap();
        let service = search_service(dir.path());
        service
            .index
            .upsert("proj", "a", vec![1.0; 300], metadata("a.rs", 1))
            .unwrap();

        let results = service
            .search("anything at all", 5, Some("no-such-project"))
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn dedup_keeps_highest_scoring_candidate_per_location() {
        let candidates = vec![
            ("low".to_string(), 0.85, metadata("calc.rs", 10)),
            ("high".to_string(), 0.95, metadata("calc.rs", 10)),
        ];
        let deduped = dedup_by_location(candidates);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].0, "high");
        assert!((deduped[0].1 - 0.95).abs() < 1e-6);
    }

    #[test]
    fn relevance_is_clamped_to_unit_interval() {
        let result = project_result("id".into(), 1.5, metadata("a.rs", 1));
        assert_eq!(result.relevance, 1.0);
        let result = project_result("id".into(), -0.5, metadata("a.rs", 1));
        assert_eq!(result.relevance, 0.0);
    }
}
