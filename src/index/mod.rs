//! In-memory vector index (spec §4.5): a shard-by-project map of
//! `(id, embedding, metadata)`, with lazy preload from the chunk
//! store and a parallel top-K cosine scan.

use crate::domain::error::{Error, Result};
use crate::domain::types::ChunkMetadata;
use crate::store::ChunkStore;
use crate::vectormath;
use dashmap::DashMap;
use rayon::prelude::*;
use std::collections::BinaryHeap;
use std::sync::RwLock;

/// One scored candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub id: String,
    pub metadata: ChunkMetadata,
    pub score: f32,
}

struct Entry {
    embedding: Vec<f32>,
    metadata: ChunkMetadata,
}

/// The subset of the index belonging to one project (GLOSSARY:
/// Shard).
struct Shard {
    dimension: usize,
    entries: RwLock<std::collections::HashMap<String, Entry>>,
}

impl Shard {
    fn new(dimension: usize) -> Self {
        Self {
            dimension,
            entries: RwLock::new(std::collections::HashMap::new()),
        }
    }
}

/// Memory/hit-rate accounting returned by [`VectorIndex::stats`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexStats {
    pub total_chunks: usize,
    pub used_mb: f64,
    pub cache_hit_rate: f64,
}

/// Map from project name to its shard (spec §4.5).
#[derive(Default)]
pub struct VectorIndex {
    shards: DashMap<String, Shard>,
}

impl VectorIndex {
    /// Construct an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk the chunk store and populate all shards. Only chunks
    /// with an embedding are inserted (spec §4.5).
    pub fn preload(&self, store: &ChunkStore) -> Result<()> {
        for chunk in store.load_all()? {
            if let Some(embedding) = chunk.embedding.clone() {
                let metadata = ChunkMetadata::from(&chunk);
                self.upsert(&chunk.project_name, &chunk.id, embedding, metadata)?;
            }
        }
        Ok(())
    }

    /// Idempotent insert/replace. Rejects a dimension mismatch
    /// against the shard's declared width (Testable Property 2).
    pub fn upsert(
        &self,
        project_name: &str,
        chunk_id: &str,
        embedding: Vec<f32>,
        metadata: ChunkMetadata,
    ) -> Result<()> {
        let shard = self
            .shards
            .entry(project_name.to_string())
            .or_insert_with(|| Shard::new(embedding.len()));
        if embedding.len() != shard.dimension {
            return Err(Error::invalid_input(format!(
                "embedding has {} dimensions, shard `{}` expects {}",
                embedding.len(),
                project_name,
                shard.dimension
            )));
        }
        shard
            .entries
            .write()
            .expect("shard lock poisoned")
            .insert(chunk_id.to_string(), Entry { embedding, metadata });
        Ok(())
    }

    /// Drop an entire project's shard (used by reindex, spec §4.6).
    pub fn drop_project(&self, project_name: &str) {
        self.shards.remove(project_name);
    }

    /// Drop every shard (used by `clear_all`, spec §4.6).
    pub fn clear(&self) {
        self.shards.clear();
    }

    /// Top-K cosine-similarity search, optionally restricted to one
    /// project. Ties are broken by chunk-id lexicographic order
    /// (Testable Property 5).
    pub fn search(&self, query: &[f32], top_k: usize, project_filter: Option<&str>) -> Vec<Hit> {
        let candidates: Vec<(String, Vec<f32>, ChunkMetadata)> = match project_filter {
            Some(name) => self
                .shards
                .get(name)
                .map(|shard| collect_shard(&shard))
                .unwrap_or_default(),
            None => self
                .shards
                .iter()
                .flat_map(|entry| collect_shard(&entry))
                .collect(),
        };

        score_and_take_top_k(&candidates, query, top_k)
    }

    /// Score a specified subset of chunk ids against `query`,
    /// without ranking or truncation (spec §4.5 `batch_similarity`).
    pub fn batch_similarity(&self, query: &[f32], chunk_ids: &[String]) -> Vec<(String, f32)> {
        let wanted: std::collections::HashSet<&str> = chunk_ids.iter().map(|s| s.as_str()).collect();
        let mut out = Vec::new();
        for shard in self.shards.iter() {
            let entries = shard.entries.read().expect("shard lock poisoned");
            for (id, entry) in entries.iter() {
                if wanted.contains(id.as_str()) {
                    out.push((id.clone(), vectormath::cosine(query, &entry.embedding)));
                }
            }
        }
        out
    }

    /// Total chunk count across all shards, without the full byte
    /// walk `stats` does (used by callers that only need a
    /// populated/empty check, e.g. `SearchService`'s fallback-scan
    /// decision).
    pub fn total_chunks(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.entries.read().expect("shard lock poisoned").len())
            .sum()
    }

    /// Approximate memory accounting plus the caller-supplied cache
    /// hit rate (spec §4.5 `stats()`). The used-MB figure is a rough
    /// proxy, as the spec's Open Questions permit any formula within
    /// a factor of two. The index itself has no cache distinct from
    /// the embedding cache (it's a plain map, not a cache over a
    /// slower store), so `cache_hit_rate` is not computed here —
    /// callers pass in `EmbeddingService::stats().hit_rate`, the
    /// system's one real cache-hit counter (see DESIGN.md).
    pub fn stats(&self, cache_hit_rate: f64) -> IndexStats {
        let mut total_chunks = 0usize;
        let mut bytes = 0usize;
        for shard in self.shards.iter() {
            let entries = shard.entries.read().expect("shard lock poisoned");
            total_chunks += entries.len();
            for entry in entries.values() {
                bytes += entry.embedding.len() * std::mem::size_of::<f32>();
                bytes += entry.metadata.content.len();
            }
        }
        IndexStats {
            total_chunks,
            used_mb: bytes as f64 / (1024.0 * 1024.0),
            cache_hit_rate,
        }
    }
}

fn collect_shard(shard: &Shard) -> Vec<(String, Vec<f32>, ChunkMetadata)> {
    shard
        .entries
        .read()
        .expect("shard lock poisoned")
        .iter()
        .map(|(id, e)| (id.clone(), e.embedding.clone(), e.metadata.clone()))
        .collect()
}

/// Ordering wrapper so a min-heap of size K keeps the K
/// highest-scoring entries (spec §4.5, Design Notes "Top-K without a
/// tree"). Lower score (or lexicographically later id at equal
/// score) sorts first, so it's evicted first.
struct ScoredCandidate<'a> {
    score: f32,
    id: &'a str,
    index: usize,
}

impl PartialEq for ScoredCandidate<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.id == other.id
    }
}
impl Eq for ScoredCandidate<'_> {}
impl PartialOrd for ScoredCandidate<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for ScoredCandidate<'_> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Min-heap by score, ties broken so the lexicographically
        // *larger* id (worse per Property 5's ascending tie-break)
        // is considered "smaller" and evicted first.
        other
            .score
            .partial_cmp(&self.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| self.id.cmp(other.id))
    }
}

fn score_and_take_top_k(
    candidates: &[(String, Vec<f32>, ChunkMetadata)],
    query: &[f32],
    top_k: usize,
) -> Vec<Hit> {
    if top_k == 0 || candidates.is_empty() {
        return Vec::new();
    }

    // Partition into ~2*cores slices scored concurrently (spec
    // §4.5), each slice reducing to its own bounded heap, merged at
    // the end.
    let num_threads = rayon::current_num_threads().max(1);
    let slice_count = (num_threads * 2).min(candidates.len().max(1));
    let chunk_size = candidates.len().div_ceil(slice_count).max(1);

    let partial_heaps: Vec<BinaryHeap<ScoredCandidate<'_>>> = candidates
        .par_chunks(chunk_size)
        .map(|slice| {
            let mut heap: BinaryHeap<ScoredCandidate<'_>> = BinaryHeap::with_capacity(top_k + 1);
            for (offset, (id, embedding, _)) in slice.iter().enumerate() {
                let score = vectormath::cosine(query, embedding);
                heap.push(ScoredCandidate {
                    score,
                    id,
                    index: offset,
                });
                if heap.len() > top_k {
                    heap.pop();
                }
            }
            heap
        })
        .collect();

    let mut merged: BinaryHeap<ScoredCandidate<'_>> = BinaryHeap::with_capacity(top_k + 1);
    let mut slice_offsets = Vec::with_capacity(partial_heaps.len());
    let mut running = 0usize;
    for slice in candidates.chunks(chunk_size) {
        slice_offsets.push(running);
        running += slice.len();
    }

    for (slice_idx, heap) in partial_heaps.into_iter().enumerate() {
        let base = slice_offsets[slice_idx];
        for candidate in heap.into_iter() {
            merged.push(ScoredCandidate {
                score: candidate.score,
                id: candidate.id,
                index: base + candidate.index,
            });
            if merged.len() > top_k {
                merged.pop();
            }
        }
    }

    let mut results: Vec<Hit> = merged
        .into_iter()
        .map(|c| Hit {
            id: c.id.to_string(),
            metadata: candidates[c.index].2.clone(),
            score: c.score,
        })
        .collect();

    // Descending score, ties broken by id ascending (Testable Property 5).
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    results.truncate(top_k);
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{ChunkKind, Language};

    fn metadata(path: &str, line: u32) -> ChunkMetadata {
        ChunkMetadata {
            project_name: "proj".into(),
            file_path: path.into(),
            language: Language::Rust,
            start_line: line,
            end_line: line + 9,
            content: "fn x() {}".into(),
            kind: ChunkKind::Code,
        }
    }

    #[test]
    fn upsert_rejects_dimension_mismatch() {
        let index = VectorIndex::new();
        index.upsert("proj", "a", vec![1.0, 0.0], metadata("a.rs", 1)).unwrap();
        let err = index
            .upsert("proj", "b", vec![1.0, 0.0, 0.0], metadata("b.rs", 1))
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }

    #[test]
    fn search_ranks_by_cosine_similarity_descending() {
        let index = VectorIndex::new();
        index.upsert("proj", "close", vec![1.0, 0.0], metadata("a.rs", 1)).unwrap();
        index.upsert("proj", "far", vec![0.0, 1.0], metadata("b.rs", 1)).unwrap();

        let hits = index.search(&[1.0, 0.0], 2, None);
        assert_eq!(hits[0].id, "close");
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn search_respects_project_filter() {
        let index = VectorIndex::new();
        index.upsert("proj-a", "a1", vec![1.0, 0.0], metadata("a.rs", 1)).unwrap();
        index.upsert("proj-b", "b1", vec![1.0, 0.0], metadata("b.rs", 1)).unwrap();

        let hits = index.search(&[1.0, 0.0], 10, Some("proj-a"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a1");
    }

    #[test]
    fn ties_broken_by_id_lexicographic_order() {
        let index = VectorIndex::new();
        index.upsert("proj", "zeta", vec![1.0, 0.0], metadata("a.rs", 1)).unwrap();
        index.upsert("proj", "alpha", vec![1.0, 0.0], metadata("b.rs", 1)).unwrap();

        let hits = index.search(&[1.0, 0.0], 2, None);
        assert_eq!(hits[0].id, "alpha");
        assert_eq!(hits[1].id, "zeta");
    }

    #[test]
    fn drop_project_removes_its_shard_only() {
        let index = VectorIndex::new();
        index.upsert("proj-a", "a1", vec![1.0, 0.0], metadata("a.rs", 1)).unwrap();
        index.upsert("proj-b", "b1", vec![1.0, 0.0], metadata("b.rs", 1)).unwrap();

        index.drop_project("proj-a");

        assert!(index.search(&[1.0, 0.0], 10, Some("proj-a")).is_empty());
        assert_eq!(index.search(&[1.0, 0.0], 10, Some("proj-b")).len(), 1);
    }

    #[test]
    fn batch_similarity_scores_only_requested_ids() {
        let index = VectorIndex::new();
        index.upsert("proj", "a", vec![1.0, 0.0], metadata("a.rs", 1)).unwrap();
        index.upsert("proj", "b", vec![0.0, 1.0], metadata("b.rs", 1)).unwrap();

        let scores = index.batch_similarity(&[1.0, 0.0], &["a".to_string()]);
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].0, "a");
    }
}
