//! Embedding service (spec §4.3): wraps a single provider with a
//! content-addressed persistent cache, batch submission with
//! cache-aware splitting, and hit/miss statistics.

use crate::domain::error::Result;
use crate::embedding::cache::EmbeddingCache;
use crate::embedding::EmbeddingProvider;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Cache/provider statistics (spec §4.3 `stats()`).
#[derive(Debug, Clone)]
pub struct EmbeddingStats {
    pub total_cached: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub cache_directory: String,
}

/// Deduplicating embedding front-end: cache-or-compute, batch
/// splitting, hit-rate accounting.
pub struct EmbeddingService {
    provider: Arc<dyn EmbeddingProvider>,
    cache: EmbeddingCache,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl EmbeddingService {
    /// Wrap `provider` with a cache persisted under `cache_dir`.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, cache_dir: impl Into<std::path::PathBuf>) -> Result<Self> {
        Ok(Self {
            provider,
            cache: EmbeddingCache::open(cache_dir)?,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    /// Dimensionality of the wrapped provider.
    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }

    /// Compute (or fetch from cache) the embedding for `text`.
    #[tracing::instrument(skip(self, text))]
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let digest = EmbeddingCache::digest(text, self.provider.dimensions());
        if let Some(cached) = self.cache.get(&digest)? {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(cached);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let vector = self.provider.embed_one(text).await?;
        self.cache.put(&digest, &vector)?;
        Ok(vector)
    }

    /// Embed a batch, splitting into cache hits and provider misses,
    /// splicing results back in the caller's original order (spec
    /// §4.3). Errors from the provider propagate and no cache entry
    /// is persisted for the failed batch; entries resolved purely
    /// from cache before the error are unaffected since they were
    /// never re-written.
    #[tracing::instrument(skip(self, texts), fields(count = texts.len()))]
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let dims = self.provider.dimensions();
        let digests: Vec<String> = texts.iter().map(|t| EmbeddingCache::digest(t, dims)).collect();

        let mut results: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        let mut miss_indices = Vec::new();
        let mut miss_texts = Vec::new();

        for (i, digest) in digests.iter().enumerate() {
            match self.cache.get(digest)? {
                Some(v) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    results[i] = Some(v);
                }
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    miss_indices.push(i);
                    miss_texts.push(texts[i].clone());
                }
            }
        }

        if !miss_texts.is_empty() {
            let computed = self.provider.embed_many(&miss_texts).await?;
            for (slot, vector) in miss_indices.into_iter().zip(computed.into_iter()) {
                self.cache.put(&digests[slot], &vector)?;
                results[slot] = Some(vector);
            }
        }

        Ok(results
            .into_iter()
            .map(|v| v.expect("every slot is filled by a cache hit or a provider result"))
            .collect())
    }

    /// Current hit/miss statistics.
    pub fn stats(&self) -> Result<EmbeddingStats> {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let denom = hits + misses;
        Ok(EmbeddingStats {
            total_cached: self.cache.len()?,
            hits,
            misses,
            hit_rate: if denom == 0 { 0.0 } else { hits as f64 / denom as f64 },
            cache_directory: self.cache.directory().display().to_string(),
        })
    }

    /// Delete every cache file and reset the hit/miss counters.
    pub fn clear(&self) -> Result<()> {
        self.cache.clear()?;
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::word_average::WordAverageProvider;

    fn service() -> (EmbeddingService, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(WordAverageProvider::new());
        let service = EmbeddingService::new(provider, dir.path()).unwrap();
        (service, dir)
    }

    #[tokio::test]
    async fn repeated_embed_is_a_cache_hit() {
        let (service, _dir) = service();
        let a = service.embed("send email to user").await.unwrap();
        let b = service.embed("send email to user").await.unwrap();
        assert_eq!(a, b);
        let stats = service.stats().unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn embed_batch_preserves_order_and_caches_misses() {
        let (service, _dir) = service();
        let texts = vec![
            "user account email".to_string(),
            "publish article".to_string(),
        ];
        let first = service.embed_batch(&texts).await.unwrap();
        assert_eq!(first.len(), 2);

        // Second call should be all cache hits, in the same order.
        let second = service.embed_batch(&texts).await.unwrap();
        assert_eq!(first, second);

        let stats = service.stats().unwrap();
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.hits, 2);
    }

    #[tokio::test]
    async fn clear_resets_cache_and_counters() {
        let (service, _dir) = service();
        service.embed("hello").await.unwrap();
        service.clear().unwrap();
        let stats = service.stats().unwrap();
        assert_eq!(stats.total_cached, 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }

    #[tokio::test]
    async fn cache_determinism_across_service_instances() {
        let dir = tempfile::tempdir().unwrap();
        let provider1 = Arc::new(WordAverageProvider::new());
        let service1 = EmbeddingService::new(provider1, dir.path()).unwrap();
        let first = service1.embed("stable text").await.unwrap();
        drop(service1);

        let provider2 = Arc::new(WordAverageProvider::new());
        let service2 = EmbeddingService::new(provider2, dir.path()).unwrap();
        let second = service2.embed("stable text").await.unwrap();

        let similarity = crate::vectormath::cosine(&first, &second);
        assert!(similarity > 0.999);
    }
}
