//! Embedding providers (spec §4.2): a pluggable capability
//! (`dimensions`, `embed_one`, `embed_many`) with two concrete
//! implementations that know nothing of each other (Design Notes,
//! "Pluggable provider").

pub mod cache;
pub mod external_model;
pub mod service;
pub mod word_average;

use crate::domain::error::Result;
use async_trait::async_trait;

/// Capability set every embedding provider implements.
///
/// `embed_batch` MUST preserve input order and length.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Dimensionality of vectors this provider returns.
    fn dimensions(&self) -> usize;

    /// Stable name used in cache keys and diagnostics.
    fn name(&self) -> &str;

    /// Embed a single piece of text. Fails with
    /// [`crate::domain::Error::InvalidInput`] on empty text.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        if text.is_empty() {
            return Err(crate::domain::Error::invalid_input(
                "embedding input text must not be empty",
            ));
        }
        let mut out = self
            .embed_many(std::slice::from_ref(&text.to_string()))
            .await?;
        Ok(out.pop().expect("embed_many preserves length"))
    }

    /// Embed a batch of texts, preserving order and length.
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
