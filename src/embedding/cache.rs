//! Content-addressed, persistent embedding cache (spec §4.3).
//!
//! A flat directory of files keyed by a digest of `(input text,
//! provider dimension tag)`. Entries are immutable once written, so
//! concurrent writers of the same key race harmlessly: the
//! filesystem serializes the winner and both vectors are byte-equal
//! by provider determinism (Design Notes).

use crate::domain::error::Result;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// A persistent, content-addressed cache directory of raw `f32`
/// vectors.
pub struct EmbeddingCache {
    dir: PathBuf,
}

impl EmbeddingCache {
    /// Open (creating if absent) a cache rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// The cache's root directory.
    pub fn directory(&self) -> &Path {
        &self.dir
    }

    /// Digest key for `(text, dimension_tag)`, hex-encoded.
    pub fn digest(text: &str, dimension_tag: usize) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        hasher.update([0u8]);
        hasher.update(dimension_tag.to_le_bytes());
        let result = hasher.finalize();
        hex_encode(&result)
    }

    fn path_for(&self, digest: &str) -> PathBuf {
        self.dir.join(format!("{digest}.vec"))
    }

    /// Read a cached vector by digest, if present.
    pub fn get(&self, digest: &str) -> Result<Option<Vec<f32>>> {
        let path = self.path_for(digest);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path)?;
        Ok(Some(decode_vector(&bytes)))
    }

    /// Persist a vector under `digest`. Uses a temp-file-then-rename
    /// write so a crash mid-write never leaves a torn record.
    pub fn put(&self, digest: &str, vector: &[f32]) -> Result<()> {
        let path = self.path_for(digest);
        let tmp_path = self.dir.join(format!("{digest}.vec.tmp-{}", std::process::id()));
        std::fs::write(&tmp_path, encode_vector(vector))?;
        std::fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    /// Delete every cache file. Counters live in
    /// [`super::service::EmbeddingService`], not here.
    pub fn clear(&self) -> Result<()> {
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.path().extension().and_then(|e| e.to_str()) == Some("vec") {
                std::fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }

    /// Total number of cached entries currently on disk.
    pub fn len(&self) -> Result<usize> {
        let count = std::fs::read_dir(&self.dir)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().and_then(|e| e.to_str()) == Some("vec"))
            .count();
        Ok(count)
    }

    /// Whether the cache is currently empty.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

fn encode_vector(v: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(v.len() * 4);
    for &x in v {
        out.extend_from_slice(&x.to_le_bytes());
    }
    out
}

fn decode_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        write!(s, "{b:02x}").expect("writing into a String never fails");
    }
    s
}
