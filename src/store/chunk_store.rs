//! Persistent record-per-chunk layout on disk (spec §4.4).
//!
//! ```text
//! <index_dir>/chunks/<project-name>/<chunk-id>.json
//! ```
//!
//! Atomicity is not required at record granularity: a crashed
//! reindex leaves a project in `partial` status (recorded by the
//! registry) and is recoverable by a subsequent reindex.

use crate::domain::error::{Error, Result};
use crate::domain::types::Chunk;
use std::path::{Path, PathBuf};
use validator::Validate;

/// Owns the on-disk chunk records under `<index_dir>/chunks/`.
pub struct ChunkStore {
    root: PathBuf,
}

impl ChunkStore {
    /// Open (creating if absent) a chunk store rooted at `index_dir`.
    pub fn open(index_dir: impl Into<PathBuf>) -> Result<Self> {
        let root = index_dir.into().join("chunks");
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn project_dir(&self, project_name: &str) -> PathBuf {
        self.root.join(sanitize(project_name))
    }

    fn chunk_path(&self, project_name: &str, chunk_id: &str) -> PathBuf {
        self.project_dir(project_name).join(format!("{}.json", sanitize(chunk_id)))
    }

    /// Persist a single chunk record.
    pub fn write_chunk(&self, chunk: &Chunk) -> Result<()> {
        chunk
            .validate()
            .map_err(|e| Error::invalid_input(format!("invalid chunk record: {e}")))?;
        let dir = self.project_dir(&chunk.project_name);
        std::fs::create_dir_all(&dir)?;
        let path = self.chunk_path(&chunk.project_name, &chunk.id);
        let bytes = serde_json::to_vec_pretty(chunk)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Persist many chunk records.
    pub fn write_chunks(&self, chunks: &[Chunk]) -> Result<()> {
        for chunk in chunks {
            self.write_chunk(chunk)?;
        }
        Ok(())
    }

    /// Enumerate all chunk records for a single project. Returns an
    /// empty vector for a project with no on-disk directory yet.
    pub fn load_project(&self, project_name: &str) -> Result<Vec<Chunk>> {
        let dir = self.project_dir(project_name);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        self.load_dir(&dir)
    }

    /// Enumerate all chunk records across every project.
    pub fn load_all(&self) -> Result<Vec<Chunk>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut all = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                all.extend(self.load_dir(&entry.path())?);
            }
        }
        Ok(all)
    }

    fn load_dir(&self, dir: &Path) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.path().extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = std::fs::read(entry.path())?;
            match serde_json::from_slice::<Chunk>(&bytes) {
                Ok(chunk) => chunks.push(chunk),
                Err(err) => {
                    // Schema-ignoring forward compatibility (spec §6.3)
                    // still requires the record to parse at all; an
                    // unreadable file is logged and skipped rather
                    // than aborting the whole load.
                    tracing::warn!(path = %entry.path().display(), error = %err, "skipping unreadable chunk record");
                }
            }
        }
        Ok(chunks)
    }

    /// Delete every chunk record belonging to `project_name`.
    pub fn delete_project(&self, project_name: &str) -> Result<()> {
        let dir = self.project_dir(project_name);
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
        }
        Ok(())
    }

    /// Delete the entire chunk tree.
    pub fn delete_all(&self) -> Result<()> {
        if self.root.exists() {
            std::fs::remove_dir_all(&self.root)?;
        }
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }
}

/// Chunk ids and project names are used as path components; reject
/// path traversal by collapsing path separators.
fn sanitize(component: &str) -> String {
    component.replace(['/', '\\'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{ChunkKind, Language};

    fn sample_chunk(project: &str, id: &str, start: u32) -> Chunk {
        Chunk {
            id: id.to_string(),
            project_name: project.to_string(),
            file_path: "src/lib.rs".to_string(),
            language: Language::Rust,
            start_line: start,
            end_line: start + 9,
            content: "fn x() {}".to_string(),
            kind: ChunkKind::Code,
            embedding: Some(vec![0.1; 4]),
            description: None,
        }
    }

    #[test]
    fn write_then_load_project_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = ChunkStore::open(dir.path()).unwrap();
        let chunk = sample_chunk("proj-a", "c1", 1);
        store.write_chunk(&chunk).unwrap();

        let loaded = store.load_project("proj-a").unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0], chunk);
    }

    #[test]
    fn load_all_spans_projects() {
        let dir = tempfile::tempdir().unwrap();
        let store = ChunkStore::open(dir.path()).unwrap();
        store.write_chunk(&sample_chunk("proj-a", "c1", 1)).unwrap();
        store.write_chunk(&sample_chunk("proj-b", "c2", 1)).unwrap();

        let all = store.load_all().unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn delete_project_removes_only_that_project() {
        let dir = tempfile::tempdir().unwrap();
        let store = ChunkStore::open(dir.path()).unwrap();
        store.write_chunk(&sample_chunk("proj-a", "c1", 1)).unwrap();
        store.write_chunk(&sample_chunk("proj-b", "c2", 1)).unwrap();

        store.delete_project("proj-a").unwrap();

        assert!(store.load_project("proj-a").unwrap().is_empty());
        assert_eq!(store.load_project("proj-b").unwrap().len(), 1);
    }

    #[test]
    fn delete_all_empties_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = ChunkStore::open(dir.path()).unwrap();
        store.write_chunk(&sample_chunk("proj-a", "c1", 1)).unwrap();
        store.delete_all().unwrap();
        assert!(store.load_all().unwrap().is_empty());
    }
}
