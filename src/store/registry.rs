//! Project registry (spec §3): the persisted catalog of projects
//! known to the system and their statistics.
//!
//! Loaded on startup, mutated only by the project indexer, saved
//! after each completed (re)index or clear.

use crate::domain::error::Result;
use crate::domain::types::ProjectMetadata;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

/// `<index_dir>/project_registry.json`.
pub struct ProjectRegistry {
    path: PathBuf,
    projects: RwLock<HashMap<String, ProjectMetadata>>,
}

impl ProjectRegistry {
    /// Load the registry from disk, or start empty if no file exists
    /// yet (schema-ignoring forward compatibility, spec §6.3: an
    /// unreadable file is treated as absent rather than fatal).
    pub fn load(index_dir: impl Into<PathBuf>) -> Result<Self> {
        let index_dir = index_dir.into();
        std::fs::create_dir_all(&index_dir)?;
        let path = index_dir.join("project_registry.json");
        let projects = if path.exists() {
            let bytes = std::fs::read(&path)?;
            serde_json::from_slice(&bytes).unwrap_or_default()
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            projects: RwLock::new(projects),
        })
    }

    /// Persist the current in-memory map to disk.
    pub fn save(&self) -> Result<()> {
        let projects = self.projects.read().expect("registry lock poisoned");
        let bytes = serde_json::to_vec_pretty(&*projects)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Look up metadata for a single project.
    pub fn get(&self, name: &str) -> Option<ProjectMetadata> {
        self.projects.read().expect("registry lock poisoned").get(name).cloned()
    }

    /// Whether `name` is a registered project.
    pub fn contains(&self, name: &str) -> bool {
        self.projects.read().expect("registry lock poisoned").contains_key(name)
    }

    /// All registered projects.
    pub fn list(&self) -> Vec<ProjectMetadata> {
        self.projects
            .read()
            .expect("registry lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    /// Insert or replace a project's metadata, then persist.
    pub fn upsert(&self, metadata: ProjectMetadata) -> Result<()> {
        self.projects
            .write()
            .expect("registry lock poisoned")
            .insert(metadata.name.clone(), metadata);
        self.save()
    }

    /// Remove every project and persist an empty registry (spec
    /// §4.6 `clear_all`).
    pub fn clear(&self) -> Result<()> {
        self.projects.write().expect("registry lock poisoned").clear();
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{ChunkSizeStats, ProjectStatus};
    use chrono::Utc;
    use std::collections::HashMap as StdHashMap;

    fn sample(name: &str) -> ProjectMetadata {
        ProjectMetadata {
            id: name.to_string(),
            name: name.to_string(),
            root_path: format!("/tmp/{name}"),
            first_indexed_at: Utc::now(),
            last_updated_at: Utc::now(),
            file_count: 1,
            chunk_count: 1,
            total_lines: 10,
            languages: StdHashMap::new(),
            stats: ChunkSizeStats::default(),
            status: ProjectStatus::Complete,
        }
    }

    #[test]
    fn upsert_persists_across_reload() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ProjectRegistry::load(dir.path()).unwrap();
        registry.upsert(sample("proj-a")).unwrap();

        let reloaded = ProjectRegistry::load(dir.path()).unwrap();
        assert!(reloaded.contains("proj-a"));
        assert_eq!(reloaded.list().len(), 1);
    }

    #[test]
    fn clear_empties_registry_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ProjectRegistry::load(dir.path()).unwrap();
        registry.upsert(sample("proj-a")).unwrap();
        registry.clear().unwrap();

        let reloaded = ProjectRegistry::load(dir.path()).unwrap();
        assert!(reloaded.list().is_empty());
    }
}
