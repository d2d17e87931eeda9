//! File discovery (spec §4.6): walk a project tree, excluding
//! reserved directories and hidden entries, keeping only files whose
//! extension maps to a known language.

use crate::domain::types::Language;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Reserved directory names excluded from discovery by default.
/// Configurable per indexer instance.
pub fn default_excluded_dirs() -> Vec<String> {
    vec![
        ".git".into(),
        "target".into(),
        "node_modules".into(),
        "vendor".into(),
        "dist".into(),
        "build".into(),
        ".venv".into(),
        "venv".into(),
        "__pycache__".into(),
    ]
}

/// Walk `root` recursively, returning every file whose extension maps
/// to a known [`Language`] and whose path does not cross an excluded
/// directory or a hidden entry (unless explicitly whitelisted).
pub fn discover_files(
    root: &Path,
    excluded_dirs: &[String],
    whitelisted_hidden: &[String],
) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let walker = WalkBuilder::new(root)
        .hidden(false) // we apply our own hidden-entry rule below
        .git_ignore(true)
        .build();

    for entry in walker.flatten() {
        let path = entry.path();
        if path == root {
            continue;
        }
        if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
            continue;
        }
        if is_excluded(path, root, excluded_dirs, whitelisted_hidden) {
            continue;
        }
        let known = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| Language::from_extension(ext).is_known())
            .unwrap_or(false);
        if known {
            out.push(path.to_path_buf());
        }
    }
    out
}

fn is_excluded(path: &Path, root: &Path, excluded_dirs: &[String], whitelisted_hidden: &[String]) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    for component in relative.components() {
        let name = component.as_os_str().to_string_lossy();
        if excluded_dirs.iter().any(|d| d == name.as_ref()) {
            return true;
        }
        if name.starts_with('.') && !whitelisted_hidden.iter().any(|w| w == name.as_ref()) {
            // The file itself (last component) is checked by the
            // caller too, but a hidden *directory* anywhere in the
            // path excludes everything beneath it.
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn discovers_known_language_files_and_skips_unknown() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.rs"), "fn main() {}").unwrap();
        fs::write(dir.path().join("data.bin"), [0u8, 1, 2]).unwrap();

        let files = discover_files(dir.path(), &default_excluded_dirs(), &[]);
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert!(names.contains(&"a.rs".to_string()));
        assert!(!names.contains(&"data.bin".to_string()));
    }

    #[test]
    fn excludes_reserved_and_hidden_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("target/debug")).unwrap();
        fs::write(dir.path().join("target/debug/build.rs"), "fn x() {}").unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/hooks.rs"), "fn x() {}").unwrap();
        fs::write(dir.path().join("lib.rs"), "fn x() {}").unwrap();

        let files = discover_files(dir.path(), &default_excluded_dirs(), &[]);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name().unwrap(), "lib.rs");
    }

    #[test]
    fn empty_directory_yields_no_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_files(dir.path(), &default_excluded_dirs(), &[]).is_empty());
    }
}
