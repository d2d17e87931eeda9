//! File-context service (spec §4.9): read a file, return a
//! requested line range widened by a context window, and report the
//! unwidened "focus" range back to the caller.
//!
//! Shares the extension-based language table with [`crate::indexer`]
//! (single source of truth, `Language::from_extension`).

use crate::domain::error::{Error, Result};
use crate::domain::types::Language;
use std::path::Path;

/// Lines are widened by this many lines on each side when no
/// explicit `context_lines` is given (spec §4.9 default).
pub const DEFAULT_CONTEXT_LINES: u32 = 3;

/// The unwidened `[start, end]` range the caller asked for, reported
/// back alongside the widened content (spec §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusRange {
    pub start_line: u32,
    pub end_line: u32,
}

/// A file excerpt: the widened content plus bookkeeping the tool
/// layer needs to render it.
#[derive(Debug, Clone, PartialEq)]
pub struct FileContext {
    pub file_path: String,
    pub language: Language,
    /// 1-indexed, inclusive: the range actually returned in `content`
    /// (focus range widened by the context window, clamped to the
    /// file's bounds).
    pub start_line: u32,
    pub end_line: u32,
    pub content: String,
    /// The caller's original, unwidened request range.
    pub focus: FocusRange,
}

/// Reads file excerpts with surrounding context (spec §4.9).
#[derive(Debug, Clone, Copy, Default)]
pub struct FileContextService;

impl FileContextService {
    /// Construct the service. Stateless: every call re-reads the
    /// file from disk, so there is nothing to own between calls.
    pub fn new() -> Self {
        Self
    }

    /// Read `file_path` and return the requested range widened by
    /// `context_lines` lines on each side.
    ///
    /// If `range` is `None`, the whole file is returned and the
    /// focus range spans the whole file. Fails with
    /// [`Error::FileNotFound`] if the file does not exist, and
    /// [`Error::InvalidRange`] if `range` falls outside
    /// `[1, file_line_count]` or `end < start`.
    pub fn read(
        &self,
        file_path: &Path,
        range: Option<(u32, u32)>,
        context_lines: u32,
    ) -> Result<FileContext> {
        if !file_path.exists() || !file_path.is_file() {
            return Err(Error::FileNotFound {
                path: file_path.display().to_string(),
            });
        }

        let text = std::fs::read_to_string(file_path)?;
        let lines: Vec<&str> = text.lines().collect();
        let line_count = lines.len() as u32;

        let language = file_path
            .extension()
            .and_then(|e| e.to_str())
            .map(Language::from_extension)
            .unwrap_or(Language::Unknown);
        let file_path_str = file_path.display().to_string();

        let (focus_start, focus_end) = match range {
            Some((start, end)) => {
                if start < 1 || end < start || end > line_count.max(1) {
                    return Err(Error::invalid_range(format!(
                        "requested range [{start}, {end}] is outside the file's bounds [1, {line_count}]"
                    )));
                }
                (start, end)
            }
            None => (1, line_count.max(1)),
        };

        let widened_start = focus_start.saturating_sub(context_lines).max(1);
        let widened_end = (focus_end + context_lines).min(line_count.max(1));

        let content = if line_count == 0 {
            String::new()
        } else {
            lines[(widened_start - 1) as usize..widened_end as usize].join("\n")
        };

        Ok(FileContext {
            file_path: file_path_str,
            language,
            start_line: widened_start,
            end_line: widened_end,
            content,
            focus: FocusRange {
                start_line: focus_start,
                end_line: focus_end,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_numbered_file(dir: &std::path::Path, name: &str, count: u32) -> std::path::PathBuf {
        let path = dir.join(name);
        let content = (1..=count).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let service = FileContextService::new();
        let err = service
            .read(Path::new("/does/not/exist.rs"), None, DEFAULT_CONTEXT_LINES)
            .unwrap_err();
        assert_eq!(err.kind(), "file_not_found");
    }

    #[test]
    fn no_range_returns_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_numbered_file(dir.path(), "a.rs", 5);
        let service = FileContextService::new();
        let ctx = service.read(&path, None, DEFAULT_CONTEXT_LINES).unwrap();
        assert_eq!(ctx.start_line, 1);
        assert_eq!(ctx.end_line, 5);
        assert_eq!(ctx.focus, FocusRange { start_line: 1, end_line: 5 });
    }

    /// Scenario S4: file of 20 lines, startLine=10, endLine=10,
    /// contextLines=3 => content contains "line 7" and "line 13",
    /// focus reports 10-10.
    #[test]
    fn range_is_widened_by_context_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_numbered_file(dir.path(), "a.rs", 20);
        let service = FileContextService::new();
        let ctx = service.read(&path, Some((10, 10)), 3).unwrap();
        assert!(ctx.content.contains("line 7"));
        assert!(ctx.content.contains("line 13"));
        assert!(!ctx.content.contains("line 6"));
        assert!(!ctx.content.contains("line 14"));
        assert_eq!(ctx.focus, FocusRange { start_line: 10, end_line: 10 });
    }

    #[test]
    fn widening_clamps_to_file_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_numbered_file(dir.path(), "a.rs", 5);
        let service = FileContextService::new();
        let ctx = service.read(&path, Some((1, 5)), 3).unwrap();
        assert_eq!(ctx.start_line, 1);
        assert_eq!(ctx.end_line, 5);
    }

    #[test]
    fn out_of_bounds_range_is_invalid_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_numbered_file(dir.path(), "a.rs", 5);
        let service = FileContextService::new();
        let err = service.read(&path, Some((3, 10)), 3).unwrap_err();
        assert_eq!(err.kind(), "invalid_range");
    }

    #[test]
    fn end_before_start_is_invalid_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_numbered_file(dir.path(), "a.rs", 5);
        let service = FileContextService::new();
        let err = service.read(&path, Some((4, 2)), 3).unwrap_err();
        assert_eq!(err.kind(), "invalid_range");
    }

    #[test]
    fn language_detected_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_numbered_file(dir.path(), "a.py", 3);
        let service = FileContextService::new();
        let ctx = service.read(&path, None, 0).unwrap();
        assert_eq!(ctx.language, Language::Python);
    }
}
