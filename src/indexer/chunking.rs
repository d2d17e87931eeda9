//! Line-window chunking (spec §4.6). No syntax tree is built;
//! chunking is purely line-range based (spec §1 Non-goals).

/// Default window size in lines (spec §4.6 default W=50).
pub const DEFAULT_CHUNK_WINDOW: usize = 50;
/// Default overlap in lines between consecutive windows (spec §4.6
/// default O≈10).
pub const DEFAULT_CHUNK_OVERLAP: usize = 10;

/// A candidate chunk prior to id assignment and embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct RawChunk {
    /// 1-indexed, inclusive.
    pub start_line: u32,
    /// 1-indexed, inclusive.
    pub end_line: u32,
    pub content: String,
    pub is_whole_file: bool,
}

/// Split `content` into windows of `window` lines with `overlap`
/// lines of overlap between consecutive windows. The last window may
/// be shorter. If the file is shorter than one window, a single
/// whole-file chunk is returned instead (kind "file" per spec §4.6).
pub fn chunk_lines(content: &str, window: usize, overlap: usize) -> Vec<RawChunk> {
    let lines: Vec<&str> = content.lines().collect();
    if lines.is_empty() {
        return Vec::new();
    }

    if lines.len() <= window {
        return vec![RawChunk {
            start_line: 1,
            end_line: lines.len() as u32,
            content: lines.join("\n"),
            is_whole_file: true,
        }];
    }

    let stride = window.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0usize; // 0-indexed
    loop {
        let end = (start + window).min(lines.len());
        chunks.push(RawChunk {
            start_line: (start + 1) as u32,
            end_line: end as u32,
            content: lines[start..end].join("\n"),
            is_whole_file: false,
        });
        if end == lines.len() {
            break;
        }
        start += stride;
    }
    chunks
}

/// Derive a stable chunk id from `(project_name, file_path,
/// start_line)` (Design Notes, "Chunk ids"). Stable across reindexes
/// of identical file content; may differ across runs if content
/// changes and start lines shift.
pub fn chunk_id(project_name: &str, file_path: &str, start_line: u32) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(project_name.as_bytes());
    hasher.update([0u8]);
    hasher.update(file_path.as_bytes());
    hasher.update([0u8]);
    hasher.update(start_line.to_le_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    use std::fmt::Write;
    for byte in digest.iter().take(16) {
        write!(hex, "{byte:02x}").expect("writing into a String never fails");
    }
    hex
}
