//! MCP tool parameter and error-shape definitions (spec §6.1).
//!
//! JSON Schemas for these are generated by `schemars` so the tool
//! surface is self-describing to the calling assistant, the same
//! pairing (`serde` + `schemars`) the teacher uses for its own tool
//! parameter structs.

use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

/// Parameters for `semantic_search`. Field names are `camelCase` on
/// the wire (`maxResults`, `projectFilter`), matching spec §6.1's
/// tool surface table.
///
/// `max_results` and `context_lines` default to `None` on the wire
/// (`#[serde(default)]`); the tool handlers apply the spec's actual
/// default values (spec §6.1) via `unwrap_or`, since a `default =
/// "fn"` attribute's function must return the field's own type and
/// these fields are `Option<_>`, not their inner defaults.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SemanticSearchArgs {
    /// Natural-language or code-snippet query.
    #[schemars(description = "Natural-language or code-snippet search query")]
    pub query: String,
    /// Maximum number of results to return.
    #[serde(default)]
    #[schemars(description = "Maximum number of results to return (default 10)")]
    pub max_results: Option<usize>,
    /// Restrict results to a single indexed project.
    #[serde(default)]
    #[schemars(description = "Restrict results to this project name")]
    pub project_filter: Option<String>,
}

/// Parameters for `file_context`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileContextArgs {
    /// Path to the file to excerpt.
    #[schemars(description = "Path to the file to excerpt")]
    pub file_path: String,
    #[serde(default)]
    #[schemars(description = "1-indexed start line of the focus range")]
    pub start_line: Option<u32>,
    #[serde(default)]
    #[schemars(description = "1-indexed, inclusive end line of the focus range")]
    pub end_line: Option<u32>,
    #[serde(default)]
    #[schemars(description = "Lines of surrounding context on each side (default 3)")]
    pub context_lines: Option<u32>,
}

/// Direction of traversal for `find_related` (spec §6.1; the
/// dependency-graph feature itself is out of scope for this core,
/// see [`super::find_related`]).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RelatedDirection {
    Imports,
    ImportsFrom,
    #[default]
    Both,
}

/// Parameters for `find_related`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FindRelatedArgs {
    pub file_path: String,
    #[serde(default)]
    pub direction: RelatedDirection,
}

/// Parameters for `reload_index`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReloadIndexArgs {
    /// Reindex only this project; omit to reindex everything
    /// registered.
    pub project_name: Option<String>,
}

/// Parameters for `clear_index`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClearIndexArgs {
    /// Must be explicitly `true`; destructive operations require
    /// confirmation (spec §7).
    pub confirm: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// spec.md's tool table (§6.1) mandates `maxResults`/
    /// `projectFilter`/`filePath`/`startLine`/`endLine`/
    /// `contextLines`/`projectName` on the wire.
    #[test]
    fn semantic_search_args_accept_camel_case_keys() {
        let args: SemanticSearchArgs =
            serde_json::from_str(r#"{"query":"q","maxResults":7,"projectFilter":"proj"}"#).unwrap();
        assert_eq!(args.max_results, Some(7));
        assert_eq!(args.project_filter.as_deref(), Some("proj"));
    }

    #[test]
    fn file_context_args_accept_camel_case_keys() {
        let args: FileContextArgs = serde_json::from_str(
            r#"{"filePath":"a.rs","startLine":1,"endLine":2,"contextLines":4}"#,
        )
        .unwrap();
        assert_eq!(args.file_path, "a.rs");
        assert_eq!(args.start_line, Some(1));
        assert_eq!(args.end_line, Some(2));
        assert_eq!(args.context_lines, Some(4));
    }

    #[test]
    fn find_related_args_accept_camel_case_file_path() {
        let args: FindRelatedArgs = serde_json::from_str(r#"{"filePath":"a.rs"}"#).unwrap();
        assert_eq!(args.file_path, "a.rs");
        assert_eq!(args.direction, RelatedDirection::Both);
    }

    #[test]
    fn reload_index_args_accept_camel_case_project_name() {
        let args: ReloadIndexArgs = serde_json::from_str(r#"{"projectName":"proj"}"#).unwrap();
        assert_eq!(args.project_name.as_deref(), Some("proj"));
    }
}
