//! Shared typed models used across analysis, detection, indexing and storage.

use std::fmt;
use std::str::FromStr;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::errors::ReviewError;
use crate::indexer::filesystem::detect_language;

/// Snapshot format version written by this crate. Snapshots carrying any other
/// version are treated as absent on load.
pub const INDEX_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// 1. Structural metadata
// ---------------------------------------------------------------------------

/// One top-level function declaration of a source unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDescriptor {
    pub name: String,
    /// 1-based line of the declaration.
    pub start_line: usize,
    /// 1-based line of the closing brace.
    pub end_line: usize,
    pub parameters: Vec<String>,
    /// Declared return type annotation without the leading `:`.
    pub return_type: Option<String>,
    pub is_async: bool,
    /// Direct statements of the top-level body block.
    pub statement_count: usize,
    /// Always >= 1.
    pub complexity: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDescriptor {
    pub name: String,
    pub start_line: usize,
    pub methods: Vec<String>,
    pub is_exported: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportDescriptor {
    pub module_specifier: String,
    pub named_imports: Vec<String>,
    pub default_import: Option<String>,
    pub line: usize,
}

/// Result of analysing one source unit. Built once per analysis call and never
/// mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceUnitMetadata {
    pub file_path: String,
    pub functions: Vec<FunctionDescriptor>,
    pub classes: Vec<ClassDescriptor>,
    pub imports: Vec<ImportDescriptor>,
    /// Sum of the function complexities.
    pub complexity: u32,
    pub line_count: usize,
}

// ---------------------------------------------------------------------------
// 2. Issues
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Performance,
    Readability,
    Maintainability,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueLocation {
    pub file: String,
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub severity: Severity,
    pub location: IssueLocation,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
    pub code_snippet: String,
}

// ---------------------------------------------------------------------------
// 3. Snippets
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnippetCategory {
    Controller,
    Service,
    Repository,
    Middleware,
    Util,
}

impl SnippetCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnippetCategory::Controller => "controller",
            SnippetCategory::Service => "service",
            SnippetCategory::Repository => "repository",
            SnippetCategory::Middleware => "middleware",
            SnippetCategory::Util => "util",
        }
    }
}

impl fmt::Display for SnippetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SnippetCategory {
    type Err = ReviewError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "controller" => Ok(SnippetCategory::Controller),
            "service" => Ok(SnippetCategory::Service),
            "repository" => Ok(SnippetCategory::Repository),
            "middleware" => Ok(SnippetCategory::Middleware),
            "util" => Ok(SnippetCategory::Util),
            other => Err(ReviewError::Config(format!(
                "unknown snippet category '{other}'"
            ))),
        }
    }
}

/// Flags derived from a snippet's code at index time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetFlags {
    pub is_async: bool,
    pub has_error_handling: bool,
    #[serde(rename = "usesAWS")]
    pub uses_external_dependency: bool,
    pub complexity: u32,
}

/// A persisted excerpt of one function's source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub id: String,
    pub file_path: String,
    pub function_name: String,
    pub code: String,
    pub category: SnippetCategory,
    #[serde(rename = "metadata")]
    pub flags: SnippetFlags,
}

/// Stable snippet identity: the same function at the same line in the same
/// file always gets the same id across rebuilds.
pub fn snippet_id(file_path: &str, function_name: &str, start_line: usize) -> String {
    format!("{file_path}:{function_name}:{start_line}")
}

// ---------------------------------------------------------------------------
// 4. Snapshots
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotStats {
    pub total_files: usize,
    pub total_snippets: usize,
    /// Per-category counts in first-seen order.
    pub categories: IndexMap<String, usize>,
    pub languages: Vec<String>,
}

impl SnapshotStats {
    pub fn from_snippets(snippets: &[Snippet]) -> Self {
        let mut categories: IndexMap<String, usize> = IndexMap::new();
        let mut files: IndexSet<&str> = IndexSet::new();
        let mut languages: Vec<String> = Vec::new();

        for snippet in snippets {
            *categories
                .entry(snippet.category.as_str().to_string())
                .or_insert(0) += 1;
            if files.insert(snippet.file_path.as_str()) {
                if let Some(language) = detect_language(&snippet.file_path) {
                    if !languages.contains(&language) {
                        languages.push(language);
                    }
                }
            }
        }

        Self {
            total_files: files.len(),
            total_snippets: snippets.len(),
            categories,
            languages,
        }
    }
}

/// Versioned, persisted collection of every snippet of a project.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSnapshot {
    pub version: u32,
    pub indexed_at: chrono::DateTime<chrono::Utc>,
    pub project_path: String,
    /// Baseline revision recorded at save time, when revision control answered.
    #[serde(rename = "gitHash", default, skip_serializing_if = "Option::is_none")]
    pub baseline_revision: Option<String>,
    pub snippets: Vec<Snippet>,
    #[serde(rename = "metadata")]
    pub stats: SnapshotStats,
}
