//! Filesystem scanning helpers for indexing passes.

use std::path::{Path, PathBuf};

use ignore::overrides::{Override, OverrideBuilder};
use ignore::WalkBuilder;
use sha2::{Digest, Sha256};

use crate::errors::{ReviewError, ReviewResult};

const LANGUAGE_BY_EXTENSION: &[(&str, &str)] = &[(".ts", "typescript"), (".tsx", "typescript")];

/// Eligible source files under a project root: known extensions, not hidden,
/// not matched by any ignore glob.
pub struct SourceFilter {
    root: PathBuf,
    overrides: Override,
}

impl SourceFilter {
    /// `ignore_globs` are root-relative globs such as `**/node_modules/**`.
    pub fn new(root: &Path, ignore_globs: &[String]) -> ReviewResult<Self> {
        let mut builder = OverrideBuilder::new(root);
        for glob in ignore_globs {
            let glob = glob.trim();
            if glob.is_empty() {
                continue;
            }
            builder
                .add(&format!("!{glob}"))
                .map_err(|e| ReviewError::Config(format!("invalid ignore glob '{glob}': {e}")))?;
        }
        let overrides = builder
            .build()
            .map_err(|e| ReviewError::Config(format!("invalid ignore globs: {e}")))?;
        Ok(Self {
            root: root.to_path_buf(),
            overrides,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the root in file-name order and return every eligible file.
    pub fn walk(&self) -> Vec<PathBuf> {
        let walker = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .hidden(true)
            .overrides(self.overrides.clone())
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        walker
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|entry| entry.into_path())
            .filter(|path| detect_language(&path.to_string_lossy()).is_some())
            .collect()
    }

    /// Whether a single path (absolute or root-relative) would be part of a walk.
    pub fn accepts(&self, path: &Path) -> bool {
        if detect_language(&path.to_string_lossy()).is_none() {
            return false;
        }
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let hidden = relative.components().any(|c| {
            c.as_os_str()
                .to_str()
                .map(|s| s.starts_with('.') && s != "." && s != "..")
                .unwrap_or(false)
        });
        !hidden && !self.overrides.matched(relative, false).is_ignore()
    }
}

/// Language tag for a path, from its extension.
pub fn detect_language(path: &str) -> Option<String> {
    let path = Path::new(path);
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))?;
    LANGUAGE_BY_EXTENSION
        .iter()
        .find(|(e, _)| *e == ext.as_str())
        .map(|(_, lang)| lang.to_string())
}

/// Whether the path needs the TSX grammar rather than plain TypeScript.
pub fn is_tsx(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().eq_ignore_ascii_case("tsx"))
        .unwrap_or(false)
}

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

pub fn compute_content_hash(path: &Path) -> ReviewResult<String> {
    let data = std::fs::read(path)?;
    Ok(sha256_hex(&data))
}

/// Absolute form of `path` without touching the filesystem.
pub fn absolute_path(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
