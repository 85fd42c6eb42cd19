//! Persisted snippet snapshot.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use crate::errors::ReviewResult;
use crate::indexer::filesystem::absolute_path;
use crate::indexer::revision::{GitCli, Lookup, RevisionControl};
use crate::models::{IndexSnapshot, Snippet, SnapshotStats, INDEX_VERSION};

pub const SNAPSHOT_FILE: &str = "index.json";
pub const CACHE_DIR: &str = "cache";

/// Reads and writes `<storage_dir>/index.json`.
///
/// Every read degrades to "absent": a missing file, invalid JSON or a
/// snapshot written with another format version all load as `None`.
#[derive(Clone)]
pub struct IndexStore {
    storage_dir: PathBuf,
    revisions: Arc<dyn RevisionControl>,
}

impl IndexStore {
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self::with_revision_control(storage_dir, Arc::new(GitCli::new()))
    }

    pub fn with_revision_control(
        storage_dir: impl Into<PathBuf>,
        revisions: Arc<dyn RevisionControl>,
    ) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            revisions,
        }
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.storage_dir.join(SNAPSHOT_FILE)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.storage_dir.join(CACHE_DIR)
    }

    /// Overwrite the snapshot with `snippets`. The current revision of
    /// `project_root` becomes the new baseline when it can be determined.
    pub fn save(&self, snippets: &[Snippet], project_root: &Path) -> ReviewResult<IndexSnapshot> {
        let baseline_revision = match self.revisions.current_revision(project_root) {
            Lookup::Value(rev) => Some(rev),
            Lookup::Unavailable(reason) => {
                debug!("Saving snapshot without baseline revision: {reason}");
                None
            }
        };

        let snapshot = IndexSnapshot {
            version: INDEX_VERSION,
            indexed_at: Utc::now(),
            project_path: absolute_path(project_root).to_string_lossy().to_string(),
            baseline_revision,
            snippets: snippets.to_vec(),
            stats: SnapshotStats::from_snippets(snippets),
        };

        fs::create_dir_all(&self.storage_dir)?;
        let json = serde_json::to_string_pretty(&snapshot)?;
        fs::write(self.snapshot_path(), json)?;
        info!(
            "Saved {} snippets from {} files to {}",
            snapshot.stats.total_snippets,
            snapshot.stats.total_files,
            self.snapshot_path().display()
        );
        Ok(snapshot)
    }

    pub fn load_snapshot(&self) -> Option<IndexSnapshot> {
        let path = self.snapshot_path();
        let content = fs::read_to_string(&path).ok()?;
        let snapshot: IndexSnapshot = match serde_json::from_str(&content) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!("Ignoring unreadable snapshot {}: {e}", path.display());
                return None;
            }
        };
        if snapshot.version != INDEX_VERSION {
            debug!(
                "Ignoring snapshot version {} (expected {INDEX_VERSION})",
                snapshot.version
            );
            return None;
        }
        Some(snapshot)
    }

    pub fn load_snippets(&self) -> Vec<Snippet> {
        self.load_snapshot()
            .map(|snapshot| snapshot.snippets)
            .unwrap_or_default()
    }

    pub fn exists(&self) -> bool {
        self.snapshot_path().is_file()
    }

    /// Time since the snapshot was written, from its recorded timestamp.
    pub fn age(&self) -> Option<Duration> {
        let snapshot = self.load_snapshot()?;
        (Utc::now() - snapshot.indexed_at).to_std().ok()
    }
}

/// "just now", "5m ago", "3h ago" or "2d ago".
pub fn format_age(age: Duration) -> String {
    let secs = age.as_secs();
    if secs < 60 {
        "just now".to_string()
    } else if secs < 3_600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86_400 {
        format!("{}h ago", secs / 3_600)
    } else {
        format!("{}d ago", secs / 86_400)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{snippet_id, SnippetCategory, SnippetFlags};
    use tempfile::TempDir;

    struct FixedRevision(Option<&'static str>);

    impl RevisionControl for FixedRevision {
        fn current_revision(&self, _root: &Path) -> Lookup<String> {
            match self.0 {
                Some(rev) => Lookup::Value(rev.to_string()),
                None => Lookup::Unavailable("not a repository".to_string()),
            }
        }

        fn changed_files(&self, _root: &Path, _baseline: &str) -> Lookup<Vec<String>> {
            Lookup::Unavailable("unused".to_string())
        }
    }

    fn store(dir: &TempDir, revision: Option<&'static str>) -> IndexStore {
        IndexStore::with_revision_control(
            dir.path().join(".code-reviewer"),
            Arc::new(FixedRevision(revision)),
        )
    }

    fn snippet(file: &str, name: &str, category: SnippetCategory) -> Snippet {
        Snippet {
            id: snippet_id(file, name, 1),
            file_path: file.to_string(),
            function_name: name.to_string(),
            code: "function x() {}".to_string(),
            category,
            flags: SnippetFlags {
                is_async: true,
                has_error_handling: false,
                uses_external_dependency: false,
                complexity: 2,
            },
        }
    }

    #[test]
    fn test_missing_snapshot_is_absent() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, None);
        assert!(!store.exists());
        assert!(store.load_snapshot().is_none());
        assert!(store.load_snippets().is_empty());
        assert!(store.age().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, Some("abc123"));
        let snippets = vec![
            snippet("/p/user.service.ts", "a", SnippetCategory::Service),
            snippet("/p/util.ts", "b", SnippetCategory::Util),
        ];
        let saved = store.save(&snippets, dir.path()).unwrap();
        assert_eq!(saved.baseline_revision.as_deref(), Some("abc123"));

        assert!(store.exists());
        let loaded = store.load_snapshot().unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.stats.total_files, 2);
        assert_eq!(store.load_snippets(), snippets);
        assert!(store.age().unwrap() < Duration::from_secs(60));
    }

    #[test]
    fn test_persisted_field_names() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, Some("abc123"));
        store
            .save(&[snippet("/p/a.ts", "a", SnippetCategory::Util)], dir.path())
            .unwrap();
        let raw = fs::read_to_string(store.snapshot_path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["gitHash"], "abc123");
        assert!(value["indexedAt"].is_string());
        assert!(value["projectPath"].is_string());
        assert_eq!(value["metadata"]["totalSnippets"], 1);
        assert_eq!(value["metadata"]["categories"]["util"], 1);
        assert_eq!(value["snippets"][0]["metadata"]["isAsync"], true);
    }

    #[test]
    fn test_unavailable_revision_omits_baseline() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, None);
        let saved = store.save(&[], dir.path()).unwrap();
        assert_eq!(saved.baseline_revision, None);
        let raw = fs::read_to_string(store.snapshot_path()).unwrap();
        assert!(!raw.contains("gitHash"));
        assert!(store.load_snapshot().unwrap().snippets.is_empty());
    }

    #[test]
    fn test_corrupt_or_foreign_snapshot_is_absent() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, None);
        fs::create_dir_all(store.storage_dir()).unwrap();

        fs::write(store.snapshot_path(), "{ not json").unwrap();
        assert!(store.exists());
        assert!(store.load_snapshot().is_none());
        assert!(store.load_snippets().is_empty());

        store.save(&[], dir.path()).unwrap();
        let raw = fs::read_to_string(store.snapshot_path()).unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        value["version"] = serde_json::json!(99);
        fs::write(store.snapshot_path(), value.to_string()).unwrap();
        assert!(store.load_snapshot().is_none());
    }

    #[test]
    fn test_save_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, None);
        store
            .save(&[snippet("/p/a.ts", "a", SnippetCategory::Util)], dir.path())
            .unwrap();
        store.save(&[], dir.path()).unwrap();
        assert!(store.load_snippets().is_empty());
    }

    #[test]
    fn test_cache_dir_location() {
        let store = IndexStore::new("/p/.code-reviewer");
        assert_eq!(store.cache_dir(), PathBuf::from("/p/.code-reviewer/cache"));
        assert_eq!(
            store.snapshot_path(),
            PathBuf::from("/p/.code-reviewer/index.json")
        );
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(Duration::from_secs(5)), "just now");
        assert_eq!(format_age(Duration::from_secs(5 * 60 + 3)), "5m ago");
        assert_eq!(format_age(Duration::from_secs(3 * 3_600)), "3h ago");
        assert_eq!(format_age(Duration::from_secs(2 * 86_400 + 10)), "2d ago");
    }
}
