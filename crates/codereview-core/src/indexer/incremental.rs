//! Diff-based re-indexing against the snapshot's baseline revision.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::errors::ReviewResult;
use crate::indexer::filesystem::absolute_path;
use crate::indexer::revision::{Lookup, RevisionControl};
use crate::indexer::snippets::SnippetIndexer;
use crate::models::{IndexSnapshot, Snippet};
use crate::store::snapshot::IndexStore;

/// Files to re-index and whether they came from a full scan.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Absolute paths, deduplicated, in diff or scan order. May name files
    /// that no longer exist.
    pub files: Vec<PathBuf>,
    /// True when there was no usable baseline and every eligible file is listed.
    pub full_rescan: bool,
}

/// Result of one incremental run.
#[derive(Clone, Debug)]
pub struct UpdateOutcome {
    pub snapshot: IndexSnapshot,
    pub changes: ChangeSet,
    pub snippets_carried_over: usize,
    pub snippets_reindexed: usize,
}

pub struct IncrementalUpdater {
    indexer: SnippetIndexer,
    store: IndexStore,
    revisions: Arc<dyn RevisionControl>,
}

impl IncrementalUpdater {
    pub fn new(
        indexer: SnippetIndexer,
        store: IndexStore,
        revisions: Arc<dyn RevisionControl>,
    ) -> Self {
        Self {
            indexer,
            store,
            revisions,
        }
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// Changed files since the stored snapshot's baseline revision, or every
    /// eligible file when there is no baseline or the diff is unavailable.
    pub fn changed_files_since_baseline(&self, root: &Path) -> ReviewResult<Vec<PathBuf>> {
        let previous = self.store.load_snapshot();
        Ok(self.change_set(root, previous.as_ref())?.files)
    }

    pub fn change_set(
        &self,
        root: &Path,
        previous: Option<&IndexSnapshot>,
    ) -> ReviewResult<ChangeSet> {
        let root = absolute_path(root);
        let filter = self.indexer.source_filter(&root)?;

        let Some(baseline) = previous.and_then(|s| s.baseline_revision.as_deref()) else {
            self.indexer
                .log()
                .progress("No baseline revision recorded, rescanning everything");
            return Ok(ChangeSet {
                files: filter.walk(),
                full_rescan: true,
            });
        };

        match self.revisions.changed_files(&root, baseline) {
            Lookup::Value(paths) => {
                let mut seen = HashSet::new();
                let files = paths
                    .iter()
                    .map(|p| root.join(p))
                    .filter(|p| filter.accepts(p))
                    .filter(|p| seen.insert(p.clone()))
                    .collect();
                Ok(ChangeSet {
                    files,
                    full_rescan: false,
                })
            }
            Lookup::Unavailable(reason) => {
                warn!("Revision diff against {baseline} unavailable ({reason}), rescanning everything");
                Ok(ChangeSet {
                    files: filter.walk(),
                    full_rescan: true,
                })
            }
        }
    }

    /// Previous snippets of files outside `changed_files`, followed by fresh
    /// snippets of the changed files that still exist. A changed file that
    /// fails to parse contributes nothing.
    pub fn merge_update(&self, changed_files: &[PathBuf], previous: &[Snippet]) -> Vec<Snippet> {
        let changed: HashSet<String> = changed_files
            .iter()
            .map(|p| absolute_path(p).to_string_lossy().to_string())
            .collect();

        let mut merged: Vec<Snippet> = previous
            .iter()
            .filter(|s| !changed.contains(&s.file_path))
            .cloned()
            .collect();

        let existing: Vec<PathBuf> = changed_files
            .iter()
            .filter(|p| {
                let exists = p.is_file();
                if !exists {
                    self.indexer
                        .log()
                        .progress(&format!("{} was removed", p.display()));
                }
                exists
            })
            .cloned()
            .collect();
        merged.extend(self.indexer.index_files(&existing));
        merged
    }

    /// Recompute the changed files, merge with the stored snapshot and save.
    /// A full rescan replaces the stored snippets instead of merging, so
    /// deleted files do not linger.
    pub fn update(&self, root: &Path) -> ReviewResult<UpdateOutcome> {
        let previous = self.store.load_snapshot();
        let changes = self.change_set(root, previous.as_ref())?;

        let carried: &[Snippet] = match (&previous, changes.full_rescan) {
            (Some(snapshot), false) => snapshot.snippets.as_slice(),
            _ => &[],
        };
        let merged = self.merge_update(&changes.files, carried);
        let changed: HashSet<String> = changes
            .files
            .iter()
            .map(|p| p.to_string_lossy().to_string())
            .collect();
        let snippets_carried_over = merged
            .iter()
            .filter(|s| !changed.contains(&s.file_path))
            .count();
        let snippets_reindexed = merged.len() - snippets_carried_over;

        let snapshot = self.store.save(&merged, root)?;
        info!(
            "Re-indexed {} files ({} snippets), kept {} snippets",
            changes.files.len(),
            snippets_reindexed,
            snippets_carried_over
        );
        Ok(UpdateOutcome {
            snapshot,
            changes,
            snippets_carried_over,
            snippets_reindexed,
        })
    }
}
