//! Indexing run orchestration: full rebuild or incremental update.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::config::Config;
use crate::errors::ReviewResult;
use crate::indexer::filesystem::absolute_path;
use crate::indexer::incremental::IncrementalUpdater;
use crate::indexer::revision::{GitCli, RevisionControl};
use crate::indexer::snippets::SnippetIndexer;
use crate::store::snapshot::IndexStore;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Candidate files considered: every eligible file on a full scan, the
    /// changed set on an incremental one.
    pub files_scanned: usize,
    pub files_reindexed: usize,
    pub snippets_written: usize,
    pub snippets_carried_over: usize,
    pub elapsed_ms: u64,
    pub full_rebuild: bool,
}

pub struct IndexPipeline {
    indexer: SnippetIndexer,
    updater: IncrementalUpdater,
    enabled: bool,
}

impl IndexPipeline {
    /// Pipeline for `project_root` with git as revision control and storage
    /// under the configured directory.
    pub fn new(config: &Config, project_root: &Path) -> ReviewResult<Self> {
        let revisions: Arc<dyn RevisionControl> = Arc::new(GitCli::new());
        let store =
            IndexStore::with_revision_control(config.storage_path(project_root), revisions.clone());
        let indexer = SnippetIndexer::from_config(config)?;
        Ok(Self::with_parts(indexer, store, revisions).with_enabled(config.indexing.enabled))
    }

    pub fn with_parts(
        indexer: SnippetIndexer,
        store: IndexStore,
        revisions: Arc<dyn RevisionControl>,
    ) -> Self {
        let updater = IncrementalUpdater::new(indexer.clone(), store, revisions);
        Self {
            indexer,
            updater,
            enabled: true,
        }
    }

    /// A disabled pipeline turns `run` into a no-op.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn store(&self) -> &IndexStore {
        self.updater.store()
    }

    pub fn indexer(&self) -> &SnippetIndexer {
        &self.indexer
    }

    pub fn updater(&self) -> &IncrementalUpdater {
        &self.updater
    }

    /// Incremental update when a snapshot exists, full rebuild otherwise.
    pub fn run(&self, root: &Path) -> ReviewResult<IndexStats> {
        if !self.enabled {
            info!("Indexing disabled, skipping {}", root.display());
            return Ok(IndexStats::default());
        }
        if self.store().load_snapshot().is_some() {
            self.incremental_update(root)
        } else {
            self.full_rebuild(root)
        }
    }

    /// Re-index every eligible file and overwrite the snapshot.
    pub fn full_rebuild(&self, root: &Path) -> ReviewResult<IndexStats> {
        let started = Instant::now();
        let files = self.indexer.source_filter(&absolute_path(root))?.walk();
        let snippets = self.indexer.index_files(&files);
        let snapshot = self.store().save(&snippets, root)?;

        let stats = IndexStats {
            files_scanned: files.len(),
            files_reindexed: files.len(),
            snippets_written: snapshot.snippets.len(),
            snippets_carried_over: 0,
            elapsed_ms: started.elapsed().as_millis() as u64,
            full_rebuild: true,
        };
        info!(
            "Full index of {}: {} files, {} snippets in {}ms",
            root.display(),
            stats.files_scanned,
            stats.snippets_written,
            stats.elapsed_ms
        );
        Ok(stats)
    }

    pub fn incremental_update(&self, root: &Path) -> ReviewResult<IndexStats> {
        let started = Instant::now();
        let outcome = self.updater.update(root)?;
        Ok(IndexStats {
            files_scanned: outcome.changes.files.len(),
            files_reindexed: outcome
                .changes
                .files
                .iter()
                .filter(|p| p.is_file())
                .count(),
            snippets_written: outcome.snapshot.snippets.len(),
            snippets_carried_over: outcome.snippets_carried_over,
            elapsed_ms: started.elapsed().as_millis() as u64,
            full_rebuild: outcome.changes.full_rescan,
        })
    }
}
