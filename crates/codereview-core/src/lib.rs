//! Code review core library.
//!
//! Structural analysis of TypeScript sources, heuristic issue detection, a
//! persisted snippet index with keyword similarity search and diff-based
//! incremental updates, and a content-addressed cache for expensive review
//! results.

pub mod config;
pub mod detect;
pub mod errors;
pub mod indexer;
pub mod logging;
pub mod models;
pub mod privacy;
pub mod query;
pub mod review;
pub mod store;

pub use config::Config;
pub use detect::PatternDetector;
pub use errors::{ReviewError, ReviewResult};
pub use indexer::incremental::IncrementalUpdater;
pub use indexer::pipeline::{IndexPipeline, IndexStats};
pub use indexer::revision::{GitCli, Lookup, RevisionControl};
pub use indexer::snippets::SnippetIndexer;
pub use indexer::symbols::SourceAnalyzer;
pub use logging::LogConfig;
pub use models::{Issue, IndexSnapshot, Snippet, SourceUnitMetadata};
pub use query::search::find_similar;
pub use store::cache::ContentCache;
pub use store::snapshot::IndexStore;
