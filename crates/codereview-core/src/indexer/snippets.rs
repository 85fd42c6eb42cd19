//! Snippet extraction and categorisation.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::config::Config;
use crate::detect::heuristics::{has_error_handling, slice_lines, uses_external_dependency};
use crate::errors::ReviewResult;
use crate::indexer::filesystem::{absolute_path, SourceFilter};
use crate::indexer::symbols::SourceAnalyzer;
use crate::logging::LogConfig;
use crate::models::{snippet_id, Snippet, SnippetCategory, SnippetFlags};
use crate::query::search::find_similar;

/// Turns the qualifying functions of a file into [`Snippet`]s.
#[derive(Clone, Debug)]
pub struct SnippetIndexer {
    analyzer: SourceAnalyzer,
    min_statements: usize,
    /// Lowercase path markers in priority order.
    category_rules: Vec<(String, SnippetCategory)>,
    ignore_globs: Vec<String>,
    workers: usize,
    log: LogConfig,
}

impl SnippetIndexer {
    /// Indexer with the default markers, ignore list and statement minimum.
    pub fn new(log: LogConfig) -> Self {
        let defaults = Config::default();
        Self {
            analyzer: SourceAnalyzer::new(),
            min_statements: defaults.indexing.min_statements,
            category_rules: default_category_rules(),
            ignore_globs: defaults.ignore_globs(),
            workers: defaults.indexing.workers,
            log,
        }
    }

    pub fn from_config(config: &Config) -> ReviewResult<Self> {
        Ok(Self {
            analyzer: SourceAnalyzer::new(),
            min_statements: config.indexing.min_statements,
            category_rules: config.category_rules()?,
            ignore_globs: config.ignore_globs(),
            workers: config.indexing.workers.max(1),
            log: config.log_config(),
        })
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn log(&self) -> LogConfig {
        self.log
    }

    /// Eligible-file filter for `root` using this indexer's ignore globs.
    pub fn source_filter(&self, root: &Path) -> ReviewResult<SourceFilter> {
        SourceFilter::new(root, &self.ignore_globs)
    }

    /// Snippets for every function of `path` with at least the minimum number
    /// of body statements, in declaration order.
    pub fn index_file(&self, path: &Path) -> ReviewResult<Vec<Snippet>> {
        let path = absolute_path(path);
        let (metadata, source) = self.analyzer.analyze_with_source(&path)?;
        let file_path = path.to_string_lossy().to_string();
        let category = self.categorize(&file_path);

        let snippets = metadata
            .functions
            .iter()
            .filter(|f| f.statement_count >= self.min_statements)
            .map(|f| {
                let code = slice_lines(&source, f.start_line, f.end_line);
                Snippet {
                    id: snippet_id(&file_path, &f.name, f.start_line),
                    file_path: file_path.clone(),
                    function_name: f.name.clone(),
                    category,
                    flags: SnippetFlags {
                        is_async: f.is_async,
                        has_error_handling: has_error_handling(&code),
                        uses_external_dependency: uses_external_dependency(&code),
                        complexity: f.complexity,
                    },
                    code,
                }
            })
            .collect();
        Ok(snippets)
    }

    /// Index every eligible file under `root`, in scan order. Files that
    /// cannot be read or parsed are logged and skipped.
    pub fn index_project(&self, root: &Path) -> ReviewResult<Vec<Snippet>> {
        let filter = self.source_filter(&absolute_path(root))?;
        let files = filter.walk();
        self.log
            .progress(&format!("Indexing {} files under {}", files.len(), root.display()));
        Ok(self.index_files(&files))
    }

    /// Index an explicit file list, skipping failures. Output follows input
    /// order regardless of the worker count.
    pub fn index_files(&self, files: &[PathBuf]) -> Vec<Snippet> {
        let results = self.extract_all(files);
        let mut snippets = Vec::new();
        for (path, result) in files.iter().zip(results) {
            match result {
                Ok(found) => {
                    self.log.progress(&format!(
                        "Indexed {} ({} snippets)",
                        path.display(),
                        found.len()
                    ));
                    snippets.extend(found);
                }
                Err(err) => self.log.skipped_file(path, &err),
            }
        }
        snippets
    }

    fn extract_all(&self, files: &[PathBuf]) -> Vec<ReviewResult<Vec<Snippet>>> {
        if self.workers <= 1 || files.len() <= 1 {
            return files.iter().map(|path| self.index_file(path)).collect();
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build();

        match pool {
            Ok(pool) => pool.install(|| {
                files
                    .par_iter()
                    .map(|path| self.index_file(path))
                    .collect()
            }),
            Err(_) => {
                // Fallback to sequential
                files.iter().map(|path| self.index_file(path)).collect()
            }
        }
    }

    /// First marker contained in the lowercased path wins; `util` otherwise.
    pub fn categorize(&self, file_path: &str) -> SnippetCategory {
        let lowered = file_path.to_lowercase();
        self.category_rules
            .iter()
            .find(|(marker, _)| lowered.contains(marker.as_str()))
            .map(|(_, category)| *category)
            .unwrap_or(SnippetCategory::Util)
    }

    pub fn find_similar(&self, target: &str, limit: usize, pool: &[Snippet]) -> Vec<Snippet> {
        find_similar(target, limit, pool)
    }
}

fn default_category_rules() -> Vec<(String, SnippetCategory)> {
    vec![
        ("controller".to_string(), SnippetCategory::Controller),
        ("service".to_string(), SnippetCategory::Service),
        ("repository".to_string(), SnippetCategory::Repository),
        ("middleware".to_string(), SnippetCategory::Middleware),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SERVICE_SOURCE: &str = "\
import { S3 } from '@aws-sdk/client-s3';

export async function uploadReport(id: string) {
  const client = new S3({});
  const body = render(id);
  try {
    await client.putObject({ Key: id, Body: body });
  } catch (err) {
    console.error(err);
  }
  const done = true;
  return done;
}

export function tiny() {
  return 1;
}
";

    const HELPER_SOURCE: &str = "\
export function formatRows(rows: string[]) {
  const out: string[] = [];
  for (const row of rows) {
    out.push(row.trim());
  }
  const joined = out.join(',');
  const size = joined.length;
  return size > 0 ? joined : '';
}
";

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_index_file_extracts_qualifying_functions() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "src/report.service.ts", SERVICE_SOURCE);
        let snippets = SnippetIndexer::new(LogConfig::default())
            .index_file(&path)
            .unwrap();

        assert_eq!(snippets.len(), 1);
        let s = &snippets[0];
        let file_path = path.to_string_lossy().to_string();
        assert_eq!(s.id, format!("{file_path}:uploadReport:3"));
        assert_eq!(s.file_path, file_path);
        assert_eq!(s.function_name, "uploadReport");
        assert_eq!(s.category, SnippetCategory::Service);
        assert!(s.code.starts_with("export async function uploadReport"));
        assert!(s.code.ends_with("  return done;\n}"));
        assert!(s.flags.is_async);
        assert!(s.flags.has_error_handling);
        assert!(!s.flags.uses_external_dependency);
        assert_eq!(s.flags.complexity, 1);
    }

    #[test]
    fn test_flags_and_minimum() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "lib/format.ts", HELPER_SOURCE);
        let snippets = SnippetIndexer::new(LogConfig::default())
            .index_file(&path)
            .unwrap();
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].category, SnippetCategory::Util);
        assert!(!snippets[0].flags.is_async);
        assert!(!snippets[0].flags.has_error_handling);
        assert_eq!(snippets[0].flags.complexity, 3);
    }

    #[test]
    fn test_categorize_priority() {
        let indexer = SnippetIndexer::new(LogConfig::default());
        assert_eq!(
            indexer.categorize("/app/src/UserController.ts"),
            SnippetCategory::Controller
        );
        // Controller outranks service when both appear.
        assert_eq!(
            indexer.categorize("/app/services/user.controller.ts"),
            SnippetCategory::Controller
        );
        assert_eq!(
            indexer.categorize("/app/repositories/user.ts"),
            SnippetCategory::Repository
        );
        assert_eq!(
            indexer.categorize("/app/middleware/auth.ts"),
            SnippetCategory::Middleware
        );
        assert_eq!(indexer.categorize("/app/lib/dates.ts"), SnippetCategory::Util);
    }

    #[test]
    fn test_custom_markers_from_config() {
        let config = Config::from_json(
            r#"{"indexing": {"categoryMarkers": [{"marker": "handlers", "category": "controller"}]}}"#,
        )
        .unwrap();
        let indexer = SnippetIndexer::from_config(&config).unwrap();
        assert_eq!(
            indexer.categorize("/app/handlers/user.ts"),
            SnippetCategory::Controller
        );
        assert_eq!(
            indexer.categorize("/app/user.service.ts"),
            SnippetCategory::Util
        );
    }

    #[test]
    fn test_index_project_skips_broken_and_ignored_files() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "src/b/format.ts", HELPER_SOURCE);
        write(root, "src/a/report.service.ts", SERVICE_SOURCE);
        write(root, "src/broken.ts", "export function broken( {\n");
        write(root, "node_modules/pkg/index.ts", HELPER_SOURCE);

        let indexer = SnippetIndexer::new(LogConfig::default());
        let snippets = indexer.index_project(root).unwrap();
        let names: Vec<&str> = snippets.iter().map(|s| s.function_name.as_str()).collect();
        assert_eq!(names, vec!["uploadReport", "formatRows"]);
    }

    #[test]
    fn test_index_project_idempotent_and_parallel_order() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        for i in 0..6 {
            write(root, &format!("src/mod{i}/format.ts"), HELPER_SOURCE);
        }
        let sequential = SnippetIndexer::new(LogConfig::default())
            .index_project(root)
            .unwrap();
        let again = SnippetIndexer::new(LogConfig::default())
            .index_project(root)
            .unwrap();
        let parallel = SnippetIndexer::new(LogConfig::default())
            .with_workers(4)
            .index_project(root)
            .unwrap();
        assert_eq!(sequential.len(), 6);
        assert_eq!(sequential, again);
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_missing_file_is_error() {
        let indexer = SnippetIndexer::new(LogConfig::default());
        assert!(indexer.index_file(Path::new("/no/such/file.ts")).is_err());
        let skipped = indexer.index_files(&[PathBuf::from("/no/such/file.ts")]);
        assert!(skipped.is_empty());
    }
}
