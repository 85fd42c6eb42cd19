//! Configuration loading: JSON rc file in the project root plus environment
//! overrides.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{ReviewError, ReviewResult};
use crate::logging::LogConfig;
use crate::models::SnippetCategory;

/// File names searched in the project root, first match wins.
pub const CONFIG_FILE_NAMES: &[&str] = &[".codereviewerrc", ".codereviewerrc.json"];

pub const DEFAULT_STORAGE_DIR: &str = ".code-reviewer";
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 7 * 24 * 60 * 60;

const DEFAULT_IGNORE: &[&str] = &["node_modules", "dist", "build"];

// ---------------------------------------------------------------------------
// Review provider selection
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Ollama,
    Claude,
    Gemini,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => "ollama",
            ProviderKind::Claude => "claude",
            ProviderKind::Gemini => "gemini",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ReviewError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "ollama" => Ok(ProviderKind::Ollama),
            "claude" => Ok(ProviderKind::Claude),
            "gemini" => Ok(ProviderKind::Gemini),
            other => Err(ReviewError::Config(format!("unknown AI provider '{other}'"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OllamaConfig {
    pub host: String,
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:11434".to_string(),
            model: "codellama:13b".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClaudeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub model: String,
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "claude-sonnet-4-5-20250929".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeminiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.0-flash".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiConfig {
    pub provider: ProviderKind,
    pub ollama: OllamaConfig,
    pub claude: ClaudeConfig,
    pub gemini: GeminiConfig,
}

// ---------------------------------------------------------------------------
// Detection and indexing knobs
// ---------------------------------------------------------------------------

/// Per-kind switches for the pattern detector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuleToggles {
    pub performance: bool,
    pub readability: bool,
    pub maintainability: bool,
}

impl Default for RuleToggles {
    fn default() -> Self {
        Self {
            performance: true,
            readability: true,
            maintainability: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Thresholds {
    /// Body statements above which a function is "long".
    pub max_statements: usize,
    /// Complexity above which a function is "complex".
    pub max_complexity: u32,
    /// Complexity above which a complex function is escalated to high severity.
    pub high_complexity: u32,
    /// Aggregate file complexity above which the file is flagged.
    pub max_file_complexity: u32,
    /// Function count above which the file is flagged.
    pub max_functions: usize,
    /// Lines of context on each side of an issue excerpt.
    pub context_lines: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_statements: 25,
            max_complexity: 10,
            high_complexity: 15,
            max_file_complexity: 50,
            max_functions: 15,
            context_lines: 3,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> ReviewResult<()> {
        if self.max_statements == 0
            || self.max_complexity == 0
            || self.high_complexity == 0
            || self.max_file_complexity == 0
            || self.max_functions == 0
        {
            return Err(ReviewError::Config(
                "thresholds must be positive (only contextLines may be 0)".to_string(),
            ));
        }
        if self.high_complexity < self.max_complexity {
            return Err(ReviewError::Config(format!(
                "highComplexity ({}) must not be below maxComplexity ({})",
                self.high_complexity, self.max_complexity
            )));
        }
        Ok(())
    }
}

/// One `file path contains marker → category` rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMarker {
    pub marker: String,
    pub category: String,
}

fn default_category_markers() -> Vec<CategoryMarker> {
    ["controller", "service", "repository", "middleware"]
        .iter()
        .map(|name| CategoryMarker {
            marker: name.to_string(),
            category: name.to_string(),
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexingConfig {
    pub enabled: bool,
    /// Minimum body statements for a function to become a snippet.
    pub min_statements: usize,
    /// Ordered by priority; the first matching marker wins.
    pub category_markers: Vec<CategoryMarker>,
    /// Rayon workers used by project scans; 1 means sequential.
    pub workers: usize,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_statements: 5,
            category_markers: default_category_markers(),
            workers: 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub verbose: bool,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub ai: AiConfig,
    pub rules: RuleToggles,
    pub ignore: Vec<String>,
    pub thresholds: Thresholds,
    pub indexing: IndexingConfig,
    pub cache: CacheConfig,
    pub storage_dir: String,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ai: AiConfig::default(),
            rules: RuleToggles::default(),
            ignore: DEFAULT_IGNORE.iter().map(|s| s.to_string()).collect(),
            thresholds: Thresholds::default(),
            indexing: IndexingConfig::default(),
            cache: CacheConfig::default(),
            storage_dir: DEFAULT_STORAGE_DIR.to_string(),
            logging: LoggingConfig::default(),
        }
    }
}

fn env_flag(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    !matches!(v.as_str(), "" | "0" | "false" | "no" | "off")
}

impl Config {
    /// Load the rc file from `project_root` (defaults when absent), apply
    /// process environment overrides and validate.
    pub fn load(project_root: &Path) -> ReviewResult<Self> {
        let mut config = match find_config_file(project_root) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> ReviewResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json(&content)
            .map_err(|e| ReviewError::Config(format!("{}: {e}", path.display())))?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Apply `AI_PROVIDER`, `OLLAMA_HOST`, `ANTHROPIC_API_KEY`,
    /// `GEMINI_API_KEY` and `CODEREVIEW_VERBOSE` from `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> ReviewResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = lookup("AI_PROVIDER").filter(|v| !v.trim().is_empty()) {
            self.ai.provider = provider.parse()?;
        }
        if let Some(host) = lookup("OLLAMA_HOST").filter(|v| !v.trim().is_empty()) {
            self.ai.ollama.host = host.trim().to_string();
        }
        if let Some(key) = lookup("ANTHROPIC_API_KEY").filter(|v| !v.trim().is_empty()) {
            self.ai.claude.api_key = Some(key.trim().to_string());
        }
        if let Some(key) = lookup("GEMINI_API_KEY").filter(|v| !v.trim().is_empty()) {
            self.ai.gemini.api_key = Some(key.trim().to_string());
        }
        if let Some(flag) = lookup("CODEREVIEW_VERBOSE") {
            self.logging.verbose = env_flag(&flag);
        }
        Ok(())
    }

    pub fn validate(&self) -> ReviewResult<()> {
        self.thresholds.validate()?;
        self.category_rules()?;
        if self.indexing.min_statements == 0 {
            return Err(ReviewError::Config(
                "indexing.minStatements must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Category markers resolved to typed categories, in priority order.
    pub fn category_rules(&self) -> ReviewResult<Vec<(String, SnippetCategory)>> {
        self.indexing
            .category_markers
            .iter()
            .map(|rule| {
                let category = rule.category.parse::<SnippetCategory>()?;
                Ok((rule.marker.to_lowercase(), category))
            })
            .collect()
    }

    /// Each ignore entry `p` expands to `**/p/**` and `**/p`.
    pub fn ignore_globs(&self) -> Vec<String> {
        expand_ignore_patterns(&self.ignore)
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            verbose: self.logging.verbose,
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_seconds)
    }

    /// Storage directory, resolved against `project_root` when relative.
    pub fn storage_path(&self, project_root: &Path) -> PathBuf {
        let dir = Path::new(&self.storage_dir);
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            project_root.join(dir)
        }
    }
}

pub fn expand_ignore_patterns(patterns: &[String]) -> Vec<String> {
    patterns
        .iter()
        .map(|p| p.trim().trim_matches('/'))
        .filter(|p| !p.is_empty())
        .flat_map(|p| [format!("**/{p}/**"), format!("**/{p}")])
        .collect()
}

fn find_config_file(project_root: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| project_root.join(name))
        .find(|path| path.is_file())
}
