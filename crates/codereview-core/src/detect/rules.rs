//! Rule engine over structural metadata.

use crate::config::{Config, RuleToggles, Thresholds};
use crate::detect::heuristics::{context_excerpt, suspension_line_count};
use crate::models::{
    FunctionDescriptor, Issue, IssueKind, IssueLocation, Severity, SourceUnitMetadata,
};

/// Minimum number of lines with a suspension marker before an async function
/// is reported as sequential.
pub const MIN_SUSPENSION_LINES: usize = 2;

/// Pure, deterministic issue detector.
#[derive(Clone, Copy, Debug, Default)]
pub struct PatternDetector {
    thresholds: Thresholds,
    rules: RuleToggles,
}

impl PatternDetector {
    pub fn new(thresholds: Thresholds, rules: RuleToggles) -> Self {
        Self { thresholds, rules }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.thresholds, config.rules)
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Issues for one source unit: every performance issue, then every
    /// readability issue, then at most one maintainability issue. Within a
    /// kind, issues follow function declaration order.
    pub fn detect_issues(&self, metadata: &SourceUnitMetadata, source: &str) -> Vec<Issue> {
        let mut issues = Vec::new();

        if self.rules.performance {
            issues.extend(
                metadata
                    .functions
                    .iter()
                    .filter(|f| is_sequential_async(f, source))
                    .map(|f| self.sequential_async_issue(metadata, f, source)),
            );
        }

        if self.rules.readability {
            issues.extend(
                metadata
                    .functions
                    .iter()
                    .filter(|f| self.is_long_or_complex(f))
                    .map(|f| self.long_function_issue(metadata, f, source)),
            );
        }

        if self.rules.maintainability && self.is_complex_file(metadata) {
            issues.push(Issue {
                kind: IssueKind::Maintainability,
                severity: Severity::Low,
                location: IssueLocation {
                    file: metadata.file_path.clone(),
                    line: 1,
                    function_name: None,
                },
                title: "High file complexity".to_string(),
                description:
                    "File has many functions or high cyclomatic complexity. Consider splitting modules."
                        .to_string(),
                suggested_fix: Some("Split into smaller, focused modules.".to_string()),
                code_snippet: context_excerpt(source, 1, self.thresholds.context_lines),
            });
        }

        issues
    }

    fn is_long_or_complex(&self, function: &FunctionDescriptor) -> bool {
        function.statement_count > self.thresholds.max_statements
            || function.complexity > self.thresholds.max_complexity
    }

    fn is_complex_file(&self, metadata: &SourceUnitMetadata) -> bool {
        metadata.complexity > self.thresholds.max_file_complexity
            || metadata.functions.len() > self.thresholds.max_functions
    }

    fn sequential_async_issue(
        &self,
        metadata: &SourceUnitMetadata,
        function: &FunctionDescriptor,
        source: &str,
    ) -> Issue {
        Issue {
            kind: IssueKind::Performance,
            severity: Severity::Medium,
            location: function_location(metadata, function),
            title: "Sequential async operations detected".to_string(),
            description:
                "Multiple await statements execute sequentially. Consider Promise.all() for parallel execution."
                    .to_string(),
            suggested_fix: Some(
                "Use Promise.all() to run independent promises in parallel.".to_string(),
            ),
            code_snippet: context_excerpt(
                source,
                function.start_line,
                self.thresholds.context_lines,
            ),
        }
    }

    fn long_function_issue(
        &self,
        metadata: &SourceUnitMetadata,
        function: &FunctionDescriptor,
        source: &str,
    ) -> Issue {
        let severity = if function.complexity > self.thresholds.high_complexity {
            Severity::High
        } else {
            Severity::Medium
        };
        Issue {
            kind: IssueKind::Readability,
            severity,
            location: function_location(metadata, function),
            title: "Long or complex function".to_string(),
            description: format!(
                "Function '{}' has {} statements and complexity {}. Consider splitting into smaller functions.",
                function.name, function.statement_count, function.complexity
            ),
            suggested_fix: Some("Extract logic into well-named helper functions.".to_string()),
            code_snippet: context_excerpt(
                source,
                function.start_line,
                self.thresholds.context_lines,
            ),
        }
    }
}

fn is_sequential_async(function: &FunctionDescriptor, source: &str) -> bool {
    function.is_async
        && suspension_line_count(source, function.start_line, function.end_line)
            >= MIN_SUSPENSION_LINES
}

fn function_location(metadata: &SourceUnitMetadata, function: &FunctionDescriptor) -> IssueLocation {
    IssueLocation {
        file: metadata.file_path.clone(),
        line: function.start_line,
        function_name: Some(function.name.clone()),
    }
}
