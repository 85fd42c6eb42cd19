//! Textual heuristics used by the detector and the snippet indexer.
//!
//! All of these work on raw text, not tokens. A marker inside a string
//! literal or a comment counts the same as one in code, and several markers
//! on one line count once.

/// Token marking a suspension point inside an async function.
pub const SUSPENSION_MARKER: &str = "await";

/// Substrings that mark use of the tracked external SDK.
pub const EXTERNAL_DEPENDENCY_MARKERS: &[&str] = &["AWS", "@aws-sdk", "aws-sdk"];

/// Number of distinct lines in `start_line..=end_line` (1-based, clamped to
/// the text) that contain [`SUSPENSION_MARKER`].
pub fn suspension_line_count(source: &str, start_line: usize, end_line: usize) -> usize {
    if start_line == 0 || end_line < start_line {
        return 0;
    }
    source
        .split('\n')
        .skip(start_line - 1)
        .take(end_line - start_line + 1)
        .filter(|line| line.contains(SUSPENSION_MARKER))
        .count()
}

/// `try` and `catch` both appear somewhere in `code`.
pub fn has_error_handling(code: &str) -> bool {
    code.contains("try") && code.contains("catch")
}

pub fn uses_external_dependency(code: &str) -> bool {
    EXTERNAL_DEPENDENCY_MARKERS
        .iter()
        .any(|marker| code.contains(marker))
}

/// Lines `start_line..=end_line` (1-based) of `source`, clamped to its bounds.
pub fn slice_lines(source: &str, start_line: usize, end_line: usize) -> String {
    let lines: Vec<&str> = source.split('\n').collect();
    let start = start_line.saturating_sub(1).min(lines.len());
    let end = end_line.min(lines.len()).max(start);
    lines[start..end].join("\n")
}

/// `context` lines on each side of `line` (1-based), clamped to the text.
pub fn context_excerpt(source: &str, line: usize, context: usize) -> String {
    let lines: Vec<&str> = source.split('\n').collect();
    let start = line.saturating_sub(1).saturating_sub(context).min(lines.len());
    let end = line.saturating_add(context).min(lines.len()).max(start);
    lines[start..end].join("\n")
}
