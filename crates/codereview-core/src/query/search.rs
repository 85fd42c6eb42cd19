//! Keyword-overlap similarity search over snippets.

use std::sync::LazyLock;

use indexmap::IndexSet;
use regex::Regex;

use crate::models::Snippet;

// Regex patterns (compiled once via LazyLock)

static IMPORT_SOURCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"import\s+.*?\s+from\s+['"]([^'"]+)['"]"#).unwrap());

// Keywords such as `if` and `for` match too when followed by `(`.
static CALL_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z0-9_]+)\s*\(").unwrap());

/// Module specifiers of `import ... from '...'` statements, then every name
/// directly followed by `(`. First-seen order, no duplicates.
pub fn extract_keywords(text: &str) -> IndexSet<String> {
    let mut keywords = IndexSet::new();
    for caps in IMPORT_SOURCE_RE.captures_iter(text) {
        if let Some(m) = caps.get(1) {
            keywords.insert(m.as_str().to_string());
        }
    }
    for caps in CALL_NAME_RE.captures_iter(text) {
        if let Some(m) = caps.get(1) {
            keywords.insert(m.as_str().to_string());
        }
    }
    keywords
}

/// Number of keywords that occur anywhere in `code`.
pub fn overlap_score(keywords: &IndexSet<String>, code: &str) -> usize {
    keywords.iter().filter(|k| code.contains(k.as_str())).count()
}

/// Snippets from `pool` sharing at least one keyword with `target`, best
/// first. Equal scores keep their pool order.
pub fn find_similar(target: &str, limit: usize, pool: &[Snippet]) -> Vec<Snippet> {
    let keywords = extract_keywords(target);
    if keywords.is_empty() || limit == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(usize, &Snippet)> = pool
        .iter()
        .map(|snippet| (overlap_score(&keywords, &snippet.code), snippet))
        .filter(|(score, _)| *score > 0)
        .collect();
    // `sort_by` is stable.
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored
        .into_iter()
        .take(limit)
        .map(|(_, snippet)| snippet.clone())
        .collect()
}
