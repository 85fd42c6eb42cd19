//! Snippet sanitisation before code leaves the machine.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::Snippet;

static DOUBLE_QUOTED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""[^"]*""#).unwrap());
static SINGLE_QUOTED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"'[^']*'").unwrap());
static BACKTICK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`[^`]*`").unwrap());

/// Last three components of `path`, joined with `/`.
pub fn anonymize_path(path: &str) -> String {
    let parts: Vec<&str> = path.split(['/', '\\']).collect();
    let keep = parts.len().saturating_sub(3);
    parts[keep..].join("/")
}

/// Blank out the contents of string and template literals.
pub fn remove_literals(code: &str) -> String {
    let code = DOUBLE_QUOTED_RE.replace_all(code, "\"***\"");
    let code = SINGLE_QUOTED_RE.replace_all(&code, "'***'");
    BACKTICK_RE.replace_all(&code, "`***`").into_owned()
}

pub fn sanitize_for_sharing(snippet: &Snippet) -> Snippet {
    Snippet {
        file_path: anonymize_path(&snippet.file_path),
        code: remove_literals(&snippet.code),
        ..snippet.clone()
    }
}
