//! Error types for the code review core library.

/// Top-level error enum for the code review core library.
///
/// Only parse, I/O, configuration and provider failures are represented here.
/// Missing or corrupt snapshots, cache misses and unavailable revision control
/// are ordinary results (`None`, a miss, `Lookup::Unavailable`), not errors.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("Parse error in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Review provider error: {0}")]
    Provider(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReviewError {
    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        ReviewError::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// True for per-file failures that a batch should skip rather than abort on.
    pub fn is_file_level(&self) -> bool {
        matches!(self, ReviewError::Parse { .. } | ReviewError::Io(_))
    }
}

pub type ReviewResult<T> = Result<T, ReviewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_names_the_file() {
        let err = ReviewError::parse("src/a.ts", "syntax error at line 3");
        assert_eq!(
            err.to_string(),
            "Parse error in src/a.ts: syntax error at line 3"
        );
        assert!(err.is_file_level());
    }

    #[test]
    fn config_errors_are_not_file_level() {
        let err = ReviewError::Config("unknown category 'handler'".to_string());
        assert!(!err.is_file_level());
    }
}
