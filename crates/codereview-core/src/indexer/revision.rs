//! Revision-control collaborator.
//!
//! Both lookups are best effort: a missing binary, a directory outside any
//! repository or an unknown baseline all come back as
//! [`Lookup::Unavailable`], never as an error.

use std::path::Path;
use std::process::Command;

use tracing::debug;

/// Outcome of a best-effort external lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lookup<T> {
    Value(T),
    /// Why the value could not be obtained.
    Unavailable(String),
}

impl<T> Lookup<T> {
    pub fn value(self) -> Option<T> {
        match self {
            Lookup::Value(v) => Some(v),
            Lookup::Unavailable(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Lookup::Value(_))
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Lookup<U> {
        match self {
            Lookup::Value(v) => Lookup::Value(f(v)),
            Lookup::Unavailable(reason) => Lookup::Unavailable(reason),
        }
    }
}

pub trait RevisionControl: Send + Sync {
    /// Identifier of the revision currently checked out under `root`.
    fn current_revision(&self, root: &Path) -> Lookup<String>;

    /// Paths, relative to `root`, changed between `baseline` and the current
    /// revision.
    fn changed_files(&self, root: &Path, baseline: &str) -> Lookup<Vec<String>>;
}

/// [`RevisionControl`] backed by the `git` command line.
#[derive(Clone, Copy, Debug, Default)]
pub struct GitCli;

impl GitCli {
    pub fn new() -> Self {
        Self
    }

    fn run_command(&self, root: &Path, args: &[&str]) -> Lookup<String> {
        let output = match Command::new("git").args(args).current_dir(root).output() {
            Ok(output) => output,
            Err(e) => return Lookup::Unavailable(format!("failed to run git: {e}")),
        };

        if output.status.success() {
            Lookup::Value(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            debug!("git {} failed: {stderr}", args.join(" "));
            Lookup::Unavailable(stderr)
        }
    }
}

impl RevisionControl for GitCli {
    fn current_revision(&self, root: &Path) -> Lookup<String> {
        match self.run_command(root, &["rev-parse", "HEAD"]) {
            Lookup::Value(out) => {
                let hash = out.trim().to_string();
                if hash.is_empty() {
                    Lookup::Unavailable("git rev-parse returned nothing".to_string())
                } else {
                    Lookup::Value(hash)
                }
            }
            unavailable => unavailable,
        }
    }

    /// Renames are reported as a deletion of the old path plus an addition
    /// of the new one. Paths come back verbatim, without git's C-quoting.
    fn changed_files(&self, root: &Path, baseline: &str) -> Lookup<Vec<String>> {
        self.run_command(
            root,
            &[
                "-c",
                "core.quotepath=off",
                "diff",
                "--name-only",
                "-z",
                "--no-renames",
                "--relative",
                baseline,
                "HEAD",
            ],
        )
        .map(|out| parse_name_list(&out))
    }
}

/// Split NUL-terminated `git diff --name-only -z` output into paths.
fn parse_name_list(output: &str) -> Vec<String> {
    output
        .split('\0')
        .filter(|path| !path.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lookup_helpers() {
        let found: Lookup<u32> = Lookup::Value(2);
        assert!(found.is_available());
        assert_eq!(found.clone().map(|v| v * 2), Lookup::Value(4));
        assert_eq!(found.value(), Some(2));

        let missing: Lookup<u32> = Lookup::Unavailable("no repo".to_string());
        assert!(!missing.is_available());
        assert_eq!(missing.value(), None);
    }

    #[test]
    fn test_outside_repository_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let git = GitCli::new();
        // Holds whether or not git is installed.
        assert!(!git.current_revision(dir.path()).is_available());
        assert!(!git.changed_files(dir.path(), "deadbeef").is_available());
    }

    #[test]
    fn test_name_list_keeps_paths_verbatim() {
        let out = "src/caf\u{e9}.ts\0src/with space.ts\0src/line\nbreak.ts\0";
        assert_eq!(
            parse_name_list(out),
            vec!["src/caf\u{e9}.ts", "src/with space.ts", "src/line\nbreak.ts"]
        );
        assert!(parse_name_list("").is_empty());
    }

    #[test]
    fn test_missing_directory_is_unavailable() {
        let git = GitCli::new();
        let lookup = git.current_revision(Path::new("/definitely/not/a/dir"));
        assert!(matches!(lookup, Lookup::Unavailable(_)));
    }
}
