//! Explicit logging configuration handed to each component at construction.

use std::path::Path;

use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;

use crate::errors::ReviewError;

/// Logging switches for one component. Components never consult a global
/// verbose flag; they carry a copy of this instead.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LogConfig {
    pub verbose: bool,
}

impl LogConfig {
    pub fn verbose() -> Self {
        Self { verbose: true }
    }

    /// Install a fmt subscriber for binaries and tests. `RUST_LOG` takes
    /// precedence; otherwise `debug` when verbose and `warn` when not.
    /// Calling this more than once is harmless.
    pub fn install(&self) {
        let fallback = if self.verbose { "debug" } else { "warn" };
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init();
    }

    /// Per-file progress, only emitted in verbose mode.
    pub fn progress(&self, message: &str) {
        if self.verbose {
            debug!("{message}");
        }
    }

    /// A file that was skipped by a batch operation.
    pub fn skipped_file(&self, path: &Path, err: &ReviewError) {
        if err.is_file_level() {
            warn!("Skipping {}: {err}", path.display());
        } else {
            error!("Skipping {} after unexpected failure: {err}", path.display());
        }
    }
}
