//! Content-addressed cache with TTL and producer key dimensions.
//!
//! Entries live one per file as `<cache_dir>/<sha256(content)>.json`. An entry
//! only answers a read whose producer id and version both match what was
//! stored, and only while it is younger than the TTL. Anything else is
//! deleted on sight and reported as a miss.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{Config, DEFAULT_CACHE_TTL_SECONDS};
use crate::errors::{ReviewError, ReviewResult};
use crate::indexer::filesystem::sha256_hex;
use crate::store::snapshot::CACHE_DIR;

const ENTRY_EXTENSION: &str = "json";
const HASH_LEN: usize = 64;

fn is_content_hash(value: &str) -> bool {
    value.len() == HASH_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub code_hash: String,
    pub payload: serde_json::Value,
    /// Creation time in milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub producer_id: String,
    pub producer_version: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub count: usize,
    pub total_size: u64,
    /// Age of the least recently written entry.
    pub oldest_age: Option<Duration>,
}

#[derive(Clone, Debug)]
pub struct ContentCache {
    dir: PathBuf,
    ttl: Duration,
}

impl ContentCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_ttl(dir, Duration::from_secs(DEFAULT_CACHE_TTL_SECONDS))
    }

    pub fn with_ttl(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    /// Cache under the configured storage directory of `project_root`.
    pub fn for_project(config: &Config, project_root: &Path) -> Self {
        Self::with_ttl(
            config.storage_path(project_root).join(CACHE_DIR),
            config.cache_ttl(),
        )
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Storage key for `content`.
    pub fn hash(content: &str) -> String {
        sha256_hex(content.as_bytes())
    }

    fn entry_path(&self, hash: &str) -> PathBuf {
        self.dir.join(format!("{hash}.{ENTRY_EXTENSION}"))
    }

    pub fn get<T: DeserializeOwned>(
        &self,
        content: &str,
        producer_id: &str,
        producer_version: &str,
    ) -> Option<T> {
        let hash = Self::hash(content);
        let path = self.entry_path(&hash);
        let raw = fs::read_to_string(&path).ok()?;

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Dropping unreadable cache entry {hash}: {e}");
                self.discard(&hash);
                return None;
            }
        };

        if entry.code_hash != hash
            || entry.producer_id != producer_id
            || entry.producer_version != producer_version
        {
            debug!("Cache key mismatch for {hash}");
            self.discard(&hash);
            return None;
        }

        if self.is_expired(&entry) {
            debug!("Cache entry {hash} expired");
            self.discard(&hash);
            return None;
        }

        match serde_json::from_value(entry.payload) {
            Ok(payload) => Some(payload),
            Err(e) => {
                debug!("Dropping cache entry {hash} with unexpected payload: {e}");
                self.discard(&hash);
                None
            }
        }
    }

    pub fn set<T: Serialize>(
        &self,
        content: &str,
        payload: &T,
        producer_id: &str,
        producer_version: &str,
    ) -> ReviewResult<()> {
        let hash = Self::hash(content);
        let entry = CacheEntry {
            code_hash: hash.clone(),
            payload: serde_json::to_value(payload)?,
            timestamp: Utc::now().timestamp_millis(),
            producer_id: producer_id.to_string(),
            producer_version: producer_version.to_string(),
        };
        fs::create_dir_all(&self.dir)?;
        fs::write(self.entry_path(&hash), serde_json::to_string_pretty(&entry)?)?;
        Ok(())
    }

    /// Remove the entry stored under `hash`; removing a missing entry is fine.
    /// Anything other than a lowercase SHA-256 hex digest is rejected.
    pub fn delete(&self, hash: &str) -> ReviewResult<()> {
        if !is_content_hash(hash) {
            return Err(ReviewError::Config(format!("invalid cache key '{hash}'")));
        }
        match fs::remove_file(self.entry_path(hash)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove every entry. A missing or empty cache directory is not an error.
    pub fn clear(&self) -> ReviewResult<()> {
        for path in self.entry_files() {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    pub fn stats(&self) -> CacheStats {
        let now = SystemTime::now();
        let mut stats = CacheStats::default();
        for path in self.entry_files() {
            let Ok(meta) = fs::metadata(&path) else {
                continue;
            };
            stats.count += 1;
            stats.total_size += meta.len();
            let age = meta
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .unwrap_or_default();
            stats.oldest_age = Some(stats.oldest_age.map_or(age, |oldest| oldest.max(age)));
        }
        stats
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        let age_ms = Utc::now().timestamp_millis().saturating_sub(entry.timestamp);
        let age = Duration::from_millis(u64::try_from(age_ms).unwrap_or(0));
        age >= self.ttl
    }

    fn discard(&self, hash: &str) {
        if let Err(e) = self.delete(hash) {
            warn!("Failed to remove cache entry {hash}: {e}");
        }
    }

    fn entry_files(&self) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .map(|ext| ext == ENTRY_EXTENSION)
                        .unwrap_or(false)
            })
            .collect()
    }
}
