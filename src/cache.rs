//! Per-file offense cache.
//!
//! An entry is reused only when both the file contents and the run
//! configuration hash to the values it was written with.

use crate::digest::sha256_hex;
use crate::fs::FileSystem;
use crate::model::Offense;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Corrupt cache entry {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to encode cache entry: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Cache lock poisoned")]
    Poisoned,
}

/// What a cached result is valid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheKey<'a> {
    pub file: &'a str,
    pub content_digest: &'a str,
    pub config_digest: &'a str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub file: String,
    pub content_digest: String,
    pub config_digest: String,
    pub offenses: Vec<Offense>,
}

impl CacheEntry {
    fn new(key: &CacheKey<'_>, offenses: &[Offense]) -> Self {
        Self {
            file: key.file.to_string(),
            content_digest: key.content_digest.to_string(),
            config_digest: key.config_digest.to_string(),
            offenses: offenses.to_vec(),
        }
    }

    fn matches(&self, key: &CacheKey<'_>) -> bool {
        self.file == key.file
            && self.content_digest == key.content_digest
            && self.config_digest == key.config_digest
    }
}

/// Must tolerate concurrent `get`/`put` from the worker pool.
pub trait Cache: Send + Sync {
    fn get(&self, key: &CacheKey<'_>) -> Result<Option<Vec<Offense>>, CacheError>;
    fn put(&self, key: &CacheKey<'_>, offenses: &[Offense]) -> Result<(), CacheError>;
}

/// One JSON file per source file under the cache directory.
///
/// Writes go to a unique temporary file first and are renamed into place,
/// so a concurrent reader sees either the old or the new entry.
pub struct DiskCache {
    directory: PathBuf,
    fs: Arc<dyn FileSystem>,
    temp_counter: AtomicU64,
}

impl DiskCache {
    pub fn new(directory: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            directory: directory.into(),
            fs,
            temp_counter: AtomicU64::new(0),
        }
    }

    fn entry_path(&self, file: &str) -> PathBuf {
        self.directory
            .join(format!("{}.json", sha256_hex(file.as_bytes())))
    }

    fn temp_path(&self, entry: &Path) -> PathBuf {
        let n = self.temp_counter.fetch_add(1, Ordering::Relaxed);
        entry.with_extension(format!("json.{}.{}.tmp", std::process::id(), n))
    }
}

impl Cache for DiskCache {
    fn get(&self, key: &CacheKey<'_>) -> Result<Option<Vec<Offense>>, CacheError> {
        let path = self.entry_path(key.file);
        if !self.fs.exists(&path) {
            return Ok(None);
        }

        let content = self
            .fs
            .read_to_string(&path)
            .map_err(|source| CacheError::Io {
                path: path.clone(),
                source,
            })?;
        let entry: CacheEntry =
            serde_json::from_str(&content).map_err(|source| CacheError::Corrupt { path, source })?;

        Ok(entry.matches(key).then_some(entry.offenses))
    }

    fn put(&self, key: &CacheKey<'_>, offenses: &[Offense]) -> Result<(), CacheError> {
        let path = self.entry_path(key.file);
        let temp = self.temp_path(&path);
        let encoded = serde_json::to_string(&CacheEntry::new(key, offenses))?;

        self.fs
            .write(&temp, &encoded)
            .map_err(|source| CacheError::Io {
                path: temp.clone(),
                source,
            })?;
        self.fs.rename(&temp, &path).map_err(|source| {
            let _ = self.fs.remove_file(&temp);
            CacheError::Io { path, source }
        })
    }
}

/// In-process cache, mostly for tests.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &CacheKey<'_>) -> Result<Option<Vec<Offense>>, CacheError> {
        let entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        Ok(entries
            .get(key.file)
            .filter(|entry| entry.matches(key))
            .map(|entry| entry.offenses.clone()))
    }

    fn put(&self, key: &CacheKey<'_>, offenses: &[Offense]) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        entries.insert(key.file.to_string(), CacheEntry::new(key, offenses));
        Ok(())
    }
}
