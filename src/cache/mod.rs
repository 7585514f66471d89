//! Asset cache with TTL.
//!
//! Two backends share one contract:
//!
//! - **disk**: one JSON file per key under the cache directory. Writes go to a
//!   temp file in the same directory and are renamed into place, so a reader
//!   sees either the old or the new entry, never a partial one. Several
//!   processes may share the directory; the last rename wins.
//! - **memory**: a process-local map, used when no cache path is configured.
//!
//! Expired entries read as absent. They are not removed until the key is
//! written again or the cache is cleared.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Options;
use crate::debug;
use crate::utils::hash::digest_hex;

/// Cache file extension.
const ENTRY_EXT: &str = "json";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("invalid cache directory `{0}`: {1}")]
    InvalidPath(PathBuf, String),

    #[error("cache IO error")]
    Io(#[from] io::Error),

    #[error("cache value could not be serialized")]
    Serialize(#[from] serde_json::Error),
}

/// On-disk (and in-memory) representation of one entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    /// Full key, checked on read so a file name collision never leaks data.
    key: String,
    /// Absolute expiry in milliseconds since the Unix epoch.
    expire_at: u64,
    value: serde_json::Value,
}

impl StoredEntry {
    #[inline]
    fn is_valid_at(&self, now: u64) -> bool {
        now < self.expire_at
    }
}

#[derive(Debug)]
enum Backend {
    Disk(PathBuf),
    Memory(Mutex<FxHashMap<String, StoredEntry>>),
}

/// Key/value store with per-entry expiry.
#[derive(Debug)]
pub struct AssetCache {
    backend: Backend,
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Cache key for a remote asset.
///
/// The requesting host is part of the key so that tenants of a multi-site
/// deployment never read each other's entries.
pub fn asset_key(kind: &str, url: &str, version: &str, host: &str) -> String {
    format!("{kind}|{version}|{}|{url}", host.to_ascii_lowercase())
}

impl AssetCache {
    /// Process-local cache.
    pub fn memory() -> Self {
        Self {
            backend: Backend::Memory(Mutex::new(FxHashMap::default())),
        }
    }

    /// Disk cache rooted at `dir`, created if missing.
    ///
    /// Fails when `dir` is not a directory or is not writable.
    pub fn on_disk(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        let invalid = |reason: String| CacheError::InvalidPath(dir.clone(), reason);

        if dir.exists() && !dir.is_dir() {
            return Err(invalid("not a directory".into()));
        }
        fs::create_dir_all(&dir).map_err(|e| invalid(e.to_string()))?;
        tempfile::NamedTempFile::new_in(&dir)
            .map_err(|e| invalid(format!("not writable: {e}")))?;

        Ok(Self {
            backend: Backend::Disk(dir),
        })
    }

    /// Backend selected by `offline_cache_path`.
    pub fn from_options(options: &Options) -> Result<Self, CacheError> {
        match options.cache_dir() {
            Some(dir) => Self::on_disk(dir),
            None => Ok(Self::memory()),
        }
    }

    pub fn is_disk(&self) -> bool {
        matches!(self.backend, Backend::Disk(_))
    }

    /// Read a value; missing, expired or unreadable entries are `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_at(key, now_millis())
    }

    /// [`get`](Self::get) evaluated at a given time.
    pub fn get_at<T: DeserializeOwned>(&self, key: &str, now: u64) -> Option<T> {
        let entry = match &self.backend {
            Backend::Disk(dir) => read_entry(&entry_path(dir, key))?,
            Backend::Memory(map) => map.lock().get(key).cloned()?,
        };
        if entry.key != key || !entry.is_valid_at(now) {
            return None;
        }
        serde_json::from_value(entry.value)
            .inspect_err(|e| debug!("cache"; "unreadable value for {}: {}", key, e))
            .ok()
    }

    /// Store a value valid for `ttl_secs` seconds from now.
    pub fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: u64,
    ) -> Result<(), CacheError> {
        let entry = StoredEntry {
            key: key.to_string(),
            expire_at: now_millis().saturating_add(ttl_secs.saturating_mul(1000)),
            value: serde_json::to_value(value)?,
        };
        match &self.backend {
            Backend::Disk(dir) => write_entry(dir, &entry_path(dir, key), &entry),
            Backend::Memory(map) => {
                map.lock().insert(key.to_string(), entry);
                Ok(())
            }
        }
    }

    pub fn delete(&self, key: &str) -> Result<(), CacheError> {
        match &self.backend {
            Backend::Disk(dir) => match fs::remove_file(entry_path(dir, key)) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            },
            Backend::Memory(map) => {
                map.lock().remove(key);
                Ok(())
            }
        }
    }

    /// Remove every entry, expired or not.
    pub fn clear(&self) -> Result<(), CacheError> {
        match &self.backend {
            Backend::Disk(dir) => {
                for item in fs::read_dir(dir)? {
                    let path = item?.path();
                    if path.extension().is_some_and(|e| e == ENTRY_EXT) {
                        fs::remove_file(&path)?;
                    }
                }
                Ok(())
            }
            Backend::Memory(map) => {
                map.lock().clear();
                Ok(())
            }
        }
    }
}

// =============================================================================
// Disk helpers
// =============================================================================

fn entry_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{}.{ENTRY_EXT}", digest_hex(key)))
}

fn read_entry(path: &Path) -> Option<StoredEntry> {
    let bytes = fs::read(path).ok()?;
    serde_json::from_slice(&bytes)
        .inspect_err(|e| debug!("cache"; "corrupt entry {}: {}", path.display(), e))
        .ok()
}

/// Write to a temp file next to the target, then rename over it.
fn write_entry(dir: &Path, path: &Path, entry: &StoredEntry) -> Result<(), CacheError> {
    let bytes = serde_json::to_vec(entry)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
