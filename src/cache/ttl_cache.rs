//! TTL cache
//!
//! Every `set` rewrites the whole log, one JSON object per line:
//!
//! ```text
//! {"key":"user:1","value":"\"Alice\"","expires_at_ms":1700000005000}
//! ```
//!
//! Expired entries are dropped lazily by `get` and skipped when the log is
//! loaded.

use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::storage::table::parent_dir;

/// A cached value and its expiry time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheItem {
    pub value: String,
    /// Unix time in milliseconds
    pub expires_at_ms: u64,
}

impl CacheItem {
    fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

/// One line of the log
#[derive(Debug, Serialize, Deserialize)]
struct LogLine {
    key: String,
    value: String,
    expires_at_ms: u64,
}

/// Thread-safe cache with expiring entries
#[derive(Debug)]
pub struct TtlCache {
    path: PathBuf,
    items: RwLock<IndexMap<String, CacheItem>>,
}

impl TtlCache {
    /// Open the cache logged at `path`.
    ///
    /// A missing log is an empty cache. A log that cannot be read is
    /// reported and ignored; the next `set` overwrites it.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::load(&path) {
            Ok(cache) => cache,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring unreadable cache log");
                Self {
                    path,
                    items: RwLock::new(IndexMap::new()),
                }
            }
        }
    }

    /// Load the cache logged at `path`, failing on a malformed log
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        let now = now_ms();
        let mut items = IndexMap::new();
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let entry: LogLine = serde_json::from_str(line)
                .map_err(|e| Error::CorruptedLog(format!("line {}: {}", number + 1, e)))?;
            let item = CacheItem {
                value: entry.value,
                expires_at_ms: entry.expires_at_ms,
            };
            if !item.is_expired(now) {
                items.insert(entry.key, item);
            }
        }

        debug!(path = %path.display(), entries = items.len(), "loaded cache log");
        Ok(Self {
            path: path.to_path_buf(),
            items: RwLock::new(items),
        })
    }

    /// Path of the log
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store `value` under `key` for `ttl`, then persist the log
    pub fn set(&self, key: &str, value: impl Into<String>, ttl: Duration) -> Result<()> {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        let item = CacheItem {
            value: value.into(),
            expires_at_ms: now_ms().saturating_add(ttl_ms),
        };

        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items.insert(key.to_string(), item);
        self.save(&items)?;
        debug!(key, ttl_ms, "cached value");
        Ok(())
    }

    /// Live value under `key`. An expired entry is evicted.
    pub fn get(&self, key: &str) -> Option<String> {
        let now = now_ms();
        {
            let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
            match items.get(key) {
                None => return None,
                Some(item) if !item.is_expired(now) => return Some(item.value.clone()),
                Some(_) => {}
            }
        }

        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        if items.get(key).map_or(false, |item| item.is_expired(now)) {
            items.shift_remove(key);
            debug!(key, "evicted expired entry");
        }
        None
    }

    /// Whether `key` is held in memory, expired or not
    pub fn contains(&self, key: &str) -> bool {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Number of entries held, expired or not
    pub fn len(&self) -> usize {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn save(&self, items: &IndexMap<String, CacheItem>) -> Result<()> {
        let mut tmp = NamedTempFile::new_in(parent_dir(&self.path))?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            for (key, item) in items {
                let line = LogLine {
                    key: key.clone(),
                    value: item.value.clone(),
                    expires_at_ms: item.expires_at_ms,
                };
                serde_json::to_writer(&mut writer, &line)?;
                writeln!(writer)?;
            }
            writer.flush()?;
        }
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
