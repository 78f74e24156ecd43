//! Configuration file support
//!
//! Loads the JSON configuration naming the storage root, the cache log and
//! the default cache TTL:
//!
//! ```json
//! {
//!   "path": {
//!     "databaseFilePath": "./data/db/",
//!     "cacheFilePath": "./data/cache/",
//!     "fileName": "cache.log"
//!   },
//!   "expirationTimeCache": 60
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Where things are stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathConfig {
    /// Storage root of the table store
    #[serde(default = "default_database_path")]
    pub database_file_path: String,

    /// Directory of the cache log
    #[serde(default = "default_cache_path")]
    pub cache_file_path: String,

    /// File name of the cache log
    #[serde(default = "default_file_name")]
    pub file_name: String,
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub path: PathConfig,

    /// Default cache TTL in seconds
    #[serde(default = "default_expiration")]
    pub expiration_time_cache: u64,
}

fn default_database_path() -> String {
    "./data/db/".to_string()
}

fn default_cache_path() -> String {
    "./data/cache/".to_string()
}

fn default_file_name() -> String {
    "cache.log".to_string()
}

fn default_expiration() -> u64 {
    60
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            database_file_path: default_database_path(),
            cache_file_path: default_cache_path(),
            file_name: default_file_name(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathConfig::default(),
            expiration_time_cache: default_expiration(),
        }
    }
}

impl Config {
    /// Loads configuration from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Full path of the cache log
    pub fn cache_log_path(&self) -> PathBuf {
        Path::new(&self.path.cache_file_path).join(&self.path.file_name)
    }

    /// Storage root of the table store
    pub fn database_root(&self) -> PathBuf {
        PathBuf::from(&self.path.database_file_path)
    }

    /// Default cache TTL
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.expiration_time_cache)
    }
}
