//! Cache-backed datasource

use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;

use super::Datasource;
use crate::cache::TtlCache;
use crate::error::Result;

/// Stores values as JSON text in a [`TtlCache`]
#[derive(Debug)]
pub struct CacheDatasource {
    cache: TtlCache,
}

impl CacheDatasource {
    /// Open the cache logged at `path`
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(TtlCache::open(path))
    }

    pub fn new(cache: TtlCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &TtlCache {
        &self.cache
    }
}

impl Datasource for CacheDatasource {
    fn set(&self, key: &str, value: &Value, ttl: Duration) -> Result<()> {
        let text = serde_json::to_string(value)?;
        self.cache.set(key, text, ttl)
    }

    fn get(&self, key: &str) -> Result<Option<Value>> {
        match self.cache.get(key) {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }
}
