//! Datasources
//!
//! A [`Datasource`] stores JSON values under string keys. The cache and the
//! table store both implement it, so callers can write through one and
//! fall back to the other.

pub mod cache;
pub mod database;

use std::time::Duration;

use serde_json::Value;

use crate::error::Result;

pub use cache::CacheDatasource;
pub use database::DatabaseDatasource;

/// Key/value access to a backing store
pub trait Datasource {
    /// Store `value` under `key`. Stores without expiry ignore `ttl`.
    fn set(&self, key: &str, value: &Value, ttl: Duration) -> Result<()>;

    /// Value under `key`, or `None` when absent or expired
    fn get(&self, key: &str) -> Result<Option<Value>>;
}
