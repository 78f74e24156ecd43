//! Write-through demo process
//!
//! Stores one profile value in both datasources, then checks that the
//! cache copy expires while the table copy survives.

use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde_json::Value;
use tracing::info;

use crate::datasource::Datasource;

/// Key the demo writes
pub const PROFILE_KEY: &str = "user:12345:profile";

/// TTL of the cached copy
pub const CACHE_TTL: Duration = Duration::from_secs(5);

/// How long [`process`] waits for the cached copy to expire in the demo
pub const SETTLE: Duration = Duration::from_secs(7);

/// Run the demo against `cache` and `database`.
///
/// `database_ttl` is handed to the database write; `settle` is how long to
/// wait before checking that the cached copy expired and must exceed
/// `cache_ttl`.
pub fn process(
    cache: &dyn Datasource,
    database: &dyn Datasource,
    database_ttl: Duration,
    cache_ttl: Duration,
    settle: Duration,
) -> Result<()> {
    let profile = Value::String("best user, expired after 5 seconds".to_string());

    database
        .set(PROFILE_KEY, &profile, database_ttl)
        .context("database set failed")?;
    cache
        .set(PROFILE_KEY, &profile, cache_ttl)
        .context("cache set failed")?;

    let cached = cache.get(PROFILE_KEY).context("cache get failed")?;
    if cached.as_ref() != Some(&profile) {
        bail!("cached value does not match: {:?}", cached);
    }
    info!(key = PROFILE_KEY, "cache hit");

    thread::sleep(settle);

    if let Some(stale) = cache.get(PROFILE_KEY).context("cache get failed")? {
        bail!("unexpected cache hit after expiry: {}", stale);
    }
    info!(key = PROFILE_KEY, "cache entry expired");

    let stored = database.get(PROFILE_KEY).context("database get failed")?;
    if stored.as_ref() != Some(&profile) {
        bail!("database value does not match: {:?}", stored);
    }
    info!(key = PROFILE_KEY, "database still holds the value");

    Ok(())
}
