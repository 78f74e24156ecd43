//! flatdb - demo runner
//!
//! Usage: `flatdb-demo [config.json]`

use std::fs;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use flatdb::app::{self, CACHE_TTL, SETTLE};
use flatdb::config::Config;
use flatdb::database::Database;
use flatdb::datasource::{CacheDatasource, DatabaseDatasource};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("flatdb=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_logging();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.json".to_string());
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to read config '{}'", config_path))?;

    let cache_log = config.cache_log_path();
    if let Some(dir) = cache_log.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create cache directory '{}'", dir.display()))?;
    }

    let cache = CacheDatasource::open(&cache_log);
    let db = Database::open(config.database_root()).with_context(|| {
        format!(
            "failed to open database at '{}'",
            config.database_root().display()
        )
    })?;
    let database = DatabaseDatasource::new(db);

    app::process(&cache, &database, config.cache_ttl(), CACHE_TTL, SETTLE)?;

    info!("demo finished");
    println!("Success!");
    Ok(())
}
