//! Key/value cache module
//!
//! An in-memory map with per-entry expiry, persisted as a JSON-lines log.

pub mod ttl_cache;

pub use ttl_cache::{CacheItem, TtlCache};
