//! Catalog module
//!
//! This module contains the storage root catalog, table schemas, and column types.

pub mod catalog;
pub mod schema;
pub mod types;

pub use catalog::Catalog;
pub use schema::Schema;
pub use types::ColumnType;
