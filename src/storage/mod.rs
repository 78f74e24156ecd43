//! Storage engine module
//!
//! Flat-file table storage: one text file per table under the storage
//! root, replaced atomically on every write.

pub mod table;

pub use table::{order_by, Row, Table};
