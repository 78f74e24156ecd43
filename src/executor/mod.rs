//! Query execution module
//!
//! This module contains the executable command form and the executor.

pub mod command;
pub mod executor;

pub use command::Command;
pub use executor::{QueryExecutor, QueryResult};
