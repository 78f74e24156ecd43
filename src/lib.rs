//! flatdb - a minimal embedded relational store written in Rust
//!
//! This library provides:
//! - SQL parsing (lexer, parser, single-clause predicates)
//! - Flat-file table storage with atomic whole-file replacement
//! - Query execution over a storage root
//! - Single-slot transactions with all-or-nothing commit
//! - A TTL cache and a key/value datasource layer on top of both

pub mod app;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod database;
pub mod datasource;
pub mod error;
pub mod executor;
pub mod sql;
pub mod storage;
pub mod transaction;

pub use database::Database;
pub use error::{Error, Result};
