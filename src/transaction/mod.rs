//! Transaction module
//!
//! Single-slot transactions over queued commands.

pub mod transaction;

pub use transaction::{TransactionGuard, TransactionManager};
