//! Database handle
//!
//! [`Database`] ties the catalog, the executor and the transaction manager
//! to one storage root. Mutations go through transactions; `query` and
//! `query_row` read table files directly and never wait for the
//! transaction slot.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::catalog::{Catalog, Schema};
use crate::error::{Error, Result};
use crate::executor::{Command, QueryExecutor, QueryResult};
use crate::sql::parse;
use crate::storage::{Row, Table};
use crate::transaction::{TransactionGuard, TransactionManager};

/// An open storage root
#[derive(Debug)]
pub struct Database {
    executor: QueryExecutor,
    transactions: TransactionManager,
}

impl Database {
    /// Open (creating if needed) the storage root at `root`
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let catalog = Catalog::new(root);
        catalog.ensure_root()?;
        debug!(root = %catalog.root().display(), "opened database");

        let executor = QueryExecutor::new(catalog);
        Ok(Self {
            transactions: TransactionManager::new(executor.clone()),
            executor,
        })
    }

    /// Storage root
    pub fn root(&self) -> &Path {
        self.executor.catalog().root()
    }

    /// Begin a transaction, waiting while another one is open
    pub fn begin(&self) -> u64 {
        self.transactions.begin()
    }

    /// Begin a transaction that rolls back if dropped unfinished
    pub fn transaction(&self) -> TransactionGuard<'_> {
        self.transactions.transaction()
    }

    /// Begin a transaction, failing with `TransactionInProgress` while
    /// another one is open
    pub fn try_begin(&self) -> Result<u64> {
        self.transactions.try_begin()
    }

    /// Queue a statement in transaction `trans_id`
    pub fn exec(&self, trans_id: u64, sql: &str) -> Result<()> {
        self.transactions.exec(trans_id, sql)
    }

    /// Statements queued in `trans_id`, in run order
    pub fn pending(&self, trans_id: u64) -> Result<Vec<Command>> {
        self.transactions.pending(trans_id)
    }

    /// Run every queued statement of `trans_id`, all or nothing
    pub fn commit(&self, trans_id: u64) -> Result<Vec<QueryResult>> {
        self.transactions.commit(trans_id)
    }

    /// Discard transaction `trans_id`
    pub fn rollback(&self, trans_id: u64) -> Result<()> {
        self.transactions.rollback(trans_id)
    }

    /// Id of the open transaction, if any
    pub fn active_transaction(&self) -> Option<u64> {
        self.transactions.active_id()
    }

    /// Run one mutating statement in its own transaction
    pub fn execute(&self, sql: &str) -> Result<QueryResult> {
        let trans = self.transaction();
        trans.exec(sql)?;
        let mut results = trans.commit()?;
        Ok(results.pop().unwrap_or_else(QueryResult::empty))
    }

    /// Run a SELECT outside any transaction
    pub fn query(&self, sql: &str) -> Result<QueryResult> {
        let command = Command::from(parse(sql)?);
        if !command.is_read_only() {
            return Err(Error::UnsupportedOperation(format!(
                "{} outside a transaction; use begin/exec/commit",
                command
            )));
        }
        self.executor.run(&command)
    }

    /// First data row of a SELECT
    pub fn query_row(&self, sql: &str) -> Result<Row> {
        self.query(sql)?
            .rows
            .into_iter()
            .next()
            .ok_or(Error::NoRows)
    }

    /// Whether a table file named `name` exists
    pub fn table_exists(&self, name: &str) -> bool {
        self.executor.catalog().table_exists(name)
    }

    /// Get all table names, sorted
    pub fn list_tables(&self) -> Result<Vec<String>> {
        self.executor.catalog().list_tables()
    }

    /// Structure of `table`
    pub fn schema(&self, table: &str) -> Result<Schema> {
        Table::open(self.executor.catalog(), table)?.read_structure()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_query_bypasses_open_transaction() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("db")).unwrap();
        db.execute("CREATE TABLE t (id, name) WITH TYPES (int64, string)")
            .unwrap();
        db.execute("INSERT INTO t (id, name) VALUES (1, 'Alice')")
            .unwrap();

        let id = db.begin();
        db.exec(id, "DELETE FROM t").unwrap();
        assert_eq!(
            db.query_row("SELECT name FROM t WHERE id = 1").unwrap(),
            vec!["Alice".to_string()]
        );
        db.commit(id).unwrap();

        assert!(matches!(
            db.query_row("SELECT name FROM t WHERE id = 1"),
            Err(Error::NoRows)
        ));
    }

    #[test]
    fn test_pending_before_commit() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path()).unwrap();

        let id = db.begin();
        db.exec(id, "CREATE TABLE t (id) WITH TYPES (int64)").unwrap();
        db.exec(id, "INSERT INTO t (id) VALUES (1), (2)").unwrap();
        let pending = db.pending(id).unwrap();
        assert_eq!(pending.len(), 2);
        assert!(matches!(
            pending[1],
            Command::Insert { ref rows, .. } if rows.len() == 2
        ));
        assert!(!db.table_exists("t"));

        db.commit(id).unwrap();
        assert!(db.table_exists("t"));
        assert!(matches!(db.pending(id), Err(Error::TransactionNotFound(_))));
    }

    #[test]
    fn test_query_rejects_mutations() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path()).unwrap();
        assert!(matches!(
            db.query("DELETE FROM t"),
            Err(Error::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_execute_failure_releases_slot() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path()).unwrap();
        assert!(db.execute("INSERT INTO t (id) VALUES").is_err());
        assert!(db.execute("INSERT INTO missing (id) VALUES (1)").is_err());
        assert!(db.active_transaction().is_none());
        assert!(db.list_tables().unwrap().is_empty());
    }
}
