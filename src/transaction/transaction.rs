//! Transaction Manager
//!
//! Handles transaction lifecycle (Begin, Exec, Commit, Rollback). There is a
//! single transaction slot per storage root: `begin` waits for it and
//! `try_begin` fails while it is taken.
//!
//! [`TransactionManager::transaction`] wraps the id in a [`TransactionGuard`]
//! that rolls back when it is dropped without `commit` or `rollback`.
//!
//! `exec` only queues parsed commands. `commit` runs the queue in order and,
//! if any command fails, puts every touched table file back the way it was
//! before the commit started.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::executor::{Command, QueryExecutor, QueryResult};
use crate::sql::parse;
use crate::storage::table::parent_dir;

/// Transaction State
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransactionState {
    Active,
    Committed,
    RolledBack,
}

/// Transaction Context
#[derive(Debug)]
struct Transaction {
    id: u64,
    state: TransactionState,
    commands: Vec<Command>,
}

impl Transaction {
    fn new(id: u64) -> Self {
        Self {
            id,
            state: TransactionState::Active,
            commands: Vec::new(),
        }
    }
}

#[derive(Debug)]
struct Slot {
    open: Option<Transaction>,
    next_trans_id: u64,
}

/// Transaction Manager
#[derive(Debug)]
pub struct TransactionManager {
    executor: QueryExecutor,
    slot: Mutex<Slot>,
    released: Condvar,
}

/// File content of a table before the commit touched it; `None` when the
/// table did not exist yet
type Snapshot = Option<Vec<u8>>;

impl TransactionManager {
    /// Create a new transaction manager
    pub fn new(executor: QueryExecutor) -> Self {
        Self {
            executor,
            slot: Mutex::new(Slot {
                open: None,
                next_trans_id: 1,
            }),
            released: Condvar::new(),
        }
    }

    /// Begin a new transaction, waiting for the open one to finish
    pub fn begin(&self) -> u64 {
        let mut slot = self.lock_slot();
        while slot.open.is_some() {
            slot = self
                .released
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
        Self::open(&mut slot)
    }

    /// Begin a new transaction held by a guard
    pub fn transaction(&self) -> TransactionGuard<'_> {
        TransactionGuard {
            manager: self,
            id: self.begin(),
            finished: false,
        }
    }

    /// Begin a new transaction unless one is already open
    pub fn try_begin(&self) -> Result<u64> {
        let mut slot = self.lock_slot();
        if let Some(open) = &slot.open {
            return Err(Error::TransactionInProgress(open.id));
        }
        Ok(Self::open(&mut slot))
    }

    /// Queue a statement in the transaction
    pub fn exec(&self, trans_id: u64, sql: &str) -> Result<()> {
        let mut slot = self.lock_slot();
        let trans = Self::active_mut(&mut slot, trans_id)?;

        let command = Command::from(parse(sql)?);
        if command.is_read_only() {
            return Err(Error::UnsupportedOperation(
                "SELECT inside a transaction; use query instead".to_string(),
            ));
        }

        debug!(trans_id, command = %command, "queued command");
        trans.commands.push(command);
        Ok(())
    }

    /// Commands queued in the transaction, in run order
    pub fn pending(&self, trans_id: u64) -> Result<Vec<Command>> {
        let mut slot = self.lock_slot();
        Ok(Self::active_mut(&mut slot, trans_id)?.commands.clone())
    }

    /// Commit a transaction, returning one result per queued command
    pub fn commit(&self, trans_id: u64) -> Result<Vec<QueryResult>> {
        let mut slot = self.lock_slot();
        Self::active_mut(&mut slot, trans_id)?;
        let mut trans = match slot.open.take() {
            Some(trans) => trans,
            None => return Err(Error::TransactionNotFound(trans_id)),
        };

        // The slot stays locked while the queue runs
        let outcome = self.apply(&trans);
        trans.state = match outcome {
            Ok(_) => TransactionState::Committed,
            Err(_) => TransactionState::RolledBack,
        };
        drop(slot);
        self.released.notify_all();

        debug!(trans_id, state = ?trans.state, "transaction finished");
        match &outcome {
            Ok(results) => info!(trans_id, commands = results.len(), "committed transaction"),
            Err(err) => warn!(trans_id, error = %err, "commit failed, transaction rolled back"),
        }
        outcome
    }

    /// Rollback a transaction, discarding its queue
    pub fn rollback(&self, trans_id: u64) -> Result<()> {
        let mut slot = self.lock_slot();
        Self::active_mut(&mut slot, trans_id)?;
        if let Some(mut trans) = slot.open.take() {
            trans.state = TransactionState::RolledBack;
            info!(
                trans_id,
                state = ?trans.state,
                discarded = trans.commands.len(),
                "rolled back transaction"
            );
        }
        drop(slot);
        self.released.notify_all();
        Ok(())
    }

    /// Id of the open transaction, if any
    pub fn active_id(&self) -> Option<u64> {
        self.lock_slot().open.as_ref().map(|t| t.id)
    }

    fn lock_slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn open(slot: &mut Slot) -> u64 {
        let trans_id = slot.next_trans_id;
        slot.next_trans_id += 1;
        slot.open = Some(Transaction::new(trans_id));
        info!(trans_id, "began transaction");
        trans_id
    }

    fn active_mut(slot: &mut Slot, trans_id: u64) -> Result<&mut Transaction> {
        match slot.open.as_mut() {
            Some(trans) if trans.id == trans_id => Ok(trans),
            _ => Err(Error::TransactionNotFound(trans_id)),
        }
    }

    /// Run every command, restoring all touched tables on the first failure
    fn apply(&self, trans: &Transaction) -> Result<Vec<QueryResult>> {
        let mut snapshots: IndexMap<String, Snapshot> = IndexMap::new();
        let mut results = Vec::with_capacity(trans.commands.len());

        for command in &trans.commands {
            let step = self.snapshot(&mut snapshots, command.table()).and_then(|_| {
                self.executor.run(command)
            });
            match step {
                Ok(result) => results.push(result),
                Err(err) => return Err(self.restore_all(&snapshots, err)),
            }
        }
        Ok(results)
    }

    /// Put every snapshot back; a failed restore wraps `cause` so the caller
    /// knows the store may hold part of the commit
    fn restore_all(&self, snapshots: &IndexMap<String, Snapshot>, cause: Error) -> Error {
        let catalog = self.executor.catalog();
        let mut failed = None;
        for (table, snapshot) in snapshots {
            let restored = catalog
                .table_path(table)
                .and_then(|path| restore(&path, snapshot.as_deref()));
            if let Err(restore_err) = restored {
                warn!(table = %table, error = %restore_err, "failed to restore table");
                failed.get_or_insert((table.clone(), restore_err));
            }
        }
        match failed {
            Some((table, restore_err)) => Error::RestoreFailed {
                table,
                cause: Box::new(cause),
                restore: Box::new(restore_err),
            },
            None => cause,
        }
    }

    fn snapshot(&self, snapshots: &mut IndexMap<String, Snapshot>, table: &str) -> Result<()> {
        if snapshots.contains_key(table) {
            return Ok(());
        }
        let path = self.executor.catalog().table_path(table)?;
        let snapshot = match fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        snapshots.insert(table.to_string(), snapshot);
        Ok(())
    }
}

/// Transaction handle that rolls back on drop unless committed or rolled back
#[derive(Debug)]
pub struct TransactionGuard<'a> {
    manager: &'a TransactionManager,
    id: u64,
    finished: bool,
}

impl TransactionGuard<'_> {
    /// Transaction id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Queue a statement
    pub fn exec(&self, sql: &str) -> Result<()> {
        self.manager.exec(self.id, sql)
    }

    /// Commands queued so far
    pub fn pending(&self) -> Result<Vec<Command>> {
        self.manager.pending(self.id)
    }

    /// Run the queue, all or nothing
    pub fn commit(mut self) -> Result<Vec<QueryResult>> {
        self.finished = true;
        self.manager.commit(self.id)
    }

    /// Discard the queue
    pub fn rollback(mut self) -> Result<()> {
        self.finished = true;
        self.manager.rollback(self.id)
    }
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(err) = self.manager.rollback(self.id) {
            debug!(trans_id = self.id, error = %err, "dropped transaction was already closed");
        }
    }
}

fn restore(path: &Path, snapshot: Option<&[u8]>) -> Result<()> {
    match snapshot {
        Some(bytes) => {
            let mut tmp = NamedTempFile::new_in(parent_dir(path))?;
            tmp.write_all(bytes)?;
            tmp.as_file().sync_all()?;
            tmp.persist(path).map_err(|e| e.error)?;
        }
        None => match fs::remove_file(path) {
            Err(e) if e.kind() != ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        },
    }
    debug!(path = %path.display(), "restored table file");
    Ok(())
}
