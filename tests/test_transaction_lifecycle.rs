use flatdb::{Database, Error};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn users_db(dir: &std::path::Path) -> Database {
    let db = Database::open(dir).unwrap();
    db.execute("CREATE TABLE users (id, name) WITH TYPES (int64, string)")
        .unwrap();
    db
}

#[test]
fn test_transaction_lifecycle() {
    let dir = tempdir().unwrap();
    let db = users_db(dir.path());

    // BEGIN / EXEC / COMMIT
    let id = db.begin();
    db.exec(id, "INSERT INTO users (id, name) VALUES (1, 'Alice')")
        .unwrap();
    db.exec(id, "UPDATE users SET name = 'Alicia' WHERE id = 1")
        .unwrap();

    // nothing runs before commit
    assert!(db.query("SELECT * FROM users").unwrap().rows.is_empty());

    let results = db.commit(id).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(
        db.query_row("SELECT id, name FROM users").unwrap(),
        strings(&["1", "Alicia"])
    );

    // a finished transaction cannot be reused
    assert!(matches!(db.commit(id), Err(Error::TransactionNotFound(i)) if i == id));
    assert!(matches!(db.rollback(id), Err(Error::TransactionNotFound(_))));

    // BEGIN / ROLLBACK
    let id = db.begin();
    db.exec(id, "DELETE FROM users").unwrap();
    db.rollback(id).unwrap();
    assert_eq!(db.query("SELECT * FROM users").unwrap().rows.len(), 1);
    assert!(matches!(db.commit(id), Err(Error::TransactionNotFound(_))));
}

#[test]
fn test_commit_runs_in_fifo_order() {
    let dir = tempdir().unwrap();
    let db = Database::open(dir.path()).unwrap();

    let id = db.begin();
    db.exec(id, "CREATE TABLE log (step) WITH TYPES (string)")
        .unwrap();
    db.exec(id, "INSERT INTO log (step) VALUES ('first')").unwrap();
    db.exec(id, "INSERT INTO log (step) VALUES ('second')").unwrap();
    db.exec(id, "UPDATE log SET step = 'third' WHERE step = 'second'")
        .unwrap();
    db.commit(id).unwrap();

    let rows = db.query("SELECT step FROM log").unwrap().rows;
    assert_eq!(rows, vec![strings(&["first"]), strings(&["third"])]);
}

#[test]
fn test_failed_commit_applies_nothing() {
    let dir = tempdir().unwrap();
    let db = users_db(dir.path());
    db.execute("INSERT INTO users (id, name) VALUES (1, 'Alice')")
        .unwrap();

    let id = db.begin();
    db.exec(id, "INSERT INTO users (id, name) VALUES (2, 'Bob')")
        .unwrap();
    db.exec(id, "DELETE FROM users WHERE id = 1").unwrap();
    db.exec(id, "INSERT INTO users (id, name) VALUES ('three', 3)")
        .unwrap();

    let err = db.commit(id).unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { ref column, .. } if column == "id"));

    let rows = db.query("SELECT * FROM users").unwrap().rows;
    assert_eq!(rows, vec![strings(&["1", "Alice"])]);
    assert!(db.active_transaction().is_none());
}

#[test]
fn test_begin_waits_for_open_transaction() {
    let dir = tempdir().unwrap();
    let db = Arc::new(users_db(dir.path()));

    let first = db.begin();
    assert!(matches!(
        db.try_begin(),
        Err(Error::TransactionInProgress(open)) if open == first
    ));

    let (tx, rx) = mpsc::channel();
    let waiter = {
        let db = Arc::clone(&db);
        thread::spawn(move || {
            let second = db.begin();
            tx.send(second).unwrap();
            db.exec(second, "INSERT INTO users (id, name) VALUES (2, 'Bob')")
                .unwrap();
            db.commit(second).unwrap();
        })
    };

    // the second begin is still blocked
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());

    db.exec(first, "INSERT INTO users (id, name) VALUES (1, 'Alice')")
        .unwrap();
    db.commit(first).unwrap();

    let second = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(second > first);
    waiter.join().unwrap();

    let rows = db.query("SELECT id FROM users ORDER BY id").unwrap().rows;
    assert_eq!(rows, vec![strings(&["1"]), strings(&["2"])]);
}

#[test]
fn test_exec_errors() {
    let dir = tempdir().unwrap();
    let db = users_db(dir.path());

    let id = db.begin();
    assert!(db.exec(id, "INSERT INTO users (id VALUES (1)").unwrap_err().is_syntax_error());
    assert!(matches!(
        db.exec(id, "SELECT * FROM users"),
        Err(Error::UnsupportedOperation(_))
    ));
    assert!(matches!(
        db.exec(id + 100, "DELETE FROM users"),
        Err(Error::TransactionNotFound(_))
    ));
    db.rollback(id).unwrap();
}
