//! Table-backed datasource
//!
//! Entries live in a two-column `(key, value)` table. Keys and JSON values
//! are stored hex encoded so that no separator or quote can reach the table
//! file. Entries never expire.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use super::Datasource;
use crate::database::Database;
use crate::error::{Error, Result};

/// Table holding the entries
pub const ENTRIES_TABLE: &str = "entries";

/// Stores values in a table of a [`Database`]
#[derive(Debug)]
pub struct DatabaseDatasource {
    db: Database,
}

impl DatabaseDatasource {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn ensure_table(&self) -> Result<()> {
        if self.db.table_exists(ENTRIES_TABLE) {
            return Ok(());
        }
        let sql = format!(
            "CREATE TABLE {} (key, value) WITH TYPES (string, string)",
            ENTRIES_TABLE
        );
        match self.db.execute(&sql) {
            Ok(_) | Err(Error::TableAlreadyExists(_)) => Ok(()),
            Err(err) => Err(err),
        }
    }

    fn lookup(&self, encoded_key: &str) -> Result<Option<String>> {
        let sql = format!(
            "SELECT value FROM {} WHERE key = '{}'",
            ENTRIES_TABLE, encoded_key
        );
        match self.db.query_row(&sql) {
            Ok(mut row) => Ok(row.pop()),
            Err(Error::NoRows) | Err(Error::TableNotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

impl Datasource for DatabaseDatasource {
    fn set(&self, key: &str, value: &Value, _ttl: Duration) -> Result<()> {
        self.ensure_table()?;

        let key = hex::encode(key);
        let value = hex::encode(serde_json::to_string(value)?);

        let trans = self.db.transaction();
        let sql = if self.lookup(&key)?.is_some() {
            format!(
                "UPDATE {} SET value = '{}' WHERE key = '{}'",
                ENTRIES_TABLE, value, key
            )
        } else {
            format!(
                "INSERT INTO {} (key, value) VALUES ('{}', '{}')",
                ENTRIES_TABLE, key, value
            )
        };
        trans.exec(&sql)?;
        trans.commit()?;

        debug!(key = %key, "stored entry");
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Value>> {
        let Some(encoded) = self.lookup(&hex::encode(key))? else {
            return Ok(None);
        };
        let bytes = hex::decode(&encoded).map_err(|e| {
            Error::CorruptedTable(format!("{}: value is not hex encoded ({})", ENTRIES_TABLE, e))
        })?;
        let text = String::from_utf8(bytes).map_err(|_| {
            Error::CorruptedTable(format!("{}: value is not UTF-8", ENTRIES_TABLE))
        })?;
        Ok(Some(serde_json::from_str(&text)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_round_trip_and_overwrite() {
        let dir = tempdir().unwrap();
        let source = DatabaseDatasource::new(Database::open(dir.path()).unwrap());

        assert_eq!(source.get("user:1").unwrap(), None);

        let value = json!("best user, expired after 5 seconds");
        source.set("user:1", &value, Duration::ZERO).unwrap();
        assert_eq!(source.get("user:1").unwrap(), Some(value));

        let newer = json!({"name": "O'Brien", "score": 7});
        source.set("user:1", &newer, Duration::ZERO).unwrap();
        assert_eq!(source.get("user:1").unwrap(), Some(newer));

        let rows = source
            .database()
            .query("SELECT * FROM entries")
            .unwrap()
            .rows;
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_value_that_is_not_hex_is_corrupt() {
        let dir = tempdir().unwrap();
        let source = DatabaseDatasource::new(Database::open(dir.path()).unwrap());
        source.set("other", &json!(1), Duration::ZERO).unwrap();

        let sql = format!(
            "INSERT INTO entries (key, value) VALUES ('{}', 'zz')",
            hex::encode("broken")
        );
        source.database().execute(&sql).unwrap();

        assert!(matches!(
            source.get("broken"),
            Err(Error::CorruptedTable(_))
        ));
        assert_eq!(source.get("other").unwrap(), Some(json!(1)));
    }
}
