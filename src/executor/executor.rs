//! Query Executor for flatdb
//!
//! This module runs [`Command`]s against table storage and returns results.

use serde::Serialize;
use tracing::{debug, info};

use super::Command;
use crate::catalog::{Catalog, Schema};
use crate::error::{Error, Result};
use crate::sql::parse;
use crate::storage::{Row, Table};

/// Query result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    /// Column names
    pub columns: Vec<String>,
    /// Result rows, data only
    pub rows: Vec<Row>,
    /// Number of affected rows (for INSERT/UPDATE/DELETE)
    pub affected_rows: usize,
    /// Message
    pub message: Option<String>,
}

impl QueryResult {
    /// Create a new empty result
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            affected_rows: 0,
            message: None,
        }
    }

    /// Create a result with a message
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::empty()
        }
    }

    /// Create a result with affected rows count
    pub fn with_affected_rows(count: usize, message: impl Into<String>) -> Self {
        Self {
            affected_rows: count,
            message: Some(message.into()),
            ..Self::empty()
        }
    }

    /// Create a result holding rows
    pub fn with_rows(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            columns,
            rows,
            ..Self::empty()
        }
    }
}

/// Execution Engine
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    catalog: Catalog,
}

impl QueryExecutor {
    /// Create a new executor over a catalog
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    /// Catalog of the storage root
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Parse and run one statement
    pub fn execute(&self, sql: &str) -> Result<QueryResult> {
        let command = Command::from(parse(sql)?);
        self.run(&command)
    }

    /// Run a command
    pub fn run(&self, command: &Command) -> Result<QueryResult> {
        debug!(command = %command, "running command");
        match command {
            Command::CreateTable {
                table,
                columns,
                types,
            } => self.execute_create_table(table, columns, types),
            Command::Insert {
                table,
                columns,
                rows,
            } => self.execute_insert(table, columns, rows),
            Command::Select {
                table,
                columns,
                predicate,
                order_by,
            } => Table::open(&self.catalog, table)?.select(
                columns,
                predicate.as_ref(),
                order_by.as_deref(),
            ),
            Command::Update {
                table,
                assignments,
                predicate,
            } => {
                let updated =
                    Table::open(&self.catalog, table)?.update(assignments, predicate.as_ref())?;
                Ok(QueryResult::with_affected_rows(
                    updated,
                    format!("{} row(s) updated", updated),
                ))
            }
            Command::Delete { table, predicate } => {
                let deleted = Table::open(&self.catalog, table)?.delete(predicate.as_ref())?;
                Ok(QueryResult::with_affected_rows(
                    deleted,
                    format!("{} row(s) deleted", deleted),
                ))
            }
        }
    }

    fn execute_create_table(
        &self,
        table_name: &str,
        columns: &[String],
        types: &[String],
    ) -> Result<QueryResult> {
        let schema = Schema::from_declaration(columns.to_vec(), types)?;
        Table::create(&self.catalog, table_name, &schema)?;

        info!(table = table_name, "created table");
        Ok(QueryResult::with_message(format!(
            "Table '{}' created",
            table_name
        )))
    }

    fn execute_insert(
        &self,
        table_name: &str,
        columns: &[String],
        values: &[Vec<String>],
    ) -> Result<QueryResult> {
        let table = Table::open(&self.catalog, table_name)?;
        let schema = table.read_structure()?;

        let indices = columns
            .iter()
            .map(|c| schema.require_column(c))
            .collect::<Result<Vec<_>>>()?;

        // Build and check every row before anything is written
        let mut rows = Vec::with_capacity(values.len());
        for group in values {
            if group.len() != indices.len() {
                return Err(Error::ValueCountMismatch {
                    expected: indices.len(),
                    found: group.len(),
                });
            }
            let mut row = vec![String::new(); schema.column_count()];
            for (&index, value) in indices.iter().zip(group) {
                row[index] = value.clone();
            }
            schema.validate_row(&row)?;
            rows.push(row);
        }

        let inserted = table.insert_rows(rows)?;
        Ok(QueryResult::with_affected_rows(
            inserted,
            format!("{} row(s) inserted", inserted),
        ))
    }
}
