//! Table storage for flatdb
//!
//! A table is one text file:
//!
//! ```text
//! id,name          <- column names
//! int64,string     <- column types
//! 1,Alice          <- one row per line
//! ```
//!
//! Every line ends with `\n`. Each mutation rewrites the whole file into a
//! temporary file next to it and renames it over the original, so readers
//! see either the old or the new contents.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::catalog::schema::{is_storable, FIELD_SEPARATOR};
use crate::catalog::{Catalog, Schema};
use crate::error::{Error, Result};
use crate::executor::QueryResult;
use crate::sql::Predicate;

/// A row is one text field per column
pub type Row = Vec<String>;

/// Handle to a table file
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    path: PathBuf,
}

impl Table {
    /// Create a new table file holding only the header and type lines
    pub fn create(catalog: &Catalog, name: &str, schema: &Schema) -> Result<Self> {
        let path = catalog.table_path(name)?;
        catalog.ensure_root()?;
        if path.exists() {
            return Err(Error::TableAlreadyExists(name.to_string()));
        }

        let table = Self {
            name: name.to_string(),
            path,
        };
        table.replace_all(schema, &[])?;
        debug!(table = name, columns = %schema.header_line(), "created table file");
        Ok(table)
    }

    /// Open an existing table
    pub fn open(catalog: &Catalog, name: &str) -> Result<Self> {
        let path = catalog.table_path(name)?;
        if !path.is_file() {
            return Err(Error::TableNotFound(name.to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            path,
        })
    }

    /// Get table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read only the header and type lines
    pub fn read_structure(&self) -> Result<Schema> {
        let file = File::open(&self.path).map_err(|e| self.missing_as_not_found(e))?;
        let mut lines = BufReader::new(file).lines();
        let header = lines.next().transpose()?;
        let types = lines.next().transpose()?;
        match (header, types) {
            (Some(header), Some(types)) => Schema::from_lines(&header, &types),
            _ => Err(self.corrupted("missing header or type line")),
        }
    }

    /// Read the schema and every data row
    pub fn read_all(&self) -> Result<(Schema, Vec<Row>)> {
        let content = fs::read_to_string(&self.path).map_err(|e| self.missing_as_not_found(e))?;
        let mut lines = content.lines();
        let schema = match (lines.next(), lines.next()) {
            (Some(header), Some(types)) => Schema::from_lines(header, types)?,
            _ => return Err(self.corrupted("missing header or type line")),
        };

        let mut rows = Vec::new();
        for (number, line) in lines.enumerate() {
            let row: Row = line.split(FIELD_SEPARATOR).map(str::to_string).collect();
            if row.len() != schema.column_count() {
                return Err(self.corrupted(&format!(
                    "row {} has {} field(s), expected {}",
                    number + 1,
                    row.len(),
                    schema.column_count()
                )));
            }
            rows.push(row);
        }
        Ok((schema, rows))
    }

    /// Append rows after the existing ones
    pub fn insert_rows(&self, new_rows: Vec<Row>) -> Result<usize> {
        let (schema, mut rows) = self.read_all()?;
        let inserted = new_rows.len();
        rows.extend(new_rows);
        self.replace_all(&schema, &rows)?;
        debug!(table = %self.name, inserted, "inserted rows");
        Ok(inserted)
    }

    /// Atomically replace the whole file
    pub fn replace_all(&self, schema: &Schema, rows: &[Row]) -> Result<()> {
        for row in rows {
            if row.len() != schema.column_count() {
                return Err(Error::ValueCountMismatch {
                    expected: schema.column_count(),
                    found: row.len(),
                });
            }
            for (column, value) in schema.columns().iter().zip(row) {
                if !is_storable(value) {
                    return Err(Error::InvalidValue {
                        column: column.clone(),
                        value: value.clone(),
                    });
                }
            }
        }

        let mut tmp = NamedTempFile::new_in(parent_dir(&self.path))?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            writeln!(writer, "{}", schema.header_line())?;
            writeln!(writer, "{}", schema.types_line())?;
            for row in rows {
                writeln!(writer, "{}", row.join(","))?;
            }
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!(table = %self.name, rows = rows.len(), "rewrote table file");
        Ok(())
    }

    /// Filter, project and optionally order rows
    pub fn select(
        &self,
        columns: &[String],
        predicate: Option<&Predicate>,
        order_column: Option<&str>,
    ) -> Result<QueryResult> {
        let (schema, rows) = self.read_all()?;

        let mut indices = Vec::new();
        for column in columns {
            if column == "*" {
                indices.extend(0..schema.column_count());
            } else {
                indices.push(schema.require_column(column)?);
            }
        }
        let header: Vec<String> = indices
            .iter()
            .map(|&i| schema.columns()[i].clone())
            .collect();

        let mut result: Vec<Row> = rows
            .into_iter()
            .filter(|row| row_matches(predicate, row, schema.columns()))
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();

        if let Some(column) = order_column {
            result = order_by(&header, result, column)?;
        }

        debug!(table = %self.name, rows = result.len(), "selected rows");
        Ok(QueryResult::with_rows(header, result))
    }

    /// Assign values in every matching row, returning how many changed
    pub fn update(
        &self,
        assignments: &[(String, String)],
        predicate: Option<&Predicate>,
    ) -> Result<usize> {
        let (schema, mut rows) = self.read_all()?;

        let mut resolved = Vec::with_capacity(assignments.len());
        for (column, value) in assignments {
            let index = schema.require_column(column)?;
            schema.check_value(index, value)?;
            resolved.push((index, value));
        }

        let mut updated = 0;
        for row in rows.iter_mut() {
            if !row_matches(predicate, row, schema.columns()) {
                continue;
            }
            for &(index, value) in &resolved {
                row[index] = value.clone();
            }
            updated += 1;
        }

        self.replace_all(&schema, &rows)?;
        debug!(table = %self.name, updated, "updated rows");
        Ok(updated)
    }

    /// Remove every matching row, returning how many were removed
    pub fn delete(&self, predicate: Option<&Predicate>) -> Result<usize> {
        let (schema, mut rows) = self.read_all()?;
        let before = rows.len();
        rows.retain(|row| !row_matches(predicate, row, schema.columns()));
        let deleted = before - rows.len();

        self.replace_all(&schema, &rows)?;
        debug!(table = %self.name, deleted, "deleted rows");
        Ok(deleted)
    }

    fn corrupted(&self, reason: &str) -> Error {
        Error::CorruptedTable(format!("{}: {}", self.path.display(), reason))
    }

    fn missing_as_not_found(&self, err: std::io::Error) -> Error {
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::TableNotFound(self.name.clone())
        } else {
            Error::IoError(err)
        }
    }
}

/// Directory a temporary file for `path` must live in to be renamed over it
pub(crate) fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

fn row_matches(predicate: Option<&Predicate>, row: &[String], header: &[String]) -> bool {
    predicate.map_or(true, |p| p.evaluate(row, header))
}

/// Stable ascending sort of `rows` by the text of `column`
pub fn order_by(columns: &[String], mut rows: Vec<Row>, column: &str) -> Result<Vec<Row>> {
    if rows.is_empty() {
        return Err(Error::NotEnoughRows);
    }
    let index = columns
        .iter()
        .position(|c| c == column)
        .ok_or_else(|| Error::ColumnNotFound(column.to_string()))?;
    rows.sort_by(|a, b| a[index].cmp(&b[index]));
    Ok(rows)
}
