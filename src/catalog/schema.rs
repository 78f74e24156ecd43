//! Schema definitions for flatdb
//!
//! A schema is the first two lines of a table file: the column names and
//! their declared types.

use super::types::ColumnType;
use crate::error::{Error, Result};

/// Field separator on disk
pub const FIELD_SEPARATOR: char = ',';

/// Whether `value` can be stored as a single field
pub fn is_storable(value: &str) -> bool {
    !value.contains([FIELD_SEPARATOR, '\n', '\r'])
}

/// Table schema - defines the structure of a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Ordered column names
    columns: Vec<String>,
    /// Declared type of each column
    types: Vec<ColumnType>,
}

impl Schema {
    /// Create a schema, checking that every column has exactly one type
    pub fn new(columns: Vec<String>, types: Vec<ColumnType>) -> Result<Self> {
        if columns.len() != types.len() {
            return Err(Error::ColumnTypeMismatch {
                columns: columns.len(),
                types: types.len(),
            });
        }
        if let Some(bad) = columns.iter().find(|c| c.is_empty() || !is_storable(c)) {
            return Err(Error::InvalidValue {
                column: bad.clone(),
                value: bad.clone(),
            });
        }
        Ok(Self { columns, types })
    }

    /// Build a schema from declared type names
    pub fn from_declaration(columns: Vec<String>, types: &[String]) -> Result<Self> {
        if columns.len() != types.len() {
            return Err(Error::ColumnTypeMismatch {
                columns: columns.len(),
                types: types.len(),
            });
        }
        let types = types
            .iter()
            .map(|t| t.parse())
            .collect::<Result<Vec<ColumnType>>>()?;
        Self::new(columns, types)
    }

    /// Parse the header and type lines of a table file
    pub fn from_lines(header: &str, types: &str) -> Result<Self> {
        let columns = header
            .split(FIELD_SEPARATOR)
            .map(str::to_string)
            .collect();
        let types: Vec<String> = types.split(FIELD_SEPARATOR).map(str::to_string).collect();
        Self::from_declaration(columns, &types)
    }

    /// Header line as written to disk
    pub fn header_line(&self) -> String {
        self.columns.join(",")
    }

    /// Type line as written to disk
    pub fn types_line(&self) -> String {
        self.types
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Column names
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Column types
    pub fn types(&self) -> &[ColumnType] {
        &self.types
    }

    /// Get number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Position of the first column named `name`
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Like [`Schema::column_index`], failing with `ColumnNotFound`
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    /// Check one value against the column at `index`
    pub fn check_value(&self, index: usize, value: &str) -> Result<()> {
        let column = &self.columns[index];
        self.types[index].check(column, value)?;
        if !is_storable(value) {
            return Err(Error::InvalidValue {
                column: column.clone(),
                value: value.to_string(),
            });
        }
        Ok(())
    }

    /// Check arity and every field of a full row
    pub fn validate_row(&self, row: &[String]) -> Result<()> {
        if row.len() != self.column_count() {
            return Err(Error::ValueCountMismatch {
                expected: self.column_count(),
                found: row.len(),
            });
        }
        for (index, value) in row.iter().enumerate() {
            self.check_value(index, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn users() -> Schema {
        Schema::new(
            strings(&["id", "name"]),
            vec![ColumnType::Int64, ColumnType::String],
        )
        .unwrap()
    }

    #[test]
    fn test_lines_round_trip() {
        let schema = users();
        assert_eq!(schema.header_line(), "id,name");
        assert_eq!(schema.types_line(), "int64,string");
        assert_eq!(Schema::from_lines("id,name", "int64,string").unwrap(), schema);
    }

    #[test]
    fn test_length_mismatch() {
        let err = Schema::from_declaration(strings(&["a", "b"]), &strings(&["int64"])).unwrap_err();
        assert!(matches!(
            err,
            Error::ColumnTypeMismatch {
                columns: 2,
                types: 1
            }
        ));
    }

    #[test]
    fn test_unsupported_type() {
        let err = Schema::from_lines("a", "float").unwrap_err();
        assert!(matches!(err, Error::UnsupportedType(ref t) if t == "float"));
    }

    #[test]
    fn test_validate_row() {
        let schema = users();
        assert!(schema.validate_row(&strings(&["1", "Alice"])).is_ok());

        let err = schema.validate_row(&strings(&["three", "3"])).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { ref column, .. } if column == "id"));

        let err = schema.validate_row(&strings(&["1"])).unwrap_err();
        assert!(matches!(
            err,
            Error::ValueCountMismatch {
                expected: 2,
                found: 1
            }
        ));

        let err = schema.validate_row(&strings(&["1", "a,b"])).unwrap_err();
        assert!(matches!(err, Error::InvalidValue { ref column, .. } if column == "name"));
    }

    #[test]
    fn test_column_lookup() {
        let schema = users();
        assert_eq!(schema.column_index("name"), Some(1));
        assert!(matches!(
            schema.require_column("age"),
            Err(Error::ColumnNotFound(ref c)) if c == "age"
        ));
    }
}
