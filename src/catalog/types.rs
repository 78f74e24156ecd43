//! Column types for flatdb
//!
//! Values are stored as text; a column type only constrains what text a
//! column accepts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Declared column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    /// Signed 64-bit integer
    Int64,
    /// Any text
    String,
}

impl ColumnType {
    /// Check that `value` is acceptable for `column`
    pub fn check(&self, column: &str, value: &str) -> Result<()> {
        match self {
            ColumnType::Int64 => value.parse::<i64>().map(|_| ()).map_err(|_| {
                Error::TypeMismatch {
                    column: column.to_string(),
                    expected: self.to_string(),
                    value: value.to_string(),
                }
            }),
            ColumnType::String => Ok(()),
        }
    }
}

impl FromStr for ColumnType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "int64" => Ok(ColumnType::Int64),
            "string" => Ok(ColumnType::String),
            other => Err(Error::UnsupportedType(other.to_string())),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Int64 => write!(f, "int64"),
            ColumnType::String => write!(f, "string"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_types() {
        assert_eq!("int64".parse::<ColumnType>().unwrap(), ColumnType::Int64);
        assert_eq!("string".parse::<ColumnType>().unwrap(), ColumnType::String);
        assert!(matches!(
            "INT64".parse::<ColumnType>(),
            Err(Error::UnsupportedType(ref t)) if t == "INT64"
        ));
    }

    #[test]
    fn test_int64_check() {
        assert!(ColumnType::Int64.check("id", "-42").is_ok());
        assert!(ColumnType::Int64.check("id", "9223372036854775807").is_ok());
        assert!(ColumnType::Int64.check("id", "9223372036854775808").is_err());
        assert!(ColumnType::Int64.check("id", "").is_err());

        let err = ColumnType::Int64.check("id", "three").unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { ref column, .. } if column == "id"));
    }

    #[test]
    fn test_string_accepts_anything() {
        assert!(ColumnType::String.check("name", "").is_ok());
        assert!(ColumnType::String.check("name", "3").is_ok());
    }
}
