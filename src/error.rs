//! Error types for flatdb
//!
//! This module defines all error types used throughout the store.

use thiserror::Error;

/// The main error type for flatdb
#[derive(Error, Debug)]
pub enum Error {
    // ========== Lexer Errors ==========
    #[error("Lexer error: unexpected character '{0}' at position {1}")]
    UnexpectedCharacter(char, usize),

    #[error("Lexer error: unterminated string literal starting at position {0}")]
    UnterminatedString(usize),

    // ========== Parser Errors ==========
    #[error("Parse error: unexpected token '{found}', expected {expected}")]
    UnexpectedToken { expected: String, found: String },

    #[error("Parse error: {0}")]
    SyntaxError(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    // ========== Catalog Errors ==========
    #[error("Catalog error: table '{0}' not found")]
    TableNotFound(String),

    #[error("Catalog error: table '{0}' already exists")]
    TableAlreadyExists(String),

    #[error("Catalog error: column '{0}' not found")]
    ColumnNotFound(String),

    #[error("Catalog error: invalid table name '{0}'")]
    InvalidTableName(String),

    #[error("Catalog error: {columns} column(s) declared with {types} type(s)")]
    ColumnTypeMismatch { columns: usize, types: usize },

    #[error("Catalog error: unsupported column type '{0}'")]
    UnsupportedType(String),

    // ========== Type Errors ==========
    #[error("Type error: value '{value}' in column '{column}' is not a valid {expected}")]
    TypeMismatch {
        column: String,
        expected: String,
        value: String,
    },

    #[error("Type error: expected {expected} value(s) per row, found {found}")]
    ValueCountMismatch { expected: usize, found: usize },

    #[error("Type error: value '{value}' in column '{column}' contains a field or row separator")]
    InvalidValue { column: String, value: String },

    // ========== Execution Errors ==========
    #[error("Execution error: not enough rows to order")]
    NotEnoughRows,

    #[error("Execution error: query returned no rows")]
    NoRows,

    // ========== Storage Errors ==========
    #[error("Storage error: corrupted table file '{0}'")]
    CorruptedTable(String),

    #[error("Storage error: corrupted cache log - {0}")]
    CorruptedLog(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // ========== I/O Errors ==========
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    // ========== Transaction Errors ==========
    #[error("Transaction error: transaction {0} not found")]
    TransactionNotFound(u64),

    #[error("Transaction error: transaction {0} is still open")]
    TransactionInProgress(u64),

    #[error("Transaction error: {cause}; restoring table '{table}' also failed: {restore}")]
    RestoreFailed {
        table: String,
        cause: Box<Error>,
        restore: Box<Error>,
    },
}

impl Error {
    /// Whether the error comes from malformed statement text
    pub fn is_syntax_error(&self) -> bool {
        matches!(
            self,
            Error::UnexpectedCharacter(..)
                | Error::UnterminatedString(_)
                | Error::UnexpectedToken { .. }
                | Error::SyntaxError(_)
        )
    }
}

/// Result type alias for flatdb operations
pub type Result<T> = std::result::Result<T, Error>;
