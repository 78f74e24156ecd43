//! Parsed statement representation
//!
//! Every statement kind shares one flat shape. What each field holds
//! depends on the operation:
//!
//! | operation | `columns`          | `value_groups`              |
//! |-----------|--------------------|-----------------------------|
//! | CREATE    | declared columns   | `[declared types]`          |
//! | INSERT    | listed columns     | one group per row           |
//! | SELECT    | projection         | empty                       |
//! | UPDATE    | assigned columns   | `[assigned values]`         |
//! | DELETE    | empty              | empty                       |

use std::fmt;

use super::predicate::Predicate;

/// Statement kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Insert,
    Select,
    Update,
    Delete,
}

impl Operation {
    /// Classify a leading keyword, ignoring case
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word.to_ascii_uppercase().as_str() {
            "CREATE" => Some(Operation::Create),
            "INSERT" => Some(Operation::Insert),
            "SELECT" => Some(Operation::Select),
            "UPDATE" => Some(Operation::Update),
            "DELETE" => Some(Operation::Delete),
            _ => None,
        }
    }

    /// Whether statements of this kind leave storage untouched
    pub fn is_read_only(&self) -> bool {
        matches!(self, Operation::Select)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "CREATE"),
            Operation::Insert => write!(f, "INSERT"),
            Operation::Select => write!(f, "SELECT"),
            Operation::Update => write!(f, "UPDATE"),
            Operation::Delete => write!(f, "DELETE"),
        }
    }
}

/// A parsed statement
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedStatement {
    pub operation: Operation,
    pub table: String,
    pub columns: Vec<String>,
    pub value_groups: Vec<Vec<String>>,
    /// WHERE clause
    pub predicate: Option<Predicate>,
    /// ORDER BY column
    pub order_by: Option<String>,
}

impl ParsedStatement {
    pub fn new(operation: Operation, table: impl Into<String>) -> Self {
        Self {
            operation,
            table: table.into(),
            columns: Vec::new(),
            value_groups: Vec::new(),
            predicate: None,
            order_by: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_keywords() {
        assert_eq!(Operation::from_keyword("select"), Some(Operation::Select));
        assert_eq!(Operation::from_keyword("DeLeTe"), Some(Operation::Delete));
        assert_eq!(Operation::from_keyword("DROP"), None);
        assert!(Operation::Select.is_read_only());
        assert!(!Operation::Insert.is_read_only());
    }
}
