//! Executable commands
//!
//! A [`Command`] is a parsed statement reshaped for execution. Transactions
//! queue commands rather than statement text.

use std::fmt;

use crate::sql::{Operation, ParsedStatement, Predicate};

/// A unit of work against one table
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateTable {
        table: String,
        columns: Vec<String>,
        types: Vec<String>,
    },
    Insert {
        table: String,
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Select {
        table: String,
        columns: Vec<String>,
        predicate: Option<Predicate>,
        order_by: Option<String>,
    },
    Update {
        table: String,
        assignments: Vec<(String, String)>,
        predicate: Option<Predicate>,
    },
    Delete {
        table: String,
        predicate: Option<Predicate>,
    },
}

impl Command {
    /// Table the command touches
    pub fn table(&self) -> &str {
        match self {
            Command::CreateTable { table, .. }
            | Command::Insert { table, .. }
            | Command::Select { table, .. }
            | Command::Update { table, .. }
            | Command::Delete { table, .. } => table,
        }
    }

    /// Whether running the command leaves storage untouched
    pub fn is_read_only(&self) -> bool {
        matches!(self, Command::Select { .. })
    }
}

impl From<ParsedStatement> for Command {
    fn from(stmt: ParsedStatement) -> Self {
        let ParsedStatement {
            operation,
            table,
            columns,
            value_groups,
            predicate,
            order_by,
        } = stmt;

        match operation {
            Operation::Create => Command::CreateTable {
                table,
                columns,
                types: value_groups.into_iter().next().unwrap_or_default(),
            },
            Operation::Insert => Command::Insert {
                table,
                columns,
                rows: value_groups,
            },
            Operation::Select => Command::Select {
                table,
                columns,
                predicate,
                order_by,
            },
            Operation::Update => {
                let values = value_groups.into_iter().next().unwrap_or_default();
                Command::Update {
                    table,
                    assignments: columns.into_iter().zip(values).collect(),
                    predicate,
                }
            }
            Operation::Delete => Command::Delete { table, predicate },
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Command::CreateTable { .. } => "CREATE",
            Command::Insert { .. } => "INSERT",
            Command::Select { .. } => "SELECT",
            Command::Update { .. } => "UPDATE",
            Command::Delete { .. } => "DELETE",
        };
        write!(f, "{} {}", kind, self.table())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::{parse, CompareOp};

    #[test]
    fn test_update_becomes_assignments() {
        let cmd = Command::from(parse("UPDATE t SET name = 'X', age = 3 WHERE id > 1").unwrap());
        match cmd {
            Command::Update {
                table,
                assignments,
                predicate,
            } => {
                assert_eq!(table, "t");
                assert_eq!(
                    assignments,
                    vec![
                        ("name".to_string(), "X".to_string()),
                        ("age".to_string(), "3".to_string())
                    ]
                );
                assert_eq!(predicate, Some(Predicate::new("id", CompareOp::Gt, "1")));
            }
            other => panic!("expected update, got {:?}", other),
        }
    }

    #[test]
    fn test_create_carries_types() {
        let cmd =
            Command::from(parse("CREATE TABLE t (id, name) WITH TYPES (int64, string)").unwrap());
        assert_eq!(cmd.table(), "t");
        assert!(!cmd.is_read_only());
        assert!(matches!(
            cmd,
            Command::CreateTable { ref types, .. } if types == &["int64", "string"]
        ));
    }

    #[test]
    fn test_select_is_read_only() {
        let cmd = Command::from(parse("SELECT * FROM t ORDER BY id").unwrap());
        assert!(cmd.is_read_only());
        assert_eq!(cmd.to_string(), "SELECT t");
    }
}
