//! Single-clause predicates
//!
//! A predicate is one `column operator literal` comparison. Every stored
//! field is text, so all operators compare byte-lexicographically: `"10"`
//! sorts before `"9"` even in an `int64` column.

use std::fmt;
use std::str::FromStr;

use super::lexer::Lexer;
use super::token::Token;
use crate::error::{Error, Result};

/// Comparison operator of a predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Gt,
    Lt,
    GtEq,
    LtEq,
}

impl CompareOp {
    /// Compare two fields as text
    pub fn compare(&self, left: &str, right: &str) -> bool {
        match self {
            CompareOp::Eq => left == right,
            CompareOp::NotEq => left != right,
            CompareOp::Gt => left > right,
            CompareOp::Lt => left < right,
            CompareOp::GtEq => left >= right,
            CompareOp::LtEq => left <= right,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "!=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::GtEq => ">=",
            CompareOp::LtEq => "<=",
        };
        write!(f, "{}", op)
    }
}

/// `column operator literal`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub column: String,
    pub op: CompareOp,
    pub literal: String,
}

impl Predicate {
    pub fn new(column: impl Into<String>, op: CompareOp, literal: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op,
            literal: literal.into(),
        }
    }

    /// Evaluate against a row laid out as `header`.
    ///
    /// The first header entry named `column` is used; a column missing from
    /// the header (or a short row) never matches.
    pub fn evaluate(&self, row: &[String], header: &[String]) -> bool {
        header
            .iter()
            .position(|h| *h == self.column)
            .and_then(|idx| row.get(idx))
            .map(|field| self.op.compare(field, &self.literal))
            .unwrap_or(false)
    }

    /// Build a predicate from exactly three tokens
    pub(crate) fn from_tokens(column: &Token, op: &Token, literal: &Token) -> Result<Self> {
        let column = match column {
            Token::Word(w) => w.clone(),
            other => {
                return Err(Error::UnexpectedToken {
                    expected: "column name".to_string(),
                    found: other.to_string(),
                })
            }
        };
        let op = op.compare_op().ok_or_else(|| Error::UnexpectedToken {
            expected: "comparison operator".to_string(),
            found: op.to_string(),
        })?;
        let literal = match literal {
            Token::Word(w) | Token::StringLiteral(w) => w.clone(),
            other => {
                return Err(Error::UnexpectedToken {
                    expected: "literal".to_string(),
                    found: other.to_string(),
                })
            }
        };
        Ok(Self::new(column, op, literal))
    }
}

impl FromStr for Predicate {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let tokens: Vec<Token> = Lexer::new(text)
            .tokenize()?
            .into_iter()
            .map(|t| t.token)
            .collect();

        // three tokens plus Eof
        if tokens.len() != 4 {
            return Err(Error::SyntaxError(format!(
                "predicate must be 'column operator literal', got '{}'",
                text.trim()
            )));
        }
        Self::from_tokens(&tokens[0], &tokens[1], &tokens[2])
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.column, self.op, self.literal)
    }
}

/// Evaluate predicate text against a row.
///
/// Text that is not a single `column operator literal` clause matches
/// nothing.
pub fn evaluate(row: &[String], header: &[String], predicate: &str) -> bool {
    predicate
        .parse::<Predicate>()
        .map(|p| p.evaluate(row, header))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_lexicographic_comparison() {
        assert!(CompareOp::Gt.compare("2", "1"));
        assert!(CompareOp::Lt.compare("10", "9"));
        assert!(!CompareOp::Lt.compare("9", "10"));
        assert!(CompareOp::GtEq.compare("b", "b"));
        assert!(CompareOp::LtEq.compare("a", "b"));
        assert!(CompareOp::NotEq.compare("a", "b"));
    }

    #[test]
    fn test_evaluate_selects_greater_ids() {
        let header = strings(&["id"]);
        let matched: Vec<&str> = ["1", "2", "3"]
            .into_iter()
            .filter(|id| evaluate(&strings(&[id]), &header, "id > 1"))
            .collect();
        assert_eq!(matched, vec!["2", "3"]);
    }

    #[test]
    fn test_evaluate_unknown_column_is_no_match() {
        let header = strings(&["id", "name"]);
        let row = strings(&["1", "Alice"]);
        assert!(!evaluate(&row, &header, "age = 1"));
    }

    #[test]
    fn test_evaluate_malformed_text_is_no_match() {
        let header = strings(&["id", "name"]);
        let row = strings(&["1", "Alice"]);
        assert!(!evaluate(&row, &header, "id = 1 extra"));
        assert!(!evaluate(&row, &header, "id"));
        assert!(!evaluate(&row, &header, "id ~ 1"));
    }

    #[test]
    fn test_first_duplicate_column_wins() {
        let header = strings(&["id", "id"]);
        let row = strings(&["1", "2"]);
        assert!(evaluate(&row, &header, "id = 1"));
        assert!(!evaluate(&row, &header, "id = 2"));
    }

    #[test]
    fn test_parse_and_display() {
        let p: Predicate = "name = 'Bob Smith'".parse().unwrap();
        assert_eq!(p, Predicate::new("name", CompareOp::Eq, "Bob Smith"));

        let p: Predicate = "id>=10".parse().unwrap();
        assert_eq!(p.to_string(), "id >= 10");
    }
}
