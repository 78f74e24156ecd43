//! SQL Parser
//!
//! This module parses statement tokens into a [`ParsedStatement`].
//!
//! ```text
//! CREATE TABLE <name> ( c1, c2, ... ) WITH TYPES ( t1, t2, ... )
//! INSERT INTO <name> ( c1, c2, ... ) VALUES (v1, v2, ...), (v1, v2, ...)
//! SELECT c1, c2, ... FROM <name> [WHERE col op lit] [ORDER BY col]
//! UPDATE <name> SET c1=v1, c2=v2 [WHERE col op lit]
//! DELETE FROM <name> [WHERE col op lit]
//! ```
//!
//! The leading keyword is classified case-insensitively; every keyword
//! after it must be spelled exactly as above.

use super::ast::{Operation, ParsedStatement};
use super::lexer::Lexer;
use super::predicate::Predicate;
use super::token::{SpannedToken, Token};
use super::values::parse_values;
use crate::error::{Error, Result};

/// Parse a single statement
pub fn parse(sql: &str) -> Result<ParsedStatement> {
    Parser::new(sql)?.parse()
}

/// SQL Parser
pub struct Parser {
    lexer: Lexer,
    tokens: Vec<SpannedToken>,
    position: usize,
}

impl Parser {
    /// Create a new parser from a statement string
    pub fn new(sql: &str) -> Result<Self> {
        let mut lexer = Lexer::new(sql);
        let tokens = lexer.tokenize()?;

        Ok(Self {
            lexer,
            tokens,
            position: 0,
        })
    }

    /// Parse the statement. Only a trailing semicolon may follow it.
    pub fn parse(&mut self) -> Result<ParsedStatement> {
        let operation = match self.current() {
            Token::Word(word) => Operation::from_keyword(word)
                .ok_or_else(|| Error::UnsupportedOperation(word.clone()))?,
            Token::Eof => return Err(Error::UnsupportedOperation("empty statement".to_string())),
            other => return Err(Error::UnsupportedOperation(other.to_string())),
        };

        let stmt = match operation {
            Operation::Create => self.parse_create()?,
            Operation::Insert => self.parse_insert()?,
            Operation::Select => self.parse_select()?,
            Operation::Update => self.parse_update()?,
            Operation::Delete => self.parse_delete()?,
        };

        if self.check(&Token::Semicolon) {
            self.advance();
        }
        if !self.is_at_end() {
            return Err(Error::UnexpectedToken {
                expected: "end of statement".to_string(),
                found: self.current().to_string(),
            });
        }

        Ok(stmt)
    }

    // ========== CREATE Statement ==========

    fn parse_create(&mut self) -> Result<ParsedStatement> {
        self.advance();
        self.expect_keyword("TABLE")?;

        let mut stmt = ParsedStatement::new(Operation::Create, self.expect_table_name()?);

        self.expect(&Token::LParen)?;
        stmt.columns = self.parse_word_list("column name")?;
        self.expect(&Token::RParen)?;

        self.expect_keyword("WITH")?;
        self.expect_keyword("TYPES")?;

        self.expect(&Token::LParen)?;
        let types = self.parse_word_list("column type")?;
        self.expect(&Token::RParen)?;
        stmt.value_groups.push(types);

        Ok(stmt)
    }

    // ========== INSERT Statement ==========

    fn parse_insert(&mut self) -> Result<ParsedStatement> {
        self.advance();
        self.expect_keyword("INTO")?;

        let mut stmt = ParsedStatement::new(Operation::Insert, self.expect_table_name()?);

        self.expect(&Token::LParen)?;
        stmt.columns = self.parse_word_list("column name")?;
        self.expect(&Token::RParen)?;

        self.expect_keyword("VALUES")?;

        loop {
            stmt.value_groups.push(self.parse_value_group()?);

            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }

        Ok(stmt)
    }

    /// Hand the raw text of one parenthesized group to the value tokenizer
    fn parse_value_group(&mut self) -> Result<Vec<String>> {
        if !self.check(&Token::LParen) {
            return Err(Error::UnexpectedToken {
                expected: "(".to_string(),
                found: self.current().to_string(),
            });
        }
        let open_end = self.tokens[self.position].end;
        self.advance();

        let mut depth = 1;
        loop {
            match self.current() {
                Token::LParen => depth += 1,
                Token::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                Token::Eof => {
                    return Err(Error::UnexpectedToken {
                        expected: ")".to_string(),
                        found: Token::Eof.to_string(),
                    })
                }
                _ => {}
            }
            self.advance();
        }

        let close_start = self.tokens[self.position].start;
        self.advance(); // consume closing paren

        parse_values(&self.lexer.slice(open_end, close_start))
    }

    // ========== SELECT Statement ==========

    fn parse_select(&mut self) -> Result<ParsedStatement> {
        self.advance();
        let columns = self.parse_word_list("column name")?;
        self.expect_keyword("FROM")?;

        let mut stmt = ParsedStatement::new(Operation::Select, self.expect_table_name()?);
        stmt.columns = columns;
        stmt.predicate = self.parse_where_clause()?;

        if self.check_keyword("ORDER") {
            self.advance();
            self.expect_keyword("BY")?;
            stmt.order_by = Some(self.expect_word("column name")?);
        }

        Ok(stmt)
    }

    // ========== UPDATE Statement ==========

    fn parse_update(&mut self) -> Result<ParsedStatement> {
        self.advance();

        let mut stmt = ParsedStatement::new(Operation::Update, self.expect_table_name()?);

        self.expect_keyword("SET")?;

        let mut values = Vec::new();
        loop {
            stmt.columns.push(self.expect_word("column name")?);
            self.expect(&Token::Eq)?;
            values.push(self.expect_literal()?);

            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }
        stmt.value_groups.push(values);
        stmt.predicate = self.parse_where_clause()?;

        Ok(stmt)
    }

    // ========== DELETE Statement ==========

    fn parse_delete(&mut self) -> Result<ParsedStatement> {
        self.advance();
        self.expect_keyword("FROM")?;

        let mut stmt = ParsedStatement::new(Operation::Delete, self.expect_table_name()?);
        stmt.predicate = self.parse_where_clause()?;

        Ok(stmt)
    }

    // ========== Helper functions ==========

    /// `[WHERE column operator literal]`
    fn parse_where_clause(&mut self) -> Result<Option<Predicate>> {
        if !self.check_keyword("WHERE") {
            return Ok(None);
        }
        self.advance();

        let column = self.current().clone();
        self.advance();
        let op = self.current().clone();
        self.advance();
        let literal = self.current().clone();
        self.advance();

        Predicate::from_tokens(&column, &op, &literal).map(Some)
    }

    fn parse_word_list(&mut self, what: &str) -> Result<Vec<String>> {
        let mut words = Vec::new();

        loop {
            words.push(self.expect_word(what)?);

            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }

        Ok(words)
    }

    fn current(&self) -> &Token {
        self.tokens
            .get(self.position)
            .map(|t| &t.token)
            .unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current(), Token::Eof)
    }

    fn check(&self, token: &Token) -> bool {
        std::mem::discriminant(self.current()) == std::mem::discriminant(token)
    }

    fn check_keyword(&self, keyword: &str) -> bool {
        self.current().is_keyword(keyword)
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        if self.check(token) {
            self.advance();
            Ok(())
        } else {
            Err(Error::UnexpectedToken {
                expected: token.to_string(),
                found: self.current().to_string(),
            })
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        if self.check_keyword(keyword) {
            self.advance();
            Ok(())
        } else {
            Err(Error::UnexpectedToken {
                expected: keyword.to_string(),
                found: self.current().to_string(),
            })
        }
    }

    fn expect_word(&mut self, what: &str) -> Result<String> {
        match self.current().clone() {
            Token::Word(word) => {
                self.advance();
                Ok(word)
            }
            other => Err(Error::UnexpectedToken {
                expected: what.to_string(),
                found: other.to_string(),
            }),
        }
    }

    fn expect_table_name(&mut self) -> Result<String> {
        let name = self.expect_word("table name")?;
        if !is_valid_name(&name) {
            return Err(Error::InvalidTableName(name));
        }
        Ok(name)
    }

    /// A bare word or a quoted string, quotes stripped
    fn expect_literal(&mut self) -> Result<String> {
        match self.current().clone() {
            Token::Word(value) | Token::StringLiteral(value) => {
                self.advance();
                Ok(value)
            }
            other => Err(Error::UnexpectedToken {
                expected: "value".to_string(),
                found: other.to_string(),
            }),
        }
    }
}

/// Table names are `\w+`
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::predicate::CompareOp;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_create_table() {
        let stmt =
            parse("CREATE TABLE test (id, name, age) WITH TYPES (int64, string, int64)").unwrap();

        assert_eq!(stmt.operation, Operation::Create);
        assert_eq!(stmt.table, "test");
        assert_eq!(stmt.columns, strings(&["id", "name", "age"]));
        assert_eq!(
            stmt.value_groups,
            vec![strings(&["int64", "string", "int64"])]
        );
    }

    #[test]
    fn test_parse_create_keeps_count_mismatch_for_storage() {
        let stmt = parse("CREATE TABLE t (a, b) WITH TYPES (int64)").unwrap();
        assert_eq!(stmt.columns.len(), 2);
        assert_eq!(stmt.value_groups[0].len(), 1);
    }

    #[test]
    fn test_parse_insert() {
        let stmt = parse("INSERT INTO users (id, name) VALUES (1, 'Alice'), (2, 'Bob')").unwrap();

        assert_eq!(stmt.operation, Operation::Insert);
        assert_eq!(stmt.table, "users");
        assert_eq!(stmt.columns, strings(&["id", "name"]));
        assert_eq!(
            stmt.value_groups,
            vec![strings(&["1", "Alice"]), strings(&["2", "Bob"])]
        );
    }

    #[test]
    fn test_parse_insert_quoted_delimiters() {
        let stmt =
            parse("INSERT INTO notes (id, body) VALUES (1, 'a, (b)'),(2,'it''s')").unwrap();
        assert_eq!(
            stmt.value_groups,
            vec![strings(&["1", "a, (b)"]), strings(&["2", "it's"])]
        );
    }

    #[test]
    fn test_parse_insert_mismatched_quotes() {
        let err = parse("INSERT INTO users (id, name) VALUES (1, 'Alice)").unwrap_err();
        assert!(err.is_syntax_error());
    }

    #[test]
    fn test_parse_select() {
        let stmt = parse("SELECT id, name FROM users WHERE id > 1 ORDER BY name").unwrap();

        assert_eq!(stmt.operation, Operation::Select);
        assert_eq!(stmt.columns, strings(&["id", "name"]));
        assert_eq!(stmt.predicate, Some(Predicate::new("id", CompareOp::Gt, "1")));
        assert_eq!(stmt.order_by.as_deref(), Some("name"));
    }

    #[test]
    fn test_parse_select_wildcard_and_semicolon() {
        let stmt = parse("SELECT * FROM users;").unwrap();
        assert_eq!(stmt.columns, strings(&["*"]));
        assert!(stmt.predicate.is_none());
        assert!(stmt.order_by.is_none());
    }

    #[test]
    fn test_parse_update() {
        let stmt = parse("UPDATE test SET name = 'Updated', age=30 WHERE id>1").unwrap();

        assert_eq!(stmt.operation, Operation::Update);
        assert_eq!(stmt.columns, strings(&["name", "age"]));
        assert_eq!(stmt.value_groups, vec![strings(&["Updated", "30"])]);
        assert_eq!(stmt.predicate, Some(Predicate::new("id", CompareOp::Gt, "1")));
    }

    #[test]
    fn test_parse_delete() {
        let stmt = parse("DELETE FROM test WHERE name != 'Bob'").unwrap();
        assert_eq!(stmt.operation, Operation::Delete);
        assert_eq!(
            stmt.predicate,
            Some(Predicate::new("name", CompareOp::NotEq, "Bob"))
        );

        let stmt = parse("DELETE FROM test").unwrap();
        assert!(stmt.predicate.is_none());
    }

    #[test]
    fn test_leading_keyword_is_case_insensitive_but_rest_is_not() {
        let stmt = parse("select id FROM users").unwrap();
        assert_eq!(stmt.operation, Operation::Select);
        assert_eq!(stmt.table, "users");

        let err = parse("select id from users").unwrap_err();
        assert!(matches!(err, Error::UnexpectedToken { .. }));

        let err = parse("DROP TABLE users").unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation(ref op) if op == "DROP"));

        let err = parse("   ").unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation(_)));
    }

    #[test]
    fn test_malformed_statements() {
        for sql in [
            "CREATE TABLE",
            "CREATE TABLE t (a, b)",
            "INSERT INTO t (a) VALUES",
            "INSERT INTO t (a) VALUES (1",
            "SELECT FROM t",
            "SELECT a FROM t WHERE a",
            "SELECT a FROM t WHERE a = 1 AND b = 2",
            "SELECT a FROM t ORDER name",
            "UPDATE t SET a",
            "DELETE t",
        ] {
            let err = parse(sql).unwrap_err();
            assert!(err.is_syntax_error(), "{} gave {:?}", sql, err);
        }
    }

    #[test]
    fn test_invalid_table_name() {
        let err = parse("DELETE FROM ../etc").unwrap_err();
        assert!(matches!(err, Error::InvalidTableName(_)));
    }
}
