//! SQL Token definitions
//!
//! This module defines all tokens that can appear in flatdb statements.
//! Keywords are not tokens of their own: they are words, matched by the
//! parser against the exact spelling of the grammar.

use std::fmt;

use super::predicate::CompareOp;

/// SQL Token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // ========== Literals ==========
    /// Bare word: keyword, name or unquoted literal
    Word(String),
    /// String literal (single-quoted)
    StringLiteral(String),

    // ========== Operators ==========
    /// =
    Eq,
    /// !=
    Neq,
    /// <
    Lt,
    /// >
    Gt,
    /// <=
    Lte,
    /// >=
    Gte,

    // ========== Delimiters ==========
    /// (
    LParen,
    /// )
    RParen,
    /// ,
    Comma,
    /// ;
    Semicolon,

    // ========== Special ==========
    /// End of input
    Eof,
}

impl Token {
    /// Check if this token is the given keyword, spelled exactly
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Word(w) if w == keyword)
    }

    /// The comparison operator this token stands for, if any
    pub fn compare_op(&self) -> Option<CompareOp> {
        match self {
            Token::Eq => Some(CompareOp::Eq),
            Token::Neq => Some(CompareOp::NotEq),
            Token::Lt => Some(CompareOp::Lt),
            Token::Gt => Some(CompareOp::Gt),
            Token::Lte => Some(CompareOp::LtEq),
            Token::Gte => Some(CompareOp::GtEq),
            _ => None,
        }
    }

    /// Characters that end a bare word
    pub fn is_delimiter(ch: char) -> bool {
        ch.is_whitespace() || matches!(ch, '(' | ')' | ',' | ';' | '=' | '<' | '>' | '!' | '\'')
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(s) => write!(f, "{}", s),
            Token::StringLiteral(s) => write!(f, "'{}'", s),
            Token::Eq => write!(f, "="),
            Token::Neq => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::Gt => write!(f, ">"),
            Token::Lte => write!(f, "<="),
            Token::Gte => write!(f, ">="),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Semicolon => write!(f, ";"),
            Token::Eof => write!(f, "EOF"),
        }
    }
}

/// A token together with the character span it was read from
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    /// Index of the first character
    pub start: usize,
    /// Index one past the last character
    pub end: usize,
}
