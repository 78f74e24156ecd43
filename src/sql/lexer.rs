//! SQL Lexer (Tokenizer)
//!
//! This module converts statement text into a stream of positioned tokens.

use super::token::{SpannedToken, Token};
use crate::error::{Error, Result};

/// SQL Lexer
pub struct Lexer {
    /// Input characters
    input: Vec<char>,
    /// Current position in input
    position: usize,
}

impl Lexer {
    /// Create a new lexer for the given input
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Tokenize the entire input. The last token is always `Eof`.
    pub fn tokenize(&mut self) -> Result<Vec<SpannedToken>> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            let start = self.position;
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(SpannedToken {
                token,
                start,
                end: self.position,
            });
            if done {
                break;
            }
        }

        Ok(tokens)
    }

    /// Raw input text between two character positions
    pub fn slice(&self, start: usize, end: usize) -> String {
        let end = end.min(self.input.len());
        let start = start.min(end);
        self.input[start..end].iter().collect()
    }

    /// Get the next token from the input
    fn next_token(&mut self) -> Result<Token> {
        if self.is_at_end() {
            return Ok(Token::Eof);
        }

        let ch = self.current_char();
        match ch {
            '(' => {
                self.advance();
                Ok(Token::LParen)
            }
            ')' => {
                self.advance();
                Ok(Token::RParen)
            }
            ',' => {
                self.advance();
                Ok(Token::Comma)
            }
            ';' => {
                self.advance();
                Ok(Token::Semicolon)
            }
            '=' => {
                self.advance();
                Ok(Token::Eq)
            }
            '<' => {
                self.advance();
                if self.peek_is('=') {
                    self.advance();
                    return Ok(Token::Lte);
                }
                Ok(Token::Lt)
            }
            '>' => {
                self.advance();
                if self.peek_is('=') {
                    self.advance();
                    return Ok(Token::Gte);
                }
                Ok(Token::Gt)
            }
            '!' => {
                self.advance();
                if self.peek_is('=') {
                    self.advance();
                    return Ok(Token::Neq);
                }
                Err(Error::UnexpectedCharacter('!', self.position - 1))
            }
            '\'' => self.read_string(),
            _ => Ok(self.read_word()),
        }
    }

    /// Check if we've reached the end of input
    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Get the current character
    fn current_char(&self) -> char {
        self.input[self.position]
    }

    fn peek_is(&self, ch: char) -> bool {
        !self.is_at_end() && self.current_char() == ch
    }

    /// Advance to the next character
    fn advance(&mut self) {
        self.position += 1;
    }

    /// Skip whitespace characters
    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    /// Read a string literal (single-quoted, `''` escapes a quote)
    fn read_string(&mut self) -> Result<Token> {
        let start_pos = self.position;
        self.advance(); // skip opening quote

        let mut value = String::new();

        while !self.is_at_end() {
            let ch = self.current_char();
            self.advance();

            if ch == '\'' {
                if self.peek_is('\'') {
                    value.push('\'');
                    self.advance();
                } else {
                    return Ok(Token::StringLiteral(value));
                }
            } else {
                value.push(ch);
            }
        }

        Err(Error::UnterminatedString(start_pos))
    }

    /// Read a bare word up to the next delimiter
    fn read_word(&mut self) -> Token {
        let mut value = String::new();

        while !self.is_at_end() && !Token::is_delimiter(self.current_char()) {
            value.push(self.current_char());
            self.advance();
        }

        Token::Word(value)
    }
}
