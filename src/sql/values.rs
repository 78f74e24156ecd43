//! Literal values of an INSERT group
//!
//! The parser hands over the raw text between a group's parentheses. Quoted
//! values are kept verbatim (they may contain commas and parentheses);
//! unquoted values are trimmed of surrounding whitespace and parentheses.

use std::iter::Peekable;
use std::str::Chars;

use crate::error::{Error, Result};

enum Entry {
    /// Still collecting an unquoted value
    Bare(String),
    /// A quoted value was closed; only padding may follow
    Quoted(String),
}

fn is_padding(ch: char) -> bool {
    ch.is_whitespace() || ch == '(' || ch == ')'
}

/// Split one value group into its literal values
pub fn parse_values(input: &str) -> Result<Vec<String>> {
    let mut values = Vec::new();
    let mut entry = Entry::Bare(String::new());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == ',' {
            let done = std::mem::replace(&mut entry, Entry::Bare(String::new()));
            values.push(finish(done)?);
            continue;
        }

        match &mut entry {
            Entry::Bare(text) if ch == '\'' => {
                if !text.chars().all(is_padding) {
                    return Err(Error::SyntaxError(format!(
                        "unexpected quote after '{}'",
                        text.trim()
                    )));
                }
                entry = Entry::Quoted(read_quoted(&mut chars)?);
            }
            Entry::Bare(text) => text.push(ch),
            Entry::Quoted(_) if is_padding(ch) => {}
            Entry::Quoted(value) => {
                return Err(Error::SyntaxError(format!(
                    "unexpected '{}' after quoted value '{}'",
                    ch, value
                )))
            }
        }
    }

    values.push(finish(entry)?);
    Ok(values)
}

/// Read up to the closing quote; the opening quote is already consumed
fn read_quoted(chars: &mut Peekable<Chars<'_>>) -> Result<String> {
    let mut quoted = String::new();
    loop {
        match chars.next() {
            Some('\'') if chars.peek() == Some(&'\'') => {
                chars.next();
                quoted.push('\'');
            }
            Some('\'') => return Ok(quoted),
            Some(c) => quoted.push(c),
            None => return Err(Error::SyntaxError("mismatched quotes in values".to_string())),
        }
    }
}

fn finish(entry: Entry) -> Result<String> {
    match entry {
        Entry::Quoted(value) => Ok(value),
        Entry::Bare(text) => {
            let value = text.trim_matches(is_padding);
            if value.is_empty() {
                return Err(Error::SyntaxError("empty value in VALUES group".to_string()));
            }
            Ok(value.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_values() {
        assert_eq!(
            parse_values("1, 'Alice', 30").unwrap(),
            vec!["1", "Alice", "30"]
        );
    }

    #[test]
    fn test_quoted_values_keep_delimiters() {
        assert_eq!(
            parse_values("'a, b', '(x)', ' padded '").unwrap(),
            vec!["a, b", "(x)", " padded "]
        );
    }

    #[test]
    fn test_unquoted_values_are_trimmed() {
        assert_eq!(
            parse_values("  (7) , foo bar ,-3").unwrap(),
            vec!["7", "foo bar", "-3"]
        );
    }

    #[test]
    fn test_escaped_quote_and_empty_string() {
        assert_eq!(
            parse_values("'it''s', ''").unwrap(),
            vec!["it's", ""]
        );
    }

    #[test]
    fn test_mismatched_quotes() {
        let err = parse_values("1, 'Alice").unwrap_err();
        assert!(err.is_syntax_error());
    }

    #[test]
    fn test_empty_entries_are_rejected() {
        assert!(parse_values("1,,2").is_err());
        assert!(parse_values("1, 2,").is_err());
        assert!(parse_values("").is_err());
    }

    #[test]
    fn test_text_around_quotes_is_rejected() {
        assert!(parse_values("'a'b").is_err());
        assert!(parse_values("x'a'").is_err());
    }
}
