//! Statement front-end
//!
//! Lexer, recursive-descent parser and the single-clause predicates used by
//! WHERE.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod predicate;
pub mod token;
pub mod values;

pub use ast::{Operation, ParsedStatement};
pub use lexer::Lexer;
pub use parser::{parse, Parser};
pub use predicate::{evaluate, CompareOp, Predicate};
pub use token::Token;
