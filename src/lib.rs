//! SQL lexer, recursive-descent parser, and syntax validator.
//!
//! Checks whether a statement is lexically and syntactically
//! well-formed against a small grammar: `SELECT`, `INSERT`,
//! `UPDATE`, and `DELETE` with an optional `WHERE` clause whose
//! operand may be a parenthesized subquery. No semantic checks are
//! made; table and column names are never resolved.
//!
//! # Quick start
//!
//! ## Validate one query
//!
//! ```
//! use sqlcheck_rs::{validate, Phase};
//!
//! let result = validate("SELECT name FROM users WHERE id IN (SELECT user_id FROM orders);");
//! assert!(result.is_valid());
//!
//! let result = validate("SELECT * FRO users;");
//! assert_eq!(result.phase(), Phase::Parsing);
//! assert_eq!(result.error().unwrap().message, "Syntax Error: Expected FROM");
//! ```
//!
//! ## Validate a batch
//!
//! ```
//! use sqlcheck_rs::validate_batch;
//!
//! let report = validate_batch(["SELECT * FROM a", "SELECT 1.2.3 FROM b"]);
//! assert_eq!(report.successes[0].index, 1);
//! assert_eq!(report.failures[0].index, 2);
//! ```
//!
//! ## Lex and parse separately
//!
//! ```
//! use sqlcheck_rs::{tokenize, parse, StatementKind, TokenKind};
//!
//! let tokens = tokenize("DELETE FROM users;").unwrap();
//! assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
//! assert_eq!(parse(&tokens), Ok(StatementKind::Delete));
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod input;
pub mod lexer;
pub mod parser;
pub mod report;
pub mod token;
pub mod validator;

pub use lexer::{LexError, LexErrorKind, Lexer, tokenize};
pub use parser::{DEFAULT_MAX_DEPTH, ParseError, ParseErrorKind, Parser, StatementKind, parse};
pub use token::{Span, Token, TokenKind, Value};
pub use validator::{
    BatchFailure, BatchReport, BatchSuccess, Phase, SqlError, Status, TrailingTokens,
    ValidationResult, Validator, ValidatorConfig, validate, validate_batch,
};

/// Unified error type covering both lexing and parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A lexer error.
    #[error("{0}")]
    Lex(#[from] LexError),
    /// A parser error.
    #[error("{0}")]
    Parse(#[from] ParseError),
}

/// Tokenize and parse a statement in one step.
///
/// Tokens left after the statement are rejected.
pub fn check(input: &str) -> Result<StatementKind, Error> {
    let tokens = tokenize(input)?;
    let mut parser = Parser::new(&tokens);
    let statement = parser.parse()?;
    if let Some(extra) = parser.remaining().first() {
        return Err(ParseError::trailing(extra).into());
    }
    Ok(statement)
}
