use std::fmt;

use serde::Serialize;
use tracing::{debug, trace};

use crate::token::{Span, Token, TokenKind};

/// Default limit on nested `(SELECT ...)` subqueries.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Statement recognized by a successful parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        })
    }
}

/// Classifies a parser error.
///
/// `found` fields hold the offending token's text as shown to
/// the user (`end of input` for EOF).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A specific token was required.
    Expected { expected: TokenKind, found: String },
    /// The first token does not start a supported statement.
    UnsupportedStatement { found: TokenKind },
    /// Neither a column list nor `*` after `SELECT`.
    ExpectedColumn { found: String },
    /// A `,` in the column list not followed by a column.
    ExpectedColumnAfterComma { found: String },
    /// Non-literal inside `VALUES (...)`.
    ExpectedInsertValue { found: String },
    /// Non-literal on the right of `SET col =`.
    ExpectedAssignmentValue { found: String },
    /// Neither `=` nor `IN` after the `WHERE` column.
    ExpectedWhereOperator { found: String },
    /// Neither a literal, a column, nor a subquery after the operator.
    ExpectedWhereOperand { found: String },
    /// Subqueries nested beyond the configured depth.
    NestingTooDeep { limit: usize },
    /// Tokens left over after a complete statement.
    TrailingInput { found: String },
}

impl ParseErrorKind {
    /// Headline shown to the user.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Expected { expected, .. } => format!("Syntax Error: Expected {expected}"),
            Self::UnsupportedStatement { found } => {
                format!("Unsupported statement start: {found}")
            }
            Self::ExpectedColumn { .. } => "Expected column name or '*' after SELECT".to_string(),
            Self::ExpectedColumnAfterComma { .. } => "Expected column name after ','".to_string(),
            Self::ExpectedInsertValue { .. } => "Expected value in VALUES clause".to_string(),
            Self::ExpectedAssignmentValue { .. } => "Expected value after '='".to_string(),
            Self::ExpectedWhereOperator { .. } => {
                "Expected operator (=, IN) in WHERE clause".to_string()
            }
            Self::ExpectedWhereOperand { .. } => "Expected value or subquery".to_string(),
            Self::NestingTooDeep { .. } => "Subquery nesting too deep".to_string(),
            Self::TrailingInput { .. } => "Unexpected trailing input".to_string(),
        }
    }

    /// Suggested fix.
    #[must_use]
    pub fn hint(&self) -> String {
        match self {
            Self::Expected { found, .. } => {
                format!("found '{found}' instead of the required keyword or symbol.")
            }
            Self::UnsupportedStatement { .. } => {
                "statements must start with SELECT, INSERT, UPDATE or DELETE.".to_string()
            }
            Self::ExpectedColumn { found } => {
                format!("found '{found}'; list column names separated by commas, or use '*'.")
            }
            Self::ExpectedColumnAfterComma { found } => {
                format!("found '{found}'; remove the trailing comma or add a column name.")
            }
            Self::ExpectedInsertValue { found } | Self::ExpectedAssignmentValue { found } => {
                format!("found '{found}'; values must be string or number literals.")
            }
            Self::ExpectedWhereOperator { found } => {
                format!("found '{found}'; only '=' and IN comparisons are supported.")
            }
            Self::ExpectedWhereOperand { found } => format!(
                "found '{found}'; compare against a literal, a column name, \
                 or a parenthesized SELECT."
            ),
            Self::NestingTooDeep { limit } => {
                format!("subqueries can be nested at most {limit} level(s) deep.")
            }
            Self::TrailingInput { found } => {
                format!("found '{found}' after a complete statement; remove it.")
            }
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expected { expected, found } => {
                write!(f, "expected {expected}, got '{found}'")
            }
            Self::UnsupportedStatement { found } => {
                write!(f, "unsupported statement start: {found}")
            }
            Self::ExpectedColumn { found } => {
                write!(f, "expected column name or '*', got '{found}'")
            }
            Self::ExpectedColumnAfterComma { found } => {
                write!(f, "expected column name after ',', got '{found}'")
            }
            Self::ExpectedInsertValue { found } | Self::ExpectedAssignmentValue { found } => {
                write!(f, "expected value, got '{found}'")
            }
            Self::ExpectedWhereOperator { found } => {
                write!(f, "expected operator (=, IN), got '{found}'")
            }
            Self::ExpectedWhereOperand { found } => {
                write!(f, "expected value or subquery, got '{found}'")
            }
            Self::NestingTooDeep { limit } => {
                write!(f, "subquery nesting exceeds {limit} level(s)")
            }
            Self::TrailingInput { found } => {
                write!(f, "unexpected trailing input '{found}'")
            }
        }
    }
}

/// Error produced during parsing.
///
/// The span is the position of the token that violated the grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.line, span.column)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

impl ParseError {
    /// Error for a token left over after a complete statement.
    #[must_use]
    pub fn trailing(token: &Token) -> Self {
        Self {
            kind: ParseErrorKind::TrailingInput {
                found: token.display_text(),
            },
            span: token.span,
        }
    }

    #[must_use]
    pub fn message(&self) -> String {
        self.kind.message()
    }

    #[must_use]
    pub fn hint(&self) -> String {
        self.kind.hint()
    }
}

/// Parse one statement from a token stream.
///
/// Leftover tokens after the statement are not an error here; use
/// [`Parser::remaining`] or the validator to reject them.
///
/// # Errors
///
/// Returns `ParseError` at the first token that does not fit the
/// statement grammar.
pub fn parse(tokens: &[Token]) -> Result<StatementKind, ParseError> {
    Parser::new(tokens).parse()
}

/// Recursive-descent parser over a lexed token stream.
#[derive(Debug)]
pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    max_depth: usize,
    eof: Token,
}

impl<'a> Parser<'a> {
    /// Create a parser over `tokens`, which should end with EOF.
    ///
    /// A stream without a trailing EOF behaves as if one followed
    /// its last token.
    #[must_use]
    pub fn new(tokens: &'a [Token]) -> Self {
        let span = tokens.last().map_or_else(Span::default, |t| t.span);
        Self {
            tokens,
            pos: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            eof: Token {
                kind: TokenKind::Eof,
                value: None,
                span,
            },
        }
    }

    /// Limit how deeply `(SELECT ...)` subqueries may nest.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parse a single statement, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` on the first grammar violation.
    pub fn parse(&mut self) -> Result<StatementKind, ParseError> {
        let statement = match self.current().kind {
            TokenKind::Select => self.parse_select(0)?,
            TokenKind::Insert => self.parse_insert()?,
            TokenKind::Update => self.parse_update()?,
            TokenKind::Delete => self.parse_delete()?,
            found => {
                return Err(self.error(ParseErrorKind::UnsupportedStatement { found }));
            }
        };
        debug!(%statement, consumed = self.pos, "statement parsed");
        Ok(statement)
    }

    /// Tokens not consumed by the statement, excluding the final EOF.
    #[must_use]
    pub fn remaining(&self) -> &'a [Token] {
        let rest = &self.tokens[self.pos.min(self.tokens.len())..];
        match rest.split_last() {
            Some((last, init)) if last.kind == TokenKind::Eof => init,
            _ => rest,
        }
    }

    // SELECT (col (, col)* | *) FROM table [WHERE ...] [;]
    fn parse_select(&mut self, depth: usize) -> Result<StatementKind, ParseError> {
        self.eat(TokenKind::Select)?;

        match self.current().kind {
            TokenKind::Asterisk => self.advance(),
            TokenKind::Identifier => {
                self.advance();
                while self.at(TokenKind::Comma) {
                    self.advance();
                    if !self.at(TokenKind::Identifier) {
                        return Err(self.error(ParseErrorKind::ExpectedColumnAfterComma {
                            found: self.found(),
                        }));
                    }
                    self.advance();
                }
            }
            _ => {
                return Err(self.error(ParseErrorKind::ExpectedColumn {
                    found: self.found(),
                }));
            }
        }

        self.eat(TokenKind::From)?;
        self.eat(TokenKind::Identifier)?;
        self.parse_where(depth)?;
        self.skip_semicolon();
        Ok(StatementKind::Select)
    }

    // INSERT INTO table (col (, col)*) VALUES (value (, value)*)
    fn parse_insert(&mut self) -> Result<StatementKind, ParseError> {
        self.eat(TokenKind::Insert)?;
        self.eat(TokenKind::Into)?;
        self.eat(TokenKind::Identifier)?;

        self.eat(TokenKind::LParen)?;
        self.eat(TokenKind::Identifier)?;
        while self.at(TokenKind::Comma) {
            self.advance();
            self.eat(TokenKind::Identifier)?;
        }
        self.eat(TokenKind::RParen)?;

        self.eat(TokenKind::Values)?;

        self.eat(TokenKind::LParen)?;
        self.eat_insert_value()?;
        while self.at(TokenKind::Comma) {
            self.advance();
            self.eat_insert_value()?;
        }
        self.eat(TokenKind::RParen)?;

        self.skip_semicolon();
        Ok(StatementKind::Insert)
    }

    // UPDATE table SET col = value [WHERE ...] [;]
    fn parse_update(&mut self) -> Result<StatementKind, ParseError> {
        self.eat(TokenKind::Update)?;
        self.eat(TokenKind::Identifier)?;
        self.eat(TokenKind::Set)?;
        self.eat(TokenKind::Identifier)?;
        self.eat(TokenKind::Equals)?;

        if self.at_literal() {
            self.advance();
        } else {
            return Err(self.error(ParseErrorKind::ExpectedAssignmentValue {
                found: self.found(),
            }));
        }

        self.parse_where(0)?;
        self.skip_semicolon();
        Ok(StatementKind::Update)
    }

    // DELETE FROM table [WHERE ...] [;]
    fn parse_delete(&mut self) -> Result<StatementKind, ParseError> {
        self.eat(TokenKind::Delete)?;
        self.eat(TokenKind::From)?;
        self.eat(TokenKind::Identifier)?;
        self.parse_where(0)?;
        self.skip_semicolon();
        Ok(StatementKind::Delete)
    }

    // [WHERE col (= | IN) operand]
    fn parse_where(&mut self, depth: usize) -> Result<(), ParseError> {
        if !self.at(TokenKind::Where) {
            return Ok(());
        }
        self.eat(TokenKind::Where)?;
        self.eat(TokenKind::Identifier)?;

        match self.current().kind {
            TokenKind::Equals | TokenKind::In => self.advance(),
            _ => {
                return Err(self.error(ParseErrorKind::ExpectedWhereOperator {
                    found: self.found(),
                }));
            }
        }

        self.parse_operand(depth)
    }

    // '(' SELECT ... ')' | STRING | NUMBER | IDENTIFIER
    fn parse_operand(&mut self, depth: usize) -> Result<(), ParseError> {
        match self.current().kind {
            TokenKind::LParen => {
                if depth >= self.max_depth {
                    return Err(self.error(ParseErrorKind::NestingTooDeep {
                        limit: self.max_depth,
                    }));
                }
                self.advance();
                self.parse_select(depth + 1)?;
                self.eat(TokenKind::RParen)
            }
            TokenKind::String | TokenKind::Number | TokenKind::Identifier => {
                self.advance();
                Ok(())
            }
            _ => Err(self.error(ParseErrorKind::ExpectedWhereOperand {
                found: self.found(),
            })),
        }
    }

    fn eat_insert_value(&mut self) -> Result<(), ParseError> {
        if self.at_literal() {
            self.advance();
            Ok(())
        } else {
            Err(self.error(ParseErrorKind::ExpectedInsertValue {
                found: self.found(),
            }))
        }
    }

    fn eat(&mut self, expected: TokenKind) -> Result<(), ParseError> {
        let token = self.current();
        if token.kind == expected {
            trace!(
                kind = %expected,
                line = token.span.line,
                column = token.span.column,
                "matched token"
            );
            self.advance();
            Ok(())
        } else {
            Err(self.error(ParseErrorKind::Expected {
                expected,
                found: self.found(),
            }))
        }
    }

    fn skip_semicolon(&mut self) {
        if self.at(TokenKind::Semicolon) {
            self.advance();
        }
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn at_literal(&self) -> bool {
        matches!(self.current().kind, TokenKind::String | TokenKind::Number)
    }

    fn found(&self) -> String {
        self.current().display_text()
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() && self.current().kind != TokenKind::Eof {
            self.pos += 1;
        }
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError {
            kind,
            span: self.current().span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_input(input: &str) -> Result<StatementKind, ParseError> {
        let tokens = tokenize(input).expect("tokenize failed");
        parse(&tokens)
    }

    #[test]
    fn select_star() {
        assert_eq!(
            parse_input("SELECT * FROM users;"),
            Ok(StatementKind::Select)
        );
    }

    #[test]
    fn select_columns_without_semicolon() {
        assert_eq!(
            parse_input("select id, name from users"),
            Ok(StatementKind::Select)
        );
    }

    #[test]
    fn select_keyword_typo() {
        let err = parse_input("SELECT * FRO users;").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::Expected {
                expected: TokenKind::From,
                found: "FRO".to_string(),
            }
        );
        assert_eq!(err.span, Span::new(1, 10));
        assert_eq!(err.message(), "Syntax Error: Expected FROM");
    }

    #[test]
    fn select_trailing_comma() {
        let err = parse_input("SELECT id, FROM t").unwrap_err();
        assert!(matches!(
            err.kind,
            ParseErrorKind::ExpectedColumnAfterComma { .. }
        ));
        assert_eq!(err.span, Span::new(1, 12));
    }

    #[test]
    fn select_missing_columns() {
        let err = parse_input("SELECT FROM t").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::ExpectedColumn { .. }));
    }

    #[test]
    fn insert() {
        assert_eq!(
            parse_input("INSERT INTO t1 (id, name) VALUES (1, 'a');"),
            Ok(StatementKind::Insert)
        );
    }

    #[test]
    fn insert_missing_paren() {
        let err = parse_input("INSERT INTO t1 (id) VALUES (1").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::Expected {
                expected: TokenKind::RParen,
                found: "end of input".to_string(),
            }
        );
    }

    #[test]
    fn insert_identifier_value() {
        let err = parse_input("INSERT INTO t (a, b) VALUES (1, x)").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::ExpectedInsertValue {
                found: "x".to_string()
            }
        );
    }

    #[test]
    fn update_with_where() {
        assert_eq!(
            parse_input("UPDATE employees SET salary = 5000 WHERE id = 1;"),
            Ok(StatementKind::Update)
        );
    }

    #[test]
    fn update_without_value() {
        let err = parse_input("UPDATE t SET a = ;").unwrap_err();
        assert!(matches!(
            err.kind,
            ParseErrorKind::ExpectedAssignmentValue { .. }
        ));
    }

    #[test]
    fn delete() {
        assert_eq!(
            parse_input("DELETE FROM users WHERE id = 'active';"),
            Ok(StatementKind::Delete)
        );
    }

    #[test]
    fn where_missing_operator() {
        let err = parse_input("DELETE FROM users WHERE id 1").unwrap_err();
        assert!(matches!(
            err.kind,
            ParseErrorKind::ExpectedWhereOperator { .. }
        ));
        assert_eq!(err.span, Span::new(1, 28));
    }

    #[test]
    fn where_in_subquery() {
        assert_eq!(
            parse_input("SELECT name FROM users WHERE id IN (SELECT user_id FROM orders);"),
            Ok(StatementKind::Select)
        );
    }

    #[test]
    fn subquery_missing_paren() {
        let err = parse_input("SELECT * FROM users WHERE id = (SELECT id FROM staff;").unwrap_err();
        assert!(matches!(
            err.kind,
            ParseErrorKind::Expected {
                expected: TokenKind::RParen,
                ..
            }
        ));
    }

    #[test]
    fn nested_subqueries_within_limit() {
        let input = "SELECT a FROM t WHERE a IN (SELECT a FROM u WHERE a IN (SELECT a FROM v))";
        let tokens = tokenize(input).expect("tokenize failed");
        assert_eq!(
            Parser::new(&tokens).with_max_depth(2).parse(),
            Ok(StatementKind::Select)
        );
    }

    #[test]
    fn nested_subqueries_over_limit() {
        let input = "SELECT a FROM t WHERE a IN (SELECT a FROM u WHERE a IN (SELECT a FROM v))";
        let tokens = tokenize(input).expect("tokenize failed");
        let err = Parser::new(&tokens).with_max_depth(1).parse().unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::NestingTooDeep { limit: 1 });
        // second '('
        assert_eq!(err.span, Span::new(1, 56));
    }

    #[test]
    fn unsupported_statement() {
        let err = parse_input("CREATE TABLE t").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::UnsupportedStatement {
                found: TokenKind::Create
            }
        );
        assert_eq!(err.span, Span::new(1, 1));
    }

    #[test]
    fn remaining_tokens() {
        let tokens = tokenize("SELECT * FROM t; SELECT").expect("tokenize failed");
        let mut parser = Parser::new(&tokens);
        assert_eq!(parser.parse(), Ok(StatementKind::Select));
        let rest = parser.remaining();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].kind, TokenKind::Select);
    }

    #[test]
    fn empty_token_stream() {
        let err = parse(&[]).unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::UnsupportedStatement {
                found: TokenKind::Eof
            }
        );
    }

    #[test]
    fn stream_without_eof() {
        let tokens = tokenize("SELECT * FROM").expect("tokenize failed");
        let err = parse(&tokens[..3]).unwrap_err();
        assert!(matches!(
            err.kind,
            ParseErrorKind::Expected {
                expected: TokenKind::Identifier,
                ..
            }
        ));
    }
}
