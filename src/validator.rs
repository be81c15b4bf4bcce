//! Validation pipeline: lex, parse, and classify one query or a
//! batch of queries.

use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::lexer::{LexError, tokenize};
use crate::parser::{DEFAULT_MAX_DEPTH, ParseError, Parser, StatementKind};
use crate::token::Token;

/// Stage of the pipeline an outcome belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Phase {
    Lexing,
    Parsing,
    Complete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lexing => "LEXING",
            Self::Parsing => "PARSING",
            Self::Complete => "COMPLETE",
        })
    }
}

/// Whether a query passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Valid,
    Invalid,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Valid => "VALID",
            Self::Invalid => "INVALID",
        })
    }
}

/// Phase-independent description of a lexical or syntax error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}{}", location(.line.as_ref(), .column.as_ref()))]
pub struct SqlError {
    pub message: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
    pub hint: String,
}

fn location(line: Option<&usize>, column: Option<&usize>) -> String {
    match (line, column) {
        (Some(line), Some(column)) => format!(" at line {line}, column {column}"),
        _ => String::new(),
    }
}

impl From<LexError> for SqlError {
    fn from(err: LexError) -> Self {
        Self {
            message: err.message(),
            line: Some(err.span.line),
            column: Some(err.span.column),
            hint: err.hint(),
        }
    }
}

impl From<ParseError> for SqlError {
    fn from(err: ParseError) -> Self {
        Self {
            message: err.message(),
            line: Some(err.span.line),
            column: Some(err.span.column),
            hint: err.hint(),
        }
    }
}

/// What to do with tokens left after a complete statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailingTokens {
    /// Fail in the parsing phase at the first leftover token.
    #[default]
    Reject,
    /// Accept the statement and ignore the rest.
    Allow,
}

/// Validator settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorConfig {
    /// Maximum nesting of `(SELECT ...)` subqueries.
    pub max_depth: usize,
    pub trailing_tokens: TrailingTokens,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            trailing_tokens: TrailingTokens::Reject,
        }
    }
}

/// Outcome of validating one query.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    Valid {
        statement: StatementKind,
        tokens: Vec<Token>,
    },
    Invalid {
        phase: Phase,
        error: SqlError,
        /// Present when lexing succeeded.
        tokens: Option<Vec<Token>>,
    },
}

impl ValidationResult {
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    #[must_use]
    pub const fn status(&self) -> Status {
        match self {
            Self::Valid { .. } => Status::Valid,
            Self::Invalid { .. } => Status::Invalid,
        }
    }

    /// `Complete` for valid queries, otherwise the failing phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match self {
            Self::Valid { .. } => Phase::Complete,
            Self::Invalid { phase, .. } => *phase,
        }
    }

    #[must_use]
    pub const fn error(&self) -> Option<&SqlError> {
        match self {
            Self::Valid { .. } => None,
            Self::Invalid { error, .. } => Some(error),
        }
    }

    #[must_use]
    pub fn tokens(&self) -> Option<&[Token]> {
        match self {
            Self::Valid { tokens, .. } => Some(tokens),
            Self::Invalid { tokens, .. } => tokens.as_deref(),
        }
    }
}

/// A batch entry that validated.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSuccess {
    /// 1-based position in the input.
    pub index: usize,
    pub query: String,
    pub statement: StatementKind,
    pub tokens: Vec<Token>,
}

/// A batch entry that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    /// 1-based position in the input.
    pub index: usize,
    pub query: String,
    pub phase: Phase,
    pub error: SqlError,
}

/// Batch outcomes, partitioned and each kept in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub successes: Vec<BatchSuccess>,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    /// Number of queries validated.
    #[must_use]
    pub fn len(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.successes.is_empty() && self.failures.is_empty()
    }

    #[must_use]
    pub fn all_valid(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs the lexer and parser over queries with a fixed config.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    config: ValidatorConfig,
}

impl Validator {
    #[must_use]
    pub const fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate a single query.
    #[must_use]
    pub fn validate(&self, query: &str) -> ValidationResult {
        debug!(len = query.len(), "lexing query");
        let tokens = match tokenize(query) {
            Ok(tokens) => tokens,
            Err(err) => {
                warn!(phase = %Phase::Lexing, error = %err, "query rejected");
                return ValidationResult::Invalid {
                    phase: Phase::Lexing,
                    error: err.into(),
                    tokens: None,
                };
            }
        };

        debug!(tokens = tokens.len(), "parsing query");
        let parsed = {
            let mut parser = Parser::new(&tokens).with_max_depth(self.config.max_depth);
            parser
                .parse()
                .and_then(|statement| self.check_trailing(parser.remaining(), statement))
        };

        match parsed {
            Ok(statement) => {
                debug!(%statement, "query valid");
                ValidationResult::Valid { statement, tokens }
            }
            Err(err) => {
                warn!(phase = %Phase::Parsing, error = %err, "query rejected");
                ValidationResult::Invalid {
                    phase: Phase::Parsing,
                    error: err.into(),
                    tokens: Some(tokens),
                }
            }
        }
    }

    /// Validate each query independently and partition the outcomes.
    ///
    /// Indexes are 1-based positions in `queries`.
    #[must_use]
    pub fn validate_batch<I, S>(&self, queries: I) -> BatchReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = BatchReport::default();

        for (index, query) in queries.into_iter().enumerate() {
            let index = index + 1;
            let query = query.as_ref();
            match self.validate(query) {
                ValidationResult::Valid { statement, tokens } => {
                    report.successes.push(BatchSuccess {
                        index,
                        query: query.to_string(),
                        statement,
                        tokens,
                    });
                }
                ValidationResult::Invalid { phase, error, .. } => {
                    report.failures.push(BatchFailure {
                        index,
                        query: query.to_string(),
                        phase,
                        error,
                    });
                }
            }
        }

        debug!(
            total = report.len(),
            failures = report.failures.len(),
            "batch validated"
        );
        report
    }

    fn check_trailing(
        &self,
        rest: &[Token],
        statement: StatementKind,
    ) -> Result<StatementKind, ParseError> {
        match (self.config.trailing_tokens, rest.first()) {
            (TrailingTokens::Reject, Some(extra)) => Err(ParseError::trailing(extra)),
            _ => Ok(statement),
        }
    }
}

/// Validate one query with the default config.
#[must_use]
pub fn validate(query: &str) -> ValidationResult {
    Validator::default().validate(query)
}

/// Validate a batch of queries with the default config.
#[must_use]
pub fn validate_batch<I, S>(queries: I) -> BatchReport
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Validator::default().validate_batch(queries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    #[test]
    fn valid_query_keeps_tokens() {
        let result = validate("SELECT * FROM users;");
        assert!(result.is_valid());
        assert_eq!(result.phase(), Phase::Complete);
        assert_eq!(result.tokens().map(<[Token]>::len), Some(6));
    }

    #[test]
    fn lexing_failure_has_no_tokens() {
        let result = validate("SELECT 10.5.2 FROM t");
        assert_eq!(result.phase(), Phase::Lexing);
        assert!(result.tokens().is_none());
        let error = result.error().expect("error");
        assert_eq!(error.message, "Invalid Number Format");
        assert_eq!((error.line, error.column), (Some(1), Some(12)));
    }

    #[test]
    fn parsing_failure_keeps_tokens() {
        let result = validate("SELECT * FRO users;");
        assert_eq!(result.status(), Status::Invalid);
        assert_eq!(result.phase(), Phase::Parsing);
        assert!(result.tokens().is_some());
    }

    #[test]
    fn sql_error_display() {
        let located = SqlError::from(tokenize("SELECT @").unwrap_err());
        assert_eq!(located.to_string(), "Unknown Character '@' at line 1, column 8");

        let bare = SqlError {
            message: "Syntax Error: Expected FROM".to_string(),
            line: None,
            column: None,
            hint: String::new(),
        };
        assert_eq!(bare.to_string(), "Syntax Error: Expected FROM");
        let source: &dyn std::error::Error = &bare;
        assert!(source.source().is_none());
    }

    #[test]
    fn trailing_tokens_rejected_by_default() {
        let result = validate("SELECT * FROM users WHERE id = 1 AND name = 'x'");
        let error = result.error().expect("error");
        assert_eq!(error.message, "Unexpected trailing input");
        assert_eq!(error.column, Some(34));
    }

    #[test]
    fn trailing_tokens_allowed() {
        let validator = Validator::new(ValidatorConfig {
            trailing_tokens: TrailingTokens::Allow,
            ..ValidatorConfig::default()
        });
        let result = validator.validate("SELECT * FROM users WHERE id = 1 AND name = 'x'");
        assert!(result.is_valid());
        let tokens = result.tokens().expect("tokens");
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    }

    #[test]
    fn depth_limit_from_config() {
        let validator = Validator::new(ValidatorConfig {
            max_depth: 0,
            ..ValidatorConfig::default()
        });
        let result = validator.validate("SELECT a FROM t WHERE a IN (SELECT a FROM u)");
        assert_eq!(result.phase(), Phase::Parsing);
        assert_eq!(
            result.error().map(|e| e.message.as_str()),
            Some("Subquery nesting too deep")
        );
    }

    #[test]
    fn batch_partitions_in_order() {
        let report = validate_batch([
            "SELECT id FROM users;",
            "SELECT * FRO users;",
            "DELETE FROM users WHERE id = 'active';",
            "SELECT 10.5.2 FROM t;",
        ]);
        assert_eq!(report.len(), 4);
        let ok: Vec<_> = report.successes.iter().map(|s| s.index).collect();
        let bad: Vec<_> = report.failures.iter().map(|f| f.index).collect();
        assert_eq!(ok, vec![1, 3]);
        assert_eq!(bad, vec![2, 4]);
        assert_eq!(report.failures[0].phase, Phase::Parsing);
        assert_eq!(report.failures[1].phase, Phase::Lexing);
        assert_eq!(report.failures[1].query, "SELECT 10.5.2 FROM t;");
        assert!(!report.all_valid());
    }

    #[test]
    fn empty_batch() {
        let report = validate_batch(Vec::<String>::new());
        assert!(report.is_empty());
        assert!(report.all_valid());
    }
}
