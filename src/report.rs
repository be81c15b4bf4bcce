//! Serializers that turn validation outcomes into text, JSON, and
//! CSV reports.

use std::fmt::Write as _;
use std::string::FromUtf8Error;

use serde::Serialize;

use crate::parser::StatementKind;
use crate::token::{Token, TokenKind, Value};
use crate::validator::{BatchReport, Phase, SqlError, Status, ValidationResult};

const RULE_WIDTH: usize = 40;

/// Error produced while rendering a report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("report is not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
}

/// Token as it appears in serialized reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenEntry<'a> {
    pub kind: TokenKind,
    pub value: Option<&'a Value>,
}

impl<'a> From<&'a Token> for TokenEntry<'a> {
    fn from(token: &'a Token) -> Self {
        Self {
            kind: token.kind,
            value: token.value.as_ref(),
        }
    }
}

/// Serializable shape of a single validation outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome<'a> {
    pub status: Status,
    pub phase: Phase,
    pub error: Option<&'a SqlError>,
    pub tokens: Option<Vec<TokenEntry<'a>>>,
}

impl<'a> From<&'a ValidationResult> for Outcome<'a> {
    fn from(result: &'a ValidationResult) -> Self {
        Self {
            status: result.status(),
            phase: result.phase(),
            error: result.error(),
            tokens: result
                .tokens()
                .map(|tokens| tokens.iter().map(TokenEntry::from).collect()),
        }
    }
}

#[derive(Serialize)]
struct ValidEntry<'a> {
    index: usize,
    query: &'a str,
    statement: StatementKind,
    tokens: Vec<TokenEntry<'a>>,
}

#[derive(Serialize)]
struct InvalidEntry<'a> {
    index: usize,
    query: &'a str,
    phase: Phase,
    error: &'a SqlError,
}

#[derive(Serialize)]
struct BatchEntries<'a> {
    valid: Vec<ValidEntry<'a>>,
    invalid: Vec<InvalidEntry<'a>>,
}

impl<'a> From<&'a BatchReport> for BatchEntries<'a> {
    fn from(report: &'a BatchReport) -> Self {
        Self {
            valid: report
                .successes
                .iter()
                .map(|s| ValidEntry {
                    index: s.index,
                    query: &s.query,
                    statement: s.statement,
                    tokens: s.tokens.iter().map(TokenEntry::from).collect(),
                })
                .collect(),
            invalid: report
                .failures
                .iter()
                .map(|f| InvalidEntry {
                    index: f.index,
                    query: &f.query,
                    phase: f.phase,
                    error: &f.error,
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    index: usize,
    query: &'a str,
    status: Status,
    phase: Phase,
    message: Option<&'a str>,
    line: Option<usize>,
    column: Option<usize>,
    hint: Option<&'a str>,
}

/// Text shown for a token's value column.
fn value_text(token: &Token) -> String {
    token.value.as_ref().map_or_else(
        || token.kind.symbol().unwrap_or_default().to_string(),
        ToString::to_string,
    )
}

fn push_rule(out: &mut String, ch: char) {
    out.extend(std::iter::repeat_n(ch, RULE_WIDTH));
    out.push('\n');
}

fn push_location(out: &mut String, error: &SqlError) {
    let line = error.line.map_or_else(|| "-".to_string(), |l| l.to_string());
    let column = error
        .column
        .map_or_else(|| "-".to_string(), |c| c.to_string());
    let _ = writeln!(out, "Line    : {line}");
    let _ = writeln!(out, "Column  : {column}");
}

/// Render a human-readable report for one query.
#[must_use]
pub fn text(query: &str, result: &ValidationResult) -> String {
    let mut out = String::new();
    out.push_str("SQL QUERY VALIDATION REPORT\n");
    push_rule(&mut out, '=');
    let _ = writeln!(out, "Query : {query}\n");
    let _ = writeln!(out, "QUERY STATUS : {}", result.status());
    push_rule(&mut out, '-');

    if let ValidationResult::Invalid { phase, error, .. } = result {
        let _ = writeln!(out, "Phase   : {phase}");
        let _ = writeln!(out, "Message : {}", error.message);
        push_location(&mut out, error);
        let _ = writeln!(out, "Hint    : {}", error.hint);
        return out;
    }

    out.push_str("\nLEXING OUTPUT (TOKENS)\n");
    push_rule(&mut out, '-');
    out.push_str(&token_table(result.tokens().unwrap_or_default()));
    out.push_str("\nPARSING RESULT : SUCCESS\n");
    out
}

/// Render one line per token: kind, value, and position.
#[must_use]
pub fn token_table(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        let _ = writeln!(
            out,
            "{:<15} -> {:<20} {}:{}",
            token.kind.name(),
            value_text(token),
            token.span.line,
            token.span.column
        );
    }
    out
}

/// Render a short per-query summary of a batch, ordered by index.
#[must_use]
pub fn batch_text(report: &BatchReport) -> String {
    let mut lines: Vec<(usize, String)> = report
        .successes
        .iter()
        .map(|s| (s.index, format!("#{}: VALID ({}) {}", s.index, s.statement, s.query)))
        .chain(report.failures.iter().map(|f| {
            (
                f.index,
                format!(
                    "#{}: INVALID [{}] {}\n    {}\n    hint: {}",
                    f.index, f.phase, f.query, f.error, f.error.hint
                ),
            )
        }))
        .collect();
    lines.sort_by_key(|(index, _)| *index);

    let mut out = String::new();
    for (_, line) in lines {
        out.push_str(&line);
        out.push('\n');
    }
    let _ = writeln!(
        out,
        "{} valid, {} invalid",
        report.successes.len(),
        report.failures.len()
    );
    out
}

/// Serialize one outcome as pretty-printed JSON.
///
/// # Errors
///
/// Returns `ReportError::Json` if serialization fails.
pub fn json(result: &ValidationResult) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(&Outcome::from(result))?)
}

/// Serialize a batch as pretty-printed JSON with `valid` and
/// `invalid` arrays.
///
/// # Errors
///
/// Returns `ReportError::Json` if serialization fails.
pub fn batch_json(report: &BatchReport) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(&BatchEntries::from(report))?)
}

/// Serialize a batch as CSV, one row per query in input order.
///
/// # Errors
///
/// Returns `ReportError` if a row cannot be written.
pub fn batch_csv(report: &BatchReport) -> Result<String, ReportError> {
    let mut rows: Vec<CsvRow<'_>> = report
        .successes
        .iter()
        .map(|s| CsvRow {
            index: s.index,
            query: &s.query,
            status: Status::Valid,
            phase: Phase::Complete,
            message: None,
            line: None,
            column: None,
            hint: None,
        })
        .chain(report.failures.iter().map(|f| CsvRow {
            index: f.index,
            query: &f.query,
            status: Status::Invalid,
            phase: f.phase,
            message: Some(&f.error.message),
            line: f.error.line,
            column: f.error.column,
            hint: Some(&f.error.hint),
        }))
        .collect();
    rows.sort_by_key(|row| row.index);

    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in &rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(csv::IntoInnerError::into_error)?;
    Ok(String::from_utf8(bytes)?)
}
