//! Loading query files from disk.

use std::fs;

use sqlcheck_rs::input::{self, InputError};
use sqlcheck_rs::{Phase, StatementKind, validate_batch};
use tempfile::TempDir;

fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write query file");
    path
}

// -----------------------------------------------------------
// Text files.
// -----------------------------------------------------------

#[test]
fn multi_line_text_file_is_one_query() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_file(&dir, "query.sql", "SELECT name\nFROM users\nWHERE id = 1;\n");

    let queries = input::load(&path).expect("load");
    assert_eq!(queries.len(), 1);

    let report = validate_batch(&queries);
    assert!(report.all_valid());
    assert_eq!(report.successes[0].statement, StatementKind::Select);
}

#[test]
fn text_file_errors_use_file_positions() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_file(&dir, "query.txt", "SELECT name\n  FRO users\n");

    let report = validate_batch(input::load(&path).expect("load"));
    let failure = &report.failures[0];
    assert_eq!(failure.phase, Phase::Parsing);
    assert_eq!(failure.error.message, "Syntax Error: Expected FROM");
    assert_eq!((failure.error.line, failure.error.column), (Some(2), Some(3)));
}

#[test]
fn empty_text_file_is_rejected_as_a_query() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_file(&dir, "empty.sql", "");

    let report = validate_batch(input::load(&path).expect("load"));
    assert_eq!(report.failures.len(), 1);
    assert_eq!(
        report.failures[0].error.message,
        "Unsupported statement start: EOF"
    );
}

// -----------------------------------------------------------
// JSON files.
// -----------------------------------------------------------

#[test]
fn json_file_holds_many_queries() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_file(
        &dir,
        "batch.JSON",
        r#"{"queries": ["SELECT * FROM a", "SELECT * FRO b"]}"#,
    );

    let report = validate_batch(input::load(&path).expect("load"));
    assert_eq!(report.successes.len(), 1);
    assert_eq!(report.failures[0].index, 2);
}

#[test]
fn malformed_json_file_names_the_path() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_file(&dir, "bad.json", "{\"sql\": 1}");

    let err = input::load(&path).unwrap_err();
    assert!(matches!(err, InputError::Json { .. }));
    assert!(err.to_string().contains("bad.json"));
}
