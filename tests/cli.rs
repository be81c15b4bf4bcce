//! Exit codes and output of the `sqlcheck` binary.

use std::fs;
use std::io::Write;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn sqlcheck(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sqlcheck"))
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("SQLCHECK_MAX_DEPTH")
        .output()
        .expect("run sqlcheck")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// -----------------------------------------------------------
// Exit codes.
// -----------------------------------------------------------

#[test]
fn valid_queries_exit_zero() {
    let output = sqlcheck(&["check", "SELECT * FROM a", "DELETE FROM b"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("2 valid, 0 invalid"));
}

#[test]
fn invalid_query_exits_one() {
    let output = sqlcheck(&["check", "SELECT * FROM a", "SELECT * FRO b"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("#2: INVALID [PARSING]"));
}

#[test]
fn missing_file_exits_two() {
    let output = sqlcheck(&["file", "/nonexistent/queries.sql"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("/nonexistent/queries.sql"));
}

#[test]
fn shell_with_csv_is_a_usage_error() {
    let output = sqlcheck(&["--format", "csv", "shell"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("--format csv"));
}

// -----------------------------------------------------------
// Files and stdin.
// -----------------------------------------------------------

#[test]
fn multi_line_file_validates_as_one_statement() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("query.sql");
    fs::write(&path, "UPDATE employees\nSET salary = 5000\nWHERE id = 1;\n").expect("write");

    let output = sqlcheck(&["--format", "csv", "file", path.to_str().expect("utf8 path")]);
    assert_eq!(output.status.code(), Some(0));
    let out = stdout(&output);
    assert_eq!(out.lines().count(), 5, "header plus one quoted multi-line row");
    assert!(out.contains(",VALID,COMPLETE,"));
}

#[test]
fn shell_reads_stdin_until_exit() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_sqlcheck"))
        .args(["--format", "json", "shell"])
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("spawn sqlcheck");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(b"SELECT * FROM t\nquit\n")
        .expect("write stdin");

    let output = child.wait_with_output().expect("wait");
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("\"status\": \"VALID\""));
}
