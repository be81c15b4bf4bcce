//! Loading query batches from files.
//!
//! JSON files may hold `{"query": "..."}`, `{"queries": [...]}`, or a
//! bare array of strings. Any other file holds a single query, which
//! may span several lines; error positions stay relative to the file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

/// Error produced while loading queries from a file.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: invalid query document: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QueryDocument {
    One { query: String },
    Many { queries: Vec<String> },
    List(Vec<String>),
}

impl From<QueryDocument> for Vec<String> {
    fn from(doc: QueryDocument) -> Self {
        match doc {
            QueryDocument::One { query } => vec![query],
            QueryDocument::Many { queries } | QueryDocument::List(queries) => queries,
        }
    }
}

/// Read the queries stored in `path`.
///
/// # Errors
///
/// Returns `InputError` if the file cannot be read or a `.json`
/// file does not match one of the accepted shapes.
pub fn load(path: &Path) -> Result<Vec<String>, InputError> {
    let content = fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let queries = if is_json {
        parse_json(&content).map_err(|source| InputError::Json {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        vec![content]
    };

    debug!(path = %path.display(), queries = queries.len(), json = is_json, "loaded queries");
    Ok(queries)
}

/// Extract queries from a JSON document.
///
/// # Errors
///
/// Returns `serde_json::Error` for malformed JSON or an unsupported
/// document shape.
pub fn parse_json(content: &str) -> Result<Vec<String>, serde_json::Error> {
    serde_json::from_str::<QueryDocument>(content).map(Vec::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_single_query() {
        let queries = parse_json(r#"{"query": "SELECT * FROM t"}"#).expect("parse");
        assert_eq!(queries, vec!["SELECT * FROM t"]);
    }

    #[test]
    fn json_query_list() {
        let queries = parse_json(r#"{"queries": ["SELECT a FROM t", "DELETE FROM t"]}"#)
            .expect("parse");
        assert_eq!(queries.len(), 2);

        let queries = parse_json(r#"["SELECT a FROM t"]"#).expect("parse");
        assert_eq!(queries, vec!["SELECT a FROM t"]);
    }

    #[test]
    fn json_wrong_shape() {
        assert!(parse_json(r#"{"sql": "SELECT"}"#).is_err());
        assert!(parse_json("[1, 2]").is_err());
    }

    #[test]
    fn missing_file() {
        let err = load(Path::new("/nonexistent/queries.sql")).unwrap_err();
        assert!(matches!(err, InputError::Io { .. }));
        assert!(err.to_string().starts_with("/nonexistent/queries.sql: "));
    }
}
