//! Maps `rusqlite` failures onto [`EdgeError`].
//!
//! Unique index violations are the one failure the link path recovers from,
//! so they keep their structure: SQLite reports them as
//! `UNIQUE constraint failed: edge.type, edge.source_id, edge.target_id`,
//! which is parsed back into the violated column list. Everything else
//! becomes [`EdgeError::Storage`].

use edgelink_core::EdgeError;
use rusqlite::ffi;

const UNIQUE_PREFIX: &str = "UNIQUE constraint failed: ";

/// Wraps any `rusqlite` error as a storage error.
pub fn db_err(err: rusqlite::Error) -> EdgeError {
    EdgeError::storage(err.to_string())
}

/// Classifies an insert failure on `table`.
pub fn insert_err(table: &str, err: rusqlite::Error) -> EdgeError {
    match &err {
        rusqlite::Error::SqliteFailure(code, message)
            if code.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            EdgeError::UniqueConstraintViolation {
                table: table.to_string(),
                columns: message
                    .as_deref()
                    .map(unique_columns)
                    .unwrap_or_default(),
            }
        }
        _ => db_err(err),
    }
}

/// Column names from a SQLite unique-constraint message, without their
/// table qualifier. Expression indexes report no columns.
fn unique_columns(message: &str) -> Vec<String> {
    let Some(list) = message.strip_prefix(UNIQUE_PREFIX) else {
        return Vec::new();
    };
    if list.starts_with("index ") {
        return Vec::new();
    }
    list.split(", ")
        .map(|qualified| {
            qualified
                .rsplit_once('.')
                .map_or(qualified, |(_, column)| column)
                .to_string()
        })
        .collect()
}
