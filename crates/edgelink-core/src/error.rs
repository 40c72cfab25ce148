//! Error types for edgelink-core.
//!
//! Uses `thiserror` for structured, matchable error variants. Exactly one
//! variant, [`EdgeError::UniqueConstraintViolation`], is recovered locally by
//! the link path; every other variant surfaces to the caller unchanged.

use thiserror::Error;

/// Errors produced by edge store operations and relational executors.
#[derive(Debug, Error)]
pub enum EdgeError {
    /// No explicit edge type was given and the store has no default type.
    #[error("invalid edge type: no explicit type given and no default type configured")]
    InvalidEdgeType,

    /// An insert violated a unique index. `columns` lists the indexed
    /// columns as reported by the backend.
    #[error("unique constraint violated on {table} ({columns})", columns = columns.join(", "))]
    UniqueConstraintViolation { table: String, columns: Vec<String> },

    /// Any other backend failure: connectivity, syntax, other constraints.
    #[error("storage error: {reason}")]
    Storage { reason: String },

    /// The store configuration is unusable.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// A row read back from the backend is missing a column or holds a value
    /// of the wrong kind.
    #[error("malformed row: {reason}")]
    MalformedRow { reason: String },
}

impl EdgeError {
    /// Shorthand for a [`EdgeError::Storage`] error.
    pub fn storage(reason: impl Into<String>) -> Self {
        EdgeError::Storage {
            reason: reason.into(),
        }
    }

    /// Returns `true` if this is a unique constraint violation.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, EdgeError::UniqueConstraintViolation { .. })
    }
}

/// Result alias used throughout the edgelink crates.
pub type Result<T, E = EdgeError> = std::result::Result<T, E>;
