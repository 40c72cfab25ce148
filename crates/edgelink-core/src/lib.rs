//! Directed, typed, weighted edges stored in a relational table.
//!
//! [`EdgeStore`] persists `source_id -> target_id` relationships partitioned
//! by an integer [`EdgeType`], keeps exactly one row per
//! `(type, source_id, target_id)`, and answers ordered bulk lookups. It is
//! written against the [`RelationalExecutor`] trait; the SQLite executor
//! lives in `edgelink-storage`.
//!
//! # Modules
//!
//! - [`error`]: EdgeError enum with all failure modes
//! - [`types`]: EdgeType, Weight, Ids, Row/Value and the typed Edge
//! - [`schema`]: edge table definition as pure data
//! - [`executor`]: RelationalExecutor trait and parameter expansion
//! - [`hook`]: ConflictHook invoked on duplicate links
//! - [`config`]: StoreConfig and its environment overrides
//! - [`store`]: EdgeStore link/read/delete/install operations
//! - [`cursor`]: paged EdgeCursor for streaming reads

pub mod config;
pub mod cursor;
pub mod error;
pub mod executor;
pub mod hook;
pub mod schema;
pub mod store;
pub mod types;

// Re-export key types for ergonomic use.
pub use config::StoreConfig;
pub use cursor::EdgeCursor;
pub use error::{EdgeError, Result};
pub use executor::{expand_params, Param, RelationalExecutor};
pub use hook::{ConflictHook, StoreIdentity};
pub use schema::TableSchema;
pub use store::{unix_now, Clock, EdgeStore, Linked};
pub use types::{Edge, EdgeType, Ids, Row, Value, Weight};
