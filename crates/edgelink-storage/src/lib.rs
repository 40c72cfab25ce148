//! SQLite backend for edgelink.
//!
//! Provides [`SqliteExecutor`], the `rusqlite` implementation of
//! [`edgelink_core::RelationalExecutor`], plus [`open_store`] /
//! [`open_store_in_memory`] to build an installed [`EdgeStore`] in one call.
//!
//! # Modules
//!
//! - [`error`]: classification of `rusqlite` errors into `EdgeError`
//! - [`schema`]: connection setup and SQLite dialect DDL
//! - [`sqlite`]: SqliteExecutor implementation

pub mod error;
pub mod schema;
pub mod sqlite;

use edgelink_core::{EdgeStore, Result, StoreConfig};

pub use sqlite::SqliteExecutor;

/// Opens the database at `path` and returns a store with its schema
/// installed.
pub fn open_store(path: &str, config: StoreConfig) -> Result<EdgeStore<SqliteExecutor>> {
    let store = EdgeStore::new(SqliteExecutor::open(path)?, config)?;
    store.install(true)?;
    Ok(store)
}

/// Like [`open_store`], backed by a private in-memory database.
pub fn open_store_in_memory(config: StoreConfig) -> Result<EdgeStore<SqliteExecutor>> {
    let store = EdgeStore::new(SqliteExecutor::in_memory()?, config)?;
    store.install(true)?;
    Ok(store)
}
