//! Connection setup and SQLite dialect DDL for edge tables.
//!
//! Tables are created from [`TableSchema`] rather than embedded migration
//! files because the table name is chosen at runtime.

use edgelink_core::schema::{ColumnDef, ColumnKind, IndexDef, TableSchema};
use rusqlite::Connection;

use crate::error::db_err;

/// Opens (or creates) a SQLite database at `path`, configured for edge
/// storage.
pub fn open_database(path: &str) -> edgelink_core::Result<Connection> {
    let conn = Connection::open(path).map_err(db_err)?;
    configure(&conn)?;
    Ok(conn)
}

/// Opens a private in-memory SQLite database.
pub fn open_in_memory() -> edgelink_core::Result<Connection> {
    let conn = Connection::open_in_memory().map_err(db_err)?;
    configure(&conn)?;
    Ok(conn)
}

fn configure(conn: &Connection) -> edgelink_core::Result<()> {
    // WAL for concurrent readers alongside the single writer; a no-op for
    // in-memory databases.
    conn.pragma_update(None, "journal_mode", "WAL").map_err(db_err)?;
    // NORMAL synchronous is safe with WAL mode.
    conn.pragma_update(None, "synchronous", "NORMAL").map_err(db_err)?;
    Ok(())
}

/// `CREATE TABLE` for `schema`, without secondary indexes.
///
/// SQLite has no unsigned integers; the auto-increment key becomes
/// `INTEGER PRIMARY KEY AUTOINCREMENT` so ids are never reused.
pub fn create_table_sql(schema: &TableSchema) -> String {
    let columns: Vec<String> = schema
        .columns
        .iter()
        .map(|column| column_sql(column, schema))
        .collect();
    format!("CREATE TABLE {} ({})", schema.name, columns.join(", "))
}

fn column_sql(column: &ColumnDef, schema: &TableSchema) -> String {
    let ty = match column.kind {
        ColumnKind::Integer => "INTEGER",
    };
    let single_key = schema.primary_key.len() == 1 && schema.primary_key[0] == column.name;
    if single_key && column.auto_increment {
        format!("{} {ty} PRIMARY KEY AUTOINCREMENT", column.name)
    } else if single_key {
        format!("{} {ty} PRIMARY KEY", column.name)
    } else {
        format!("{} {ty} NOT NULL", column.name)
    }
}

/// `CREATE [UNIQUE] INDEX` for one index on `table`.
pub fn create_index_sql(table: &str, index: &IndexDef) -> String {
    format!(
        "CREATE {}INDEX {} ON {table} ({})",
        if index.unique { "UNIQUE " } else { "" },
        index.name,
        index.columns.join(", ")
    )
}
