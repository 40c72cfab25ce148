//! SQLite implementation of [`RelationalExecutor`].
//!
//! [`SqliteExecutor`] owns one `rusqlite::Connection`. Each trait call runs
//! exactly one statement, so every call is atomic on its own; nothing spans
//! calls. Row values cross the boundary as [`edgelink_core::Value`] and are
//! bound positionally.

use std::collections::HashSet;

use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params, params_from_iter, Connection};
use tracing::trace;

use edgelink_core::schema::{IndexDef, TableSchema};
use edgelink_core::{expand_params, Param, RelationalExecutor, Result, Row, Value};

use crate::error::{db_err, insert_err};

/// SQLite-backed [`RelationalExecutor`].
#[derive(Debug)]
pub struct SqliteExecutor {
    conn: Connection,
}

impl SqliteExecutor {
    /// Opens (or creates) a SQLite database at `path`.
    pub fn open(path: &str) -> Result<Self> {
        crate::schema::open_database(path).map(Self::from_connection)
    }

    /// Opens an in-memory SQLite database (for testing).
    pub fn in_memory() -> Result<Self> {
        crate::schema::open_in_memory().map(Self::from_connection)
    }

    /// Wraps an already configured connection.
    pub fn from_connection(conn: Connection) -> Self {
        SqliteExecutor { conn }
    }

    /// The underlying connection, for statements outside the executor
    /// contract.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn bind(sql: &str, params: &[Param]) -> Result<(String, Vec<SqlValue>)> {
        let (sql, values) = expand_params(sql, params)?;
        Ok((sql, values.iter().map(to_sql_value).collect()))
    }
}

impl RelationalExecutor for SqliteExecutor {
    fn insert(&self, table: &str, row: &Row) -> Result<i64> {
        let columns: Vec<&str> = row.keys().map(String::as_str).collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {table} ({}) VALUES ({placeholders})",
            columns.join(", ")
        );
        trace!(%sql, "insert");

        let mut stmt = self.conn.prepare_cached(&sql).map_err(db_err)?;
        stmt.execute(params_from_iter(row.values().map(to_sql_value)))
            .map_err(|err| insert_err(table, err))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, table: &str, payload: &Row, where_equals: &Row) -> Result<usize> {
        let assignments: Vec<String> = payload.keys().map(|c| format!("{c} = ?")).collect();
        let conditions: Vec<String> = where_equals.keys().map(|c| format!("{c} = ?")).collect();
        let mut sql = format!("UPDATE {table} SET {}", assignments.join(", "));
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        trace!(%sql, "update");

        let values = payload
            .values()
            .chain(where_equals.values())
            .map(to_sql_value);
        let mut stmt = self.conn.prepare_cached(&sql).map_err(db_err)?;
        stmt.execute(params_from_iter(values)).map_err(db_err)
    }

    fn query(&self, sql: &str, params: &[Param]) -> Result<Vec<Row>> {
        let (sql, values) = Self::bind(sql, params)?;
        trace!(%sql, params = values.len(), "query");

        let mut stmt = self.conn.prepare_cached(&sql).map_err(db_err)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.query(params_from_iter(values)).map_err(db_err)?;

        let mut result = Vec::new();
        while let Some(row) = rows.next().map_err(db_err)? {
            let mut out = Row::with_capacity(columns.len());
            for (i, name) in columns.iter().enumerate() {
                out.insert(name.clone(), from_sql_value(row.get_ref(i).map_err(db_err)?));
            }
            result.push(out);
        }
        Ok(result)
    }

    fn execute(&self, sql: &str, params: &[Param]) -> Result<usize> {
        let (sql, values) = Self::bind(sql, params)?;
        trace!(%sql, params = values.len(), "execute");
        self.conn
            .execute(&sql, params_from_iter(values))
            .map_err(db_err)
    }

    fn execute_batch(&self, statements: &[String]) -> Result<()> {
        // Rolls back on drop unless committed.
        let tx = self.conn.unchecked_transaction().map_err(db_err)?;
        for sql in statements {
            trace!(%sql, "batch");
            tx.execute(sql, []).map_err(db_err)?;
        }
        tx.commit().map_err(db_err)
    }

        fn existing_schema_objects(&self, table: &str) -> Result<HashSet<String>> {
        let mut stmt = self
            .conn
            .prepare_cached(
                "SELECT name FROM sqlite_master WHERE tbl_name = ?1 AND type IN ('table', 'index')",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![table], |row| row.get::<_, String>(0))
            .map_err(db_err)?;
        let mut names = HashSet::new();
        for row in rows {
            names.insert(row.map_err(db_err)?);
        }
        Ok(names)
    }

    fn create_table_sql(&self, schema: &TableSchema) -> String {
        crate::schema::create_table_sql(schema)
    }

    fn create_index_sql(&self, table: &str, index: &IndexDef) -> String {
        crate::schema::create_index_sql(table, index)
    }
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(v) => SqlValue::Integer(*v),
        Value::Real(v) => SqlValue::Real(*v),
        Value::Text(v) => SqlValue::Text(v.clone()),
        Value::Blob(v) => SqlValue::Blob(v.clone()),
    }
}

fn from_sql_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Integer(v),
        ValueRef::Real(v) => Value::Real(v),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    }
}
