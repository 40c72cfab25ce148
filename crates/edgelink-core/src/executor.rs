//! The [`RelationalExecutor`] trait: the statement-execution contract the
//! edge store is written against.
//!
//! Executors own the connection, the SQL dialect and error classification.
//! The store hands them parameterized SQL using positional `?` placeholders;
//! a [`Param::IntList`] binds a whole `IN (?)` membership list to a single
//! placeholder and is expanded by [`expand_params`].

use std::collections::HashSet;

use crate::error::Result;
use crate::schema::{IndexDef, TableSchema};
use crate::types::{Row, Value};

/// A positional statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Int(i64),
    /// Bound to an `IN (?)` placeholder, one value per element.
    IntList(Vec<i64>),
}

/// The storage contract for edge tables.
///
/// Methods take `&self`; executors that need interior mutability (a pooled
/// or locked connection) manage it themselves. Every call is one statement
/// and is assumed to be atomic on its own.
pub trait RelationalExecutor {
    /// Inserts `row` into `table` and returns the id assigned to it.
    ///
    /// Must fail with
    /// [`EdgeError::UniqueConstraintViolation`](crate::EdgeError::UniqueConstraintViolation)
    /// when a unique index rejects the row, and with
    /// [`EdgeError::Storage`](crate::EdgeError::Storage) for anything else.
    fn insert(&self, table: &str, row: &Row) -> Result<i64>;

    /// Sets every column of `payload` on the rows whose columns equal
    /// `where_equals`. Returns the number of rows changed.
    fn update(&self, table: &str, payload: &Row, where_equals: &Row) -> Result<usize>;

    /// Runs a query and collects its rows.
    fn query(&self, sql: &str, params: &[Param]) -> Result<Vec<Row>>;

    /// Runs a statement that returns no rows. Returns the affected count.
    fn execute(&self, sql: &str, params: &[Param]) -> Result<usize>;

    /// Runs parameterless `statements` as one unit: either every statement
    /// takes effect or none does.
    fn execute_batch(&self, statements: &[String]) -> Result<()>;

    /// Names of the table and of its indexes that already exist.
    fn existing_schema_objects(&self, table: &str) -> Result<HashSet<String>>;

    /// DDL creating `schema`'s table (without its secondary indexes).
    fn create_table_sql(&self, schema: &TableSchema) -> String;

    /// DDL creating one secondary index on `table`.
    fn create_index_sql(&self, table: &str, index: &IndexDef) -> String;
}

/// Expands list parameters into one placeholder per element and flattens
/// all parameters into bind values, in placeholder order.
///
/// An empty list becomes `NULL`, so `x IN (NULL)` matches nothing.
/// Placeholders inside quoted literals are left alone.
pub fn expand_params(sql: &str, params: &[Param]) -> Result<(String, Vec<Value>)> {
    let mut out = String::with_capacity(sql.len());
    let mut values = Vec::new();
    let mut params = params.iter();
    let mut quote: Option<char> = None;

    for ch in sql.chars() {
        match (ch, quote) {
            ('\'' | '"', None) => {
                quote = Some(ch);
                out.push(ch);
            }
            (c, Some(q)) if c == q => {
                quote = None;
                out.push(ch);
            }
            ('?', None) => match params.next() {
                Some(Param::Int(v)) => {
                    out.push('?');
                    values.push(Value::Integer(*v));
                }
                Some(Param::IntList(list)) if list.is_empty() => out.push_str("NULL"),
                Some(Param::IntList(list)) => {
                    for (i, v) in list.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        out.push('?');
                        values.push(Value::Integer(*v));
                    }
                }
                None => {
                    return Err(crate::EdgeError::storage(format!(
                        "statement has more placeholders than parameters: {sql}"
                    )))
                }
            },
            _ => out.push(ch),
        }
    }

    if params.next().is_some() {
        return Err(crate::EdgeError::storage(format!(
            "statement has fewer placeholders than parameters: {sql}"
        )));
    }

    Ok((out, values))
}
