//! Value types shared by the store, its executors and its callers.
//!
//! [`EdgeType`] and [`Weight`] are the typed arguments of the link path,
//! [`Ids`] carries the scalar-or-collection endpoint arguments of bulk
//! operations, and [`Row`] / [`Value`] are the schema-agnostic row shape that
//! crosses the executor boundary. [`Edge`] is the typed view of a stored row.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::EdgeError;
use crate::schema::{COL_ID, COL_SOURCE_ID, COL_TARGET_ID, COL_TIMESTAMP, COL_TYPE, COL_WEIGHT};

/// Integer discriminator partitioning the relationship namespace
/// (for example "is-child-of" vs "follows").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeType(pub i64);

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EdgeType {
    fn from(value: i64) -> Self {
        EdgeType(value)
    }
}

/// Weight argument of [`EdgeStore::link`](crate::store::EdgeStore::link).
///
/// `Keep` is the non-numeric sentinel: when the link already exists, the
/// stored weight is left untouched and only the timestamp is refreshed. On
/// the create path there is nothing to keep, so the row is created with
/// weight `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Weight {
    Value(i64),
    Keep,
}

impl Weight {
    /// The numeric weight, or `None` for [`Weight::Keep`].
    pub fn value(self) -> Option<i64> {
        match self {
            Weight::Value(w) => Some(w),
            Weight::Keep => None,
        }
    }
}

impl Default for Weight {
    fn default() -> Self {
        Weight::Value(0)
    }
}

impl From<i64> for Weight {
    fn from(value: i64) -> Self {
        Weight::Value(value)
    }
}

impl From<Option<i64>> for Weight {
    fn from(value: Option<i64>) -> Self {
        value.map_or(Weight::Keep, Weight::Value)
    }
}

/// One endpoint id or a collection of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ids {
    One(i64),
    Many(Vec<i64>),
}

impl Ids {
    /// The ids as a vector, regardless of shape.
    pub fn into_vec(self) -> Vec<i64> {
        match self {
            Ids::One(id) => vec![id],
            Ids::Many(ids) => ids,
        }
    }
}

impl From<i64> for Ids {
    fn from(id: i64) -> Self {
        Ids::One(id)
    }
}

impl From<Vec<i64>> for Ids {
    fn from(ids: Vec<i64>) -> Self {
        Ids::Many(ids)
    }
}

impl From<&[i64]> for Ids {
    fn from(ids: &[i64]) -> Self {
        Ids::Many(ids.to_vec())
    }
}

impl<const N: usize> From<[i64; N]> for Ids {
    fn from(ids: [i64; N]) -> Self {
        Ids::Many(ids.to_vec())
    }
}

/// A dynamically typed column value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<EdgeType> for Value {
    fn from(t: EdgeType) -> Self {
        Value::Integer(t.0)
    }
}

/// A row keyed by column name, in column order.
pub type Row = IndexMap<String, Value>;

/// Reads a required integer column out of a row.
pub fn row_i64(row: &Row, column: &str) -> Result<i64, EdgeError> {
    match row.get(column) {
        Some(value) => value.as_i64().ok_or_else(|| EdgeError::MalformedRow {
            reason: format!("column '{column}' is not an integer: {value:?}"),
        }),
        None => Err(EdgeError::MalformedRow {
            reason: format!("column '{column}' missing"),
        }),
    }
}

/// A stored edge: a typed, weighted, directed relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: i64,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    pub source_id: i64,
    pub target_id: i64,
    pub weight: i64,
    pub timestamp: i64,
}

impl TryFrom<&Row> for Edge {
    type Error = EdgeError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(Edge {
            id: row_i64(row, COL_ID)?,
            edge_type: EdgeType(row_i64(row, COL_TYPE)?),
            source_id: row_i64(row, COL_SOURCE_ID)?,
            target_id: row_i64(row, COL_TARGET_ID)?,
            weight: row_i64(row, COL_WEIGHT)?,
            timestamp: row_i64(row, COL_TIMESTAMP)?,
        })
    }
}
