//! Edge table definition as pure data.
//!
//! [`TableSchema::edge`] describes the edge table without touching a backend,
//! so the installer can render DDL from it and tests can inspect it directly.
//! Column and index names are fixed; only the table name varies.

use serde::Serialize;

pub const DEFAULT_TABLE: &str = "edge";

pub const COL_ID: &str = "id";
pub const COL_TYPE: &str = "type";
pub const COL_SOURCE_ID: &str = "source_id";
pub const COL_TARGET_ID: &str = "target_id";
pub const COL_WEIGHT: &str = "weight";
pub const COL_TIMESTAMP: &str = "timestamp";

pub const INDEX_SOURCE: &str = "index_source";
pub const INDEX_TARGET: &str = "index_target";
pub const INDEX_WEIGHT: &str = "index_weight";
pub const INDEX_TIMESTAMP: &str = "index_timestamp";
pub const UNIQUE_RELATIONSHIP: &str = "unique_relationship";

/// Column set of the `(type, source_id, target_id)` uniqueness constraint.
pub const RELATIONSHIP_KEY: [&str; 3] = [COL_TYPE, COL_SOURCE_ID, COL_TARGET_ID];

/// Storage kind of a column. The edge table only uses integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnKind {
    Integer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub unsigned: bool,
    pub auto_increment: bool,
}

impl ColumnDef {
    const fn integer(name: &'static str) -> Self {
        ColumnDef {
            name,
            kind: ColumnKind::Integer,
            unsigned: false,
            auto_increment: false,
        }
    }

    const fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    const fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexDef {
    pub name: &'static str,
    pub columns: Vec<&'static str>,
    pub unique: bool,
}

/// A table: columns in declaration order, primary key, secondary indexes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub primary_key: Vec<&'static str>,
    pub indexes: Vec<IndexDef>,
}

impl TableSchema {
    /// The edge table under the given name.
    pub fn edge(name: impl Into<String>) -> Self {
        let index = |name, columns: &[&'static str], unique| IndexDef {
            name,
            columns: columns.to_vec(),
            unique,
        };

        TableSchema {
            name: name.into(),
            columns: vec![
                ColumnDef::integer(COL_ID).unsigned().auto_increment(),
                ColumnDef::integer(COL_TYPE),
                ColumnDef::integer(COL_SOURCE_ID),
                ColumnDef::integer(COL_TARGET_ID),
                ColumnDef::integer(COL_WEIGHT),
                ColumnDef::integer(COL_TIMESTAMP).unsigned(),
            ],
            primary_key: vec![COL_ID],
            indexes: vec![
                index(INDEX_SOURCE, &[COL_TYPE, COL_SOURCE_ID], false),
                index(INDEX_TARGET, &[COL_TYPE, COL_TARGET_ID], false),
                index(INDEX_WEIGHT, &[COL_WEIGHT], false),
                index(INDEX_TIMESTAMP, &[COL_TIMESTAMP], false),
                index(UNIQUE_RELATIONSHIP, &RELATIONSHIP_KEY, true),
            ],
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn index(&self, name: &str) -> Option<&IndexDef> {
        self.indexes.iter().find(|i| i.name == name)
    }

    /// The uniqueness constraint guarding one row per relationship.
    pub fn unique_index(&self) -> Option<&IndexDef> {
        self.index(UNIQUE_RELATIONSHIP)
    }

    /// Returns `true` if `columns` is exactly the relationship key, in any
    /// order.
    pub fn is_relationship_key<S: AsRef<str>>(columns: &[S]) -> bool {
        columns.len() == RELATIONSHIP_KEY.len()
            && RELATIONSHIP_KEY
                .iter()
                .all(|key| columns.iter().any(|c| c.as_ref() == *key))
    }
}
