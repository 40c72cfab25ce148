//! [`EdgeStore`]: typed, weighted, directed edges in one relational table.
//!
//! The store is stateless logic over a [`RelationalExecutor`]: it caches
//! nothing, and every operation resolves its edge type, builds parameterized
//! statements, and hands them to the executor.
//!
//! # Link path
//!
//! [`EdgeStore::link`] inserts first and treats a violation of the
//! `(type, source_id, target_id)` unique index as "already linked": it
//! reloads the stored row, refreshes its timestamp, applies the new weight
//! (unless [`Weight::Keep`]), lets the [`ConflictHook`] adjust the candidate,
//! and updates the row in place. The steps after the failed insert are not
//! one transaction; a concurrent writer can interleave and the last update
//! wins.

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::cursor::{Direction, EdgeCursor};
use crate::error::{EdgeError, Result};
use crate::executor::{Param, RelationalExecutor};
use crate::hook::{BoxedHook, ConflictHook, StoreIdentity};
use crate::schema::{
    TableSchema, COL_ID, COL_SOURCE_ID, COL_TARGET_ID, COL_TIMESTAMP, COL_TYPE, COL_WEIGHT,
};
use crate::types::{row_i64, Edge, EdgeType, Ids, Row, Value, Weight};

/// Source of "now" in seconds since the Unix epoch.
pub type Clock = fn() -> i64;

/// Wall-clock seconds since the Unix epoch.
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Columns a reconciling update never rewrites.
const IMMUTABLE_COLUMNS: [&str; 4] = [COL_ID, COL_TYPE, COL_SOURCE_ID, COL_TARGET_ID];

/// What a link call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linked {
    /// A new row was inserted with this id.
    Created(i64),
    /// The relationship existed; this row was updated in place.
    Updated(i64),
}

impl Linked {
    /// Id of the linked row, whichever way it was reached.
    pub fn id(self) -> i64 {
        match self {
            Linked::Created(id) | Linked::Updated(id) => id,
        }
    }
}

/// Result of one insert attempt.
enum LinkOutcome {
    Created(i64),
    Conflicted(Row),
    /// The insert conflicted but the row was gone by the time it was
    /// reloaded.
    Vanished,
}

/// Edge store over one table.
#[derive(Debug)]
pub struct EdgeStore<E> {
    executor: E,
    identity: StoreIdentity,
    page_size: usize,
    hook: Option<BoxedHook>,
    clock: Clock,
}

impl<E: RelationalExecutor> EdgeStore<E> {
    /// Creates a store over `executor`. Fails if `config` is invalid.
    pub fn new(executor: E, config: StoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(EdgeStore {
            executor,
            identity: StoreIdentity {
                table: config.table_name,
                default_type: config.default_type,
            },
            page_size: config.page_size,
            hook: None,
            clock: unix_now,
        })
    }

    /// Installs the hook invoked on duplicate links.
    pub fn with_hook(mut self, hook: impl ConflictHook + 'static) -> Self {
        self.hook = Some(BoxedHook::new(hook));
        self
    }

    /// Replaces the timestamp source.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// The executor statements run on.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Table and default type, as handed to the conflict hook.
    pub fn identity(&self) -> &StoreIdentity {
        &self.identity
    }

    /// Name of the edge table.
    pub fn table_name(&self) -> &str {
        &self.identity.table
    }

    /// Type used when an operation is given none.
    pub fn default_type(&self) -> Option<EdgeType> {
        self.identity.default_type
    }

    /// The schema of this store's table.
    pub fn schema(&self) -> TableSchema {
        TableSchema::edge(self.table_name())
    }

    // -------------------------------------------------------------------
    // Schema installation
    // -------------------------------------------------------------------

    /// Builds DDL for whatever part of the schema the backend lacks and runs
    /// it when `apply` is set. Returns the statements either way.
    pub fn install(&self, apply: bool) -> Result<Vec<String>> {
        let schema = self.schema();
        let existing = self.executor.existing_schema_objects(&schema.name)?;

        let mut ddl = Vec::new();
        if !existing.contains(&schema.name) {
            ddl.push(self.executor.create_table_sql(&schema));
        }
        for index in &schema.indexes {
            if !existing.contains(index.name) {
                ddl.push(self.executor.create_index_sql(&schema.name, index));
            }
        }

        // All or nothing: the table never exists without `unique_relationship`.
        if apply && !ddl.is_empty() {
            self.executor.execute_batch(&ddl)?;
            info!(table = %schema.name, statements = ddl.len(), "installed edge schema");
        }
        Ok(ddl)
    }

    // -------------------------------------------------------------------
    // Type resolution
    // -------------------------------------------------------------------

    /// `explicit` if given, else the store's default type.
    pub fn resolve_type(&self, explicit: Option<EdgeType>) -> Result<EdgeType> {
        explicit
            .or(self.identity.default_type)
            .ok_or(EdgeError::InvalidEdgeType)
    }

    // -------------------------------------------------------------------
    // Link
    // -------------------------------------------------------------------

    /// Creates the edge `source_id -> target_id`, or updates it if it already
    /// exists. Returns the edge id, which is stable across repeated links of
    /// the same relationship.
    pub fn link(
        &self,
        source_id: i64,
        target_id: i64,
        weight: impl Into<Weight>,
        edge_type: Option<EdgeType>,
    ) -> Result<i64> {
        self.link_with_outcome(source_id, target_id, weight, edge_type)
            .map(Linked::id)
    }

    /// Like [`EdgeStore::link`], reporting whether the row was created or
    /// updated.
    pub fn link_with_outcome(
        &self,
        source_id: i64,
        target_id: i64,
        weight: impl Into<Weight>,
        edge_type: Option<EdgeType>,
    ) -> Result<Linked> {
        let edge_type = self.resolve_type(edge_type)?;
        let weight = weight.into();
        let now = (self.clock)();

        // A conflicting row deleted before the reload frees the key; retry
        // the insert once.
        for attempt in 0..2 {
            match self.try_create(edge_type, source_id, target_id, weight, now)? {
                LinkOutcome::Created(id) => {
                    debug!(table = %self.identity.table, id, %edge_type, source_id, target_id, "edge created");
                    return Ok(Linked::Created(id));
                }
                LinkOutcome::Conflicted(existing) => {
                    return self.reconcile(existing, weight, now).map(Linked::Updated);
                }
                LinkOutcome::Vanished => {
                    warn!(
                        table = %self.identity.table, attempt, %edge_type, source_id, target_id,
                        "conflicting edge vanished before reload"
                    );
                }
            }
        }

        Err(EdgeError::storage(format!(
            "edge ({edge_type}, {source_id}, {target_id}) conflicted on insert but could not be reloaded"
        )))
    }

    fn try_create(
        &self,
        edge_type: EdgeType,
        source_id: i64,
        target_id: i64,
        weight: Weight,
        now: i64,
    ) -> Result<LinkOutcome> {
        let mut row = Row::new();
        row.insert(COL_TYPE.into(), edge_type.into());
        row.insert(COL_SOURCE_ID.into(), source_id.into());
        row.insert(COL_TARGET_ID.into(), target_id.into());
        row.insert(COL_WEIGHT.into(), weight.value().unwrap_or(0).into());
        row.insert(COL_TIMESTAMP.into(), now.into());

        match self.executor.insert(&self.identity.table, &row) {
            Ok(id) => Ok(LinkOutcome::Created(id)),
            Err(EdgeError::UniqueConstraintViolation { columns, .. })
                if TableSchema::is_relationship_key(columns.as_slice()) =>
            {
                Ok(match self.load_row(edge_type, source_id, target_id)? {
                    Some(existing) => LinkOutcome::Conflicted(existing),
                    None => LinkOutcome::Vanished,
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Writes the reconciled candidate for an existing row back by id.
    fn reconcile(&self, existing: Row, weight: Weight, now: i64) -> Result<i64> {
        let id = row_i64(&existing, COL_ID)?;

        let mut candidate = existing.clone();
        candidate.insert(COL_TIMESTAMP.into(), Value::Integer(now));
        if let Some(weight) = weight.value() {
            candidate.insert(COL_WEIGHT.into(), Value::Integer(weight));
        }
        if let Some(hook) = &self.hook {
            hook.call(&self.identity, &mut candidate);
        }

        for column in IMMUTABLE_COLUMNS {
            let edited = candidate.shift_remove(column);
            if edited.as_ref() != existing.get(column) {
                warn!(table = %self.identity.table, id, column, "ignoring conflict hook edit to immutable column");
            }
        }

        // Only the refreshed columns and whatever the hook changed are written
        // back; untouched columns keep their stored bytes.
        let mut payload = Row::new();
        for (column, value) in candidate {
            let refreshed =
                column == COL_TIMESTAMP || (column == COL_WEIGHT && weight.value().is_some());
            if refreshed || existing.get(&column) != Some(&value) {
                payload.insert(column, value);
            }
        }

        if !payload.is_empty() {
            let mut key = Row::new();
            key.insert(COL_ID.into(), Value::Integer(id));
            self.executor.update(&self.identity.table, &payload, &key)?;
        }
        debug!(table = %self.identity.table, id, "duplicate edge reconciled");
        Ok(id)
    }

    /// Loads the edge for a relationship, if it exists.
    pub fn find(
        &self,
        source_id: i64,
        target_id: i64,
        edge_type: Option<EdgeType>,
    ) -> Result<Option<Edge>> {
        let edge_type = self.resolve_type(edge_type)?;
        self.load_row(edge_type, source_id, target_id)?
            .as_ref()
            .map(Edge::try_from)
            .transpose()
    }

    /// Full stored row for a relationship, including columns the store does
    /// not model.
    fn load_row(&self, edge_type: EdgeType, source_id: i64, target_id: i64) -> Result<Option<Row>> {
        let sql = format!(
            "SELECT * FROM {} WHERE type = ? AND source_id = ? AND target_id = ?",
            self.identity.table
        );
        let rows = self.executor.query(
            &sql,
            &[Param::Int(edge_type.0), Param::Int(source_id), Param::Int(target_id)],
        )?;
        Ok(rows.into_iter().next())
    }

    // -------------------------------------------------------------------
    // Bulk reads
    // -------------------------------------------------------------------

    /// Targets of one source, ascending by weight.
    pub fn targets_of(&self, source_id: i64, edge_type: Option<EdgeType>) -> Result<Vec<i64>> {
        let rows = self.select_targets(&[source_id], edge_type)?;
        rows.iter().map(|row| row_i64(row, COL_TARGET_ID)).collect()
    }

    /// Targets of each source, ascending by weight within each source.
    /// Sources without edges are absent from the map.
    pub fn targets_of_many(
        &self,
        source_ids: &[i64],
        edge_type: Option<EdgeType>,
    ) -> Result<IndexMap<i64, Vec<i64>>> {
        let rows = self.select_targets(source_ids, edge_type)?;
        group(&rows, COL_SOURCE_ID, COL_TARGET_ID)
    }

    /// Sources of one target. No ordering is applied.
    pub fn sources_of(&self, target_id: i64, edge_type: Option<EdgeType>) -> Result<Vec<i64>> {
        let rows = self.select_sources(&[target_id], edge_type)?;
        rows.iter().map(|row| row_i64(row, COL_SOURCE_ID)).collect()
    }

    /// Sources of each target. Targets without edges are absent from the map.
    pub fn sources_of_many(
        &self,
        target_ids: &[i64],
        edge_type: Option<EdgeType>,
    ) -> Result<IndexMap<i64, Vec<i64>>> {
        let rows = self.select_sources(target_ids, edge_type)?;
        group(&rows, COL_TARGET_ID, COL_SOURCE_ID)
    }

    /// Streams `(source_id, target_id)` pairs for the given sources in weight
    /// order.
    pub fn target_cursor(
        &self,
        source_ids: impl Into<Ids>,
        edge_type: Option<EdgeType>,
    ) -> Result<EdgeCursor<'_, E>> {
        let edge_type = self.resolve_type(edge_type)?;
        Ok(EdgeCursor::new(
            &self.executor,
            &self.identity.table,
            Direction::Targets,
            edge_type,
            source_ids.into().into_vec(),
            self.page_size,
        ))
    }

    /// Streams `(target_id, source_id)` pairs for the given targets.
    pub fn source_cursor(
        &self,
        target_ids: impl Into<Ids>,
        edge_type: Option<EdgeType>,
    ) -> Result<EdgeCursor<'_, E>> {
        let edge_type = self.resolve_type(edge_type)?;
        Ok(EdgeCursor::new(
            &self.executor,
            &self.identity.table,
            Direction::Sources,
            edge_type,
            target_ids.into().into_vec(),
            self.page_size,
        ))
    }

    fn select_targets(&self, source_ids: &[i64], edge_type: Option<EdgeType>) -> Result<Vec<Row>> {
        let edge_type = self.resolve_type(edge_type)?;
        let sql = format!(
            "SELECT target_id, source_id FROM {} WHERE type = ? AND source_id IN (?) ORDER BY weight ASC",
            self.identity.table
        );
        self.executor.query(
            &sql,
            &[Param::Int(edge_type.0), Param::IntList(source_ids.to_vec())],
        )
    }

    fn select_sources(&self, target_ids: &[i64], edge_type: Option<EdgeType>) -> Result<Vec<Row>> {
        let edge_type = self.resolve_type(edge_type)?;
        let sql = format!(
            "SELECT source_id, target_id FROM {} WHERE type = ? AND target_id IN (?)",
            self.identity.table
        );
        self.executor.query(
            &sql,
            &[Param::Int(edge_type.0), Param::IntList(target_ids.to_vec())],
        )
    }

    // -------------------------------------------------------------------
    // Deletion
    // -------------------------------------------------------------------

    /// Deletes every edge of the type leaving any of `source_ids`. Returns
    /// the number of rows deleted.
    pub fn clear_using_source(
        &self,
        source_ids: impl Into<Ids>,
        edge_type: Option<EdgeType>,
    ) -> Result<usize> {
        self.clear(COL_SOURCE_ID, source_ids.into(), edge_type)
    }

    /// Deletes every edge of the type entering any of `target_ids`. Returns
    /// the number of rows deleted.
    pub fn clear_using_target(
        &self,
        target_ids: impl Into<Ids>,
        edge_type: Option<EdgeType>,
    ) -> Result<usize> {
        self.clear(COL_TARGET_ID, target_ids.into(), edge_type)
    }

    fn clear(&self, column: &str, ids: Ids, edge_type: Option<EdgeType>) -> Result<usize> {
        let edge_type = self.resolve_type(edge_type)?;
        let sql = format!(
            "DELETE FROM {} WHERE type = ? AND {column} IN (?)",
            self.identity.table
        );
        let deleted = self
            .executor
            .execute(&sql, &[Param::Int(edge_type.0), Param::IntList(ids.into_vec())])?;
        debug!(table = %self.identity.table, column, deleted, "cleared edges");
        Ok(deleted)
    }
}

/// Buckets `value_col` under `key_col`, keeping row order within a bucket.
fn group(rows: &[Row], key_col: &str, value_col: &str) -> Result<IndexMap<i64, Vec<i64>>> {
    let mut grouped: IndexMap<i64, Vec<i64>> = IndexMap::new();
    for row in rows {
        grouped
            .entry(row_i64(row, key_col)?)
            .or_default()
            .push(row_i64(row, value_col)?);
    }
    Ok(grouped)
}
