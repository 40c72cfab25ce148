//! Forward-only cursors over edge endpoints.
//!
//! An [`EdgeCursor`] fetches `page_size` rows per statement using keyset
//! pagination (rows strictly after the last key seen), so memory stays
//! bounded by one page however large the result is. Target cursors walk
//! `(weight, id)` ascending, matching `targets_of`; source cursors walk `id`
//! ascending only to page stably. Once exhausted or failed, a cursor yields
//! `None` forever and cannot be restarted.

use std::collections::VecDeque;
use std::iter::FusedIterator;

use crate::error::Result;
use crate::executor::{Param, RelationalExecutor};
use crate::schema::{COL_ID, COL_SOURCE_ID, COL_TARGET_ID, COL_WEIGHT};
use crate::types::{row_i64, EdgeType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    /// Yields `(source_id, target_id)` for the given sources.
    Targets,
    /// Yields `(target_id, source_id)` for the given targets.
    Sources,
}

/// Lazy cursor over `(lookup id, related id)` pairs.
pub struct EdgeCursor<'s, E> {
    executor: &'s E,
    table: &'s str,
    direction: Direction,
    edge_type: EdgeType,
    ids: Vec<i64>,
    page_size: usize,
    buffer: VecDeque<(i64, i64)>,
    /// `(weight, id)` of the last row fetched; weight is unused for sources.
    after: Option<(i64, i64)>,
    finished: bool,
}

impl<'s, E: RelationalExecutor> EdgeCursor<'s, E> {
    pub(crate) fn new(
        executor: &'s E,
        table: &'s str,
        direction: Direction,
        edge_type: EdgeType,
        ids: Vec<i64>,
        page_size: usize,
    ) -> Self {
        let finished = ids.is_empty();
        EdgeCursor {
            executor,
            table,
            direction,
            edge_type,
            ids,
            page_size,
            buffer: VecDeque::new(),
            after: None,
            finished,
        }
    }

    fn page_sql(&self) -> String {
        let table = self.table;
        match (self.direction, self.after.is_some()) {
            (Direction::Targets, false) => format!(
                "SELECT id, weight, source_id, target_id FROM {table} \
                 WHERE type = ? AND source_id IN (?) \
                 ORDER BY weight ASC, id ASC LIMIT ?"
            ),
            (Direction::Targets, true) => format!(
                "SELECT id, weight, source_id, target_id FROM {table} \
                 WHERE type = ? AND source_id IN (?) \
                 AND (weight > ? OR (weight = ? AND id > ?)) \
                 ORDER BY weight ASC, id ASC LIMIT ?"
            ),
            (Direction::Sources, false) => format!(
                "SELECT id, weight, source_id, target_id FROM {table} \
                 WHERE type = ? AND target_id IN (?) \
                 ORDER BY id ASC LIMIT ?"
            ),
            (Direction::Sources, true) => format!(
                "SELECT id, weight, source_id, target_id FROM {table} \
                 WHERE type = ? AND target_id IN (?) AND id > ? \
                 ORDER BY id ASC LIMIT ?"
            ),
        }
    }

    fn fetch_page(&mut self) -> Result<()> {
        let mut params = vec![Param::Int(self.edge_type.0), Param::IntList(self.ids.clone())];
        match (self.direction, self.after) {
            (Direction::Targets, Some((weight, id))) => {
                params.extend([Param::Int(weight), Param::Int(weight), Param::Int(id)]);
            }
            (Direction::Sources, Some((_, id))) => params.push(Param::Int(id)),
            (_, None) => {}
        }
        params.push(Param::Int(self.page_size as i64));

        let rows = self.executor.query(&self.page_sql(), &params)?;
        tracing::trace!(table = self.table, rows = rows.len(), "fetched cursor page");
        if rows.len() < self.page_size {
            self.finished = true;
        }

        for row in &rows {
            let source_id = row_i64(row, COL_SOURCE_ID)?;
            let target_id = row_i64(row, COL_TARGET_ID)?;
            self.after = Some((row_i64(row, COL_WEIGHT)?, row_i64(row, COL_ID)?));
            self.buffer.push_back(match self.direction {
                Direction::Targets => (source_id, target_id),
                Direction::Sources => (target_id, source_id),
            });
        }
        Ok(())
    }
}

impl<E: RelationalExecutor> Iterator for EdgeCursor<'_, E> {
    type Item = Result<(i64, i64)>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(pair) = self.buffer.pop_front() {
            return Some(Ok(pair));
        }
        if self.finished {
            return None;
        }
        match self.fetch_page() {
            Ok(()) => self.buffer.pop_front().map(Ok),
            Err(err) => {
                self.finished = true;
                self.buffer.clear();
                Some(Err(err))
            }
        }
    }
}

impl<E: RelationalExecutor> FusedIterator for EdgeCursor<'_, E> {}
