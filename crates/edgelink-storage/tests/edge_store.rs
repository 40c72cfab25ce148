//! End-to-end tests for `EdgeStore` over an in-memory SQLite database.
//!
//! Each test builds a fresh store with default type 111 on table `edge`
//! and the schema installed, mirroring how callers wire the store.

use std::sync::{Arc, Mutex};

use edgelink_core::{
    Edge, EdgeError, EdgeStore, EdgeType, Linked, RelationalExecutor, Row, StoreConfig, StoreIdentity,
    Value, Weight,
};
use edgelink_storage::{open_store, open_store_in_memory, SqliteExecutor};
use indexmap::IndexMap;

const T: Option<EdgeType> = Some(EdgeType(111));

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

fn test_store() -> EdgeStore<SqliteExecutor> {
    open_store_in_memory(StoreConfig::new("edge", Some(EdgeType(111))))
        .expect("failed to open in-memory edge store")
}

fn count_rows(store: &EdgeStore<SqliteExecutor>) -> i64 {
    store
        .executor()
        .connection()
        .query_row(&format!("SELECT COUNT(*) FROM {}", store.table_name()), [], |row| row.get(0))
        .unwrap()
}

fn edge(store: &EdgeStore<SqliteExecutor>, source: i64, target: i64) -> Edge {
    store
        .find(source, target, None)
        .unwrap()
        .expect("edge should exist")
}

// ---------------------------------------------------------------------------
// Link
// ---------------------------------------------------------------------------

#[test]
fn link_inserts_rows_in_call_order() {
    let store = test_store();
    store.link(555, 777, 0, None).unwrap();
    store.link(555, 999, 1, None).unwrap();

    let mut stmt = store
        .executor()
        .connection()
        .prepare("SELECT target_id FROM edge WHERE type = 111 ORDER BY id")
        .unwrap();
    let targets: Vec<i64> = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(targets, vec![777, 999]);
}

#[test]
fn repeated_link_keeps_one_row_and_its_id() {
    let store = test_store().with_clock(|| 1_000);
    let first = store.link_with_outcome(555, 999, 0, None).unwrap();
    assert!(matches!(first, Linked::Created(_)));

    let store = store.with_clock(|| 2_000);
    let second = store.link_with_outcome(555, 999, 1, None).unwrap();
    assert_eq!(second, Linked::Updated(first.id()));
    assert_eq!(count_rows(&store), 1);

    let stored = edge(&store, 555, 999);
    assert_eq!(stored.id, first.id());
    assert_eq!(stored.weight, 1);
    assert_eq!(stored.timestamp, 2_000);
    assert_eq!(stored.edge_type, EdgeType(111));
}

#[test]
fn same_endpoints_under_different_types_are_distinct_edges() {
    let store = test_store();
    let a = store.link(555, 999, 0, None).unwrap();
    let b = store.link(555, 999, 0, Some(EdgeType(222))).unwrap();
    assert_ne!(a, b);
    assert_eq!(count_rows(&store), 2);
    assert_eq!(store.targets_of(555, Some(EdgeType(222))).unwrap(), vec![999]);
}

#[test]
fn keep_weight_on_conflict_only_refreshes_timestamp() {
    let store = test_store().with_clock(|| 1_000);
    let id = store.link(555, 999, 5, None).unwrap();

    let store = store.with_clock(|| 3_000);
    assert_eq!(store.link(555, 999, Weight::Keep, None).unwrap(), id);

    let stored = edge(&store, 555, 999);
    assert_eq!(stored.weight, 5);
    assert_eq!(stored.timestamp, 3_000);
}

#[test]
fn keep_weight_on_create_uses_zero() {
    let store = test_store();
    store.link(555, 999, Weight::Keep, None).unwrap();
    assert_eq!(edge(&store, 555, 999).weight, 0);
}

#[test]
fn conflict_hook_observes_candidate() {
    let seen: Arc<Mutex<Vec<(StoreIdentity, Row)>>> = Arc::default();
    let recorder = Arc::clone(&seen);
    let store = test_store().with_hook(move |identity: &StoreIdentity, candidate: &mut Row| {
        recorder
            .lock()
            .unwrap()
            .push((identity.clone(), candidate.clone()));
    });

    let id = store.link(555, 999, 0, None).unwrap();
    assert!(seen.lock().unwrap().is_empty(), "hook must not run on create");

    store.link(555, 999, 1, None).unwrap();
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);

    let (identity, candidate) = &seen[0];
    assert_eq!(identity.table, "edge");
    assert_eq!(identity.default_type, Some(EdgeType(111)));
    assert_eq!(candidate["id"], Value::Integer(id));
    assert_eq!(candidate["type"], Value::Integer(111));
    assert_eq!(candidate["source_id"], Value::Integer(555));
    assert_eq!(candidate["target_id"], Value::Integer(999));
    assert_eq!(candidate["weight"], Value::Integer(1));
    assert!(candidate.contains_key("timestamp"));
}

#[test]
fn conflict_hook_can_recompute_weight_and_fill_extra_columns() {
    let store = test_store().with_hook(|_: &StoreIdentity, candidate: &mut Row| {
        let weight = candidate["weight"].as_i64().unwrap_or(0);
        candidate.insert("weight".into(), Value::Integer(weight * 10));
        candidate.insert("note".into(), Value::Text("merged".into()));
        candidate.insert("target_id".into(), Value::Integer(1));
    });
    store
        .executor()
        .connection()
        .execute_batch("ALTER TABLE edge ADD COLUMN note TEXT NOT NULL DEFAULT ''")
        .unwrap();

    store.link(555, 999, 0, None).unwrap();
    store.link(555, 999, 2, None).unwrap();

    let stored = edge(&store, 555, 999);
    assert_eq!(stored.weight, 20);
    assert_eq!(stored.target_id, 999);
    let note: String = store
        .executor()
        .connection()
        .query_row("SELECT note FROM edge WHERE id = ?1", [stored.id], |row| row.get(0))
        .unwrap();
    assert_eq!(note, "merged");
}

#[test]
fn unknown_columns_survive_reconciliation() {
    let store = test_store();
    store
        .executor()
        .connection()
        .execute_batch("ALTER TABLE edge ADD COLUMN label TEXT")
        .unwrap();
    let id = store.link(555, 999, 0, None).unwrap();
    store
        .executor()
        .connection()
        .execute("UPDATE edge SET label = 'pinned' WHERE id = ?1", [id])
        .unwrap();

    store.link(555, 999, 4, None).unwrap();
    let label: String = store
        .executor()
        .connection()
        .query_row("SELECT label FROM edge WHERE id = ?1", [id], |row| row.get(0))
        .unwrap();
    assert_eq!(label, "pinned");
}

#[test]
fn reconciliation_leaves_untouched_text_bytes_alone() {
    let store = test_store();
    store
        .executor()
        .connection()
        .execute_batch("ALTER TABLE edge ADD COLUMN label TEXT")
        .unwrap();
    let id = store.link(555, 999, 0, None).unwrap();
    store
        .executor()
        .connection()
        .execute("UPDATE edge SET label = CAST(X'FF41' AS TEXT) WHERE id = ?1", [id])
        .unwrap();

    store.link(555, 999, 4, None).unwrap();
    store.link(555, 999, Weight::Keep, None).unwrap();

    let hex: String = store
        .executor()
        .connection()
        .query_row("SELECT hex(label) FROM edge WHERE id = ?1", [id], |row| row.get(0))
        .unwrap();
    assert_eq!(hex, "FF41");
    assert_eq!(edge(&store, 555, 999).weight, 4);
}

#[test]
fn link_without_table_is_a_storage_error() {
    let store = EdgeStore::new(
        SqliteExecutor::in_memory().unwrap(),
        StoreConfig::new("edge", Some(EdgeType(111))),
    )
    .unwrap();
    let err = store.link(555, 999, 0, None).unwrap_err();
    assert!(matches!(err, EdgeError::Storage { .. }), "got {err:?}");
}

// ---------------------------------------------------------------------------
// Bulk reads
// ---------------------------------------------------------------------------

#[test]
fn targets_are_ordered_by_weight() {
    let store = test_store();
    store.link(555, 999, 1, None).unwrap();
    store.link(555, 777, 0, None).unwrap();
    assert_eq!(store.targets_of(555, None).unwrap(), vec![777, 999]);
    assert_eq!(store.targets_of(555, T).unwrap(), vec![777, 999]);
}

#[test]
fn targets_of_many_buckets_per_source() {
    let store = test_store();
    store.link(1, 30, 3, None).unwrap();
    store.link(1, 10, 1, None).unwrap();
    store.link(2, 20, 2, None).unwrap();
    store.link(3, 40, 0, Some(EdgeType(9))).unwrap();

    let grouped = store.targets_of_many(&[1, 2, 3], None).unwrap();
    assert_eq!(grouped.len(), 2);
    assert_eq!(grouped[&1], vec![10, 30]);
    assert_eq!(grouped[&2], vec![20]);
    assert!(!grouped.contains_key(&3));
}

#[test]
fn sources_mirror_targets() {
    let store = test_store();
    store.link(555, 999, 1, None).unwrap();
    store.link(555, 777, 0, None).unwrap();

    assert_eq!(store.sources_of(777, None).unwrap(), vec![555]);
    assert_eq!(store.sources_of(999, None).unwrap(), vec![555]);
    assert_eq!(
        store.sources_of_many(&[777, 999], None).unwrap(),
        IndexMap::from([(777, vec![555]), (999, vec![555])])
    );
}

#[test]
fn reads_of_unknown_ids_are_empty() {
    let store = test_store();
    store.link(555, 777, 0, None).unwrap();
    assert!(store.targets_of(1, None).unwrap().is_empty());
    assert!(store.sources_of(1, None).unwrap().is_empty());
    assert!(store.targets_of_many(&[], None).unwrap().is_empty());
    assert!(store.find(1, 2, None).unwrap().is_none());
}

#[test]
fn target_cursor_streams_across_pages_in_weight_order() {
    let config = StoreConfig {
        page_size: 2,
        ..StoreConfig::new("edge", Some(EdgeType(111)))
    };
    let store = open_store_in_memory(config).unwrap();
    for (target, weight) in [(10, 5), (11, 1), (12, 1), (13, 0), (14, 9)] {
        store.link(1, target, weight, None).unwrap();
    }
    store.link(2, 20, 3, None).unwrap();

    let pairs: Vec<(i64, i64)> = store
        .target_cursor([1, 2], None)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        pairs,
        vec![(1, 13), (1, 11), (1, 12), (2, 20), (1, 10), (1, 14)]
    );
}

#[test]
fn source_cursor_yields_target_then_source() {
    let config = StoreConfig {
        page_size: 1,
        ..StoreConfig::new("edge", Some(EdgeType(111)))
    };
    let store = open_store_in_memory(config).unwrap();
    store.link(555, 777, 0, None).unwrap();
    store.link(556, 777, 0, None).unwrap();
    store.link(555, 999, 0, None).unwrap();

    let mut cursor = store.source_cursor(777, None).unwrap();
    assert_eq!(cursor.next().unwrap().unwrap(), (777, 555));
    assert_eq!(cursor.next().unwrap().unwrap(), (777, 556));
    assert!(cursor.next().is_none());
    assert!(cursor.next().is_none());

    assert_eq!(store.source_cursor(Vec::<i64>::new(), None).unwrap().count(), 0);
}

#[test]
fn cursor_surfaces_storage_errors_once() {
    let store = EdgeStore::new(
        SqliteExecutor::in_memory().unwrap(),
        StoreConfig::new("edge", Some(EdgeType(111))),
    )
    .unwrap();
    let mut cursor = store.target_cursor(1, None).unwrap();
    assert!(matches!(cursor.next(), Some(Err(EdgeError::Storage { .. }))));
    assert!(cursor.next().is_none());
}

// ---------------------------------------------------------------------------
// Deletion
// ---------------------------------------------------------------------------

#[test]
fn clear_by_source_and_target_removes_all_touching_edges() {
    let store = test_store();
    store.link(555, 999, 0, None).unwrap();
    store.link(777, 555, 0, None).unwrap();

    assert_eq!(store.clear_using_source(555, None).unwrap(), 1);
    assert_eq!(store.clear_using_target(555, None).unwrap(), 1);
    assert_eq!(count_rows(&store), 0);
}

#[test]
fn clear_respects_type_and_accepts_collections() {
    let store = test_store();
    store.link(1, 10, 0, None).unwrap();
    store.link(2, 10, 0, None).unwrap();
    store.link(3, 10, 0, None).unwrap();
    store.link(1, 10, 0, Some(EdgeType(222))).unwrap();

    assert_eq!(store.clear_using_source(vec![1, 2], None).unwrap(), 2);
    assert_eq!(store.sources_of(10, None).unwrap(), vec![3]);
    assert_eq!(store.sources_of(10, Some(EdgeType(222))).unwrap(), vec![1]);
    assert_eq!(store.clear_using_target([10], T).unwrap(), 1);
    assert_eq!(store.clear_using_target(Vec::<i64>::new(), T).unwrap(), 0);
    assert_eq!(count_rows(&store), 1);
}

// ---------------------------------------------------------------------------
// Type resolution
// ---------------------------------------------------------------------------

#[test]
fn store_without_default_type_requires_explicit_type() {
    let store = open_store_in_memory(StoreConfig::new("edge", None)).unwrap();
    assert!(matches!(
        store.link(555, 999, 0, None),
        Err(EdgeError::InvalidEdgeType)
    ));
    assert!(matches!(
        store.targets_of(555, None),
        Err(EdgeError::InvalidEdgeType)
    ));
    assert!(matches!(
        store.clear_using_target(555, None),
        Err(EdgeError::InvalidEdgeType)
    ));

    store.link(555, 999, 0, T).unwrap();
    assert_eq!(store.targets_of(555, T).unwrap(), vec![999]);
}

// ---------------------------------------------------------------------------
// Installation
// ---------------------------------------------------------------------------

#[test]
fn install_is_idempotent() {
    let store = EdgeStore::new(
        SqliteExecutor::in_memory().unwrap(),
        StoreConfig::new("follows", Some(EdgeType(1))),
    )
    .unwrap();

    let planned = store.install(false).unwrap();
    assert_eq!(planned.len(), 6);
    assert!(planned[0].starts_with("CREATE TABLE follows"));
    assert!(store.install(false).unwrap().len() == 6, "dry run must not apply");

    assert_eq!(store.install(true).unwrap(), planned);
    assert!(store.install(true).unwrap().is_empty());
    store.link(1, 2, 0, None).unwrap();
}

#[test]
fn failed_install_leaves_no_table_behind() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("edges.db");
    let path = path.to_str().unwrap();

    open_store(path, StoreConfig::new("edge", Some(EdgeType(111)))).unwrap();

    // Index names are database-wide, so a second edge table collides on them.
    let err = open_store(path, StoreConfig::new("follows", Some(EdgeType(1)))).unwrap_err();
    assert!(matches!(err, EdgeError::Storage { .. }));

    let store = EdgeStore::new(
        SqliteExecutor::open(path).unwrap(),
        StoreConfig::new("follows", Some(EdgeType(1))),
    )
    .unwrap();
    assert!(store.executor().existing_schema_objects("follows").unwrap().is_empty());
    assert!(matches!(
        store.link(1, 2, 0, None),
        Err(EdgeError::Storage { .. })
    ));
}

#[test]
fn on_disk_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("edges.db");
    let path = path.to_str().unwrap();

    let config = StoreConfig::new("edge", Some(EdgeType(111)));
    let id = {
        let store = open_store(path, config.clone()).unwrap();
        store.link(555, 999, 3, None).unwrap()
    };

    let store = open_store(path, config).unwrap();
    let stored = edge(&store, 555, 999);
    assert_eq!(stored.id, id);
    assert_eq!(stored.weight, 3);
    assert_eq!(store.link(555, 999, 4, None).unwrap(), id);
}
