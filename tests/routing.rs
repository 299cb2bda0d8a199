//! Routing Tests
//!
//! Backend selection across every public operation:
//! - selection depends only on table locality and the tenant flag
//! - fetch, fetch_raw, fetch_view and export route exactly like search
//! - no fallback between executors

use std::sync::Arc;

use rowsearch::backend::{
    select_strategy, Dispatcher, MemoryExecutor, StaticFeatureFlags, Strategy,
};
use rowsearch::config::{SearchConfig, StructuredQueryConfig};
use rowsearch::core::{RequestContext, SearchError};
use rowsearch::observability::MemoryTraceSink;
use rowsearch::query::{ExportFormat, ExportRowsOptions, SearchRequest, ViewParams};
use rowsearch::schema::{FieldSchema, Locality, MemoryTableStore, Table, ViewDefinition};
use rowsearch::search::RowSearch;
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

struct Harness {
    search: RowSearch,
    sink: Arc<MemoryTraceSink>,
    executors: [Arc<MemoryExecutor>; 3],
}

impl Harness {
    /// (external, structured, legacy) call counts
    fn calls(&self) -> [usize; 3] {
        [
            self.executors[0].calls(),
            self.executors[1].calls(),
            self.executors[2].calls(),
        ]
    }
}

fn tables() -> Vec<Table> {
    vec![
        Table::new("ta_local", "local")
            .with_field("name", FieldSchema::text())
            .with_view("everything", ViewDefinition::default()),
        Table::new("ta_remote", "remote")
            .external("ds_postgres")
            .with_field("name", FieldSchema::text()),
        Table::new("datasource_plus_pg__things", "things").with_field("name", FieldSchema::text()),
    ]
}

fn harness(structured_default: bool) -> Harness {
    let store = Arc::new(MemoryTableStore::new());
    for table in tables() {
        store.register(table).unwrap();
    }

    let executors = ["external", "structured", "legacy"].map(|name| {
        let executor = Arc::new(MemoryExecutor::new(name));
        for table in tables() {
            executor
                .insert(&table, vec![json!({"_id": "r1", "name": "x"})])
                .unwrap();
        }
        executor
    });

    let flags = StaticFeatureFlags::new(StructuredQueryConfig {
        default_enabled: structured_default,
        ..StructuredQueryConfig::default()
    });
    let dispatcher = Dispatcher::new(
        executors[0].clone(),
        executors[1].clone(),
        executors[2].clone(),
        Arc::new(flags),
    );
    let sink = Arc::new(MemoryTraceSink::new());
    let search =
        RowSearch::new(SearchConfig::default(), store, dispatcher).with_trace_sink(sink.clone());

    Harness {
        search,
        sink,
        executors,
    }
}

async fn run_every_operation(h: &Harness, table_id: &str) {
    let ctx = RequestContext::new("tenant");
    h.search
        .search(&ctx, SearchRequest::new(table_id))
        .await
        .unwrap();
    h.search.fetch(&ctx, table_id).await.unwrap();
    h.search.fetch_raw(&ctx, table_id).await.unwrap();
    h.search
        .export_rows(&ctx, ExportRowsOptions::new(table_id, ExportFormat::Json))
        .await
        .unwrap();
}

// =============================================================================
// Selection Tests
// =============================================================================

/// Same inputs, same strategy, every time.
#[test]
fn test_selection_is_pure() {
    for locality in [Locality::Internal, Locality::External] {
        for flag in [false, true] {
            let expected = select_strategy(locality, flag);
            for _ in 0..100 {
                assert_eq!(select_strategy(locality, flag), expected);
            }
        }
    }
    assert_eq!(
        select_strategy(Locality::External, true),
        Strategy::External
    );
}

// =============================================================================
// Operation Routing Tests
// =============================================================================

#[tokio::test]
async fn test_internal_table_legacy_for_all_operations() {
    let h = harness(false);
    run_every_operation(&h, "ta_local").await;

    assert_eq!(h.calls(), [0, 0, 4]);
    assert_eq!(h.sink.get("strategy").as_deref(), Some("legacyInternal"));
}

#[tokio::test]
async fn test_internal_table_structured_for_all_operations() {
    let h = harness(true);
    run_every_operation(&h, "ta_local").await;

    assert_eq!(h.calls(), [0, 4, 0]);
    assert_eq!(h.sink.get("strategy").as_deref(), Some("structuredInternal"));
}

#[tokio::test]
async fn test_external_tables_ignore_tenant_flag() {
    for structured in [false, true] {
        let h = harness(structured);
        run_every_operation(&h, "ta_remote").await;
        run_every_operation(&h, "datasource_plus_pg__things").await;

        assert_eq!(h.calls(), [8, 0, 0]);
    }
}

#[tokio::test]
async fn test_fetch_view_routes_like_search() {
    let h = harness(true);
    let ctx = RequestContext::default();

    let rows = h
        .search
        .fetch_view(&ctx, "ta_local", "everything", &ViewParams::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(h.calls(), [0, 1, 0]);
    assert_eq!(h.sink.get("view").as_deref(), Some("everything"));
}

/// A failing executor is not retried on another one.
#[tokio::test]
async fn test_no_fallback_between_executors() {
    let h = harness(false);
    h.executors[2].fail_with(SearchError::backend("legacy", "down"));

    let err = h
        .search
        .fetch(&RequestContext::default(), "ta_local")
        .await
        .unwrap_err();

    assert_eq!(err, SearchError::backend("legacy", "down"));
    assert_eq!(h.calls(), [0, 0, 1]);
}

#[tokio::test]
async fn test_fetch_unknown_table_is_not_found() {
    let h = harness(false);
    let err = h
        .search
        .fetch_raw(&RequestContext::default(), "ta_nope")
        .await
        .unwrap_err();

    assert!(matches!(err, SearchError::NotFound(_)));
    assert_eq!(h.calls(), [0, 0, 0]);
}

// =============================================================================
// Export Tests
// =============================================================================

#[tokio::test]
async fn test_export_cleans_query_before_dispatch() {
    let h = harness(false);
    let options: ExportRowsOptions = serde_json::from_value(json!({
        "tableId": "ta_local",
        "format": "csv",
        "query": {"equal": {"name": ""}, "oneOf": {"name": "x, y"}},
        "sortOrder": "DESCENDING",
        "sort": "name"
    }))
    .unwrap();

    let result = h
        .search
        .export_rows(&RequestContext::default(), options)
        .await
        .unwrap();

    assert_eq!(result.file_name, "local.csv");
    assert_eq!(result.content, "_id,name\nr1,x\n");
}
