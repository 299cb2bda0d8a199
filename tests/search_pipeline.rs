//! Search Pipeline Tests
//!
//! End-to-end behavior of `RowSearch::search`:
//! - empty-filter short circuit never reaches a backend
//! - related-table columns are queriable under both aliases
//! - non-queriable conditions are stripped, never rejected
//! - executor errors reach the caller unchanged
//! - pagination envelope

use std::sync::Arc;

use rowsearch::backend::{Dispatcher, MemoryExecutor, StaticFeatureFlags};
use rowsearch::config::{SearchConfig, StructuredQueryConfig};
use rowsearch::core::{RequestContext, SearchError};
use rowsearch::query::{
    Bookmark, ExportFormat, ExportRowsOptions, SearchFilters, SearchRequest, SortOrder,
};
use rowsearch::schema::{FieldSchema, MemoryTableStore, Table};
use rowsearch::search::RowSearch;
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

struct Harness {
    search: RowSearch,
    external: Arc<MemoryExecutor>,
    structured: Arc<MemoryExecutor>,
    legacy: Arc<MemoryExecutor>,
}

impl Harness {
    fn total_calls(&self) -> usize {
        self.external.calls() + self.structured.calls() + self.legacy.calls()
    }
}

fn customers() -> Table {
    Table::new("ta_customers", "customers")
        .with_field("name", FieldSchema::text())
        .with_field("tier", FieldSchema::text())
}

fn orders() -> Table {
    Table::new("ta_orders", "orders")
        .with_field("status", FieldSchema::text())
        .with_field("total", FieldSchema::number())
        .with_field("secret", FieldSchema::text().hidden())
        .with_field("customer", FieldSchema::link("ta_customers"))
}

fn order_rows() -> Vec<Value> {
    vec![
        json!({"_id": "o1", "status": "open", "total": 10, "secret": "a",
               "customer": [{"_id": "c1", "name": "Ann"}]}),
        json!({"_id": "o2", "status": "closed", "total": 20, "secret": "b",
               "customer": [{"_id": "c2", "name": "Bob"}]}),
        json!({"_id": "o3", "status": "open", "total": 30, "secret": "a",
               "customer": [{"_id": "c2", "name": "Bob"}]}),
    ]
}

/// Every executor holds the same rows so results only differ by routing.
fn harness(structured_tenants: &[&str]) -> Harness {
    let store = Arc::new(MemoryTableStore::new());
    store.register(customers()).unwrap();
    store.register(orders()).unwrap();

    let executor = |name: &str| {
        let executor = Arc::new(MemoryExecutor::new(name));
        executor.insert(&customers(), Vec::new()).unwrap();
        executor.insert(&orders(), order_rows()).unwrap();
        executor
    };
    let external = executor("external");
    let structured = executor("structured");
    let legacy = executor("legacy");

    let config = SearchConfig {
        structured_query: StructuredQueryConfig {
            tenants: structured_tenants.iter().map(|t| t.to_string()).collect(),
            ..StructuredQueryConfig::default()
        },
        ..SearchConfig::default()
    };
    let flags = StaticFeatureFlags::new(config.structured_query.clone());
    let dispatcher = Dispatcher::new(
        external.clone(),
        structured.clone(),
        legacy.clone(),
        Arc::new(flags),
    );

    Harness {
        search: RowSearch::new(config, store, dispatcher),
        external,
        structured,
        legacy,
    }
}

fn ids(rows: &[Value]) -> Vec<&str> {
    rows.iter().map(|r| r["_id"].as_str().unwrap()).collect()
}

// =============================================================================
// Short Circuit Tests
// =============================================================================

/// `{}` with RETURN_NONE answers `{rows: []}` without touching a backend.
#[tokio::test]
async fn test_return_none_with_empty_query_calls_no_executor() {
    let h = harness(&["acme"]);
    let request: SearchRequest = serde_json::from_value(json!({
        "tableId": "ta_orders",
        "query": {"onEmptyFilter": "RETURN_NONE"}
    }))
    .unwrap();

    let response = h
        .search
        .search(&RequestContext::new("acme"), request)
        .await
        .unwrap();

    assert_eq!(serde_json::to_value(&response).unwrap(), json!({"rows": []}));
    assert_eq!(h.total_calls(), 0);
}

/// Blank operands count as no filter at all.
#[tokio::test]
async fn test_blank_operands_with_return_none_short_circuit() {
    let h = harness(&[]);
    let request = SearchRequest::new("ta_missing_table").with_query(SearchFilters::from(json!({
        "equal": {"status": ""},
        "oneOf": {"status": []},
        "onEmptyFilter": "none"
    })));

    // The table is never resolved, so even an unknown id succeeds
    let response = h
        .search
        .search(&RequestContext::default(), request)
        .await
        .unwrap();
    assert!(response.is_empty());
    assert_eq!(h.total_calls(), 0);
}

/// A filter made only of non-queriable conditions is empty once sanitized,
/// so RETURN_NONE still answers nothing instead of scanning the table.
#[tokio::test]
async fn test_return_none_after_every_condition_is_stripped() {
    let h = harness(&[]);
    let request: SearchRequest = serde_json::from_value(json!({
        "tableId": "ta_orders",
        "query": {"equal": {"secret": "no-such-value"}, "onEmptyFilter": "RETURN_NONE"}
    }))
    .unwrap();

    let response = h
        .search
        .search(&RequestContext::default(), request)
        .await
        .unwrap();

    assert!(response.is_empty());
    assert_eq!(serde_json::to_value(&response).unwrap(), json!({"rows": []}));
    assert_eq!(h.total_calls(), 0);
}

/// Export honors the policy once blank operands are cleaned away.
#[tokio::test]
async fn test_export_with_return_none_and_blank_operands_is_empty() {
    let h = harness(&[]);
    let options: ExportRowsOptions = serde_json::from_value(json!({
        "tableId": "ta_orders",
        "format": "json",
        "query": {"equal": {"status": ""}, "onEmptyFilter": "none"}
    }))
    .unwrap();

    let result = h
        .search
        .export_rows(&RequestContext::default(), options)
        .await
        .unwrap();

    let rows: Vec<Value> = serde_json::from_str(&result.content).unwrap();
    assert!(rows.is_empty());
    assert_eq!(result.file_name, "orders.json");

    // Same export without the policy returns every order
    let all = h
        .search
        .export_rows(
            &RequestContext::default(),
            ExportRowsOptions::new("ta_orders", ExportFormat::Json),
        )
        .await
        .unwrap();
    let rows: Vec<Value> = serde_json::from_str(&all.content).unwrap();
    assert_eq!(rows.len(), 3);
}

/// Without the policy an empty query matches everything.
#[tokio::test]
async fn test_empty_query_defaults_to_all_rows() {
    let h = harness(&[]);
    let response = h
        .search
        .search(&RequestContext::default(), SearchRequest::new("ta_orders"))
        .await
        .unwrap();

    assert_eq!(response.len(), 3);
    assert_eq!(h.legacy.calls(), 1);
}

// =============================================================================
// Relationship Scenario Tests
// =============================================================================

/// Structured tenant, filter through the link by relationship name.
#[tokio::test]
async fn test_orders_customers_scenario_structured() {
    let h = harness(&["acme"]);

    let fields = h.search.queriable_fields("ta_orders", None).await.unwrap();
    for path in [
        "_id",
        "status",
        "total",
        "customer.name",
        "customer.tier",
        "customers.name",
        "customers.tier",
    ] {
        assert!(fields.contains(path), "missing {}", path);
    }
    assert!(!fields.contains("secret"));

    let request = SearchRequest::new("ta_orders")
        .with_query(SearchFilters::new().equal("customer.name", json!("Bob")))
        .sorted_by("total", SortOrder::Descending);
    let response = h
        .search
        .search(&RequestContext::new("acme"), request)
        .await
        .unwrap();

    assert_eq!(ids(&response.rows), vec!["o3", "o2"]);
    assert_eq!(h.structured.calls(), 1);
    assert_eq!(h.legacy.calls() + h.external.calls(), 0);
}

/// The related table's name works as an alias too.
#[tokio::test]
async fn test_table_name_alias_filters() {
    let h = harness(&[]);
    let request = SearchRequest::new("ta_orders")
        .with_query(SearchFilters::from(json!({"string": {"customers.name": "an"}})));

    let response = h
        .search
        .search(&RequestContext::default(), request)
        .await
        .unwrap();
    assert_eq!(ids(&response.rows), vec!["o1"]);
}

// =============================================================================
// Sanitization Tests
// =============================================================================

/// A condition on a hidden column is dropped and the search still succeeds.
#[tokio::test]
async fn test_hidden_field_condition_is_stripped() {
    let h = harness(&[]);
    let request = SearchRequest::new("ta_orders").with_query(SearchFilters::from(json!({
        "equal": {"secret": "a", "status": "open"}
    })));

    let response = h
        .search
        .search(&RequestContext::default(), request)
        .await
        .unwrap();

    // Only the status condition applied; o1 and o3 are open
    assert_eq!(ids(&response.rows), vec!["o1", "o3"]);
    assert!(response.rows.iter().all(|r| r.get("secret").is_none()));
}

/// Columns outside the projection are not queriable.
#[tokio::test]
async fn test_projection_limits_queriable_fields() {
    let h = harness(&[]);
    let request = SearchRequest::new("ta_orders")
        .with_fields(["STATUS"])
        .with_query(SearchFilters::from(json!({
            "equal": {"status": "open"},
            "range": {"total": {"low": 25}}
        })))
        .sorted_by("total", SortOrder::Descending);

    let response = h
        .search
        .search(&RequestContext::default(), request)
        .await
        .unwrap();

    // Range and sort on `total` were dropped
    assert_eq!(ids(&response.rows), vec!["o1", "o3"]);
    let first = response.rows[0].as_object().unwrap();
    assert!(first.contains_key("status"));
    assert!(!first.contains_key("total"));
}

/// Stripping a whole `$or` group leaves the rest of the filter intact.
#[tokio::test]
async fn test_stripped_nested_group_disappears() {
    let h = harness(&[]);
    let request = SearchRequest::new("ta_orders").with_query(SearchFilters::from(json!({
        "equal": {"status": "closed"},
        "$or": {"conditions": [{"equal": {"secret": "zzz"}}]}
    })));

    let response = h
        .search
        .search(&RequestContext::default(), request)
        .await
        .unwrap();
    assert_eq!(ids(&response.rows), vec!["o2"]);
}

// =============================================================================
// Error Propagation Tests
// =============================================================================

#[tokio::test]
async fn test_executor_error_propagates_unchanged() {
    let h = harness(&[]);
    let failure = SearchError::backend("legacy", "connection reset");
    h.legacy.fail_with(failure.clone());

    let err = h
        .search
        .search(&RequestContext::default(), SearchRequest::new("ta_orders"))
        .await
        .unwrap_err();

    assert_eq!(err, failure);
    assert_eq!(h.structured.calls() + h.external.calls(), 0);
}

#[tokio::test]
async fn test_unknown_table_is_not_found() {
    let h = harness(&[]);
    let err = h
        .search
        .search(&RequestContext::default(), SearchRequest::new("ta_nope"))
        .await
        .unwrap_err();

    assert!(matches!(err, SearchError::NotFound(_)));
    assert_eq!(h.total_calls(), 0);
}

/// A link to a table that no longer exists fails the search.
#[tokio::test]
async fn test_dangling_link_is_not_found() {
    let store = Arc::new(MemoryTableStore::new());
    store
        .register(Table::new("ta_a", "a").with_field("b", FieldSchema::link("ta_gone")))
        .unwrap();
    let executor = Arc::new(MemoryExecutor::new("legacy"));
    let dispatcher = Dispatcher::new(
        executor.clone(),
        executor.clone(),
        executor.clone(),
        Arc::new(StaticFeatureFlags::default()),
    );
    let search = RowSearch::new(SearchConfig::default(), store, dispatcher);

    let err = search
        .search(&RequestContext::default(), SearchRequest::new("ta_a"))
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::NotFound(_)));
    assert_eq!(executor.calls(), 0);
}

// =============================================================================
// Envelope Tests
// =============================================================================

#[tokio::test]
async fn test_pagination_round_trip() {
    let h = harness(&[]);
    let request = SearchRequest::new("ta_orders")
        .sorted_by("total", SortOrder::parse("Ascending"))
        .paginated(2)
        .counting_rows();

    let first = h
        .search
        .search(&RequestContext::default(), request.clone())
        .await
        .unwrap();
    assert_eq!(ids(&first.rows), vec!["o1", "o2"]);
    assert_eq!(first.has_next_page, Some(true));
    assert_eq!(first.total_rows, Some(3));
    let bookmark = first.bookmark.clone().unwrap();
    assert_eq!(bookmark, Bookmark::Offset(2));

    let second = h
        .search
        .search(&RequestContext::default(), request.with_bookmark(bookmark))
        .await
        .unwrap();
    assert_eq!(ids(&second.rows), vec!["o3"]);
    assert_eq!(second.bookmark, None);
    assert_eq!(second.has_next_page, None);
}

/// Page sizes are capped by configuration.
#[tokio::test]
async fn test_limit_is_clamped() {
    let store = Arc::new(MemoryTableStore::new());
    store.register(customers()).unwrap();
    store.register(orders()).unwrap();
    let executor = Arc::new(MemoryExecutor::new("legacy"));
    executor.insert(&orders(), order_rows()).unwrap();
    let dispatcher = Dispatcher::new(
        executor.clone(),
        executor.clone(),
        executor,
        Arc::new(StaticFeatureFlags::default()),
    );
    let config = SearchConfig::from_json(r#"{"default_page_size": 1, "max_page_size": 2}"#).unwrap();
    let search = RowSearch::new(config, store, dispatcher);

    let response = search
        .search(
            &RequestContext::default(),
            SearchRequest::new("ta_orders").paginated(50),
        )
        .await
        .unwrap();
    assert_eq!(response.len(), 2);
    assert_eq!(response.has_next_page, Some(true));
}
