//! Row search service
//!
//! Search runs: normalize -> resolve table -> table-aware mapping ->
//! queriable field expansion -> sanitize -> dispatch -> envelope.
//! The empty-filter policy is checked again after sanitizing, so a filter
//! made only of non-queriable conditions still selects no rows.
//! The other reads resolve the table and dispatch without field expansion.

use std::sync::Arc;

use crate::backend::{
    build_response, Dispatcher, ExportResult, Row, RowExecutor, SearchResponse, Strategy,
};
use crate::config::SearchConfig;
use crate::core::{RequestContext, SearchResult};
use crate::fields::{sanitize_request, visible_fields, FieldExpander, QueriableFieldSet};
use crate::observability::{NoOpTraceSink, TraceSink};
use crate::query::{
    cleanup_query, fixup_filter_arrays, map_search_input, matches_nothing, normalize,
    ExportRowsOptions,
    NormalizedRequest, SearchRequest, SortOrder, ViewParams,
};
use crate::schema::{SchemaResolver, Table, TableStore};

/// Entry point for the public read operations
pub struct RowSearch {
    config: SearchConfig,
    resolver: SchemaResolver,
    expander: FieldExpander,
    dispatcher: Dispatcher,
    trace: Arc<dyn TraceSink>,
}

impl RowSearch {
    pub fn new(config: SearchConfig, store: Arc<dyn TableStore>, dispatcher: Dispatcher) -> Self {
        let resolver = SchemaResolver::new(store);
        let expander = FieldExpander::new(resolver.clone(), config.id_field.clone());

        Self {
            config,
            resolver,
            expander,
            dispatcher,
            trace: Arc::new(NoOpTraceSink),
        }
    }

    /// Attach an instrumentation sink
    pub fn with_trace_sink(mut self, trace: Arc<dyn TraceSink>) -> Self {
        self.trace = trace;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run a row search
    pub async fn search(
        &self,
        ctx: &RequestContext,
        request: SearchRequest,
    ) -> SearchResult<SearchResponse> {
        self.trace.tag("table_id", &request.table_id);

        let request = match normalize(request) {
            NormalizedRequest::Empty => {
                self.trace.tag("short_circuit", "true");
                tracing::debug!(request_id = %ctx.request_id, "Empty filter with return-none policy; skipping backend.");
                return Ok(SearchResponse::empty());
            }
            NormalizedRequest::Ready(request) => request,
        };

        let table = self.resolver.get_table(&request.table_id).await?;
        let request = map_search_input(&table, request, &self.config);

        let allowed = self.allowed_fields(&table, request.fields.as_deref()).await?;
        self.trace.tag("queriable_fields", &allowed.len().to_string());
        let request = sanitize_request(request, &allowed);

        if matches_nothing(&request.query) {
            self.trace.tag("short_circuit", "true");
            tracing::debug!(request_id = %ctx.request_id, table_id = %table.id, "No queriable condition left with return-none policy; skipping backend.");
            return Ok(SearchResponse::empty());
        }

        let (strategy, executor) = self.route(ctx, &table).await?;
        let output = executor
            .search(&table, &request)
            .await
            .map_err(|e| {
                tracing::warn!(request_id = %ctx.request_id, strategy = %strategy, error = %e, "Search failed.");
                e
            })?;
        let response = build_response(&request, output);

        tracing::info!(
            request_id = %ctx.request_id,
            table_id = %table.id,
            strategy = %strategy,
            rows = response.len(),
            elapsed_ms = ctx.elapsed_ms() as u64,
            "Search complete."
        );

        Ok(response)
    }

    /// Paths a search on `table_id` projecting `fields` may filter and sort on
    pub async fn queriable_fields(
        &self,
        table_id: &str,
        fields: Option<&[String]>,
    ) -> SearchResult<QueriableFieldSet> {
        let table = self.resolver.get_table(table_id).await?;
        self.allowed_fields(&table, fields).await
    }

    /// Export rows in a file format
    pub async fn export_rows(
        &self,
        ctx: &RequestContext,
        mut options: ExportRowsOptions,
    ) -> SearchResult<ExportResult> {
        self.trace.tag("table_id", &options.table_id);

        let table = self.resolver.get_table(&options.table_id).await?;
        options.query = options
            .query
            .take()
            .map(|query| fixup_filter_arrays(cleanup_query(query)));
        options.sort_order = options.sort_order.take().map(SortOrder::canonicalize);

        let (strategy, executor) = self.route(ctx, &table).await?;
        let result = executor.export_rows(&table, &options).await?;

        tracing::info!(
            request_id = %ctx.request_id,
            table_id = %table.id,
            strategy = %strategy,
            file_name = %result.file_name,
            "Export complete."
        );
        Ok(result)
    }

    /// All rows of a table, output-processed
    pub async fn fetch(&self, ctx: &RequestContext, table_id: &str) -> SearchResult<Vec<Row>> {
        let table = self.resolver.get_table(table_id).await?;
        let (_, executor) = self.route(ctx, &table).await?;
        executor.fetch(&table).await
    }

    /// All rows of a table, as stored
    pub async fn fetch_raw(&self, ctx: &RequestContext, table_id: &str) -> SearchResult<Vec<Row>> {
        let table = self.resolver.get_table(table_id).await?;
        let (_, executor) = self.route(ctx, &table).await?;
        executor.fetch_raw(&table).await
    }

    /// Run a saved view
    pub async fn fetch_view(
        &self,
        ctx: &RequestContext,
        table_id: &str,
        view_name: &str,
        params: &ViewParams,
    ) -> SearchResult<Vec<Row>> {
        let table = self.resolver.get_table(table_id).await?;
        let (_, executor) = self.route(ctx, &table).await?;
        self.trace.tag("view", view_name);
        executor.fetch_view(&table, view_name, params).await
    }

    async fn allowed_fields(
        &self,
        table: &Table,
        requested: Option<&[String]>,
    ) -> SearchResult<QueriableFieldSet> {
        let fields = visible_fields(table, requested);
        self.expander.queriable_fields(table, &fields).await
    }

    async fn route(
        &self,
        ctx: &RequestContext,
        table: &Table,
    ) -> SearchResult<(Strategy, &dyn RowExecutor)> {
        self.trace.tag("table_id", &table.id);
        let (strategy, executor) = self.dispatcher.route(ctx, table).await?;
        self.trace.tag("strategy", strategy.as_str());
        Ok((strategy, executor))
    }
}
