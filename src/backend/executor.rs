//! Row executor capability
//!
//! One implementation per backend strategy. Executors receive the resolved
//! table and an already sanitized request.

use crate::core::{BoxFuture, SearchResult};
use crate::query::{ExportRowsOptions, SearchRequest, ViewParams};
use crate::schema::Table;

use super::envelope::{ExecutorOutput, ExportResult, Row};

/// Backend that can answer the public read operations
pub trait RowExecutor: Send + Sync {
    /// Engine name, used in logs and backend errors
    fn name(&self) -> &str;

    fn search<'a>(
        &'a self,
        table: &'a Table,
        request: &'a SearchRequest,
    ) -> BoxFuture<'a, SearchResult<ExecutorOutput>>;

    fn export_rows<'a>(
        &'a self,
        table: &'a Table,
        options: &'a ExportRowsOptions,
    ) -> BoxFuture<'a, SearchResult<ExportResult>>;

    /// All rows, output-processed
    fn fetch<'a>(&'a self, table: &'a Table) -> BoxFuture<'a, SearchResult<Vec<Row>>>;

    /// All rows, as stored
    fn fetch_raw<'a>(&'a self, table: &'a Table) -> BoxFuture<'a, SearchResult<Vec<Row>>>;

    /// Run a saved view
    fn fetch_view<'a>(
        &'a self,
        table: &'a Table,
        view_name: &'a str,
        params: &'a ViewParams,
    ) -> BoxFuture<'a, SearchResult<Vec<Row>>>;
}
