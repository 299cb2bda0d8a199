//! Result envelope
//!
//! Executors report `ExecutorOutput`; callers get `SearchResponse`. Only the
//! shape changes here, never row content.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::query::{Bookmark, SearchRequest};

/// Row record; its shape is owned by the executor
pub type Row = Value;

/// Raw result of one executor search
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutorOutput {
    pub rows: Vec<Row>,
    /// Cursor for the next page, when the executor has one
    pub continuation: Option<Bookmark>,
    /// More rows exist past this page
    pub has_more: bool,
    /// Total matching rows, when counted
    pub total_rows: Option<u64>,
}

impl ExecutorOutput {
    pub fn rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }
}

/// Uniform search response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub rows: Vec<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmark: Option<Bookmark>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_next_page: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<u64>,
}

impl SearchResponse {
    /// `{rows: []}`
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Exported file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResult {
    pub file_name: String,
    pub content: String,
}

/// Shape executor output for the caller.
///
/// The bookmark and `hasNextPage` appear only for paginated requests with
/// more rows to come; `totalRows` only when the request asked for a count.
pub fn build_response(request: &SearchRequest, output: ExecutorOutput) -> SearchResponse {
    let next_page = request.paginate && output.has_more;

    SearchResponse {
        rows: output.rows,
        bookmark: if next_page { output.continuation } else { None },
        has_next_page: next_page.then_some(true),
        total_rows: if request.count_rows {
            output.total_rows
        } else {
            None
        },
    }
}
