//! Request types for the public read operations

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::filter::SearchFilters;

/// Sort direction
///
/// Tokens other than `ascending` / `descending` are kept verbatim so the
/// executor can decide what to do with them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SortOrder {
    Ascending,
    Descending,
    Unrecognized(String),
}

impl SortOrder {
    /// Exact-match parse; case differences stay unrecognized until
    /// `canonicalize` runs.
    pub fn parse(token: &str) -> Self {
        match token {
            "ascending" => SortOrder::Ascending,
            "descending" => SortOrder::Descending,
            other => SortOrder::Unrecognized(other.to_string()),
        }
    }

    /// Lower-case an unrecognized token and retry the parse
    pub fn canonicalize(self) -> Self {
        match self {
            SortOrder::Unrecognized(raw) => match Self::parse(&raw.to_lowercase()) {
                SortOrder::Unrecognized(_) => SortOrder::Unrecognized(raw),
                known => known,
            },
            known => known,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SortOrder::Ascending => "ascending",
            SortOrder::Descending => "descending",
            SortOrder::Unrecognized(raw) => raw,
        }
    }
}

impl From<String> for SortOrder {
    fn from(token: String) -> Self {
        Self::parse(&token)
    }
}

impl From<SortOrder> for String {
    fn from(order: SortOrder) -> Self {
        order.as_str().to_string()
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the sort column is compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortType {
    String,
    Number,
}

/// Opaque pagination cursor handed back by an executor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bookmark {
    Offset(u64),
    Token(String),
}

/// Row search request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub table_id: String,
    #[serde(default)]
    pub query: SearchFilters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_type: Option<SortType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmark: Option<Bookmark>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default)]
    pub paginate: bool,
    /// Requested output columns; `None` means every visible column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(default)]
    pub count_rows: bool,
}

impl SearchRequest {
    pub fn new(table_id: impl Into<String>) -> Self {
        Self {
            table_id: table_id.into(),
            ..Self::default()
        }
    }

    pub fn with_query(mut self, query: SearchFilters) -> Self {
        self.query = query;
        self
    }

    pub fn sorted_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some(field.into());
        self.sort_order = Some(order);
        self
    }

    pub fn paginated(mut self, limit: usize) -> Self {
        self.paginate = true;
        self.limit = Some(limit);
        self
    }

    pub fn with_bookmark(mut self, bookmark: Bookmark) -> Self {
        self.bookmark = Some(bookmark);
        self
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn counting_rows(mut self) -> Self {
        self.count_rows = true;
        self
    }
}

/// Export file format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
    /// JSON object carrying both the table schema and the rows
    JsonWithSchema,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json | ExportFormat::JsonWithSchema => "json",
        }
    }
}

/// Export request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRowsOptions {
    pub table_id: String,
    #[serde(default)]
    pub format: ExportFormat,
    /// Restrict the export to these row ids
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_ids: Option<Vec<String>>,
    /// Restrict and order the exported columns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<SearchFilters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    /// CSV delimiter (default ",")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
    /// Column -> header label overrides for CSV
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_headers: Option<BTreeMap<String, String>>,
}

impl ExportRowsOptions {
    pub fn new(table_id: impl Into<String>, format: ExportFormat) -> Self {
        Self {
            table_id: table_id.into(),
            format,
            ..Self::default()
        }
    }
}

/// Aggregate computed by `fetch_view`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Calculation {
    Count,
    Sum,
    Stats,
}

/// Parameters for running a saved view
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculation: Option<Calculation>,
    /// Group aggregates by this column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Numeric column aggregated by `sum` / `stats`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}
