//! In-memory row executor
//!
//! Reference `RowExecutor` holding rows per table in a map. It serves every
//! strategy in the binary and in tests; each instance carries its own
//! engine name, call counter and an optional injected failure.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::core::{BoxFuture, SearchError, SearchResult};
use crate::query::{
    matches_nothing, Bookmark, Calculation, ExportRowsOptions, SearchFilters, SearchRequest,
    SortOrder, SortType, ViewParams,
};
use crate::schema::Table;

use super::envelope::{ExecutorOutput, ExportResult, Row};
use super::executor::RowExecutor;
use super::export::{format_rows, ExportLayout};
use super::matcher::RowMatcher;
use super::sorter::sort_rows;

const ID_FIELD: &str = "_id";
const TABLE_ID_FIELD: &str = "tableId";
const DEFAULT_DELIMITER: &str = ",";

#[derive(Debug, Default)]
struct StoredTable {
    name: String,
    rows: Vec<Row>,
}

/// Rows and table names visible to one call
struct Snapshot {
    rows: Vec<Row>,
    table_names: HashMap<String, String>,
}

/// Executor over rows held in memory
#[derive(Debug)]
pub struct MemoryExecutor {
    name: String,
    tables: RwLock<HashMap<String, StoredTable>>,
    failure: RwLock<Option<SearchError>>,
    calls: AtomicUsize,
}

impl MemoryExecutor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: RwLock::new(HashMap::new()),
            failure: RwLock::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// Replace the rows of `table`. Rows must be objects; a missing `_id`
    /// is generated.
    pub fn insert(&self, table: &Table, rows: Vec<Row>) -> SearchResult<()> {
        let mut prepared = Vec::with_capacity(rows.len());
        for row in rows {
            let Value::Object(mut obj) = row else {
                return Err(SearchError::config(format!(
                    "Rows for table '{}' must be JSON objects",
                    table.id
                )));
            };
            obj.entry(ID_FIELD)
                .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
            prepared.push(Value::Object(obj));
        }

        let mut tables = self
            .tables
            .write()
            .map_err(|_| SearchError::config("row store lock poisoned"))?;
        tables.insert(
            table.id.clone(),
            StoredTable {
                name: table.name.clone(),
                rows: prepared,
            },
        );
        Ok(())
    }

    /// Load `<dir>/<table id>.json` (a JSON array of rows) for each table.
    ///
    /// Tables without a file get no rows but stay addressable by name.
    pub fn load_dir<'t>(
        &self,
        dir: &Path,
        tables: impl IntoIterator<Item = &'t Table>,
    ) -> SearchResult<usize> {
        let mut loaded = 0;

        for table in tables {
            let path = dir.join(format!("{}.json", table.id));
            let rows = if path.exists() {
                let content = fs::read_to_string(&path).map_err(|e| {
                    SearchError::config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                serde_json::from_str::<Vec<Row>>(&content).map_err(|e| {
                    SearchError::config(format!("Invalid rows JSON in {}: {}", path.display(), e))
                })?
            } else {
                Vec::new()
            };

            loaded += rows.len();
            self.insert(table, rows)?;
        }

        tracing::debug!(engine = %self.name, dir = %dir.display(), rows = loaded, "Loaded rows.");
        Ok(loaded)
    }

    /// Make every following call fail with `error`
    pub fn fail_with(&self, error: SearchError) {
        if let Ok(mut failure) = self.failure.write() {
            *failure = Some(error);
        }
    }

    /// Number of executor calls received so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn begin(&self) -> SearchResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let failure = self
            .failure
            .read()
            .map_err(|_| self.error("failure lock poisoned"))?;
        match failure.as_ref() {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn error(&self, message: impl Into<String>) -> SearchError {
        SearchError::backend(self.name.clone(), message)
    }

    fn snapshot(&self, table: &Table) -> SearchResult<Snapshot> {
        let tables = self
            .tables
            .read()
            .map_err(|_| self.error("row store lock poisoned"))?;

        Ok(Snapshot {
            rows: tables
                .get(&table.id)
                .map(|stored| stored.rows.clone())
                .unwrap_or_default(),
            table_names: tables
                .iter()
                .map(|(id, stored)| (id.clone(), stored.name.clone()))
                .collect(),
        })
    }

    /// Rows matching `filters`; none when only a return-none policy is left
    fn filtered(&self, table: &Table, filters: &SearchFilters) -> SearchResult<Vec<Row>> {
        if matches_nothing(filters) {
            return Ok(Vec::new());
        }

        let Snapshot { mut rows, table_names } = self.snapshot(table)?;
        let matcher = RowMatcher::new(table, &table_names);
        rows.retain(|row| matcher.matches(filters, row));
        Ok(rows)
    }

    fn sort(
        &self,
        table: &Table,
        rows: &mut [Row],
        field: &str,
        order: Option<&SortOrder>,
        sort_type: Option<SortType>,
    ) -> SearchResult<()> {
        let descending = match order {
            None | Some(SortOrder::Ascending) => false,
            Some(SortOrder::Descending) => true,
            Some(SortOrder::Unrecognized(raw)) => {
                return Err(self.error(format!("Unrecognized sort order '{}'", raw)));
            }
        };

        let sort_type = sort_type.unwrap_or_else(|| match table.schema.get(field) {
            Some(schema) if schema.field_type.sorts_numerically() => SortType::Number,
            _ => SortType::String,
        });

        sort_rows(rows, field, descending, sort_type);
        Ok(())
    }

    fn page(&self, rows: Vec<Row>, request: &SearchRequest) -> SearchResult<ExecutorOutput> {
        let total = rows.len();
        let offset = match &request.bookmark {
            None => 0,
            Some(Bookmark::Offset(offset)) => *offset as usize,
            Some(Bookmark::Token(token)) => token
                .parse::<usize>()
                .map_err(|_| self.error(format!("Invalid bookmark '{}'", token)))?,
        };

        let page: Vec<Row> = rows
            .into_iter()
            .skip(offset)
            .take(request.limit.unwrap_or(usize::MAX))
            .collect();

        let end = offset.saturating_add(page.len());
        let has_more = end < total;

        Ok(ExecutorOutput {
            rows: page,
            continuation: has_more.then_some(Bookmark::Offset(end as u64)),
            has_more,
            total_rows: request.count_rows.then_some(total as u64),
        })
    }

    fn run_search(&self, table: &Table, request: &SearchRequest) -> SearchResult<ExecutorOutput> {
        self.begin()?;

        let mut rows = self.filtered(table, &request.query)?;
        if let Some(field) = &request.sort {
            self.sort(table, &mut rows, field, request.sort_order.as_ref(), request.sort_type)?;
        }

        let mut output = self.page(rows, request)?;
        output.rows = output
            .rows
            .into_iter()
            .map(|row| output_row(table, row, request.fields.as_deref()))
            .collect();

        tracing::trace!(engine = %self.name, table_id = %table.id, rows = output.rows.len(), "Executed search.");
        Ok(output)
    }

    fn run_export(&self, table: &Table, options: &ExportRowsOptions) -> SearchResult<ExportResult> {
        self.begin()?;

        let mut rows = match &options.query {
            Some(query) => self.filtered(table, query)?,
            None => self.snapshot(table)?.rows,
        };

        if let Some(ids) = &options.row_ids {
            rows.retain(|row| {
                row.get(ID_FIELD)
                    .and_then(Value::as_str)
                    .map_or(false, |id| ids.iter().any(|wanted| wanted == id))
            });
        }

        if let Some(field) = &options.sort {
            self.sort(table, &mut rows, field, options.sort_order.as_ref(), None)?;
        }

        let columns: Vec<String> = match &options.columns {
            Some(columns) => columns
                .iter()
                .filter(|column| table.schema.get(*column).map_or(true, |f| f.visible))
                .cloned()
                .collect(),
            None => std::iter::once(ID_FIELD.to_string())
                .chain(table.visible_field_names())
                .collect(),
        };

        let layout = ExportLayout {
            columns,
            delimiter: options.delimiter.as_deref().unwrap_or(DEFAULT_DELIMITER),
            headers: options.custom_headers.as_ref(),
        };

        let content = format_rows(options.format, table, &layout, &rows)?;
        Ok(ExportResult {
            file_name: format!("{}.{}", table.name, options.format.extension()),
            content,
        })
    }

    fn run_fetch(&self, table: &Table, raw: bool) -> SearchResult<Vec<Row>> {
        self.begin()?;

        let rows = self.snapshot(table)?.rows;
        if raw {
            return Ok(rows);
        }
        Ok(rows
            .into_iter()
            .map(|row| output_row(table, row, None))
            .collect())
    }

    fn run_view(
        &self,
        table: &Table,
        view_name: &str,
        params: &ViewParams,
    ) -> SearchResult<Vec<Row>> {
        self.begin()?;

        let view = table.views.get(view_name).ok_or_else(|| {
            SearchError::not_found(format!("view {} on table {}", view_name, table.id))
        })?;

        let mut rows = self.filtered(table, &view.query)?;
        if let Some(field) = &view.sort {
            self.sort(table, &mut rows, field, view.sort_order.as_ref(), None)?;
        }

        match params.calculation {
            None => Ok(rows
                .into_iter()
                .map(|row| output_row(table, row, view.fields.as_deref()))
                .collect()),
            Some(calculation) => aggregate(&rows, calculation, params),
        }
    }
}

impl RowExecutor for MemoryExecutor {
    fn name(&self) -> &str {
        &self.name
    }

    fn search<'a>(
        &'a self,
        table: &'a Table,
        request: &'a SearchRequest,
    ) -> BoxFuture<'a, SearchResult<ExecutorOutput>> {
        let result = self.run_search(table, request);
        Box::pin(async move { result })
    }

    fn export_rows<'a>(
        &'a self,
        table: &'a Table,
        options: &'a ExportRowsOptions,
    ) -> BoxFuture<'a, SearchResult<ExportResult>> {
        let result = self.run_export(table, options);
        Box::pin(async move { result })
    }

    fn fetch<'a>(&'a self, table: &'a Table) -> BoxFuture<'a, SearchResult<Vec<Row>>> {
        let result = self.run_fetch(table, false);
        Box::pin(async move { result })
    }

    fn fetch_raw<'a>(&'a self, table: &'a Table) -> BoxFuture<'a, SearchResult<Vec<Row>>> {
        let result = self.run_fetch(table, true);
        Box::pin(async move { result })
    }

    fn fetch_view<'a>(
        &'a self,
        table: &'a Table,
        view_name: &'a str,
        params: &'a ViewParams,
    ) -> BoxFuture<'a, SearchResult<Vec<Row>>> {
        let result = self.run_view(table, view_name, params);
        Box::pin(async move { result })
    }
}

/// Drop hidden and unrequested schema columns, stamp `tableId`
fn output_row(table: &Table, row: Row, fields: Option<&[String]>) -> Row {
    let Value::Object(mut obj) = row else {
        return row;
    };

    obj.retain(|key, _| match table.schema.get(key) {
        Some(field) => field.visible && fields.map_or(true, |f| f.iter().any(|k| k == key)),
        None => true,
    });
    obj.insert(TABLE_ID_FIELD.to_string(), Value::String(table.id.clone()));
    Value::Object(obj)
}

#[derive(Debug, Default)]
struct Stats {
    rows: u64,
    count: u64,
    sum: f64,
    min: Option<f64>,
    max: Option<f64>,
    sumsqr: f64,
}

impl Stats {
    fn add(&mut self, value: Option<f64>) {
        self.rows += 1;
        let Some(value) = value else {
            return;
        };
        self.count += 1;
        self.sum += value;
        self.sumsqr += value * value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }
}

fn aggregate(rows: &[Row], calculation: Calculation, params: &ViewParams) -> SearchResult<Vec<Row>> {
    let field = match (calculation, params.field.as_deref()) {
        (Calculation::Count, field) => field,
        (_, Some(field)) => Some(field),
        (_, None) => {
            return Err(SearchError::invalid_request(format!(
                "Calculation {:?} requires a field",
                calculation
            )));
        }
    };

    let mut groups: Vec<(Value, Stats)> = Vec::new();
    if params.group.is_none() {
        groups.push((Value::Null, Stats::default()));
    }

    for row in rows {
        let key = match &params.group {
            Some(group) => row.get(group).cloned().unwrap_or(Value::Null),
            None => Value::Null,
        };
        let value = field.and_then(|f| row.get(f)).and_then(Value::as_f64);

        let index = match groups.iter().position(|(k, _)| *k == key) {
            Some(index) => index,
            None => {
                groups.push((key, Stats::default()));
                groups.len() - 1
            }
        };
        groups[index].1.add(value);
    }

    Ok(groups
        .into_iter()
        .map(|(key, stats)| {
            let mut out = Map::new();
            out.insert("group".to_string(), key);
            match calculation {
                Calculation::Count => {
                    out.insert("count".to_string(), Value::from(stats.rows));
                }
                Calculation::Sum => {
                    out.insert("sum".to_string(), Value::from(stats.sum));
                }
                Calculation::Stats => {
                    let avg = if stats.count > 0 {
                        stats.sum / stats.count as f64
                    } else {
                        0.0
                    };
                    out.insert("sum".to_string(), Value::from(stats.sum));
                    out.insert("min".to_string(), Value::from(stats.min.unwrap_or(0.0)));
                    out.insert("max".to_string(), Value::from(stats.max.unwrap_or(0.0)));
                    out.insert("count".to_string(), Value::from(stats.count));
                    out.insert("sumsqr".to_string(), Value::from(stats.sumsqr));
                    out.insert("avg".to_string(), Value::from(avg));
                }
            }
            Value::Object(out)
        })
        .collect())
}
