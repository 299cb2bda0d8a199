//! Export file formatting

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::core::{SearchError, SearchResult};
use crate::query::ExportFormat;
use crate::schema::Table;

use super::envelope::Row;

const DEFAULT_DELIMITER: &str = ",";

/// Column layout and CSV options for one export
#[derive(Debug, Clone)]
pub struct ExportLayout<'a> {
    pub columns: Vec<String>,
    pub delimiter: &'a str,
    pub headers: Option<&'a BTreeMap<String, String>>,
}

impl<'a> ExportLayout<'a> {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            delimiter: DEFAULT_DELIMITER,
            headers: None,
        }
    }
}

/// Render rows in the requested format
pub fn format_rows(
    format: ExportFormat,
    table: &Table,
    layout: &ExportLayout<'_>,
    rows: &[Row],
) -> SearchResult<String> {
    match format {
        ExportFormat::Csv => format_csv(layout, rows),
        ExportFormat::Json => to_pretty(&Value::Array(project(layout, rows))),
        ExportFormat::JsonWithSchema => {
            let schema: Map<String, Value> = layout
                .columns
                .iter()
                .filter_map(|column| {
                    let field = table.schema.get(column)?;
                    serde_json::to_value(field)
                        .ok()
                        .map(|value| (column.clone(), value))
                })
                .collect();

            to_pretty(&serde_json::json!({
                "schema": schema,
                "rows": project(layout, rows),
            }))
        }
    }
}

/// CSV with a header line. Cells containing the delimiter, quotes or line
/// breaks are quoted.
pub fn format_csv(layout: &ExportLayout<'_>, rows: &[Row]) -> SearchResult<String> {
    if layout.delimiter.is_empty() {
        return Err(SearchError::invalid_request("CSV delimiter must not be empty"));
    }

    let header: Vec<String> = layout
        .columns
        .iter()
        .map(|column| {
            let label = layout
                .headers
                .and_then(|headers| headers.get(column))
                .unwrap_or(column);
            escape_cell(label, layout.delimiter)
        })
        .collect();

    let mut out = header.join(layout.delimiter);
    out.push('\n');

    for row in rows {
        let cells: Vec<String> = layout
            .columns
            .iter()
            .map(|column| escape_cell(&cell_text(row.get(column)), layout.delimiter))
            .collect();
        out.push_str(&cells.join(layout.delimiter));
        out.push('\n');
    }

    Ok(out)
}

fn project(layout: &ExportLayout<'_>, rows: &[Row]) -> Vec<Value> {
    rows.iter()
        .map(|row| {
            let obj: Map<String, Value> = layout
                .columns
                .iter()
                .filter_map(|column| row.get(column).map(|v| (column.clone(), v.clone())))
                .collect();
            Value::Object(obj)
        })
        .collect()
}

fn to_pretty(value: &Value) -> SearchResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| SearchError::invalid_request(format!("Failed to encode export: {}", e)))
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn escape_cell(text: &str, delimiter: &str) -> String {
    if text.contains(delimiter) || text.contains('"') || text.contains('\n') || text.contains('\r')
    {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}
