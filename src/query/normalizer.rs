//! Query Normalizer
//!
//! Two stages around schema resolution:
//!
//! 1. `normalize` runs on the raw request: filter cleanup, list-operand
//!    repair, the empty-filter short circuit and sort-order casing.
//! 2. `map_search_input` runs once the table is known: column spelling,
//!    inferred sort type, page-size defaults and operand coercion.

use serde_json::{Number, Value};

use crate::config::SearchConfig;
use crate::schema::{FieldType, Table};

use super::cleanup::{cleanup_query, fixup_filter_arrays, matches_nothing};
use super::filter::{strip_key_numbering, FilterOperator, SearchFilters};
use super::request::{SearchRequest, SortOrder, SortType};

/// Outcome of normalization
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedRequest {
    /// No active condition and the request asked for nothing in that case
    Empty,
    /// Ready for schema resolution
    Ready(SearchRequest),
}

/// Clean the filter tree and canonicalise the sort order.
pub fn normalize(mut request: SearchRequest) -> NormalizedRequest {
    let query = cleanup_query(std::mem::take(&mut request.query));
    let query = fixup_filter_arrays(query);

    if matches_nothing(&query) {
        return NormalizedRequest::Empty;
    }

    request.query = query;
    request.sort_order = request.sort_order.map(SortOrder::canonicalize);
    NormalizedRequest::Ready(request)
}

/// Table-aware input mapping, applied after the table is resolved.
pub fn map_search_input(
    table: &Table,
    mut request: SearchRequest,
    config: &SearchConfig,
) -> SearchRequest {
    if let Some(fields) = request.fields.take() {
        request.fields = Some(
            fields
                .into_iter()
                .map(|field| canonical_name(table, field))
                .collect(),
        );
    }

    if let Some(sort) = request.sort.take() {
        let sort = canonical_name(table, sort);
        if request.sort_type.is_none() {
            request.sort_type = table.schema.get(&sort).map(|field| {
                if field.field_type.sorts_numerically() {
                    SortType::Number
                } else {
                    SortType::String
                }
            });
        }
        request.sort = Some(sort);
    }

    if request.paginate && request.limit.is_none() {
        request.limit = Some(config.default_page_size);
    }
    request.limit = request.limit.map(|limit| limit.min(config.max_page_size));

    coerce_filter_values(table, &mut request.query);
    request
}

fn canonical_name(table: &Table, name: String) -> String {
    match table.find_field(&name) {
        Some((key, _)) => key.to_string(),
        None => name,
    }
}

fn coerce_filter_values(table: &Table, filters: &mut SearchFilters) {
    for (op, conditions) in filters.groups.iter_mut() {
        for (key, value) in conditions.iter_mut() {
            let Some(field) = table.schema.get(strip_key_numbering(key)) else {
                continue;
            };

            match (&field.field_type, op) {
                (
                    FieldType::Number | FieldType::BigInt,
                    FilterOperator::Equal | FilterOperator::NotEqual,
                ) => coerce_number(value),
                (FieldType::Number | FieldType::BigInt, FilterOperator::Range) => {
                    if let Value::Object(bounds) = value {
                        bounds.values_mut().for_each(coerce_number);
                    }
                }
                (FieldType::Boolean, FilterOperator::Equal | FilterOperator::NotEqual) => {
                    coerce_bool(value)
                }
                _ => {}
            }
        }
    }

    for nested in filters.all_of.iter_mut().chain(filters.any_of.iter_mut()) {
        coerce_filter_values(table, nested);
    }
}

fn coerce_number(value: &mut Value) {
    let Value::String(raw) = value else {
        return;
    };
    let raw = raw.trim();

    if let Ok(n) = raw.parse::<i64>() {
        *value = Value::from(n);
    } else if let Some(n) = raw.parse::<f64>().ok().and_then(Number::from_f64) {
        *value = Value::Number(n);
    }
}

fn coerce_bool(value: &mut Value) {
    let Value::String(raw) = value else {
        return;
    };

    if raw.eq_ignore_ascii_case("true") {
        *value = Value::Bool(true);
    } else if raw.eq_ignore_ascii_case("false") {
        *value = Value::Bool(false);
    }
}
