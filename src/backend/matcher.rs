//! Filter evaluation against JSON rows
//!
//! Used by the in-memory executor. Conditions inside one operator group and
//! across groups are ANDed; `$and` needs every nested group, `$or` at least
//! one. Dotted paths walk through link columns, which hold arrays of related
//! rows.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::DateTime;
use serde_json::Value;

use crate::query::{strip_key_numbering, FilterOperator, SearchFilters};
use crate::schema::Table;

use super::envelope::Row;

/// Evaluates filter trees for rows of one table
pub struct RowMatcher<'a> {
    table: &'a Table,
    /// Table id -> table name, for paths qualified by related table name
    table_names: &'a HashMap<String, String>,
}

impl<'a> RowMatcher<'a> {
    pub fn new(table: &'a Table, table_names: &'a HashMap<String, String>) -> Self {
        Self { table, table_names }
    }

    /// Check if a row satisfies the whole tree
    pub fn matches(&self, filters: &SearchFilters, row: &Row) -> bool {
        let groups_match = filters.groups.iter().all(|(op, conditions)| {
            conditions
                .iter()
                .all(|(key, operand)| self.matches_condition(*op, key, operand, row))
        });

        groups_match
            && filters.all_of.iter().all(|group| self.matches(group, row))
            && (filters.any_of.is_empty()
                || filters.any_of.iter().any(|group| self.matches(group, row)))
    }

    fn matches_condition(&self, op: FilterOperator, key: &str, operand: &Value, row: &Row) -> bool {
        let values = self.resolve(row, strip_key_numbering(key));

        match op {
            FilterOperator::String => values
                .iter()
                .any(|v| text_match(v, operand, |text, needle| text.starts_with(needle))),
            FilterOperator::Fuzzy => values
                .iter()
                .any(|v| text_match(v, operand, |text, needle| text.contains(needle))),
            FilterOperator::Range => values.iter().any(|v| in_range(v, operand)),
            FilterOperator::Equal => values.iter().any(|v| loosely_equal(v, operand)),
            FilterOperator::NotEqual => !values.iter().any(|v| loosely_equal(v, operand)),
            FilterOperator::Empty => values.iter().all(|v| is_empty_value(v)),
            FilterOperator::NotEmpty => values.iter().any(|v| !is_empty_value(v)),
            FilterOperator::OneOf => {
                let options = as_list(operand);
                values.iter().any(|v| match v {
                    Value::Array(items) => items.iter().any(|item| in_list(item, &options)),
                    scalar => in_list(scalar, &options),
                })
            }
            FilterOperator::Contains => values.iter().any(|v| contains_all(v, &as_list(operand))),
            FilterOperator::NotContains => {
                !values.iter().any(|v| contains_all(v, &as_list(operand)))
            }
            FilterOperator::ContainsAny => {
                let options = as_list(operand);
                values.iter().any(|v| match v {
                    Value::Array(items) => items.iter().any(|item| in_list(item, &options)),
                    _ => false,
                })
            }
        }
    }

    /// Every value a path reaches in a row
    fn resolve<'r>(&self, row: &'r Row, path: &str) -> Vec<&'r Value> {
        if let Some(value) = row.get(path) {
            return vec![value];
        }

        let Some((head, rest)) = path.split_once('.') else {
            return Vec::new();
        };
        let Some(column) = self.link_column(head) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        if let Some(linked) = row.get(column) {
            collect(linked, rest, &mut out);
        }
        out
    }

    /// Link column reachable as `head`: its key, its display name, or the
    /// related table's name
    fn link_column(&self, head: &str) -> Option<&'a str> {
        self.table
            .schema
            .iter()
            .find(|(key, field)| {
                let Some(related) = field.field_type.related_table() else {
                    return false;
                };
                key.as_str() == head
                    || field.name == head
                    || self.table_names.get(related).map(String::as_str) == Some(head)
            })
            .map(|(key, _)| key.as_str())
    }
}

fn collect<'r>(value: &'r Value, path: &str, out: &mut Vec<&'r Value>) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| collect(item, path, out)),
        Value::Object(obj) => {
            if let Some(found) = obj.get(path) {
                out.push(found);
            } else if let Some((head, rest)) = path.split_once('.') {
                if let Some(nested) = obj.get(head) {
                    collect(nested, rest, out);
                }
            }
        }
        _ => {}
    }
}

fn text_match(value: &Value, operand: &Value, test: impl Fn(&str, &str) -> bool) -> bool {
    match (value.as_str(), operand.as_str()) {
        (Some(text), Some(needle)) => test(&text.to_lowercase(), &needle.to_lowercase()),
        _ => false,
    }
}

fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn as_list(operand: &Value) -> Vec<&Value> {
    match operand {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

fn in_list(value: &Value, options: &[&Value]) -> bool {
    options.iter().any(|option| loosely_equal(value, option))
}

fn contains_all(value: &Value, wanted: &[&Value]) -> bool {
    match value {
        Value::Array(items) => wanted
            .iter()
            .all(|w| items.iter().any(|item| loosely_equal(item, w))),
        _ => false,
    }
}

fn in_range(value: &Value, operand: &Value) -> bool {
    let Value::Object(bounds) = operand else {
        return false;
    };

    let above_low = match bounds.get("low") {
        None | Some(Value::Null) => true,
        Some(low) => matches!(
            compare_scalars(value, low),
            Some(Ordering::Greater | Ordering::Equal)
        ),
    };
    let below_high = match bounds.get("high") {
        None | Some(Value::Null) => true,
        Some(high) => matches!(
            compare_scalars(value, high),
            Some(Ordering::Less | Ordering::Equal)
        ),
    };

    above_low && below_high
}

/// Numbers with numbers, strings with strings; anything else is unordered.
/// Two RFC 3339 timestamps compare as instants.
fn compare_scalars(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => {
            match (
                DateTime::parse_from_rfc3339(x),
                DateTime::parse_from_rfc3339(y),
            ) {
                (Ok(x), Ok(y)) => Some(x.cmp(&y)),
                _ => Some(x.cmp(y)),
            }
        }
        _ => None,
    }
}
