//! Row sorting for the in-memory executor

use std::cmp::Ordering;

use serde_json::Value;

use crate::query::SortType;

use super::envelope::Row;

/// Sorts rows by one column. Sort is stable.
///
/// `Number` compares numerically (numeric strings included); `String`
/// compares by JSON type first, then natural ordering.
pub fn sort_rows(rows: &mut [Row], field: &str, descending: bool, sort_type: SortType) {
    rows.sort_by(|a, b| {
        let ordering = match sort_type {
            SortType::Number => compare_numbers(a.get(field), b.get(field)),
            SortType::String => compare_values(a.get(field), b.get(field)),
        };

        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

fn as_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Non-numeric values sort before numbers
fn compare_numbers(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (as_number(a), as_number(b)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}

/// Missing < null < bool < number < string < array < object
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a_val), Some(b_val)) => {
            let type_order = |v: &Value| -> u8 {
                match v {
                    Value::Null => 0,
                    Value::Bool(_) => 1,
                    Value::Number(_) => 2,
                    Value::String(_) => 3,
                    Value::Array(_) => 4,
                    Value::Object(_) => 5,
                }
            };

            let a_type = type_order(a_val);
            let b_type = type_order(b_val);
            if a_type != b_type {
                return a_type.cmp(&b_type);
            }

            match (a_val, b_val) {
                (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
                (Value::Number(x), Value::Number(y)) => {
                    let x = x.as_f64().unwrap_or(0.0);
                    let y = y.as_f64().unwrap_or(0.0);
                    x.partial_cmp(&y).unwrap_or(Ordering::Equal)
                }
                (Value::String(x), Value::String(y)) => x.cmp(y),
                _ => Ordering::Equal,
            }
        }
    }
}
