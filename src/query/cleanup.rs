//! Filter cleanup helpers
//!
//! `cleanup_query` removes conditions with no usable operand,
//! `fixup_filter_arrays` gives list operators list operands and
//! `has_filters` reports whether anything is left to match on and
//! `matches_nothing` whether the empty-filter policy then selects no rows.

use serde_json::Value;

use super::filter::{EmptyFilterOption, FilterOperator, SearchFilters};

/// Drop null / empty-string / empty-list operands, empty range bounds and
/// groups left without conditions.
pub fn cleanup_query(mut filters: SearchFilters) -> SearchFilters {
    for (op, conditions) in filters.groups.iter_mut() {
        let op = *op;
        conditions.retain(|_, value| keeps_condition(op, value));
    }
    filters.groups.retain(|_, conditions| !conditions.is_empty());

    filters.all_of = cleanup_nested(std::mem::take(&mut filters.all_of));
    filters.any_of = cleanup_nested(std::mem::take(&mut filters.any_of));
    filters
}

fn cleanup_nested(groups: Vec<SearchFilters>) -> Vec<SearchFilters> {
    groups
        .into_iter()
        .map(cleanup_query)
        .filter(has_filters)
        .collect()
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn keeps_condition(op: FilterOperator, value: &Value) -> bool {
    match op {
        FilterOperator::Empty | FilterOperator::NotEmpty => true,
        FilterOperator::Range => match value {
            Value::Object(bounds) => ["low", "high"]
                .iter()
                .any(|bound| bounds.get(*bound).map_or(false, |v| !is_blank(v))),
            _ => false,
        },
        _ => !is_blank(value),
    }
}

/// Give list operators (`oneOf`, `contains`, `notContains`, `containsAny`)
/// list operands: comma-separated strings are split and trimmed, scalars
/// are wrapped.
pub fn fixup_filter_arrays(mut filters: SearchFilters) -> SearchFilters {
    for (op, conditions) in filters.groups.iter_mut() {
        if !op.is_array_operator() {
            continue;
        }
        for value in conditions.values_mut() {
            *value = match value.take() {
                list @ Value::Array(_) => list,
                Value::String(s) => Value::Array(
                    s.split(',')
                        .map(str::trim)
                        .filter(|part| !part.is_empty())
                        .map(|part| Value::String(part.to_string()))
                        .collect(),
                ),
                other => Value::Array(vec![other]),
            };
        }
    }

    filters.all_of = filters.all_of.into_iter().map(fixup_filter_arrays).collect();
    filters.any_of = filters.any_of.into_iter().map(fixup_filter_arrays).collect();
    filters
}

/// Whether any condition remains anywhere in the tree
pub fn has_filters(filters: &SearchFilters) -> bool {
    filters.groups.values().any(|conditions| !conditions.is_empty())
        || filters.all_of.iter().any(has_filters)
        || filters.any_of.iter().any(has_filters)
}

/// No condition left and the request asked for no rows in that case
pub fn matches_nothing(filters: &SearchFilters) -> bool {
    !has_filters(filters) && filters.on_empty_filter == Some(EmptyFilterOption::ReturnNone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> SearchFilters {
        SearchFilters::from(value)
    }

    #[test]
    fn test_cleanup_drops_blank_operands() {
        let cleaned = cleanup_query(parse(json!({
            "equal": {"a": null, "b": "", "c": 0, "d": false},
            "oneOf": {"e": []},
            "range": {"f": {"low": "", "high": null}, "g": {"low": 1}, "h": 5},
            "empty": {"i": null}
        })));

        let equal = cleaned.conditions(FilterOperator::Equal).unwrap();
        assert_eq!(equal.keys().collect::<Vec<_>>(), vec!["c", "d"]);
        assert!(cleaned.conditions(FilterOperator::OneOf).is_none());
        let range = cleaned.conditions(FilterOperator::Range).unwrap();
        assert_eq!(range.keys().collect::<Vec<_>>(), vec!["g"]);
        assert!(cleaned.conditions(FilterOperator::Empty).is_some());
    }

    #[test]
    fn test_cleanup_collapses_empty_nested_groups() {
        let cleaned = cleanup_query(parse(json!({
            "$and": {"conditions": [{"equal": {"a": ""}}, {}, {"equal": {"b": 1}}]},
            "$or": {"conditions": [{"string": {"c": null}}]}
        })));

        assert_eq!(cleaned.all_of.len(), 1);
        assert!(cleaned.any_of.is_empty());
    }

    #[test]
    fn test_cleanup_keeps_on_empty_filter() {
        let cleaned = cleanup_query(parse(json!({"onEmptyFilter": "none"})));
        assert!(cleaned.on_empty_filter.is_some());
        assert!(!has_filters(&cleaned));
    }

    #[test]
    fn test_matches_nothing_needs_return_none_and_no_conditions() {
        assert!(matches_nothing(&parse(json!({"onEmptyFilter": "RETURN_NONE"}))));
        assert!(!matches_nothing(&parse(json!({}))));
        assert!(!matches_nothing(&parse(json!({"onEmptyFilter": "all"}))));
        assert!(!matches_nothing(&parse(json!({
            "equal": {"status": "open"},
            "onEmptyFilter": "none"
        }))));
    }

    #[test]
    fn test_fixup_splits_and_wraps() {
        let fixed = fixup_filter_arrays(parse(json!({
            "oneOf": {"a": "x, y ,,z", "b": 3, "c": ["kept"]},
            "equal": {"d": "p,q"},
            "$or": {"conditions": [{"containsAny": {"e": "solo"}}]}
        })));

        let one_of = fixed.conditions(FilterOperator::OneOf).unwrap();
        assert_eq!(one_of["a"], json!(["x", "y", "z"]));
        assert_eq!(one_of["b"], json!([3]));
        assert_eq!(one_of["c"], json!(["kept"]));
        assert_eq!(fixed.conditions(FilterOperator::Equal).unwrap()["d"], json!("p,q"));
        assert_eq!(
            fixed.any_of[0].conditions(FilterOperator::ContainsAny).unwrap()["e"],
            json!(["solo"])
        );
    }

    #[test]
    fn test_has_filters() {
        assert!(!has_filters(&SearchFilters::default()));
        assert!(has_filters(&parse(json!({"notEmpty": {"a": null}}))));
        assert!(has_filters(&parse(json!({"$and": {"conditions": [{"equal": {"a": 1}}]}}))));
        assert!(!has_filters(&parse(json!({"$and": {"conditions": [{}]}}))));
    }
}
