//! # Filter Tree
//!
//! Client-built search filters: one condition map per operator plus nested
//! `$and` / `$or` groups.
//!
//! ```json
//! {
//!   "equal": {"status": "open"},
//!   "range": {"total": {"low": 10, "high": 100}},
//!   "$or": {"conditions": [{"oneOf": {"region": ["eu", "us"]}}]},
//!   "onEmptyFilter": "none"
//! }
//! ```
//!
//! Parsing never fails: operator groups that are not objects, group
//! conditions that are not arrays and unknown keys are dropped.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field key -> operand, for one operator
pub type Conditions = BTreeMap<String, Value>;

/// Filter operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterOperator {
    /// Prefix match
    String,
    /// Substring match
    Fuzzy,
    /// `{low, high}` inclusive bounds
    Range,
    Equal,
    NotEqual,
    /// Value is null, missing, empty string or empty array
    Empty,
    NotEmpty,
    /// Column value is one of the operand list
    OneOf,
    /// Array column contains every operand
    Contains,
    /// Array column contains none of the operands
    NotContains,
    /// Array column contains at least one operand
    ContainsAny,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 11] = [
        FilterOperator::String,
        FilterOperator::Fuzzy,
        FilterOperator::Range,
        FilterOperator::Equal,
        FilterOperator::NotEqual,
        FilterOperator::Empty,
        FilterOperator::NotEmpty,
        FilterOperator::OneOf,
        FilterOperator::Contains,
        FilterOperator::NotContains,
        FilterOperator::ContainsAny,
    ];

    /// Wire key of the operator group
    pub fn key(&self) -> &'static str {
        match self {
            FilterOperator::String => "string",
            FilterOperator::Fuzzy => "fuzzy",
            FilterOperator::Range => "range",
            FilterOperator::Equal => "equal",
            FilterOperator::NotEqual => "notEqual",
            FilterOperator::Empty => "empty",
            FilterOperator::NotEmpty => "notEmpty",
            FilterOperator::OneOf => "oneOf",
            FilterOperator::Contains => "contains",
            FilterOperator::NotContains => "notContains",
            FilterOperator::ContainsAny => "containsAny",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.key() == key)
    }

    /// Operators whose operand must be a list
    pub fn is_array_operator(&self) -> bool {
        matches!(
            self,
            FilterOperator::OneOf
                | FilterOperator::Contains
                | FilterOperator::NotContains
                | FilterOperator::ContainsAny
        )
    }
}

/// What a request with no active condition returns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmptyFilterOption {
    #[default]
    #[serde(rename = "all", alias = "RETURN_ALL")]
    ReturnAll,
    #[serde(rename = "none", alias = "RETURN_NONE")]
    ReturnNone,
}

const AND_KEY: &str = "$and";
const OR_KEY: &str = "$or";
const ON_EMPTY_KEY: &str = "onEmptyFilter";

/// Filter tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub struct SearchFilters {
    pub groups: BTreeMap<FilterOperator, Conditions>,
    /// `$and` conditions
    pub all_of: Vec<SearchFilters>,
    /// `$or` conditions
    pub any_of: Vec<SearchFilters>,
    pub on_empty_filter: Option<EmptyFilterOption>,
}

impl SearchFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one condition
    pub fn with(mut self, op: FilterOperator, field: impl Into<String>, value: Value) -> Self {
        self.groups.entry(op).or_default().insert(field.into(), value);
        self
    }

    pub fn equal(self, field: impl Into<String>, value: Value) -> Self {
        self.with(FilterOperator::Equal, field, value)
    }

    pub fn and(mut self, conditions: Vec<SearchFilters>) -> Self {
        self.all_of.extend(conditions);
        self
    }

    pub fn or(mut self, conditions: Vec<SearchFilters>) -> Self {
        self.any_of.extend(conditions);
        self
    }

    pub fn on_empty(mut self, option: EmptyFilterOption) -> Self {
        self.on_empty_filter = Some(option);
        self
    }

    pub fn conditions(&self, op: FilterOperator) -> Option<&Conditions> {
        self.groups.get(&op)
    }

    /// Every field key referenced anywhere in the tree, numbering included
    pub fn referenced_fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = self
            .groups
            .values()
            .flat_map(|conditions| conditions.keys().map(String::as_str))
            .collect();
        for nested in self.all_of.iter().chain(self.any_of.iter()) {
            fields.extend(nested.referenced_fields());
        }
        fields
    }
}

/// Strips the `N:` prefix that lets one field appear twice in a group
pub fn strip_key_numbering(key: &str) -> &str {
    match key.split_once(':') {
        Some((prefix, rest)) if !prefix.is_empty() && prefix.bytes().all(|b| b.is_ascii_digit()) => {
            rest
        }
        _ => key,
    }
}

fn parse_group(raw: Value) -> Vec<SearchFilters> {
    let conditions = match raw {
        Value::Object(mut obj) => obj.remove("conditions"),
        list @ Value::Array(_) => Some(list),
        _ => None,
    };

    match conditions {
        Some(Value::Array(items)) => items.into_iter().map(SearchFilters::from).collect(),
        _ => Vec::new(),
    }
}

impl From<Value> for SearchFilters {
    fn from(value: Value) -> Self {
        let Value::Object(map) = value else {
            return Self::default();
        };

        let mut filters = Self::default();
        for (key, raw) in map {
            match key.as_str() {
                AND_KEY => filters.all_of = parse_group(raw),
                OR_KEY => filters.any_of = parse_group(raw),
                ON_EMPTY_KEY => filters.on_empty_filter = serde_json::from_value(raw).ok(),
                other => {
                    if let (Some(op), Value::Object(conditions)) = (FilterOperator::from_key(other), raw)
                    {
                        filters.groups.insert(op, conditions.into_iter().collect());
                    }
                }
            }
        }
        filters
    }
}

impl From<SearchFilters> for Value {
    fn from(filters: SearchFilters) -> Self {
        let mut map = Map::new();
        for (op, conditions) in filters.groups {
            map.insert(
                op.key().to_string(),
                Value::Object(conditions.into_iter().collect()),
            );
        }

        let group = |conditions: Vec<SearchFilters>| {
            let items: Vec<Value> = conditions.into_iter().map(Value::from).collect();
            serde_json::json!({ "conditions": items })
        };
        if !filters.all_of.is_empty() {
            map.insert(AND_KEY.to_string(), group(filters.all_of));
        }
        if !filters.any_of.is_empty() {
            map.insert(OR_KEY.to_string(), group(filters.any_of));
        }
        if let Some(option) = filters.on_empty_filter {
            if let Ok(value) = serde_json::to_value(option) {
                map.insert(ON_EMPTY_KEY.to_string(), value);
            }
        }
        Value::Object(map)
    }
}
