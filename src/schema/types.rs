//! Table definition types
//!
//! A table is a named mapping from column name to field definition. Link
//! fields point at another table by id; the field's own `name` is the
//! relationship's display name.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::query::{SearchFilters, SortOrder};

/// Table ids carrying this prefix belong to an external datasource
pub const EXTERNAL_TABLE_PREFIX: &str = "datasource_plus";

/// Cardinality of a link field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationshipType {
    OneToMany,
    ManyToOne,
    ManyToMany,
}

/// Column data type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldType {
    String,
    LongForm,
    Options,
    Number,
    BigInt,
    Boolean,
    DateTime,
    Array,
    Json,
    /// Relationship to rows of another table
    Link {
        #[serde(rename = "tableId")]
        table_id: String,
        #[serde(
            rename = "relationshipType",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        relationship_type: Option<RelationshipType>,
    },
}

impl FieldType {
    /// Returns the type name for logs and error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::LongForm => "longform",
            FieldType::Options => "options",
            FieldType::Number => "number",
            FieldType::BigInt => "bigint",
            FieldType::Boolean => "boolean",
            FieldType::DateTime => "datetime",
            FieldType::Array => "array",
            FieldType::Json => "json",
            FieldType::Link { .. } => "link",
        }
    }

    /// Related table id for link fields
    pub fn related_table(&self) -> Option<&str> {
        match self {
            FieldType::Link { table_id, .. } => Some(table_id),
            _ => None,
        }
    }

    /// Whether values of this type sort numerically
    pub fn sorts_numerically(&self) -> bool {
        matches!(self, FieldType::Number | FieldType::BigInt)
    }
}

fn default_visible() -> bool {
    true
}

/// Column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Display name; for link fields this is the relationship name
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub field_type: FieldType,
    /// Hidden columns are neither returned by `fetch` nor filterable
    #[serde(default = "default_visible")]
    pub visible: bool,
}

impl FieldSchema {
    fn of(field_type: FieldType) -> Self {
        Self {
            name: String::new(),
            field_type,
            visible: true,
        }
    }

    pub fn text() -> Self {
        Self::of(FieldType::String)
    }

    pub fn number() -> Self {
        Self::of(FieldType::Number)
    }

    pub fn boolean() -> Self {
        Self::of(FieldType::Boolean)
    }

    pub fn datetime() -> Self {
        Self::of(FieldType::DateTime)
    }

    /// Many-to-many link to another table
    pub fn link(table_id: impl Into<String>) -> Self {
        Self::of(FieldType::Link {
            table_id: table_id.into(),
            relationship_type: Some(RelationshipType::ManyToMany),
        })
    }

    /// Override the display name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Mark the column hidden
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn is_link(&self) -> bool {
        matches!(self.field_type, FieldType::Link { .. })
    }
}

/// Where a table's rows live
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locality {
    /// Embedded document store
    #[default]
    Internal,
    /// Proxied from an external connector
    External,
}

/// Saved query over a table, executed by `fetch_view`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewDefinition {
    #[serde(default)]
    pub query: SearchFilters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
}

/// Table definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub source_type: Locality,
    /// Datasource id for external tables
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_display: Option<String>,
    pub schema: BTreeMap<String, FieldSchema>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub views: BTreeMap<String, ViewDefinition>,
}

impl Table {
    /// Create an internal table with an empty schema
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            source_type: Locality::Internal,
            source_id: None,
            primary_display: None,
            schema: BTreeMap::new(),
            views: BTreeMap::new(),
        }
    }

    /// Mark the table as owned by an external datasource
    pub fn external(mut self, source_id: impl Into<String>) -> Self {
        self.source_type = Locality::External;
        self.source_id = Some(source_id.into());
        self
    }

    /// Add a column; an empty display name defaults to the column key
    pub fn with_field(mut self, key: impl Into<String>, mut field: FieldSchema) -> Self {
        let key = key.into();
        if field.name.is_empty() {
            field.name = key.clone();
        }
        self.schema.insert(key, field);
        self
    }

    pub fn with_view(mut self, name: impl Into<String>, view: ViewDefinition) -> Self {
        self.views.insert(name.into(), view);
        self
    }

    /// Embedded store or external connector
    pub fn locality(&self) -> Locality {
        if self.source_type == Locality::External || self.id.starts_with(EXTERNAL_TABLE_PREFIX)
        {
            Locality::External
        } else {
            Locality::Internal
        }
    }

    /// Display name of a link column, falling back to its key
    pub fn relationship_name<'a>(&'a self, key: &'a str) -> &'a str {
        match self.schema.get(key) {
            Some(field) if !field.name.is_empty() => &field.name,
            _ => key,
        }
    }

    /// Case-insensitive column lookup returning the schema's own spelling
    pub fn find_field(&self, name: &str) -> Option<(&str, &FieldSchema)> {
        self.schema
            .get_key_value(name)
            .or_else(|| {
                self.schema
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
            })
            .map(|(key, field)| (key.as_str(), field))
    }

    /// Column keys not marked hidden
    pub fn visible_field_names(&self) -> Vec<String> {
        self.schema
            .iter()
            .filter(|(_, field)| field.visible)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Fill empty display names with their column keys
    pub fn fill_field_names(&mut self) {
        for (key, field) in self.schema.iter_mut() {
            if field.name.is_empty() {
                field.name = key.clone();
            }
        }
    }

    /// Validates the definition itself (not a row)
    pub fn validate_structure(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Table must have a non-empty '_id'".into());
        }

        if self.name.trim().is_empty() {
            return Err(format!("Table '{}' must have a non-empty name", self.id));
        }

        for (key, field) in &self.schema {
            if key.contains('.') {
                return Err(format!(
                    "Column '{}' in table '{}' must not contain '.'",
                    key, self.id
                ));
            }
            if let Some(related) = field.field_type.related_table() {
                if related.trim().is_empty() {
                    return Err(format!(
                        "Link column '{}' in table '{}' has no tableId",
                        key, self.id
                    ));
                }
            }
        }

        Ok(())
    }
}
