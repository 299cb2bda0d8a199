//! Relational Field Expander
//!
//! Computes every path a request may filter or sort on: the identifier
//! column, the requested visible columns, and for each link column the
//! related table's columns under both the relationship name and the related
//! table's name.
//!
//! Traversal is guarded by a set of visited directed edges
//! `(from table id, to table id)`, fresh for every top-level call and shared
//! by the whole traversal. Following `A -> B` marks both `A -> B` and
//! `B -> A`, so a back-edge never re-expands the table it came from.

use std::collections::HashSet;

use crate::core::{BoxFuture, SearchResult};
use crate::schema::{SchemaResolver, Table};

use super::path::{FieldPath, QueriableFieldSet};

type Edge = (String, String);

/// Requested columns narrowed to visible ones, in schema spelling.
///
/// Matching is case-insensitive. `None` selects every visible column.
pub fn visible_fields(table: &Table, requested: Option<&[String]>) -> Vec<String> {
    table
        .schema
        .iter()
        .filter(|(_, field)| field.visible)
        .filter(|(key, _)| match requested {
            Some(requested) => requested.iter().any(|r| r.eq_ignore_ascii_case(key)),
            None => true,
        })
        .map(|(key, _)| key.clone())
        .collect()
}

/// Builds `QueriableFieldSet`s, resolving related tables as it goes
pub struct FieldExpander {
    resolver: SchemaResolver,
    id_field: String,
}

impl FieldExpander {
    pub fn new(resolver: SchemaResolver, id_field: impl Into<String>) -> Self {
        Self {
            resolver,
            id_field: id_field.into(),
        }
    }

    /// Paths legal for a request on `table` projecting `requested_fields`.
    ///
    /// A related table that does not resolve fails the whole call with
    /// `NotFound`.
    pub async fn queriable_fields(
        &self,
        table: &Table,
        requested_fields: &[String],
    ) -> SearchResult<QueriableFieldSet> {
        let mut visited: HashSet<Edge> = HashSet::new();
        let mut result = QueriableFieldSet::with_id(&self.id_field);

        let paths =
            extract_table_fields(&self.resolver, table, Some(requested_fields), &mut visited)
                .await?;
        result.extend(paths);

        tracing::debug!(
            table_id = %table.id,
            requested = requested_fields.len(),
            queriable = result.len(),
            edges = visited.len(),
            "Expanded queriable fields."
        );

        Ok(result)
    }
}

fn extract_table_fields<'a>(
    resolver: &'a SchemaResolver,
    table: &'a Table,
    allowed: Option<&'a [String]>,
    visited: &'a mut HashSet<Edge>,
) -> BoxFuture<'a, SearchResult<Vec<FieldPath>>> {
    Box::pin(async move {
        let mut paths = Vec::new();

        for (key, field) in &table.schema {
            if let Some(allowed) = allowed {
                if !allowed.iter().any(|a| a == key) {
                    continue;
                }
            }

            let Some(related_id) = field.field_type.related_table() else {
                paths.push(FieldPath::new(key));
                continue;
            };

            let edge = (table.id.clone(), related_id.to_string());
            if visited.contains(&edge) {
                tracing::trace!(from = %table.id, to = related_id, field = %key, "Skipping visited relationship.");
                continue;
            }
            visited.insert(edge);
            visited.insert((related_id.to_string(), table.id.clone()));

            let related = resolver.get_table(related_id).await?;
            let nested = extract_table_fields(resolver, &related, None, &mut *visited).await?;

            let relationship = table.relationship_name(key);
            for path in &nested {
                paths.push(FieldPath::qualified(relationship, path));
                paths.push(FieldPath::qualified(&related.name, path));
            }
        }

        Ok(paths)
    })
}
