//! Schema resolver
//!
//! Thin pass-through to the table store. Nothing is cached: every call hits
//! the store so schema and visibility changes apply to the next request.

use std::sync::Arc;

use crate::core::SearchResult;

use super::store::TableStore;
use super::types::Table;

/// Resolves table ids to their current definitions
#[derive(Clone)]
pub struct SchemaResolver {
    store: Arc<dyn TableStore>,
}

impl SchemaResolver {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    /// Fetch the authoritative definition, failing with `NotFound`
    pub async fn get_table(&self, table_id: &str) -> SearchResult<Table> {
        let table = self.store.get_table(table_id).await?;
        tracing::trace!(table_id, name = %table.name, columns = table.schema.len(), "Resolved table.");
        Ok(table)
    }
}
