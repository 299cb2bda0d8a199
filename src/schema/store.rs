//! Table definition store
//!
//! `TableStore` is the boundary to wherever table definitions live. The
//! in-memory store doubles as the directory loader used by the binary:
//! one `*.json` table definition per file.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::RwLock;

use crate::core::{BoxFuture, SearchError, SearchResult};

use super::types::Table;

/// Source of authoritative table definitions
pub trait TableStore: Send + Sync {
    /// Fetch a table by id, failing with `NotFound` when it does not exist
    fn get_table<'a>(&'a self, table_id: &'a str) -> BoxFuture<'a, SearchResult<Table>>;
}

/// Table store backed by a map, optionally seeded from disk
#[derive(Debug, Default)]
pub struct MemoryTableStore {
    tables: RwLock<HashMap<String, Table>>,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every `*.json` file in `dir` as a table definition.
    ///
    /// Malformed files and duplicate table ids fail the whole load.
    pub fn load_dir(dir: &Path) -> SearchResult<Self> {
        let store = Self::new();

        let entries = fs::read_dir(dir).map_err(|e| {
            SearchError::config(format!(
                "Failed to read table directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                SearchError::config(format!("Failed to read directory entry: {}", e))
            })?;
            let path = entry.path();

            // Skip non-JSON files
            if path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }
            paths.push(path);
        }
        paths.sort();

        for path in paths {
            let content = fs::read_to_string(&path).map_err(|e| {
                SearchError::config(format!("Failed to read {}: {}", path.display(), e))
            })?;

            let table: Table = serde_json::from_str(&content).map_err(|e| {
                SearchError::config(format!("Invalid table JSON in {}: {}", path.display(), e))
            })?;

            store.register(table)?;
        }

        tracing::debug!(dir = %dir.display(), tables = store.len(), "Loaded table definitions.");

        Ok(store)
    }

    /// Registers a new table; an existing id is rejected.
    pub fn register(&self, table: Table) -> SearchResult<()> {
        let mut tables = self.write_lock()?;
        if tables.contains_key(&table.id) {
            return Err(SearchError::config(format!(
                "Table '{}' is already registered",
                table.id
            )));
        }
        tables.insert(table.id.clone(), Self::prepare(table)?);
        Ok(())
    }

    /// Inserts or replaces a table definition.
    pub fn upsert(&self, table: Table) -> SearchResult<()> {
        let table = Self::prepare(table)?;
        self.write_lock()?.insert(table.id.clone(), table);
        Ok(())
    }

    /// Removes a table, returning whether it existed.
    pub fn remove(&self, table_id: &str) -> SearchResult<bool> {
        Ok(self.write_lock()?.remove(table_id).is_some())
    }

    /// Every registered table, ordered by id
    pub fn tables(&self) -> SearchResult<Vec<Table>> {
        let tables = self
            .tables
            .read()
            .map_err(|_| SearchError::config("table store lock poisoned"))?;

        let mut all: Vec<Table> = tables.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    pub fn len(&self) -> usize {
        self.tables.read().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn prepare(mut table: Table) -> SearchResult<Table> {
        table.validate_structure().map_err(SearchError::config)?;
        table.fill_field_names();
        Ok(table)
    }

    fn write_lock(
        &self,
    ) -> SearchResult<std::sync::RwLockWriteGuard<'_, HashMap<String, Table>>> {
        self.tables
            .write()
            .map_err(|_| SearchError::config("table store lock poisoned"))
    }

    fn lookup(&self, table_id: &str) -> SearchResult<Table> {
        let tables = self
            .tables
            .read()
            .map_err(|_| SearchError::config("table store lock poisoned"))?;

        tables
            .get(table_id)
            .cloned()
            .ok_or_else(|| SearchError::not_found(format!("table {}", table_id)))
    }
}

impl TableStore for MemoryTableStore {
    fn get_table<'a>(&'a self, table_id: &'a str) -> BoxFuture<'a, SearchResult<Table>> {
        let result = self.lookup(table_id);
        Box::pin(async move { result })
    }
}
