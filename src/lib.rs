//! rowsearch - query routing and field resolution for row search
//!
//! Normalizes search requests, works out which columns (including columns
//! of related tables) a request may filter on, strips the rest, and routes
//! the request to the backend that owns the table.

pub mod backend;
pub mod cli;
pub mod config;
pub mod core;
pub mod fields;
pub mod observability;
pub mod query;
pub mod schema;
pub mod search;

pub use crate::backend::{Dispatcher, MemoryExecutor, RowExecutor, SearchResponse, Strategy};
pub use crate::config::SearchConfig;
pub use crate::core::{RequestContext, SearchError, SearchResult};
pub use crate::search::RowSearch;
