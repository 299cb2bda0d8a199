//! Backend routing and execution
//!
//! `RowExecutor` is the capability every backend offers; the `Dispatcher`
//! picks one per request through the pure `select_strategy`. The envelope
//! types are what the public operations return.

mod dispatcher;
mod envelope;
mod executor;
mod export;
mod flags;
mod matcher;
mod memory;
mod sorter;
mod strategy;

pub use dispatcher::Dispatcher;
pub use envelope::{build_response, ExecutorOutput, ExportResult, Row, SearchResponse};
pub use executor::RowExecutor;
pub use export::{format_csv, format_rows, ExportLayout};
pub use flags::{FeatureFlags, StaticFeatureFlags};
pub use matcher::RowMatcher;
pub use memory::MemoryExecutor;
pub use sorter::sort_rows;
pub use strategy::{select_strategy, Strategy};
