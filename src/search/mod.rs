//! Public read operations
//!
//! `RowSearch` ties the pipeline together: query normalization, schema
//! resolution, field expansion, sanitization, dispatch and the envelope.

mod service;

pub use service::RowSearch;
