//! Queriable fields
//!
//! Which paths a request may filter and sort on, and the pass that strips
//! everything else from the request.

mod expander;
mod path;
mod sanitizer;

pub use expander::{visible_fields, FieldExpander};
pub use path::{FieldPath, QueriableFieldSet};
pub use sanitizer::{sanitize, sanitize_request};
