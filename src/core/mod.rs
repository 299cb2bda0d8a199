//! # Core Module
//!
//! Shared error type, request context and the boxed future alias used by
//! every collaborator trait in the crate.

pub mod context;
pub mod error;

use std::future::Future;
use std::pin::Pin;

pub use context::{RequestContext, DEFAULT_TENANT};
pub use error::{SearchError, SearchResult};

/// Boxed `Send` future returned by collaborator trait methods
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
