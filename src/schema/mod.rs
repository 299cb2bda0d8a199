//! Table definitions and their resolution
//!
//! Tables are owned by an external store; this module defines their shape,
//! the store boundary and the per-request resolver.

mod resolver;
mod store;
mod types;

pub use resolver::SchemaResolver;
pub use store::{MemoryTableStore, TableStore};
pub use types::{
    FieldSchema, FieldType, Locality, RelationshipType, Table, ViewDefinition,
    EXTERNAL_TABLE_PREFIX,
};
