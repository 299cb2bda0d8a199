//! Field paths and the per-request set of queriable paths

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::query::strip_key_numbering;

/// Dot-qualified column reference: `status` or `customer.name`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FieldPath(String);

impl FieldPath {
    /// Build a path from a filter key, dropping any `N:` numbering
    pub fn new(raw: &str) -> Self {
        Self(strip_key_numbering(raw).to_string())
    }

    /// `prefix.inner`
    pub fn qualified(prefix: &str, inner: &FieldPath) -> Self {
        Self(format!("{}.{}", prefix, inner.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldPath {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Paths a request may filter or sort on
///
/// Membership is exact (case-sensitive) after key numbering is removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QueriableFieldSet {
    paths: BTreeSet<FieldPath>,
}

impl QueriableFieldSet {
    /// Set seeded with the identifier column
    pub fn with_id(id_field: &str) -> Self {
        let mut set = Self::default();
        set.insert(FieldPath::new(id_field));
        set
    }

    pub fn insert(&mut self, path: FieldPath) -> bool {
        self.paths.insert(path)
    }

    pub fn extend<I: IntoIterator<Item = FieldPath>>(&mut self, paths: I) {
        self.paths.extend(paths);
    }

    /// Whether a filter key (numbering allowed) is queriable
    pub fn contains(&self, key: &str) -> bool {
        self.paths.contains(&FieldPath::new(key))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldPath> {
        self.paths.iter()
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.paths.iter().map(|p| p.as_str().to_string()).collect()
    }
}
