//! Backend strategy selection

use std::fmt;

use serde::Serialize;

use crate::schema::Locality;

/// Which executor handles a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Strategy {
    /// Table proxied from an external connector
    External,
    /// Embedded store, structured-query engine
    StructuredInternal,
    /// Embedded store, legacy engine
    LegacyInternal,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::External => "external",
            Strategy::StructuredInternal => "structuredInternal",
            Strategy::LegacyInternal => "legacyInternal",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External tables always go external; internal tables follow the tenant's
/// structured-query flag.
pub fn select_strategy(locality: Locality, structured_enabled: bool) -> Strategy {
    match (locality, structured_enabled) {
        (Locality::External, _) => Strategy::External,
        (Locality::Internal, true) => Strategy::StructuredInternal,
        (Locality::Internal, false) => Strategy::LegacyInternal,
    }
}
