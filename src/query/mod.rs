//! Search request model and normalization
//!
//! Raw client requests enter here and leave as a cleaned, table-aware
//! `SearchRequest` (or as the decision to return nothing).

mod cleanup;
mod filter;
mod normalizer;
mod request;

pub use cleanup::{cleanup_query, fixup_filter_arrays, has_filters, matches_nothing};
pub use filter::{strip_key_numbering, Conditions, EmptyFilterOption, FilterOperator, SearchFilters};
pub use normalizer::{map_search_input, normalize, NormalizedRequest};
pub use request::{
    Bookmark, Calculation, ExportFormat, ExportRowsOptions, SearchRequest, SortOrder, SortType,
    ViewParams,
};
