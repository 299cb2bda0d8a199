//! Filter Sanitizer
//!
//! Removes filter conditions and sort references naming paths outside the
//! request's `QueriableFieldSet`. Sanitization narrows, it never fails: a
//! stripped condition simply stops constraining the result.

use crate::query::{has_filters, Conditions, SearchFilters, SearchRequest};

use super::path::QueriableFieldSet;

/// Strip non-queriable conditions from a filter tree.
///
/// Nested groups are sanitized recursively and dropped once empty. The
/// empty-filter policy is carried over untouched.
pub fn sanitize(filters: SearchFilters, allowed: &QueriableFieldSet) -> SearchFilters {
    let SearchFilters {
        groups,
        all_of,
        any_of,
        on_empty_filter,
    } = filters;

    let mut sanitized = SearchFilters {
        on_empty_filter,
        ..SearchFilters::default()
    };

    for (op, conditions) in groups {
        let kept: Conditions = conditions
            .into_iter()
            .filter(|(key, _)| {
                let keep = allowed.contains(key);
                if !keep {
                    tracing::debug!(operator = op.key(), field = %key, "Dropped filter on non-queriable field.");
                }
                keep
            })
            .collect();

        if !kept.is_empty() {
            sanitized.groups.insert(op, kept);
        }
    }

    sanitized.all_of = sanitize_nested(all_of, allowed);
    sanitized.any_of = sanitize_nested(any_of, allowed);
    sanitized
}

fn sanitize_nested(nested: Vec<SearchFilters>, allowed: &QueriableFieldSet) -> Vec<SearchFilters> {
    nested
        .into_iter()
        .map(|group| sanitize(group, allowed))
        .filter(has_filters)
        .collect()
}

/// Sanitize a request's filter tree and sort column.
///
/// A sort on a non-queriable column is dropped together with its order and
/// comparison type.
pub fn sanitize_request(mut request: SearchRequest, allowed: &QueriableFieldSet) -> SearchRequest {
    request.query = sanitize(std::mem::take(&mut request.query), allowed);

    if let Some(sort) = request.sort.as_deref() {
        if !allowed.contains(sort) {
            tracing::debug!(field = sort, "Dropped sort on non-queriable field.");
            request.sort = None;
            request.sort_order = None;
            request.sort_type = None;
        }
    }

    request
}
