//! Request Context
//!
//! Context carried through one search call: request id for log correlation
//! and the tenant whose feature flags decide the internal engine.

use std::time::Instant;

use uuid::Uuid;

/// Tenant used when the caller does not name one
pub const DEFAULT_TENANT: &str = "default";

/// Context carried through the search pipeline
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Request ID for tracing
    pub request_id: Uuid,

    /// Tenant the request runs on behalf of
    pub tenant_id: String,

    /// Start time for duration tracking
    started_at: Instant,
}

impl RequestContext {
    /// Create a new request context for a tenant
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            tenant_id: tenant_id.into(),
            started_at: Instant::now(),
        }
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u128 {
        self.started_at.elapsed().as_millis()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new(DEFAULT_TENANT)
    }
}
