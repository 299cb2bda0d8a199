//! Tenant feature flags

use crate::config::StructuredQueryConfig;
use crate::core::{BoxFuture, SearchResult};

/// Per-tenant feature flag lookup
pub trait FeatureFlags: Send + Sync {
    /// Whether the tenant's internal tables run on the structured-query engine
    fn structured_query_enabled<'a>(&'a self, tenant_id: &'a str)
        -> BoxFuture<'a, SearchResult<bool>>;
}

/// Flags read from static configuration
///
/// An opt-out beats an opt-in; unlisted tenants get `default_enabled`.
#[derive(Debug, Clone, Default)]
pub struct StaticFeatureFlags {
    config: StructuredQueryConfig,
}

impl StaticFeatureFlags {
    pub fn new(config: StructuredQueryConfig) -> Self {
        Self { config }
    }

    /// Every tenant on the structured-query engine
    pub fn all_structured() -> Self {
        Self::new(StructuredQueryConfig {
            default_enabled: true,
            ..StructuredQueryConfig::default()
        })
    }

    pub fn is_enabled(&self, tenant_id: &str) -> bool {
        if self.config.disabled_tenants.contains(tenant_id) {
            false
        } else if self.config.tenants.contains(tenant_id) {
            true
        } else {
            self.config.default_enabled
        }
    }
}

impl FeatureFlags for StaticFeatureFlags {
    fn structured_query_enabled<'a>(
        &'a self,
        tenant_id: &'a str,
    ) -> BoxFuture<'a, SearchResult<bool>> {
        let enabled = self.is_enabled(tenant_id);
        Box::pin(async move { Ok(enabled) })
    }
}
