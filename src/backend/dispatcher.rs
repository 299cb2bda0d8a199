//! Backend Dispatcher
//!
//! Owns one executor per strategy and picks one per request. There is no
//! fallback: whatever the chosen executor returns is the answer.

use std::sync::Arc;

use crate::core::{RequestContext, SearchResult};
use crate::schema::{Locality, Table};

use super::executor::RowExecutor;
use super::flags::FeatureFlags;
use super::strategy::{select_strategy, Strategy};

/// Strategy-to-executor routing
#[derive(Clone)]
pub struct Dispatcher {
    external: Arc<dyn RowExecutor>,
    structured: Arc<dyn RowExecutor>,
    legacy: Arc<dyn RowExecutor>,
    flags: Arc<dyn FeatureFlags>,
}

impl Dispatcher {
    pub fn new(
        external: Arc<dyn RowExecutor>,
        structured: Arc<dyn RowExecutor>,
        legacy: Arc<dyn RowExecutor>,
        flags: Arc<dyn FeatureFlags>,
    ) -> Self {
        Self {
            external,
            structured,
            legacy,
            flags,
        }
    }

    pub fn executor(&self, strategy: Strategy) -> &dyn RowExecutor {
        match strategy {
            Strategy::External => self.external.as_ref(),
            Strategy::StructuredInternal => self.structured.as_ref(),
            Strategy::LegacyInternal => self.legacy.as_ref(),
        }
    }

    /// Strategy for `table` on behalf of the context's tenant.
    ///
    /// Feature flags are only consulted for internal tables.
    pub async fn strategy_for(
        &self,
        ctx: &RequestContext,
        table: &Table,
    ) -> SearchResult<Strategy> {
        let locality = table.locality();
        let structured = match locality {
            Locality::External => false,
            Locality::Internal => {
                self.flags
                    .structured_query_enabled(&ctx.tenant_id)
                    .await?
            }
        };

        let strategy = select_strategy(locality, structured);
        tracing::debug!(
            request_id = %ctx.request_id,
            tenant_id = %ctx.tenant_id,
            table_id = %table.id,
            strategy = %strategy,
            "Selected backend strategy."
        );
        Ok(strategy)
    }

    /// Strategy and executor for `table`
    pub async fn route(
        &self,
        ctx: &RequestContext,
        table: &Table,
    ) -> SearchResult<(Strategy, &dyn RowExecutor)> {
        let strategy = self.strategy_for(ctx, table).await?;
        Ok((strategy, self.executor(strategy)))
    }
}
