//! Filter module.

mod api_key;
mod jwt;
mod logger;
mod transform;

pub use api_key::ApiKeyFilter;
pub use jwt::JwtAuthFilter;
pub use logger::LoggingFilter;
pub use transform::ClaimsTransformFilter;

use std::sync::Arc;
use stratus_kernel::gateway::{
    FilterAction, GatewayContext, GatewayError, GatewayFilter, GatewayResponse,
};

/// Ordered list of boxed filters executed as a pipeline.
///
/// Filters are sorted by [`FilterOrder`](stratus_kernel::gateway::FilterOrder)
/// in ascending order (lowest value runs first on the request path).
pub struct FilterPipeline {
    filters: Vec<Arc<dyn GatewayFilter>>,
}

impl FilterPipeline {
    /// Build a pipeline from a list of filters, sorted by their declared order.
    pub fn new(mut filters: Vec<Arc<dyn GatewayFilter>>) -> Self {
        filters.sort_by_key(|f| f.order());
        Self { filters }
    }

    /// Filter names in execution order.
    pub fn names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Run all filters' `on_request` hooks in ascending order.
    ///
    /// Short-circuits on the first non-`Continue` action.
    pub async fn run_request(
        &self,
        ctx: &mut GatewayContext,
    ) -> Result<FilterAction, GatewayError> {
        for filter in &self.filters {
            match filter.on_request(ctx).await? {
                FilterAction::Continue => {}
                other => return Ok(other),
            }
        }
        Ok(FilterAction::Continue)
    }

    /// Run all filters' `on_response` hooks in descending order
    /// (outermost filter last, so it can finalize latency, etc.).
    pub async fn run_response(
        &self,
        ctx: &GatewayContext,
        resp: &mut GatewayResponse,
    ) -> Result<(), GatewayError> {
        for filter in self.filters.iter().rev() {
            filter.on_response(ctx, resp).await?;
        }
        Ok(())
    }
}
