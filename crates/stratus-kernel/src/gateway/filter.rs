//! Gateway filter trait and filter ordering.
//!
//! A filter chain is an ordered list of [`GatewayFilter`] instances applied
//! to every proxied request and response.  Filters are sorted by their
//! declared [`FilterOrder`] and executed in ascending order on the request
//! path and descending order on the response path.
//!
//! ```text
//! Request  ──► KeyGate ──► Auth ──► Transform ──► Logging
//!                  (upstream call happens here)
//! Response ◄── Logging ◄── Transform ◄── Auth ◄── KeyGate
//! ```

use super::error::GatewayError;
use super::types::{GatewayContext, GatewayResponse};
use async_trait::async_trait;

/// Numeric ordering slot for a filter in the chain.
///
/// Filters with equal order values are executed in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FilterOrder(pub u32);

impl FilterOrder {
    /// Executes before all authentication logic (static key gate).
    pub const PRE_AUTH: FilterOrder = FilterOrder(0);
    /// Authentication filter slot (bearer tokens).
    pub const AUTH: FilterOrder = FilterOrder(100);
    /// Request rewriting slot.
    pub const TRANSFORM: FilterOrder = FilterOrder(300);
    /// Access logging slot, after all transformations.
    pub const LOGGING: FilterOrder = FilterOrder(400);
}

/// Instruction returned by [`GatewayFilter::on_request`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FilterAction {
    /// Pass the (possibly modified) request to the next filter or upstream.
    Continue,
    /// Short-circuit the chain and answer with the given HTTP status and
    /// plain-text body.
    Reject(u16, String),
}

/// Kernel contract for a single filter in the gateway pipeline.
#[async_trait]
pub trait GatewayFilter: Send + Sync {
    /// Stable, human-readable identifier for this filter (used in logs).
    fn name(&self) -> &str;

    /// Position in the filter chain.
    fn order(&self) -> FilterOrder;

    /// Called with the in-flight request *before* it is forwarded upstream.
    async fn on_request(&self, ctx: &mut GatewayContext) -> Result<FilterAction, GatewayError>;

    /// Called with the upstream response *before* it is returned to the
    /// caller.  Most filters have nothing to do here.
    async fn on_response(
        &self,
        _ctx: &GatewayContext,
        _resp: &mut GatewayResponse,
    ) -> Result<(), GatewayError> {
        Ok(())
    }
}
