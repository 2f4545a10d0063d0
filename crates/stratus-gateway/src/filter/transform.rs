//! Claims transform hook.
//!
//! Runs the route's transform directives for authenticated callers on routes
//! that carry an authorization policy.  Every other request is forwarded
//! exactly as it arrived.

use crate::claims::ClaimSet;
use crate::transform::ClaimsTransform;
use async_trait::async_trait;
use std::sync::Arc;
use stratus_kernel::gateway::{
    FilterAction, FilterOrder, GatewayContext, GatewayError, GatewayFilter,
};

#[derive(Default)]
pub struct ClaimsTransformFilter;

impl ClaimsTransformFilter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl GatewayFilter for ClaimsTransformFilter {
    fn name(&self) -> &str {
        "claims-transform"
    }

    fn order(&self) -> FilterOrder {
        FilterOrder::TRANSFORM
    }

    async fn on_request(&self, ctx: &mut GatewayContext) -> Result<FilterAction, GatewayError> {
        let Some(route) = ctx.route_match.as_ref().map(|m| Arc::clone(&m.route)) else {
            return Ok(FilterAction::Continue);
        };
        if !route.requires_authorization() || route.transforms.is_empty() {
            return Ok(FilterAction::Continue);
        }
        let Some(identity) = ctx.identity.as_ref().filter(|i| i.is_authenticated()) else {
            return Ok(FilterAction::Continue);
        };

        let claims = ClaimSet::from_claims(identity.claims()).with_authorization_from(&ctx.request);
        ClaimsTransform::new(&route, &claims).apply(&ctx.inbound_path, &mut ctx.request);
        Ok(FilterAction::Continue)
    }
}
