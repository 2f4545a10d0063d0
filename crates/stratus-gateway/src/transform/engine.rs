//! Claims-driven request transform.
//!
//! Applies a route's [`TransformDirective`]s to an in-flight request, in
//! declared order, using the caller's [`ClaimSet`] and the positional
//! parameters of the route's match path.  The engine is synchronous, does
//! no I/O and never fails: placeholders it cannot resolve degrade to the
//! literal placeholder (claims) or [`UNRESOLVED_SEGMENT`] (positions).

use super::template::{UNRESOLVED_SEGMENT, render, segment_at, segment_index};
use crate::claims::ClaimSet;
use stratus_kernel::gateway::{GatewayRequest, RouteConfig, TransformDirective};
use tracing::{debug, warn};

/// One transform run for one request.
pub struct ClaimsTransform<'a> {
    route: &'a RouteConfig,
    claims: &'a ClaimSet,
}

impl<'a> ClaimsTransform<'a> {
    pub fn new(route: &'a RouteConfig, claims: &'a ClaimSet) -> Self {
        Self { route, claims }
    }

    /// Rewrite `request` in place.
    ///
    /// `inbound_path` is the path the caller actually requested; positional
    /// placeholders are read from it even after an earlier `PathPattern`
    /// changed `request.path`.
    pub fn apply(&self, inbound_path: &str, request: &mut GatewayRequest) {
        for directive in &self.route.transforms {
            match directive {
                TransformDirective::PathPattern(pattern) => {
                    request.path = self.rewrite_path(pattern, inbound_path, &request.id);
                }
                TransformDirective::QueryValueParameter { set, .. } => {
                    self.rewrite_query(set, request);
                }
                TransformDirective::RequestHeader { name, set } => {
                    let value = self.render_claims(set);
                    request.set_header(name, value);
                }
            }
        }
        debug!(
            request_id = %request.id,
            route_id = %self.route.route_id,
            path = %request.path,
            "claims transform applied"
        );
    }

    /// Substitute claims first; every remaining placeholder is looked up by
    /// position in the route's match path and read from the inbound path.
    fn rewrite_path(&self, pattern: &str, inbound_path: &str, request_id: &str) -> String {
        let match_path = self.route.match_path();
        render(pattern, |name| {
            if let Some(value) = self.claims.get(name) {
                return Some(value.to_string());
            }
            let segment = segment_index(match_path, name)
                .and_then(|index| segment_at(inbound_path, index));
            match segment {
                Some(segment) => Some(segment.to_string()),
                None => {
                    warn!(
                        request_id = %request_id,
                        route_id = %self.route.route_id,
                        placeholder = %name,
                        "path placeholder resolves to no claim and no match-path segment"
                    );
                    Some(UNRESOLVED_SEGMENT.to_string())
                }
            }
        })
    }

    /// Only the first query parameter is rewritten, at every position its
    /// key occurs.
    fn rewrite_query(&self, pattern: &str, request: &mut GatewayRequest) {
        let Some((key, _)) = request.query.first() else {
            return;
        };
        let key = key.clone();
        let value = self.render_claims(pattern);
        for (k, v) in request.query.iter_mut() {
            if *k == key {
                v.clone_from(&value);
            }
        }
    }

    fn render_claims(&self, pattern: &str) -> String {
        render(pattern, |name| self.claims.get(name).map(str::to_string))
    }
}
