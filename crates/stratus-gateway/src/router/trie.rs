//! Path-template router.
//!
//! Routes are stored in sorted-by-priority order.  Resolution performs a
//! linear scan with a simple path-template matcher that supports `{param}`
//! capture segments.  Route tables are small, so O(R × D) is fine.

use std::sync::Arc;
use stratus_kernel::gateway::{GatewayError, HttpMethod, RouteConfig, RouteMatch};

/// Priority-sorted route table with `{param}` template matching.
#[derive(Debug, Default, Clone)]
pub struct TrieRouter {
    /// Routes sorted by descending priority (highest first).
    routes: Vec<Arc<RouteConfig>>,
}

impl TrieRouter {
    /// Create an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a router from a route list, rejecting duplicate ids.
    pub fn from_routes<I>(routes: I) -> Result<Self, GatewayError>
    where
        I: IntoIterator<Item = RouteConfig>,
    {
        let mut router = Self::new();
        for route in routes {
            router.register(route)?;
        }
        Ok(router)
    }

    /// Register a route.  Equal priorities keep registration order.
    pub fn register(&mut self, route: RouteConfig) -> Result<(), GatewayError> {
        if self.routes.iter().any(|r| r.route_id == route.route_id) {
            return Err(GatewayError::DuplicateRoute(route.route_id));
        }
        let pos = self
            .routes
            .partition_point(|r| r.priority >= route.priority);
        self.routes.insert(pos, Arc::new(route));
        Ok(())
    }

    /// Resolve `(path, method)` to the best matching route.
    pub fn resolve(&self, path: &str, method: HttpMethod) -> Option<RouteMatch> {
        self.routes.iter().find_map(|route| {
            if !route.accepts(method) {
                return None;
            }
            Self::matches(route.match_path(), path).then(|| RouteMatch {
                route: Arc::clone(route),
            })
        })
    }

    /// Match a concrete path against a template such as `/users/{id}`.
    fn matches(template: &str, path: &str) -> bool {
        let t_parts: Vec<&str> = template.trim_matches('/').split('/').collect();
        let p_parts: Vec<&str> = path.trim_matches('/').split('/').collect();

        t_parts.len() == p_parts.len()
            && t_parts.iter().zip(p_parts.iter()).all(|(t, p)| {
                (t.starts_with('{') && t.ends_with('}')) || t.eq_ignore_ascii_case(p)
            })
    }
}
