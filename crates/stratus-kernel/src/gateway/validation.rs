//! Proxy configuration container and definition-time validation.
//!
//! [`ProxyConfig`] aggregates the routes and clusters supplied by the host
//! and exposes a single [`validate()`](ProxyConfig::validate) method that
//! checks all structural invariants *before* a snapshot is published.

use super::cluster::ClusterConfig;
use super::error::GatewayError;
use super::route::RouteConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The declarative route/cluster configuration of the gateway.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProxyConfig {
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
    #[serde(default)]
    pub clusters: Vec<ClusterConfig>,
}

impl ProxyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a route.
    pub fn with_route(mut self, route: RouteConfig) -> Self {
        self.routes.push(route);
        self
    }

    /// Builder: add a cluster.
    pub fn with_cluster(mut self, cluster: ClusterConfig) -> Self {
        self.clusters.push(cluster);
        self
    }

    /// Look up a cluster by id.
    pub fn cluster(&self, cluster_id: &str) -> Option<&ClusterConfig> {
        self.clusters.iter().find(|c| c.cluster_id == cluster_id)
    }

    /// Validate all structural invariants of this configuration.
    ///
    /// Returns the *first* detected [`GatewayError`].  Checks performed:
    /// 1. Each cluster passes [`ClusterConfig`] validation.
    /// 2. No two clusters share the same id.
    /// 3. Each route passes [`RouteConfig`] validation.
    /// 4. No two routes share the same id.
    /// 5. Every route's `cluster_id` refers to a declared cluster.
    pub fn validate(&self) -> Result<(), GatewayError> {
        let mut cluster_ids = HashSet::new();
        for cluster in &self.clusters {
            cluster.validate()?;
            if !cluster_ids.insert(cluster.cluster_id.as_str()) {
                return Err(GatewayError::DuplicateCluster(cluster.cluster_id.clone()));
            }
        }

        let mut route_ids = HashSet::new();
        for route in &self.routes {
            route.validate()?;
            if !route_ids.insert(route.route_id.as_str()) {
                return Err(GatewayError::DuplicateRoute(route.route_id.clone()));
            }
            if let Some(cluster_id) = &route.cluster_id {
                if !cluster_ids.contains(cluster_id.as_str()) {
                    return Err(GatewayError::UnknownCluster(
                        route.route_id.clone(),
                        cluster_id.clone(),
                    ));
                }
            }
        }
        Ok(())
    }
}
