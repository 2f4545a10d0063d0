//! Route configuration.
//!
//! A [`RouteConfig`] maps an inbound path template + method set to a cluster,
//! an optional authorization policy and an ordered list of
//! [`TransformDirective`]s.  Routes are created by configuration load and are
//! immutable for the lifetime of a snapshot.
//!
//! Path templates use `{name}` placeholders, one per segment:
//! ```text
//! /users/{id}/orders      captures `id`
//! /me/profile             exact path
//! ```

use super::error::GatewayError;
use super::transform::TransformDirective;
use super::types::HttpMethod;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata key carrying the documentation group of a route.
pub const SECTION_METADATA_KEY: &str = "Section";

/// Inbound match criteria of a route.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteMatchSpec {
    /// URL path template.  Must begin with `/`.
    pub path: String,
    /// Accepted HTTP methods.  An empty vec means *all* methods are accepted.
    #[serde(default)]
    pub methods: Vec<HttpMethod>,
}

/// A single routing rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteConfig {
    /// Unique stable identifier for this route.
    pub route_id: String,
    /// Cluster the route forwards to.
    #[serde(default)]
    pub cluster_id: Option<String>,
    /// Non-empty value marks the route as requiring an authenticated caller.
    #[serde(default)]
    pub authorization_policy: Option<String>,
    #[serde(rename = "match")]
    pub match_spec: RouteMatchSpec,
    /// Routing priority: higher values are evaluated first when multiple
    /// templates match the same path.
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Rewrite rules, applied in declared order.
    #[serde(default)]
    pub transforms: Vec<TransformDirective>,
}

impl RouteConfig {
    /// Create a minimal route with just an id and a match path.
    pub fn new(route_id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            route_id: route_id.into(),
            cluster_id: None,
            authorization_policy: None,
            match_spec: RouteMatchSpec {
                path: path.into(),
                methods: Vec::new(),
            },
            priority: 0,
            metadata: BTreeMap::new(),
            transforms: Vec::new(),
        }
    }

    /// Builder: forward to `cluster_id`.
    pub fn with_cluster(mut self, cluster_id: impl Into<String>) -> Self {
        self.cluster_id = Some(cluster_id.into());
        self
    }

    /// Builder: restrict to specific HTTP methods.
    pub fn with_methods(mut self, methods: Vec<HttpMethod>) -> Self {
        self.match_spec.methods = methods;
        self
    }

    /// Builder: require an authenticated caller under `policy`.
    pub fn with_authorization_policy(mut self, policy: impl Into<String>) -> Self {
        self.authorization_policy = Some(policy.into());
        self
    }

    /// Builder: attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Builder: append a transform directive.
    pub fn with_transform(mut self, directive: TransformDirective) -> Self {
        self.transforms.push(directive);
        self
    }

    /// Builder: set routing priority (higher = evaluated first).
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// The inbound path template.
    pub fn match_path(&self) -> &str {
        &self.match_spec.path
    }

    /// Declared methods; empty means all.
    pub fn methods(&self) -> &[HttpMethod] {
        &self.match_spec.methods
    }

    /// Whether `method` is accepted by this route.
    pub fn accepts(&self, method: HttpMethod) -> bool {
        self.match_spec.methods.is_empty() || self.match_spec.methods.contains(&method)
    }

    /// `true` when the route carries a non-empty authorization policy.
    /// Any non-empty value counts, whitespace included.
    pub fn requires_authorization(&self) -> bool {
        self.authorization_policy
            .as_deref()
            .is_some_and(|p| !p.is_empty())
    }

    /// The configured `PathPattern` target template, if any.
    pub fn path_pattern(&self) -> Option<&str> {
        self.transforms.iter().find_map(|t| match t {
            TransformDirective::PathPattern(pattern) => Some(pattern.as_str()),
            _ => None,
        })
    }

    /// Case-insensitive metadata lookup.
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        metadata_lookup(&self.metadata, key)
    }

    /// Documentation section tag, from the `Section` metadata entry.
    pub fn section(&self) -> Option<&str> {
        self.metadata_value(SECTION_METADATA_KEY)
            .filter(|s| !s.trim().is_empty())
    }

    /// Sanity checks run during [`ProxyConfig::validate()`](super::validation::ProxyConfig::validate).
    pub(crate) fn validate(&self) -> Result<(), GatewayError> {
        if self.route_id.trim().is_empty() {
            return Err(GatewayError::EmptyRouteId);
        }
        let path = self.match_path();
        if path.trim().is_empty() {
            return Err(GatewayError::InvalidPathPattern(
                self.route_id.clone(),
                "path pattern cannot be empty".to_string(),
            ));
        }
        if !path.starts_with('/') {
            return Err(GatewayError::InvalidPathPattern(
                self.route_id.clone(),
                "path pattern must start with '/'".to_string(),
            ));
        }
        if !braces_balanced(path) {
            return Err(GatewayError::InvalidPathPattern(
                self.route_id.clone(),
                "unbalanced '{' / '}' in path pattern".to_string(),
            ));
        }
        let path_patterns = self
            .transforms
            .iter()
            .filter(|t| matches!(t, TransformDirective::PathPattern(_)))
            .count();
        if path_patterns > 1 {
            return Err(GatewayError::MultiplePathPatterns(self.route_id.clone()));
        }
        Ok(())
    }
}

/// Case-insensitive lookup into a metadata map.
pub fn metadata_lookup<'a>(metadata: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
    metadata
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.as_str())
}

fn braces_balanced(path: &str) -> bool {
    let mut open = false;
    for c in path.chars() {
        match c {
            '{' if open => return false,
            '{' => open = true,
            '}' if !open => return false,
            '}' => open = false,
            _ => {}
        }
    }
    !open
}
