//! Gateway error types for `stratus-kernel`.
//!
//! [`GatewayError`] covers every failure mode that can be detected at
//! *definition time*: empty ids, duplicate registrations, dangling cluster
//! references, malformed path templates, transform directives the engine
//! cannot express.  Runtime failures (connection refused, upstream timeout,
//! ambiguous upstream documents) belong in `stratus-gateway`.

use thiserror::Error;

/// Configuration error type for the gateway kernel contract.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum GatewayError {
    // ── Routes ───────────────────────────────────────────────────────────────
    /// A route `route_id` field is empty or whitespace-only.
    #[error("route id cannot be empty")]
    EmptyRouteId,

    /// A route with this id has already been registered.
    #[error("route '{0}' is already registered")]
    DuplicateRoute(String),

    /// A route references a cluster id that is not present in the cluster list.
    #[error("route '{0}' references unknown cluster '{1}'")]
    UnknownCluster(String, String),

    /// A route match path is syntactically invalid.
    #[error("route '{0}' has an invalid path pattern: {1}")]
    InvalidPathPattern(String, String),

    /// A route declares more than one `PathPattern` directive.
    #[error("route '{0}' declares more than one PathPattern transform")]
    MultiplePathPatterns(String),

    // ── Clusters ─────────────────────────────────────────────────────────────
    /// A cluster `cluster_id` field is empty or whitespace-only.
    #[error("cluster id cannot be empty")]
    EmptyClusterId,

    /// A cluster with this id has already been registered.
    #[error("cluster '{0}' is already registered")]
    DuplicateCluster(String),

    /// A cluster destination address is empty.
    #[error("cluster '{0}' has an invalid destination: {1}")]
    InvalidDestination(String, String),

    // ── Transforms / methods ─────────────────────────────────────────────────
    /// A method name in `match.methods` is not a known HTTP method.
    #[error("unknown HTTP method '{0}'")]
    UnknownMethod(String),

    /// A transform entry does not name any supported directive.
    #[error("unsupported transform directive with keys [{0}]")]
    UnsupportedTransform(String),

    /// A transform entry names a directive but lacks a required key.
    #[error("transform directive '{0}' is missing required key '{1}'")]
    IncompleteTransform(String, String),

    // ── Auth ─────────────────────────────────────────────────────────────────
    /// An authentication or key-gate configuration block is missing a field.
    #[error("authentication config is missing required field: {0}")]
    InvalidAuthConfig(String),
}
