//! Core data types for the gateway kernel contract.
//!
//! These types are shared by the filter chain, the claims transform engine
//! and the router, and carry no runtime dependencies beyond `serde` and
//! `std`.

use super::error::GatewayError;
use super::route::RouteConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

// ─────────────────────────────────────────────────────────────────────────────
// HTTP primitives
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP method, covering every verb an API-description path-item can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
    Connect,
}

impl HttpMethod {
    /// Every method, in the order operations are conventionally listed.
    pub const ALL: [HttpMethod; 9] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Connect,
        HttpMethod::Trace,
    ];

    /// Case-insensitive parse from a string slice.
    pub fn from_str_ci(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "PATCH" => Some(HttpMethod::Patch),
            "DELETE" => Some(HttpMethod::Delete),
            "HEAD" => Some(HttpMethod::Head),
            "OPTIONS" => Some(HttpMethod::Options),
            "TRACE" => Some(HttpMethod::Trace),
            "CONNECT" => Some(HttpMethod::Connect),
            _ => None,
        }
    }

    /// Return the standard uppercase string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
            HttpMethod::Connect => "CONNECT",
        }
    }

    /// Lowercase key used for this method inside an API-description path-item.
    pub fn operation_key(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
            HttpMethod::Head => "head",
            HttpMethod::Options => "options",
            HttpMethod::Trace => "trace",
            HttpMethod::Connect => "connect",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for HttpMethod {
    type Error = GatewayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        HttpMethod::from_str_ci(&value).ok_or(GatewayError::UnknownMethod(value))
    }
}

impl From<HttpMethod> for String {
    fn from(method: HttpMethod) -> Self {
        method.as_str().to_string()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Identity
// ─────────────────────────────────────────────────────────────────────────────

/// Claim type the subject shortcut is stored under.
pub const SUBJECT_CLAIM: &str = "sub";

/// Canonical subject-identifier claim type some identity providers emit
/// instead of `sub`.
pub const NAME_IDENTIFIER_CLAIM: &str =
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier";

/// Claim type under which the inbound `Authorization` header is exposed.
pub const AUTHORIZATION_CLAIM: &str = "Authorization";

/// A single named attribute asserted about a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub claim_type: String,
    pub value: String,
}

impl Claim {
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }
}

/// The caller as seen by the authentication filter.
///
/// Claims keep the order the identity provider produced them in; duplicates
/// are allowed here and resolved later by the claim set builder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    authenticated: bool,
    claims: Vec<Claim>,
}

impl Identity {
    /// An authenticated identity carrying `claims`.
    pub fn authenticated(claims: Vec<Claim>) -> Self {
        Self {
            authenticated: true,
            claims,
        }
    }

    /// An identity that has not been authenticated.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request / Response
// ─────────────────────────────────────────────────────────────────────────────

/// An in-flight request flowing through the gateway towards an upstream.
///
/// All fields use owned types so the struct can be sent across async task
/// boundaries.  Header names are lowercased; the query keeps the order and
/// repetitions of the inbound query string.
#[derive(Debug, Clone)]
pub struct GatewayRequest {
    /// Unique identifier for correlating this request across logs.
    pub id: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Request path without the query string, e.g. `/users/42/orders`.
    pub path: String,
    /// Query parameters in inbound order.
    pub query: Vec<(String, String)>,
    /// HTTP headers (names lowercased).
    pub headers: HashMap<String, String>,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl GatewayRequest {
    /// Construct a minimal request with the given id, method and path.
    pub fn new(id: impl Into<String>, method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Builder helper: attach a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into().to_lowercase(), value.into());
        self
    }

    /// Builder helper: append a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Builder helper: set the body.
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Replace every value of header `name` with `value`.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_lowercase(), value.into());
    }

    /// First value of query parameter `name`, if present.
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A response produced by an upstream and returned through the gateway.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    /// HTTP status code (100–599).
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Raw body bytes.
    pub body: Vec<u8>,
    /// Id of the cluster that generated this response.
    pub cluster_id: String,
    /// Round-trip latency in milliseconds (gateway → upstream → gateway).
    pub latency_ms: u64,
}

impl GatewayResponse {
    /// Construct a minimal response.
    pub fn new(status: u16, cluster_id: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
            cluster_id: cluster_id.into(),
            latency_ms: 0,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Route match
// ─────────────────────────────────────────────────────────────────────────────

/// The result of a successful route lookup.
///
/// Positional parameters are not captured here; the transform engine reads
/// them from the inbound path by their position in the match path.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<RouteConfig>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Request context
// ─────────────────────────────────────────────────────────────────────────────

/// Mutable context that flows through the filter chain for a single request.
///
/// The authentication filter writes `identity`; the transform filter reads it
/// together with `route_match` and rewrites `request` in place.
#[derive(Debug, Clone)]
pub struct GatewayContext {
    /// The request as it will be forwarded.
    pub request: GatewayRequest,
    /// Path of the request as it arrived, before any transform ran.
    pub inbound_path: String,
    /// Populated after routing; `None` if routing has not yet occurred.
    pub route_match: Option<RouteMatch>,
    /// Caller identity; `None` until an authentication filter ran.
    pub identity: Option<Identity>,
    /// Free-form attributes written and read by filters.
    pub attributes: HashMap<String, serde_json::Value>,
}

impl GatewayContext {
    /// Create a fresh context from an inbound request.
    pub fn new(request: GatewayRequest) -> Self {
        Self {
            inbound_path: request.path.clone(),
            request,
            route_match: None,
            identity: None,
            attributes: HashMap::new(),
        }
    }

    /// Builder: attach the routing result.
    pub fn with_route_match(mut self, route_match: RouteMatch) -> Self {
        self.route_match = Some(route_match);
        self
    }

    /// The matched route, if routing already happened.
    pub fn route(&self) -> Option<&RouteConfig> {
        self.route_match.as_ref().map(|m| m.route.as_ref())
    }

    /// `true` when an authentication filter resolved an authenticated caller.
    pub fn is_authenticated(&self) -> bool {
        self.identity
            .as_ref()
            .is_some_and(Identity::is_authenticated)
    }

    /// Read a typed attribute, returning `None` if absent or if
    /// deserialization fails.
    pub fn get_attr<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Write a serializable attribute.
    pub fn set_attr<T: serde::Serialize>(&mut self, key: impl Into<String>, val: &T) {
        if let Ok(v) = serde_json::to_value(val) {
            self.attributes.insert(key.into(), v);
        }
    }
}
