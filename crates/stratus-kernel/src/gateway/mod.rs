//! Gateway kernel contract.
//!
//! This module defines the *configuration model, request types and trait
//! interfaces* of the Stratus gateway.  No concrete implementations live
//! here; those belong in `stratus-gateway`.
//!
//! # Architecture mapping
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              stratus-kernel  (this module)                  │
//! │  ProxyConfig + validate()   RouteConfig  ClusterConfig      │
//! │  TransformDirective         GatewayFilter trait             │
//! │  GatewayRequest/Response/Context  Identity  GatewayError    │
//! └──────────────────────────┬──────────────────────────────────┘
//!                            │  depends on
//! ┌──────────────────────────▼──────────────────────────────────┐
//! │              stratus-gateway  (runtime crate)               │
//! │  ClaimSet / ClaimsTransform     ConfigStore (snapshots)     │
//! │  OpenApiBuilder / OpenApiCache  HttpDocumentFetcher         │
//! │  ApiKeyFilter / JwtAuthFilter / ClaimsTransformFilter       │
//! │  GatewayServer  (axum HTTP server)                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust
//! use stratus_kernel::gateway::{
//!     ClusterConfig, HttpMethod, ProxyConfig, RouteConfig, TransformDirective,
//! };
//!
//! let config = ProxyConfig::new()
//!     .with_cluster(
//!         ClusterConfig::new("orders")
//!             .with_destination("primary", "http://orders.internal")
//!             .with_metadata("OpenApiAddress", "http://orders.internal/openapi.json"),
//!     )
//!     .with_route(
//!         RouteConfig::new("my-orders", "/users/{id}/orders")
//!             .with_cluster("orders")
//!             .with_methods(vec![HttpMethod::Get])
//!             .with_authorization_policy("jwt")
//!             .with_transform(TransformDirective::PathPattern(
//!                 "/internal/{sub}/orders/{id}".into(),
//!             )),
//!     );
//!
//! config.validate().expect("proxy config is valid");
//! ```

pub mod cluster;
pub mod error;
pub mod filter;
pub mod route;
pub mod transform;
pub mod validation;

// ── Flat re-exports ────────────────────────────────────────────────────────

pub use cluster::{ClusterConfig, DestinationConfig, OPENAPI_ADDRESS_METADATA_KEY};
pub use error::GatewayError;
pub use filter::{FilterAction, FilterOrder, GatewayFilter};
pub use route::{RouteConfig, RouteMatchSpec, SECTION_METADATA_KEY};
pub use transform::TransformDirective;
pub use validation::ProxyConfig;

pub mod types;
pub use types::{
    AUTHORIZATION_CLAIM, Claim, GatewayContext, GatewayRequest, GatewayResponse, HttpMethod,
    Identity, NAME_IDENTIFIER_CLAIM, RouteMatch, SUBJECT_CLAIM,
};
