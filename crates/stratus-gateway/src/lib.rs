//! `stratus-gateway`: Stratus gateway runtime.
//!
//! This crate provides the concrete implementations of the gateway kernel
//! contracts defined in `stratus-kernel::gateway`:
//!
//! | Concern | Implementation |
//! |---------|----------------|
//! | Claims-driven request rewriting | [`claims::ClaimSet`], [`transform::ClaimsTransform`] |
//! | Unified API-description document | [`openapi::OpenApiBuilder`], [`openapi::OpenApiCache`] |
//! | Configuration snapshots | [`snapshot::ConfigStore`], [`router::TrieRouter`] |
//! | [`GatewayFilter`](stratus_kernel::gateway::GatewayFilter) | [`filter::ApiKeyFilter`], [`filter::JwtAuthFilter`], [`filter::ClaimsTransformFilter`], [`filter::LoggingFilter`] |
//!
//! The [`server::GatewayServer`] wires everything together into an axum HTTP
//! service.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use stratus_gateway::server::GatewayServer;
//! use stratus_gateway::settings::GatewaySettings;
//!
//! #[tokio::main]
//! async fn main() {
//!     let settings = GatewaySettings::load("stratus.yaml").expect("readable settings");
//!     GatewayServer::new(settings).start().await.unwrap();
//! }
//! ```

pub mod backend;
pub mod claims;
pub mod error;
pub mod filter;
pub mod openapi;
pub mod router;
pub mod server;
pub mod settings;
pub mod snapshot;
pub mod transform;

// Re-export the kernel gateway types for convenience.
pub use stratus_kernel::gateway;
