//! `stratus-kernel`: contracts and configuration model for the Stratus gateway.
//!
//! This crate holds *data and traits only*: the declarative route/cluster
//! model consumed by both the claims transform engine and the schema
//! aggregation engine, the request/identity types that flow through the
//! filter chain, and the multi-format configuration loader.  Concrete
//! implementations live in `stratus-gateway`.

#[cfg(feature = "config")]
pub mod config;

pub mod gateway;
