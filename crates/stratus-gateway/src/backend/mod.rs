//! Upstream backend module.

mod forwarder;

pub use forwarder::UpstreamForwarder;
