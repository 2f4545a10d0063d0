//! Upstream forwarder.
//!
//! [`UpstreamForwarder`] sends the (already transformed) request to the
//! primary destination of the route's cluster and relays the response
//! verbatim.  4xx answers are passed through; 5xx answers and transport
//! failures become errors so the server can answer `502`.

use crate::error::{GatewayImplError, GatewayResult};
use reqwest::{Client, Method};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use stratus_kernel::gateway::{ClusterConfig, GatewayRequest, GatewayResponse};
use tracing::{debug, instrument};

/// Hop-by-hop and length headers that must not be copied onto the upstream
/// request.
const SKIPPED_HEADERS: &[&str] = &["host", "content-length", "connection", "transfer-encoding"];

pub struct UpstreamForwarder {
    client: Client,
    timeout: Duration,
}

impl UpstreamForwarder {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            timeout,
        }
    }

    /// Forward `req` to `{destination}{req.path}?{req.query}`.
    #[instrument(skip(self, cluster, req), fields(cluster = %cluster.cluster_id, path = %req.path))]
    pub async fn forward(
        &self,
        cluster: &ClusterConfig,
        req: &GatewayRequest,
    ) -> GatewayResult<GatewayResponse> {
        let destination = cluster
            .primary_destination()
            .ok_or_else(|| GatewayImplError::NoDestination(cluster.cluster_id.clone()))?;
        let url = format!("{}{}", destination.address.trim_end_matches('/'), req.path);
        debug!(url = %url, "forwarding to upstream");

        let start = Instant::now();

        let method = Method::from_bytes(req.method.as_str().as_bytes())
            .map_err(|e| GatewayImplError::Internal(e.to_string()))?;
        let mut builder = self.client.request(method, &url).timeout(self.timeout);
        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }

        for (key, value) in &req.headers {
            if SKIPPED_HEADERS.contains(&key.as_str()) {
                continue;
            }
            builder = builder.header(key, value);
        }

        if !req.body.is_empty() {
            builder = builder.body(req.body.clone());
        }

        let network_error = |e: reqwest::Error| GatewayImplError::NetworkError {
            cluster_id: cluster.cluster_id.clone(),
            source: e,
        };

        let upstream_resp = builder.send().await.map_err(network_error)?;

        let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        let status = upstream_resp.status().as_u16();

        let mut headers = HashMap::new();
        for (name, value) in upstream_resp.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(name.to_string(), v.to_string());
            }
        }

        let body = upstream_resp.bytes().await.map_err(network_error)?;

        if status >= 500 {
            return Err(GatewayImplError::UpstreamError {
                cluster_id: cluster.cluster_id.clone(),
                status,
                message: String::from_utf8_lossy(&body).to_string(),
            });
        }

        let mut resp = GatewayResponse::new(status, &cluster.cluster_id);
        resp.headers = headers;
        resp.body = body.to_vec();
        resp.latency_ms = latency_ms;
        Ok(resp)
    }
}
