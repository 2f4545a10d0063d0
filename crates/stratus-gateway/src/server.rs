//! Axum-based HTTP gateway server.
//!
//! [`GatewayServer`] wires together the configuration store, filter
//! pipeline, upstream forwarder and document cache into a running axum
//! service.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Liveness check, always `200 OK`. |
//! | `GET`  | `server.metadata_path` | Unified API-description document. |
//! | `ANY`  | everything else | Routed, filtered and forwarded upstream. |

use crate::backend::UpstreamForwarder;
use crate::error::{GatewayImplError, GatewayResult};
use crate::filter::{
    ApiKeyFilter, ClaimsTransformFilter, FilterPipeline, JwtAuthFilter, LoggingFilter,
};
use crate::openapi::{HttpDocumentFetcher, OpenApiBuilder, OpenApiCache};
use crate::settings::GatewaySettings;
use crate::snapshot::ConfigStore;
use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{Query, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use stratus_kernel::gateway::{
    FilterAction, GatewayContext, GatewayFilter, GatewayRequest, GatewayResponse, HttpMethod,
};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

/// Response headers that describe the upstream connection rather than the
/// payload.
const HOP_BY_HOP: &[&str] = &["connection", "transfer-encoding", "content-length", "keep-alive"];

// ─────────────────────────────────────────────────────────────────────────────
// Shared application state
// ─────────────────────────────────────────────────────────────────────────────

/// Shared state injected into every axum handler via [`State`] extractor.
#[derive(Clone)]
pub struct AppState {
    store: Arc<ConfigStore>,
    pipeline: Arc<FilterPipeline>,
    forwarder: Arc<UpstreamForwarder>,
    documents: Arc<OpenApiCache>,
}

impl AppState {
    pub fn new(
        store: Arc<ConfigStore>,
        pipeline: FilterPipeline,
        forwarder: UpstreamForwarder,
        documents: OpenApiCache,
    ) -> Self {
        Self {
            store,
            pipeline: Arc::new(pipeline),
            forwarder: Arc::new(forwarder),
            documents: Arc::new(documents),
        }
    }

    /// The live configuration; call [`ConfigStore::replace`] to reload.
    pub fn config_store(&self) -> &Arc<ConfigStore> {
        &self.store
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// GatewayServer
// ─────────────────────────────────────────────────────────────────────────────

pub struct GatewayServer {
    settings: GatewaySettings,
}

impl GatewayServer {
    pub fn new(settings: GatewaySettings) -> Self {
        Self { settings }
    }

    /// Validate the proxy configuration and assemble handler state.
    pub fn build_state(&self) -> GatewayResult<AppState> {
        let store = Arc::new(ConfigStore::new(self.settings.proxy.clone())?);
        let pipeline = self.build_pipeline()?;
        let forwarder =
            UpstreamForwarder::new(Duration::from_millis(self.settings.server.forward_timeout_ms));

        let openapi = &self.settings.openapi;
        let fetcher = Arc::new(HttpDocumentFetcher::new(openapi.fetch_timeout()));
        let documents = OpenApiCache::new(
            OpenApiBuilder::new(fetcher, openapi.document_info()),
            openapi.cache_ttl(),
        );

        Ok(AppState::new(store, pipeline, forwarder, documents))
    }

    fn build_pipeline(&self) -> GatewayResult<FilterPipeline> {
        let mut filters: Vec<Arc<dyn GatewayFilter>> = vec![
            Arc::new(ClaimsTransformFilter::new()),
            Arc::new(LoggingFilter::new()),
        ];

        if let Some(gate) = &self.settings.api_key_gate {
            filters.push(Arc::new(ApiKeyFilter::new(
                &gate.header_name,
                &gate.parameter_name,
                gate.keys.iter().cloned(),
            )));
        }

        match &self.settings.auth.jwt {
            Some(jwt) => filters.push(Arc::new(JwtAuthFilter::new(jwt.key.as_bytes(), &jwt.issuer)?)),
            None => {
                warn!("no auth.jwt section: routes with an authorization policy will reject every caller");
                filters.push(Arc::new(JwtAuthFilter::disabled()));
            }
        }

        Ok(FilterPipeline::new(filters))
    }

    /// Build the axum [`Router`] for `state`.
    pub fn router(&self, state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route(&self.settings.server.metadata_path, get(metadata_handler))
            .fallback(proxy_handler)
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Validate configuration and build the complete application.
    pub fn build_app(&self) -> GatewayResult<Router> {
        let state = self.build_state()?;
        Ok(self.router(state))
    }

    /// Bind the server to `0.0.0.0:{port}` and serve until the process exits.
    pub async fn start(self) -> GatewayResult<()> {
        let app = self.build_app()?;
        let addr = format!("0.0.0.0:{}", self.settings.server.port);
        info!(
            addr = %addr,
            metadata_path = %self.settings.server.metadata_path,
            routes = self.settings.proxy.routes.len(),
            clusters = self.settings.proxy.clusters.len(),
            "Stratus gateway starting"
        );
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /health`: liveness probe.
async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "stratus-gateway" }))
}

/// `GET {metadata_path}`: the unified API-description document.
async fn metadata_handler(State(state): State<AppState>) -> Result<Response, GatewayImplError> {
    let snapshot = state.store.load();
    let built = state.documents.get(&snapshot).await?;
    Ok(Json(built.document.clone()).into_response())
}

/// Generic proxy handler: routes the request through the filter pipeline
/// then forwards it to the route's cluster.
async fn proxy_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    Query(query): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(http_method) = HttpMethod::from_str_ci(method.as_str()) else {
        return error_response(
            StatusCode::METHOD_NOT_ALLOWED,
            "METHOD_NOT_ALLOWED",
            format!("method '{method}' is not supported"),
        );
    };
    let request_id = Uuid::new_v4().to_string();
    let path = uri.path().to_string();

    let mut req = GatewayRequest::new(&request_id, http_method, &path).with_body(body.to_vec());
    req.query = query;
    for (name, value) in &headers {
        if let Ok(v) = value.to_str() {
            req = req.with_header(name.as_str(), v);
        }
    }

    let snapshot = state.store.load();
    let Some(route_match) = snapshot.router.resolve(&path, http_method) else {
        return error_response(
            StatusCode::NOT_FOUND,
            "ROUTE_NOT_FOUND",
            format!("no route matched '{path}'"),
        );
    };

    let mut ctx = GatewayContext::new(req).with_route_match(route_match);

    match state.pipeline.run_request(&mut ctx).await {
        Ok(FilterAction::Reject(status, msg)) => {
            let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return (code, msg).into_response();
        }
        Ok(_) => {}
        Err(e) => return GatewayImplError::from(e).into_response(),
    }

    let Some(route) = ctx.route() else {
        return GatewayImplError::Internal("route match lost in filter pipeline".into()).into_response();
    };
    let Some(cluster) = route
        .cluster_id
        .as_deref()
        .and_then(|id| snapshot.config.cluster(id))
    else {
        return GatewayImplError::NoDestination(route.route_id.clone()).into_response();
    };

    let mut gateway_resp = match state.forwarder.forward(cluster, &ctx.request).await {
        Ok(r) => r,
        Err(e) => {
            warn!(request_id = %request_id, cluster_id = %cluster.cluster_id, error = %e, "upstream call failed");
            return e.into_response();
        }
    };

    if let Err(err) = state.pipeline.run_response(&ctx, &mut gateway_resp).await {
        warn!(
            request_id = %request_id,
            error = %err,
            "response filter pipeline error (upstream response still returned)"
        );
    }

    build_axum_response(gateway_resp)
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn error_response(status: StatusCode, code: &str, message: String) -> Response {
    (
        status,
        Json(json!({ "error": { "code": code, "message": message } })),
    )
        .into_response()
}

fn build_axum_response(resp: GatewayResponse) -> Response {
    let status = StatusCode::from_u16(resp.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut builder = Response::builder().status(status);
    for (k, v) in &resp.headers {
        if HOP_BY_HOP.contains(&k.as_str()) {
            continue;
        }
        builder = builder.header(k, v);
    }
    builder
        .body(Body::from(resp.body))
        .unwrap_or_else(|e| GatewayImplError::Internal(e.to_string()).into_response())
}
