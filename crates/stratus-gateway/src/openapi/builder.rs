//! Unified API-description document builder.
//!
//! One build run:
//!
//! 1. fetches the document of every cluster that declares an
//!    `OpenApiAddress`, concurrently, each fetch failing on its own;
//! 2. for every route, looks up the upstream path-item whose path equals
//!    the route's target pattern (or uses the fallback stub);
//! 3. filters methods, stamps security and section tags, pulls in the
//!    transitive schema closure, and stores the result under the route's
//!    own match path.
//!
//! All per-run state lives in the run; upstream documents and the
//! configuration are only read.

use super::fallback::fallback_path_item;
use super::fetcher::{DocumentFetcher, UpstreamDocument};
use super::refs::schema_closure;
use crate::error::{GatewayImplError, GatewayResult};
use futures::future::join_all;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use stratus_kernel::gateway::{HttpMethod, ProxyConfig, RouteConfig};
use tracing::{debug, info, warn};

/// API-description version written into every unified document.
pub const OPENAPI_VERSION: &str = "3.0.0";

/// Name of the bearer security scheme.
pub const BEARER_SCHEME: &str = "bearerAuth";

/// Static `info` block of the unified document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
}

impl Default for DocumentInfo {
    fn default() -> Self {
        Self {
            title: "Unified API".to_string(),
            version: "1.0.0".to_string(),
            description: None,
        }
    }
}

/// What happened to one route during a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Stored under the route's pattern.  `cluster_id` names the cluster
    /// whose document supplied the path-item; `None` means the fallback
    /// stub was used.
    Documented { cluster_id: Option<String> },
    /// Left out of the document.
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteReport {
    pub route_id: String,
    pub pattern: String,
    pub outcome: RouteOutcome,
}

/// Result of one build run.
#[derive(Debug, Clone)]
pub struct UnifiedDocument {
    pub document: Value,
    pub routes: Vec<RouteReport>,
}

impl UnifiedDocument {
    pub fn skipped(&self) -> impl Iterator<Item = &RouteReport> {
        self.routes
            .iter()
            .filter(|r| matches!(r.outcome, RouteOutcome::Skipped(_)))
    }
}

/// Aggregates upstream documents into one.
pub struct OpenApiBuilder {
    fetcher: Arc<dyn DocumentFetcher>,
    info: DocumentInfo,
}

impl OpenApiBuilder {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>, info: DocumentInfo) -> Self {
        Self { fetcher, info }
    }

    /// Build the unified document for `config`.
    ///
    /// Fails only when a target pattern is declared by more than one
    /// upstream document; every other problem degrades to the fallback stub
    /// or a skipped route.
    pub async fn build(&self, config: &ProxyConfig) -> GatewayResult<UnifiedDocument> {
        let catalog = self.fetch_catalog(config).await;

        let mut paths = Map::new();
        let mut schemas = Map::new();
        let mut reports = Vec::with_capacity(config.routes.len());

        for route in &config.routes {
            let pattern = route.match_path().to_string();
            let target = target_pattern(route);

            let (item, source) = match catalog.lookup(&target)? {
                Some((source, item)) => (item.clone(), Some(source)),
                None => {
                    debug!(route_id = %route.route_id, target = %target, "no upstream operation, using fallback stub");
                    (fallback_path_item(), None)
                }
            };
            let cluster_id = source.map(|s| s.cluster_id.clone());

            let outcome = match shape_path_item(route, item) {
                Ok(item) => {
                    let catalogs: Vec<&Map<String, Value>> =
                        source.map(|s| &s.schemas).into_iter().chain([&catalog.schemas]).collect();
                    let found = schema_closure(&Value::Object(item.clone()), &catalogs, &schemas);
                    schemas.extend(found);
                    merge_path_item(&mut paths, &pattern, item);
                    RouteOutcome::Documented { cluster_id }
                }
                Err(reason) => {
                    warn!(route_id = %route.route_id, reason = %reason, "route skipped from unified document");
                    RouteOutcome::Skipped(reason)
                }
            };
            reports.push(RouteReport {
                route_id: route.route_id.clone(),
                pattern,
                outcome,
            });
        }

        let all_secured = config.routes.iter().all(RouteConfig::requires_authorization);
        let document = self.assemble(paths, schemas, all_secured);

        info!(
            routes = reports.len(),
            skipped = reports.iter().filter(|r| matches!(r.outcome, RouteOutcome::Skipped(_))).count(),
            upstream_documents = catalog.documents.len(),
            "unified document built"
        );
        Ok(UnifiedDocument {
            document,
            routes: reports,
        })
    }

    async fn fetch_catalog(&self, config: &ProxyConfig) -> Catalog {
        let mut sources: Vec<(&str, &str)> = Vec::new();
        for cluster in &config.clusters {
            if let Some(address) = cluster.openapi_address() {
                if !sources.iter().any(|(_, a)| *a == address) {
                    sources.push((cluster.cluster_id.as_str(), address));
                }
            }
        }

        let fetches = sources.iter().map(|(cluster_id, address)| async move {
            (*cluster_id, self.fetcher.fetch(address).await)
        });

        let mut catalog = Catalog::default();
        for (cluster_id, result) in join_all(fetches).await {
            match result {
                Ok(document) => catalog.add(cluster_id, document),
                Err(err) => {
                    warn!(cluster_id = %cluster_id, error = %err, "upstream document unavailable");
                }
            }
        }
        catalog
    }

    fn assemble(&self, paths: Map<String, Value>, schemas: Map<String, Value>, all_secured: bool) -> Value {
        let mut info = json!({
            "title": self.info.title,
            "version": self.info.version,
        });
        if let Some(description) = &self.info.description {
            info["description"] = Value::String(description.clone());
        }

        let mut document = json!({
            "openapi": OPENAPI_VERSION,
            "info": info,
            "paths": paths,
            "components": {
                "securitySchemes": {
                    BEARER_SCHEME: {
                        "type": "http",
                        "scheme": "bearer",
                        "bearerFormat": "JWT"
                    }
                },
                "schemas": schemas,
            },
        });
        if all_secured {
            document["security"] = bearer_requirement();
        }
        document
    }
}

/// One fetched upstream document.
struct SourceDocument {
    cluster_id: String,
    paths: Map<String, Value>,
    schemas: Map<String, Value>,
}

/// Fetched documents plus the combined schema catalog.
///
/// A path-item's references resolve against its own document first and the
/// combined catalog second.
#[derive(Default)]
struct Catalog {
    documents: Vec<SourceDocument>,
    /// First document declaring a schema name wins.
    schemas: Map<String, Value>,
}

impl Catalog {
    fn add(&mut self, cluster_id: &str, document: UpstreamDocument) {
        for (name, schema) in &document.schemas {
            if !self.schemas.contains_key(name) {
                self.schemas.insert(name.clone(), schema.clone());
            }
        }
        self.documents.push(SourceDocument {
            cluster_id: cluster_id.to_string(),
            paths: document.paths,
            schemas: document.schemas,
        });
    }

    fn lookup(&self, target: &str) -> GatewayResult<Option<(&SourceDocument, &Value)>> {
        let mut matches = self
            .documents
            .iter()
            .filter_map(|doc| doc.paths.get(target).map(|item| (doc, item)));

        let Some(first) = matches.next() else {
            return Ok(None);
        };
        let rest: Vec<(&SourceDocument, &Value)> = matches.collect();
        if rest.is_empty() {
            return Ok(Some(first));
        }
        Err(GatewayImplError::AmbiguousOperationPath {
            path: target.to_string(),
            clusters: std::iter::once(first)
                .chain(rest)
                .map(|(doc, _)| doc.cluster_id.clone())
                .collect(),
        })
    }
}

/// Upstream operation path a route is documented from.
///
/// The `PathPattern` target when one is configured, otherwise the match
/// path; `{sub}` is written as `{id}` the way upstream documents name it.
pub fn target_pattern(route: &RouteConfig) -> String {
    route
        .path_pattern()
        .unwrap_or_else(|| route.match_path())
        .replace("{sub}", "{id}")
}

fn method_of(key: &str) -> Option<HttpMethod> {
    HttpMethod::ALL.into_iter().find(|m| m.operation_key() == key)
}

fn bearer_requirement() -> Value {
    json!([{ BEARER_SCHEME: [] }])
}

/// Apply method filtering, security and section tags to a copied path-item.
fn shape_path_item(route: &RouteConfig, item: Value) -> Result<Map<String, Value>, String> {
    let Value::Object(mut item) = item else {
        return Err("path-item is not an object".to_string());
    };

    item.retain(|key, _| method_of(key).is_none_or(|m| route.accepts(m)));

    let secured = route.requires_authorization();
    let section = route.section();
    for (key, operation) in item.iter_mut() {
        if method_of(key).is_none() {
            continue;
        }
        let Some(operation) = operation.as_object_mut() else {
            return Err(format!("operation '{key}' is not an object"));
        };
        if secured {
            operation.insert("security".to_string(), bearer_requirement());
        }
        if let Some(section) = section {
            operation.insert("tags".to_string(), json!([section]));
        }
    }
    Ok(item)
}

/// Store `item` under `pattern`; operations already stored there win.
fn merge_path_item(paths: &mut Map<String, Value>, pattern: &str, item: Map<String, Value>) {
    match paths.get_mut(pattern).and_then(Value::as_object_mut) {
        Some(existing) => {
            for (key, value) in item {
                existing.entry(key).or_insert(value);
            }
        }
        None => {
            paths.insert(pattern.to_string(), Value::Object(item));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::fetcher::FetchError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use stratus_kernel::gateway::{ClusterConfig, TransformDirective};

    /// Serves canned documents by address; unknown addresses fail.
    struct StubFetcher {
        documents: HashMap<String, Value>,
    }

    impl StubFetcher {
        fn new(documents: &[(&str, Value)]) -> Arc<Self> {
            Arc::new(Self {
                documents: documents
                    .iter()
                    .map(|(a, d)| (a.to_string(), d.clone()))
                    .collect(),
            })
        }
    }

    #[async_trait]
    impl DocumentFetcher for StubFetcher {
        async fn fetch(&self, address: &str) -> Result<UpstreamDocument, FetchError> {
            let document = self.documents.get(address).cloned().ok_or_else(|| FetchError::Status {
                url: address.to_string(),
                status: 404,
            })?;
            UpstreamDocument::from_value(document).map_err(|reason| FetchError::Malformed {
                url: address.to_string(),
                reason,
            })
        }
    }

    fn cluster(id: &str, address: &str) -> ClusterConfig {
        ClusterConfig::new(id)
            .with_destination("d1", format!("http://{id}"))
            .with_metadata("OpenApiAddress", address)
    }

    fn route(id: &str, path: &str, target: &str, cluster_id: &str) -> RouteConfig {
        RouteConfig::new(id, path)
            .with_cluster(cluster_id)
            .with_transform(TransformDirective::PathPattern(target.to_string()))
    }

    fn orders_doc() -> Value {
        json!({
            "paths": {
                "/internal/{id}/orders": {
                    "get": {
                        "tags": ["upstream"],
                        "responses": {"200": {"content": {"application/json": {"schema": {"$ref": "#/components/schemas/OrderList"}}}}}
                    },
                    "post": {
                        "responses": {"400": {"content": {"application/json": {"schema": {"$ref": "#/components/schemas/Error"}}}}}
                    }
                }
            },
            "components": {"schemas": {
                "OrderList": {"type": "array", "items": {"$ref": "#/components/schemas/Order"}},
                "Order": {"type": "object"},
                "Error": {"type": "object", "properties": {"message": {"type": "string"}}}
            }}
        })
    }

    fn users_doc() -> Value {
        json!({
            "paths": {
                "/internal/users/{id}": {
                    "get": {
                        "responses": {"404": {"content": {"application/json": {"schema": {"$ref": "#/components/schemas/Error"}}}}}
                    }
                }
            },
            "components": {"schemas": {
                "Error": {"type": "object", "description": "users flavour"}
            }}
        })
    }

    fn builder(fetcher: Arc<StubFetcher>) -> OpenApiBuilder {
        OpenApiBuilder::new(fetcher, DocumentInfo::default())
    }

    #[tokio::test]
    async fn matched_route_is_stored_under_gateway_pattern() {
        let fetcher = StubFetcher::new(&[("http://orders/doc", orders_doc())]);
        let config = ProxyConfig::new()
            .with_cluster(cluster("orders", "http://orders/doc"))
            .with_route(route("r1", "/users/{id}/orders", "/internal/{sub}/orders", "orders"));

        let built = builder(fetcher).build(&config).await.unwrap();
        let doc = &built.document;

        assert_eq!(doc["openapi"], "3.0.0");
        assert_eq!(doc["info"]["title"], "Unified API");
        assert!(doc["paths"]["/users/{id}/orders"]["get"].is_object());
        assert!(doc["paths"].get("/internal/{id}/orders").is_none());
        assert_eq!(
            built.routes[0].outcome,
            RouteOutcome::Documented { cluster_id: Some("orders".into()) }
        );
        let schemas = doc["components"]["schemas"].as_object().unwrap();
        assert!(schemas.contains_key("OrderList"));
        assert!(schemas.contains_key("Order"));
        assert_eq!(doc["components"]["securitySchemes"]["bearerAuth"]["scheme"], "bearer");
    }

    #[tokio::test]
    async fn shared_schema_appears_once() {
        let fetcher = StubFetcher::new(&[
            ("http://orders/doc", orders_doc()),
            ("http://users/doc", users_doc()),
        ]);
        let config = ProxyConfig::new()
            .with_cluster(cluster("orders", "http://orders/doc"))
            .with_cluster(cluster("users", "http://users/doc"))
            .with_route(route("orders", "/orders/{id}", "/internal/{id}/orders", "orders"))
            .with_route(route("users", "/users/{id}", "/internal/users/{id}", "users"));

        let built = builder(fetcher).build(&config).await.unwrap();
        let schemas = built.document["components"]["schemas"].as_object().unwrap();

        assert_eq!(schemas.keys().filter(|k| k.as_str() == "Error").count(), 1);
        // The first route referencing the name supplies its body.
        assert!(schemas["Error"].get("description").is_none());
    }

    #[tokio::test]
    async fn refs_resolve_against_the_source_document_first() {
        let fetcher = StubFetcher::new(&[
            ("http://orders/doc", orders_doc()),
            ("http://users/doc", users_doc()),
        ]);
        // Orders is fetched first, but only the users route is documented.
        let config = ProxyConfig::new()
            .with_cluster(cluster("orders", "http://orders/doc"))
            .with_cluster(cluster("users", "http://users/doc"))
            .with_route(route("users", "/users/{id}", "/internal/users/{id}", "users"));

        let built = builder(fetcher).build(&config).await.unwrap();
        let schemas = built.document["components"]["schemas"].as_object().unwrap();

        assert_eq!(schemas["Error"]["description"], "users flavour");
        assert!(!schemas.contains_key("Order"));
    }

    #[tokio::test]
    async fn unmatched_route_gets_filtered_fallback_stub() {
        let fetcher = StubFetcher::new(&[]);
        let config = ProxyConfig::new().with_route(
            RouteConfig::new("r", "/reports")
                .with_methods(vec![HttpMethod::Get, HttpMethod::Delete])
                .with_transform(TransformDirective::PathPattern("/nowhere".into())),
        );

        let built = builder(fetcher).build(&config).await.unwrap();
        let item = built.document["paths"]["/reports"].as_object().unwrap();
        let mut methods: Vec<&str> = item.keys().map(String::as_str).collect();
        methods.sort_unstable();
        assert_eq!(methods, vec!["delete", "get"]);
        assert_eq!(built.routes[0].outcome, RouteOutcome::Documented { cluster_id: None });
    }

    #[tokio::test]
    async fn method_filter_drops_undeclared_operations() {
        let fetcher = StubFetcher::new(&[("http://orders/doc", orders_doc())]);
        let config = ProxyConfig::new()
            .with_cluster(cluster("orders", "http://orders/doc"))
            .with_route(
                route("r1", "/my/orders", "/internal/{id}/orders", "orders")
                    .with_methods(vec![HttpMethod::Get]),
            );

        let built = builder(fetcher).build(&config).await.unwrap();
        let item = &built.document["paths"]["/my/orders"];
        assert!(item.get("get").is_some());
        assert!(item.get("post").is_none());
        // `Error` was only referenced by the dropped `post`.
        assert!(built.document["components"]["schemas"].get("Error").is_none());
    }

    #[tokio::test]
    async fn global_security_only_when_every_route_is_secured() {
        let fetcher = StubFetcher::new(&[("http://orders/doc", orders_doc())]);
        let secured = route("a", "/a", "/internal/{id}/orders", "orders").with_authorization_policy("jwt");
        let base = ProxyConfig::new().with_cluster(cluster("orders", "http://orders/doc"));

        let all = base.clone().with_route(secured.clone());
        let built = builder(fetcher.clone()).build(&all).await.unwrap();
        assert_eq!(built.document["security"], json!([{"bearerAuth": []}]));
        assert_eq!(
            built.document["paths"]["/a"]["get"]["security"],
            json!([{"bearerAuth": []}])
        );

        let mixed = base
            .with_route(secured)
            .with_route(route("b", "/b", "/internal/{id}/orders", "orders"));
        let built = builder(fetcher).build(&mixed).await.unwrap();
        assert!(built.document.get("security").is_none());
        assert!(built.document["paths"]["/b"]["get"].get("security").is_none());
    }

    #[tokio::test]
    async fn section_tag_replaces_operation_tags() {
        let fetcher = StubFetcher::new(&[("http://orders/doc", orders_doc())]);
        let config = ProxyConfig::new()
            .with_cluster(cluster("orders", "http://orders/doc"))
            .with_route(
                route("r1", "/orders", "/internal/{id}/orders", "orders").with_metadata("Section", "Orders"),
            );

        let built = builder(fetcher).build(&config).await.unwrap();
        assert_eq!(built.document["paths"]["/orders"]["get"]["tags"], json!(["Orders"]));
        assert_eq!(built.document["paths"]["/orders"]["post"]["tags"], json!(["Orders"]));
    }

    #[tokio::test]
    async fn malformed_upstream_does_not_affect_other_clusters() {
        let fetcher = StubFetcher::new(&[
            ("http://orders/doc", orders_doc()),
            ("http://broken/doc", json!({"openapi": "3.0.0"})),
        ]);
        let config = ProxyConfig::new()
            .with_cluster(cluster("broken", "http://broken/doc"))
            .with_cluster(cluster("orders", "http://orders/doc"))
            .with_route(route("broken", "/broken", "/internal/things", "broken"))
            .with_route(route("orders", "/orders", "/internal/{id}/orders", "orders"));

        let built = builder(fetcher).build(&config).await.unwrap();
        assert_eq!(
            built.routes[1].outcome,
            RouteOutcome::Documented { cluster_id: Some("orders".into()) }
        );
        assert!(built.document["components"]["schemas"].get("OrderList").is_some());
        // The broken cluster's route still gets a stub.
        assert_eq!(built.routes[0].outcome, RouteOutcome::Documented { cluster_id: None });
    }

    #[tokio::test]
    async fn ambiguous_operation_path_fails_the_build() {
        let fetcher = StubFetcher::new(&[
            ("http://orders/doc", orders_doc()),
            ("http://mirror/doc", orders_doc()),
        ]);
        let config = ProxyConfig::new()
            .with_cluster(cluster("orders", "http://orders/doc"))
            .with_cluster(cluster("mirror", "http://mirror/doc"))
            .with_route(route("r1", "/orders", "/internal/{id}/orders", "orders"));

        let err = builder(fetcher).build(&config).await.unwrap_err();
        match err {
            GatewayImplError::AmbiguousOperationPath { path, clusters } => {
                assert_eq!(path, "/internal/{id}/orders");
                assert_eq!(clusters, vec!["orders".to_string(), "mirror".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn non_object_operation_skips_only_that_route() {
        let fetcher = StubFetcher::new(&[(
            "http://odd/doc",
            json!({"paths": {"/odd": {"get": "not-an-operation"}, "/fine": {"get": {}}}}),
        )]);
        let config = ProxyConfig::new()
            .with_cluster(cluster("odd", "http://odd/doc"))
            .with_route(route("odd", "/odd", "/odd", "odd"))
            .with_route(route("fine", "/fine", "/fine", "odd"));

        let built = builder(fetcher).build(&config).await.unwrap();
        assert!(matches!(built.routes[0].outcome, RouteOutcome::Skipped(_)));
        assert_eq!(built.skipped().count(), 1);
        assert!(built.document["paths"].get("/odd").is_none());
        assert!(built.document["paths"].get("/fine").is_some());
    }

    #[tokio::test]
    async fn routes_sharing_a_pattern_are_merged() {
        let fetcher = StubFetcher::new(&[("http://orders/doc", orders_doc())]);
        let config = ProxyConfig::new()
            .with_cluster(cluster("orders", "http://orders/doc"))
            .with_route(
                route("read", "/orders", "/internal/{id}/orders", "orders")
                    .with_methods(vec![HttpMethod::Get])
                    .with_metadata("Section", "Read"),
            )
            .with_route(
                route("write", "/orders", "/internal/{id}/orders", "orders")
                    .with_methods(vec![HttpMethod::Get, HttpMethod::Post])
                    .with_metadata("Section", "Write"),
            );

        let built = builder(fetcher).build(&config).await.unwrap();
        let item = &built.document["paths"]["/orders"];
        assert_eq!(item["get"]["tags"], json!(["Read"]));
        assert_eq!(item["post"]["tags"], json!(["Write"]));
    }

    #[tokio::test]
    async fn route_without_path_pattern_uses_its_match_path() {
        let fetcher = StubFetcher::new(&[(
            "http://plain/doc",
            json!({"paths": {"/status": {"get": {"summary": "upstream status"}}}}),
        )]);
        let config = ProxyConfig::new()
            .with_cluster(cluster("plain", "http://plain/doc"))
            .with_route(RouteConfig::new("status", "/status").with_cluster("plain"));

        let built = builder(fetcher).build(&config).await.unwrap();
        assert_eq!(built.document["paths"]["/status"]["get"]["summary"], "upstream status");
    }

    #[test]
    fn target_pattern_aliases_sub_to_id() {
        let r = route("r", "/me/orders", "/internal/{sub}/orders", "c");
        assert_eq!(target_pattern(&r), "/internal/{id}/orders");
    }

    #[test]
    fn description_is_optional_in_info() {
        let b = OpenApiBuilder::new(
            StubFetcher::new(&[]),
            DocumentInfo {
                description: Some("All services".into()),
                ..DocumentInfo::default()
            },
        );
        let doc = b.assemble(Map::new(), Map::new(), false);
        assert_eq!(doc["info"]["description"], "All services");
    }
}
