//! Bearer-token authentication filter.
//!
//! Validates `Authorization: Bearer <jwt>` tokens signed with a shared HS256
//! key, checking signature, expiry and issuer (audience is not checked).  A
//! valid token resolves an authenticated [`Identity`] whose claims are the
//! token's payload fields; anything else leaves the caller anonymous.
//!
//! Routes carrying an authorization policy reject anonymous callers with
//! `401`; other routes let them through untouched.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde_json::Value;
use stratus_kernel::config::has_env_reference;
use stratus_kernel::gateway::{
    Claim, FilterAction, FilterOrder, GatewayContext, GatewayError, GatewayFilter, Identity,
};
use tracing::{debug, warn};

pub struct JwtAuthFilter {
    verifier: Option<Verifier>,
}

struct Verifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtAuthFilter {
    /// `secret` is the raw shared signing key; `issuer` the only accepted
    /// `iss` value.
    ///
    /// A key that still reads like an environment reference (`${VAR}`,
    /// `$VAR`) came from an unset variable and is refused.
    pub fn new(secret: &[u8], issuer: impl Into<String>) -> Result<Self, GatewayError> {
        let issuer = issuer.into();
        let unresolved = std::str::from_utf8(secret).is_ok_and(has_env_reference);
        if secret.is_empty() || unresolved {
            return Err(GatewayError::InvalidAuthConfig("auth.jwt.key".to_string()));
        }
        if issuer.trim().is_empty() {
            return Err(GatewayError::InvalidAuthConfig("auth.jwt.issuer".to_string()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer]);
        validation.validate_aud = false;

        Ok(Self {
            verifier: Some(Verifier {
                key: DecodingKey::from_secret(secret),
                validation,
            }),
        })
    }

    /// A filter that authenticates nobody: routes with a policy reject
    /// every caller.
    pub fn disabled() -> Self {
        Self { verifier: None }
    }

    fn authenticate(&self, ctx: &GatewayContext) -> Identity {
        let Some(verifier) = &self.verifier else {
            return Identity::anonymous();
        };
        let Some(token) = ctx
            .request
            .header("authorization")
            .and_then(bearer_token)
        else {
            return Identity::anonymous();
        };

        match decode::<Value>(token, &verifier.key, &verifier.validation) {
            Ok(data) => Identity::authenticated(flatten_claims(&data.claims)),
            Err(err) => {
                debug!(request_id = %ctx.request.id, error = %err, "bearer token rejected");
                Identity::anonymous()
            }
        }
    }
}

/// Credentials of a `Bearer` authorization header; the scheme name is
/// case-insensitive.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim_start().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Token payload as a claim list.
///
/// Arrays yield one claim per element; `null` is dropped; nested objects
/// are kept as their JSON text.
pub fn flatten_claims(payload: &Value) -> Vec<Claim> {
    let Value::Object(fields) = payload else {
        return Vec::new();
    };
    let mut claims = Vec::new();
    for (name, value) in fields {
        match value {
            Value::Array(items) => {
                claims.extend(items.iter().filter_map(|v| claim_value(v).map(|v| Claim::new(name, v))));
            }
            other => {
                if let Some(v) = claim_value(other) {
                    claims.push(Claim::new(name, v));
                }
            }
        }
    }
    claims
}

fn claim_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl GatewayFilter for JwtAuthFilter {
    fn name(&self) -> &str {
        "jwt-auth"
    }

    fn order(&self) -> FilterOrder {
        FilterOrder::AUTH
    }

    async fn on_request(&self, ctx: &mut GatewayContext) -> Result<FilterAction, GatewayError> {
        let identity = self.authenticate(ctx);
        let required = ctx.route().is_some_and(|r| r.requires_authorization());
        let authenticated = identity.is_authenticated();
        ctx.identity = Some(identity);

        if required && !authenticated {
            warn!(request_id = %ctx.request.id, path = %ctx.inbound_path, "rejected request: authentication required");
            return Ok(FilterAction::Reject(401, "Unauthorized".to_string()));
        }
        Ok(FilterAction::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;
    use std::sync::Arc;
    use stratus_kernel::gateway::{GatewayRequest, HttpMethod, RouteConfig, RouteMatch};

    const SECRET: &[u8] = b"integration-test-signing-key-0123456789";

    fn token(payload: Value, secret: &[u8]) -> String {
        encode(&Header::new(Algorithm::HS256), &payload, &EncodingKey::from_secret(secret)).unwrap()
    }

    fn payload(issuer: &str) -> Value {
        json!({"sub": "alice", "iss": issuer, "exp": 4_102_444_800u64, "roles": ["a", "b"]})
    }

    fn ctx(route: RouteConfig, bearer: Option<String>) -> GatewayContext {
        let mut req = GatewayRequest::new("req-1", HttpMethod::Get, route.match_path().to_string());
        if let Some(t) = bearer {
            req = req.with_header("Authorization", format!("Bearer {t}"));
        }
        GatewayContext::new(req).with_route_match(RouteMatch {
            route: Arc::new(route),
        })
    }

    fn filter() -> JwtAuthFilter {
        JwtAuthFilter::new(SECRET, "stratus-tests").unwrap()
    }

    #[tokio::test]
    async fn valid_token_authenticates() {
        let route = RouteConfig::new("r", "/me").with_authorization_policy("jwt");
        let mut c = ctx(route, Some(token(payload("stratus-tests"), SECRET)));

        assert_eq!(filter().on_request(&mut c).await.unwrap(), FilterAction::Continue);
        let identity = c.identity.as_ref().unwrap();
        assert!(identity.is_authenticated());
        assert!(identity.claims().contains(&Claim::new("sub", "alice")));
        assert!(identity.claims().contains(&Claim::new("roles", "b")));
    }

    #[tokio::test]
    async fn wrong_issuer_is_anonymous_and_rejected_on_secured_route() {
        let route = RouteConfig::new("r", "/me").with_authorization_policy("jwt");
        let mut c = ctx(route, Some(token(payload("someone-else"), SECRET)));

        assert_eq!(
            filter().on_request(&mut c).await.unwrap(),
            FilterAction::Reject(401, "Unauthorized".to_string())
        );
        assert!(!c.is_authenticated());
    }

    #[tokio::test]
    async fn bad_signature_is_rejected() {
        let route = RouteConfig::new("r", "/me").with_authorization_policy("jwt");
        let mut c = ctx(route, Some(token(payload("stratus-tests"), b"another-key")));
        assert!(matches!(
            filter().on_request(&mut c).await.unwrap(),
            FilterAction::Reject(401, _)
        ));
    }

    #[tokio::test]
    async fn anonymous_caller_passes_open_route() {
        let mut c = ctx(RouteConfig::new("r", "/public"), None);
        assert_eq!(filter().on_request(&mut c).await.unwrap(), FilterAction::Continue);
        assert!(!c.is_authenticated());
    }

    #[tokio::test]
    async fn disabled_filter_rejects_secured_routes() {
        let route = RouteConfig::new("r", "/me").with_authorization_policy("jwt");
        let mut c = ctx(route, Some(token(payload("stratus-tests"), SECRET)));
        assert!(matches!(
            JwtAuthFilter::disabled().on_request(&mut c).await.unwrap(),
            FilterAction::Reject(401, _)
        ));
    }

    #[test]
    fn empty_issuer_is_a_config_error() {
        assert!(matches!(
            JwtAuthFilter::new(SECRET, " "),
            Err(GatewayError::InvalidAuthConfig(_))
        ));
    }

    #[test]
    fn unresolved_key_reference_is_a_config_error() {
        for key in ["${STRATUS_JWT_KEY}", "$STRATUS_JWT_KEY"] {
            assert!(matches!(
                JwtAuthFilter::new(key.as_bytes(), "stratus-tests"),
                Err(GatewayError::InvalidAuthConfig(ref field)) if field == "auth.jwt.key"
            ));
        }
    }

    #[tokio::test]
    async fn bearer_scheme_is_case_insensitive() {
        let route = RouteConfig::new("r", "/me").with_authorization_policy("jwt");
        let req = GatewayRequest::new("req-1", HttpMethod::Get, "/me").with_header(
            "Authorization",
            format!("bearer  {}", token(payload("stratus-tests"), SECRET)),
        );
        let mut c = GatewayContext::new(req).with_route_match(RouteMatch {
            route: Arc::new(route),
        });

        assert_eq!(filter().on_request(&mut c).await.unwrap(), FilterAction::Continue);
        assert!(c.is_authenticated());
    }

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("BEARER abc "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Bearer"), None);
    }

    #[test]
    fn flatten_keeps_payload_order_and_expands_arrays() {
        let claims = flatten_claims(&json!({"a": 1, "b": [true, null, "x"], "c": null}));
        assert_eq!(
            claims,
            vec![Claim::new("a", "1"), Claim::new("b", "true"), Claim::new("b", "x")]
        );
    }
}
