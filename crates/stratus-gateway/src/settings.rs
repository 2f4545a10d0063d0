//! Gateway runtime settings.
//!
//! One file holds everything: listener, document aggregation, bearer-token
//! validation, the optional API-key gate and the proxy routes/clusters.
//! Every section except `proxy` has defaults.
//!
//! ```yaml
//! server:
//!   port: 8080
//! openapi:
//!   title: Unified API
//!   cache_ttl_secs: 60
//! auth:
//!   jwt:
//!     key: ${STRATUS_JWT_KEY}
//!     issuer: https://issuer.example
//! api_key_gate:
//!   header_name: X-Api-Key
//!   parameter_name: api-key
//!   keys: [key-1, key-2]
//! proxy:
//!   routes: [...]
//!   clusters: [...]
//! ```

use crate::openapi::DocumentInfo;
use serde::Deserialize;
use std::time::Duration;
use stratus_kernel::config::{ConfigResult, load_with_env};
use stratus_kernel::gateway::ProxyConfig;

/// Prefix of environment overrides, e.g. `STRATUS__SERVER__PORT`.
pub const ENV_PREFIX: &str = "STRATUS";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewaySettings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub openapi: OpenApiSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub api_key_gate: Option<ApiKeyGateSettings>,
    #[serde(default)]
    pub proxy: ProxyConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub port: u16,
    /// Path of the unified-document endpoint.
    pub metadata_path: String,
    /// Timeout of one forwarded request.
    pub forward_timeout_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8080,
            metadata_path: "/.metadata/open-api".to_string(),
            forward_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpenApiSettings {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
    /// Timeout of each upstream document fetch.
    pub fetch_timeout_ms: u64,
    /// Lifetime of a cached unified document; `0` disables caching.
    pub cache_ttl_secs: u64,
}

impl Default for OpenApiSettings {
    fn default() -> Self {
        let info = DocumentInfo::default();
        Self {
            title: info.title,
            version: info.version,
            description: info.description,
            fetch_timeout_ms: 10_000,
            cache_ttl_secs: 60,
        }
    }
}

impl OpenApiSettings {
    pub fn document_info(&self) -> DocumentInfo {
        DocumentInfo {
            title: self.title.clone(),
            version: self.version.clone(),
            description: self.description.clone(),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthSettings {
    /// Without this section no caller is ever authenticated.
    #[serde(default)]
    pub jwt: Option<JwtSettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Shared HS256 signing key.
    pub key: String,
    pub issuer: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeyGateSettings {
    pub header_name: String,
    pub parameter_name: String,
    pub keys: Vec<String>,
}

impl GatewaySettings {
    /// Load from `path` and apply `STRATUS__…` environment overrides.
    pub fn load(path: &str) -> ConfigResult<Self> {
        load_with_env(path, ENV_PREFIX)
    }
}
