//! Static API-key gate.
//!
//! The key is read from the configured header first and from the configured
//! query parameter otherwise.  Requests without a key, or with a key that is
//! not in the configured set, receive a `401` with a plain-text body.

use async_trait::async_trait;
use std::collections::HashSet;
use stratus_kernel::gateway::{
    FilterAction, FilterOrder, GatewayContext, GatewayError, GatewayFilter,
};
use tracing::warn;

/// Body returned when the request carries no key.
pub const MISSING_KEY_MESSAGE: &str = "API Key was not provided.";
/// Body returned when the key is not recognised.
pub const UNKNOWN_KEY_MESSAGE: &str = "Unauthorized client.";

pub struct ApiKeyFilter {
    header_name: String,
    parameter_name: String,
    valid_keys: HashSet<String>,
}

impl ApiKeyFilter {
    pub fn new(
        header_name: impl Into<String>,
        parameter_name: impl Into<String>,
        valid_keys: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            header_name: header_name.into(),
            parameter_name: parameter_name.into(),
            valid_keys: valid_keys.into_iter().map(Into::into).collect(),
        }
    }

    fn extract_key<'a>(&self, ctx: &'a GatewayContext) -> Option<&'a str> {
        ctx.request
            .header(&self.header_name)
            .or_else(|| ctx.request.query_value(&self.parameter_name))
            .filter(|key| !key.is_empty())
    }
}

#[async_trait]
impl GatewayFilter for ApiKeyFilter {
    fn name(&self) -> &str {
        "api-key-gate"
    }

    fn order(&self) -> FilterOrder {
        FilterOrder::PRE_AUTH
    }

    async fn on_request(&self, ctx: &mut GatewayContext) -> Result<FilterAction, GatewayError> {
        match self.extract_key(ctx) {
            Some(key) if self.valid_keys.contains(key) => Ok(FilterAction::Continue),
            Some(_) => {
                warn!(request_id = %ctx.request.id, "rejected request: unknown API key");
                Ok(FilterAction::Reject(401, UNKNOWN_KEY_MESSAGE.to_string()))
            }
            None => {
                warn!(request_id = %ctx.request.id, "rejected request: missing API key");
                Ok(FilterAction::Reject(401, MISSING_KEY_MESSAGE.to_string()))
            }
        }
    }
}
