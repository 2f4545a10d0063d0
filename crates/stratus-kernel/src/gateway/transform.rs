//! Transform directives.
//!
//! Configuration expresses each directive in reverse-proxy dictionary form,
//! a flat string→string map:
//!
//! ```yaml
//! transforms:
//!   - PathPattern: /internal/{sub}/orders/{id}
//!   - QueryValueParameter: owner
//!     Set: "{sub}"
//!   - RequestHeader: X-User-Id
//!     Set: "{sub}"
//! ```
//!
//! Keys are matched case-insensitively.  Anything that is not one of the
//! three supported directives is rejected at load time.

use super::error::GatewayError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const PATH_PATTERN: &str = "PathPattern";
const QUERY_VALUE_PARAMETER: &str = "QueryValueParameter";
const REQUEST_HEADER: &str = "RequestHeader";
const SET: &str = "Set";

/// One configured rewrite rule applied to an outbound request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, String>",
    into = "BTreeMap<String, String>"
)]
pub enum TransformDirective {
    /// Target path template with `{claimKey}` / `{paramName}` placeholders.
    PathPattern(String),
    /// Templated replacement value for the request's first query parameter.
    /// `name` is the parameter the configuration author expects there.
    QueryValueParameter { name: String, set: String },
    /// Templated replacement value for outbound header `name`.
    RequestHeader { name: String, set: String },
}

impl TransformDirective {
    /// Builder for [`TransformDirective::QueryValueParameter`].
    pub fn query_value(name: impl Into<String>, set: impl Into<String>) -> Self {
        Self::QueryValueParameter {
            name: name.into(),
            set: set.into(),
        }
    }

    /// Builder for [`TransformDirective::RequestHeader`].
    pub fn request_header(name: impl Into<String>, set: impl Into<String>) -> Self {
        Self::RequestHeader {
            name: name.into(),
            set: set.into(),
        }
    }
}

fn lookup<'a>(entry: &'a BTreeMap<String, String>, key: &str) -> Option<&'a String> {
    entry
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
}

fn unsupported(entry: &BTreeMap<String, String>) -> GatewayError {
    GatewayError::UnsupportedTransform(entry.keys().cloned().collect::<Vec<_>>().join(", "))
}

fn required_set(
    entry: &BTreeMap<String, String>,
    directive: &str,
) -> Result<String, GatewayError> {
    if entry.len() > 2 {
        return Err(unsupported(entry));
    }
    lookup(entry, SET)
        .cloned()
        .ok_or_else(|| GatewayError::IncompleteTransform(directive.to_string(), SET.to_string()))
}

impl TryFrom<BTreeMap<String, String>> for TransformDirective {
    type Error = GatewayError;

    fn try_from(entry: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        if let Some(pattern) = lookup(&entry, PATH_PATTERN) {
            if entry.len() != 1 {
                return Err(unsupported(&entry));
            }
            return Ok(Self::PathPattern(pattern.clone()));
        }
        if let Some(name) = lookup(&entry, QUERY_VALUE_PARAMETER) {
            let set = required_set(&entry, QUERY_VALUE_PARAMETER)?;
            return Ok(Self::QueryValueParameter {
                name: name.clone(),
                set,
            });
        }
        if let Some(name) = lookup(&entry, REQUEST_HEADER) {
            let set = required_set(&entry, REQUEST_HEADER)?;
            return Ok(Self::RequestHeader {
                name: name.clone(),
                set,
            });
        }
        Err(unsupported(&entry))
    }
}

impl From<TransformDirective> for BTreeMap<String, String> {
    fn from(directive: TransformDirective) -> Self {
        let mut entry = BTreeMap::new();
        match directive {
            TransformDirective::PathPattern(pattern) => {
                entry.insert(PATH_PATTERN.to_string(), pattern);
            }
            TransformDirective::QueryValueParameter { name, set } => {
                entry.insert(QUERY_VALUE_PARAMETER.to_string(), name);
                entry.insert(SET.to_string(), set);
            }
            TransformDirective::RequestHeader { name, set } => {
                entry.insert(REQUEST_HEADER.to_string(), name);
                entry.insert(SET.to_string(), set);
            }
        }
        entry
    }
}
