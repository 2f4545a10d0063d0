//! Cluster configuration.
//!
//! A cluster is an upstream service group backing one or more routes.  Its
//! metadata may name the location of the service's API-description document
//! under the `OpenApiAddress` key.

use super::error::GatewayError;
use super::route::metadata_lookup;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata key naming the API-description document of a cluster.
pub const OPENAPI_ADDRESS_METADATA_KEY: &str = "OpenApiAddress";

/// A single upstream endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DestinationConfig {
    /// Base address, e.g. `http://orders.internal:8080`.
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClusterConfig {
    /// Unique stable identifier (must not be empty).
    pub cluster_id: String,
    /// Named destinations.  The forwarder uses the first one by name order.
    #[serde(default)]
    pub destinations: BTreeMap<String, DestinationConfig>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl ClusterConfig {
    pub fn new(cluster_id: impl Into<String>) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            destinations: BTreeMap::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Builder: add a named destination.
    pub fn with_destination(mut self, name: impl Into<String>, address: impl Into<String>) -> Self {
        self.destinations.insert(
            name.into(),
            DestinationConfig {
                address: address.into(),
            },
        );
        self
    }

    /// Builder: attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Location of this cluster's API-description document, if declared.
    pub fn openapi_address(&self) -> Option<&str> {
        metadata_lookup(&self.metadata, OPENAPI_ADDRESS_METADATA_KEY)
            .filter(|a| !a.trim().is_empty())
    }

    /// Destination the forwarder sends traffic to.
    pub fn primary_destination(&self) -> Option<&DestinationConfig> {
        self.destinations.values().next()
    }

    pub(crate) fn validate(&self) -> Result<(), GatewayError> {
        if self.cluster_id.trim().is_empty() {
            return Err(GatewayError::EmptyClusterId);
        }
        for (name, destination) in &self.destinations {
            if destination.address.trim().is_empty() {
                return Err(GatewayError::InvalidDestination(
                    self.cluster_id.clone(),
                    format!("destination '{name}' has an empty address"),
                ));
            }
        }
        Ok(())
    }
}
