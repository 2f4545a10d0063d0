//! Immutable configuration snapshots.
//!
//! Every request loads one [`ProxySnapshot`] up front and works against it
//! until it completes.  A reload builds and validates a whole new snapshot
//! and publishes it with a single atomic pointer swap, so no reader ever sees
//! a mix of old and new routes.

use crate::router::TrieRouter;
use arc_swap::ArcSwap;
use std::sync::{Arc, Mutex, PoisonError};
use stratus_kernel::gateway::{GatewayError, ProxyConfig};
use tracing::info;

/// One validated configuration generation.
#[derive(Debug)]
pub struct ProxySnapshot {
    /// Monotonically increasing generation number, starting at 1.
    pub version: u64,
    pub config: ProxyConfig,
    pub router: TrieRouter,
}

impl ProxySnapshot {
    fn build(version: u64, config: ProxyConfig) -> Result<Self, GatewayError> {
        config.validate()?;
        let router = TrieRouter::from_routes(config.routes.iter().cloned())?;
        Ok(Self {
            version,
            config,
            router,
        })
    }
}

/// Holder of the live snapshot.
pub struct ConfigStore {
    current: ArcSwap<ProxySnapshot>,
    /// Serializes writers so versions are published in order.
    reload: Mutex<()>,
}

impl ConfigStore {
    /// Validate `config` and publish it as version 1.
    pub fn new(config: ProxyConfig) -> Result<Self, GatewayError> {
        let snapshot = ProxySnapshot::build(1, config)?;
        Ok(Self {
            current: ArcSwap::from_pointee(snapshot),
            reload: Mutex::new(()),
        })
    }

    /// The snapshot in effect right now.
    pub fn load(&self) -> Arc<ProxySnapshot> {
        self.current.load_full()
    }

    /// Validate `config` and swap it in.  On error the live snapshot and the
    /// version counter are left untouched.  Returns the new version.
    pub fn replace(&self, config: ProxyConfig) -> Result<u64, GatewayError> {
        // Nothing is left half-written on panic, so a poisoned lock is usable.
        let _writer = self.reload.lock().unwrap_or_else(PoisonError::into_inner);
        let version = self.current.load().version + 1;
        let snapshot = ProxySnapshot::build(version, config)?;
        let routes = snapshot.config.routes.len();
        let clusters = snapshot.config.clusters.len();
        self.current.store(Arc::new(snapshot));
        info!(version, routes, clusters, "proxy configuration swapped");
        Ok(version)
    }
}
