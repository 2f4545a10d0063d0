//! Single-flight cache in front of [`OpenApiBuilder`].
//!
//! The cached document is keyed by snapshot version and expires after a TTL.
//! The slot lock is held for the whole build, so callers arriving while a
//! build is running wait for it and reuse its result.  Failed builds leave
//! the slot as it was.

use super::builder::{OpenApiBuilder, UnifiedDocument};
use crate::error::GatewayResult;
use crate::snapshot::ProxySnapshot;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

struct CachedDocument {
    version: u64,
    built_at: Instant,
    document: Arc<UnifiedDocument>,
}

pub struct OpenApiCache {
    builder: OpenApiBuilder,
    ttl: Duration,
    slot: Mutex<Option<CachedDocument>>,
}

impl OpenApiCache {
    /// A zero `ttl` disables caching: every call builds.
    pub fn new(builder: OpenApiBuilder, ttl: Duration) -> Self {
        Self {
            builder,
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// The unified document for `snapshot`.
    pub async fn get(&self, snapshot: &ProxySnapshot) -> GatewayResult<Arc<UnifiedDocument>> {
        if self.ttl.is_zero() {
            return self.builder.build(&snapshot.config).await.map(Arc::new);
        }

        let mut slot = self.slot.lock().await;
        if let Some(cached) = slot.as_ref() {
            if cached.version == snapshot.version && cached.built_at.elapsed() < self.ttl {
                debug!(version = snapshot.version, "serving cached unified document");
                return Ok(Arc::clone(&cached.document));
            }
        }

        let document = Arc::new(self.builder.build(&snapshot.config).await?);
        *slot = Some(CachedDocument {
            version: snapshot.version,
            built_at: Instant::now(),
            document: Arc::clone(&document),
        });
        Ok(document)
    }
}
