//! Unified API-description document aggregation.

mod builder;
mod cache;
mod fallback;
mod fetcher;
pub mod refs;

pub use builder::{
    BEARER_SCHEME, DocumentInfo, OPENAPI_VERSION, OpenApiBuilder, RouteOutcome, RouteReport,
    UnifiedDocument, target_pattern,
};
pub use cache::OpenApiCache;
pub use fallback::fallback_path_item;
pub use fetcher::{DocumentFetcher, FetchError, HttpDocumentFetcher, UpstreamDocument};
