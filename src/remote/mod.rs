// ============================================================================
// Remote Catalog Source
// ============================================================================

pub mod http;

pub use http::{HttpCatalogFetcher, HttpCatalogFetcherBuilder, DEFAULT_CATALOG_URL};

use crate::core::{CatalogItem, NetworkResult};
use async_trait::async_trait;

/// One-shot source of the full remote catalog.
///
/// A call performs a single request, never retries, and resolves exactly
/// once with either the whole snapshot or an error.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn fetch_catalog(&self) -> NetworkResult<Vec<CatalogItem>>;
}
