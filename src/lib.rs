// ============================================================================
// Game Catalog Library
// ============================================================================

//! Offline-first catalog core.
//!
//! A [`SyncCoordinator`] mirrors a remote catalog into a local
//! [`CatalogStore`], lets callers edit and delete records in place, and keeps
//! a search-filtered [`CatalogView`] in step with the store.
//!
//! ```
//! use std::sync::Arc;
//! use game_catalog::{HttpCatalogFetcher, InMemoryCatalogStore, SyncCoordinator};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(InMemoryCatalogStore::preview());
//! let remote = Arc::new(HttpCatalogFetcher::new(game_catalog::DEFAULT_CATALOG_URL)?);
//! let catalog = SyncCoordinator::new(store, remote);
//!
//! catalog.load_local()?;
//! catalog.set_search_text("genre 3");
//! assert_eq!(catalog.view().filtered.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod remote;
pub mod storage;
pub mod sync;

pub use crate::config::CatalogConfig;
pub use crate::core::{CatalogError, CatalogItem, ItemId, NetworkError, RemoteCatalogItem, Result, StorageError};
pub use crate::remote::{HttpCatalogFetcher, RemoteSource, DEFAULT_CATALOG_URL};
pub use crate::storage::{CatalogStore, InMemoryCatalogStore, ItemQuery, SortDirection, SortField};
pub use crate::sync::{
    CatalogView, DeleteFailurePolicy, MergeReport, RefreshOutcome, SkipReason, SyncCoordinator,
    SyncState,
};
