// ============================================================================
// Sync Coordination
// ============================================================================
//
// Decides when to fetch remotely, merges fetched snapshots into the local
// store, and serves the canonical and filtered views to observers.
//
// ============================================================================

pub mod coordinator;
pub mod merge;
pub mod state;

pub use coordinator::{
    DeleteFailurePolicy, RefreshOutcome, SkipReason, SyncCoordinator, SyncCoordinatorBuilder,
};
pub use merge::{merge_catalog, MergeReport};
pub use state::{filter_items, CatalogView, SyncState};
