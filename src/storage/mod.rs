pub mod change;
pub mod memory;
pub mod persistence;
pub mod query;
pub mod store;

pub use change::{ChangeSummary, StagedChange};
pub use memory::InMemoryCatalogStore;
pub use persistence::{CatalogSnapshot, SnapshotManager, SNAPSHOT_FILE};
pub use query::{ItemFilter, ItemQuery, SortDirection, SortField, SortOrder};
pub use store::CatalogStore;
