use super::query::ItemQuery;
use crate::core::{CatalogItem, ItemId, StorageResult};

/// Persistent store backing the catalog - allows pluggable storage backends.
///
/// Mutations are staged until [`commit`](CatalogStore::commit). Reads made
/// while mutations are staged observe them. After a successful commit a
/// fresh query reflects every staged mutation; a failed commit leaves the
/// store exactly as it was before the first staged mutation.
///
/// Implementations serialize concurrent writers themselves.
pub trait CatalogStore: Send + Sync {
    /// Filtered, sorted read
    fn query(&self, query: &ItemQuery) -> StorageResult<Vec<CatalogItem>>;

    /// Look up a single record by id
    fn get(&self, id: ItemId) -> StorageResult<Option<CatalogItem>>;

    /// Check if a record with `id` exists
    fn exists(&self, id: ItemId) -> StorageResult<bool> {
        Ok(self.get(id)?.is_some())
    }

    /// Number of records
    fn count(&self) -> StorageResult<usize> {
        Ok(self.query(&ItemQuery::new())?.len())
    }

    /// Stage a new record.
    ///
    /// Deduplication is the caller's job; the backing table still refuses a
    /// second row for the same id with `StorageError::DuplicateId`.
    fn insert(&self, item: CatalogItem) -> StorageResult<()>;

    /// Stage a full overwrite of the record with `item.id`.
    /// Fails with `StorageError::NotFound` if there is no such record.
    fn update(&self, item: CatalogItem) -> StorageResult<()>;

    /// Stage removal of the record with `id`. Absent ids are a no-op.
    fn delete(&self, id: ItemId) -> StorageResult<()>;

    /// Atomically apply all staged mutations
    fn commit(&self) -> StorageResult<()>;

    /// Discard all staged mutations
    fn rollback(&self) -> StorageResult<()>;
}
