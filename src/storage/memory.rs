use super::change::{ChangeSummary, StagedChange};
use super::persistence::{CatalogSnapshot, SnapshotManager};
use super::query::ItemQuery;
use super::store::CatalogStore;
use crate::core::{CatalogItem, ItemId, StorageError, StorageResult};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, trace, warn};

type Table = BTreeMap<ItemId, CatalogItem>;

#[derive(Debug, Default)]
struct StoreState {
    /// Committed contents with the journal applied
    table: Table,
    /// Mutations since the last commit, oldest first
    journal: Vec<StagedChange>,
}

impl StoreState {
    fn from_table(table: Table) -> Self {
        Self {
            table,
            journal: Vec::new(),
        }
    }

    /// Undo staged changes newest first, restoring the committed contents.
    fn discard_staged(&mut self) {
        while let Some(change) = self.journal.pop() {
            trace!(id = change.id(), kind = change.kind(), "undo staged change");
            match change {
                StagedChange::Insert { id } => {
                    self.table.remove(&id);
                }
                StagedChange::Update { old } | StagedChange::Delete { old } => {
                    self.table.insert(old.id, old);
                }
            }
        }
    }
}

/// Catalog table held in memory, optionally backed by a snapshot file.
///
/// Without persistence the store lives as long as the process (previews,
/// tests). With persistence every commit rewrites the snapshot in full, and
/// the commit only takes effect if that write succeeds.
#[derive(Debug)]
pub struct InMemoryCatalogStore {
    state: Mutex<StoreState>,
    persistence: Option<SnapshotManager>,
}

impl InMemoryCatalogStore {
    /// Volatile, empty store
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            persistence: None,
        }
    }

    /// Volatile store seeded with `items`.
    ///
    /// Later duplicates of an id are dropped.
    pub fn with_items(items: impl IntoIterator<Item = CatalogItem>) -> Self {
        let mut table = Table::new();
        for item in items {
            table.entry(item.id).or_insert(item);
        }
        Self {
            state: Mutex::new(StoreState::from_table(table)),
            persistence: None,
        }
    }

    /// Volatile store holding the ten-item preview fixture
    pub fn preview() -> Self {
        Self::with_items(CatalogItem::preview_set(10))
    }

    /// Durable store whose snapshot lives in `data_dir`.
    ///
    /// Loads the existing snapshot if there is one.
    pub fn open<P: AsRef<Path>>(data_dir: P) -> StorageResult<Self> {
        let manager = SnapshotManager::in_dir(data_dir);
        let mut table = Table::new();

        if let Some(snapshot) = manager.load()? {
            for item in snapshot.items {
                let id = item.id;
                if table.insert(id, item).is_some() {
                    return Err(StorageError::Corrupt(format!(
                        "snapshot holds catalog item {} more than once",
                        id
                    )));
                }
            }
        }

        info!(
            path = %manager.path().display(),
            items = table.len(),
            "catalog store opened"
        );

        Ok(Self {
            state: Mutex::new(StoreState::from_table(table)),
            persistence: Some(manager),
        })
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.persistence.as_ref().map(SnapshotManager::path)
    }

    /// Number of staged, uncommitted mutations
    pub fn pending_changes(&self) -> StorageResult<usize> {
        Ok(self.lock()?.journal.len())
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, StoreState>> {
        Ok(self.state.lock()?)
    }
}

impl Default for InMemoryCatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore for InMemoryCatalogStore {
    fn query(&self, query: &ItemQuery) -> StorageResult<Vec<CatalogItem>> {
        let state = self.lock()?;
        Ok(query.execute(state.table.values()))
    }

    fn get(&self, id: ItemId) -> StorageResult<Option<CatalogItem>> {
        Ok(self.lock()?.table.get(&id).cloned())
    }

    fn exists(&self, id: ItemId) -> StorageResult<bool> {
        Ok(self.lock()?.table.contains_key(&id))
    }

    fn count(&self) -> StorageResult<usize> {
        Ok(self.lock()?.table.len())
    }

    fn insert(&self, item: CatalogItem) -> StorageResult<()> {
        let mut state = self.lock()?;
        if state.table.contains_key(&item.id) {
            return Err(StorageError::DuplicateId(item.id));
        }
        state.journal.push(StagedChange::Insert { id: item.id });
        state.table.insert(item.id, item);
        Ok(())
    }

    fn update(&self, item: CatalogItem) -> StorageResult<()> {
        let mut state = self.lock()?;
        if !state.table.contains_key(&item.id) {
            return Err(StorageError::NotFound(item.id));
        }
        if let Some(old) = state.table.insert(item.id, item) {
            state.journal.push(StagedChange::Update { old });
        }
        Ok(())
    }

    fn delete(&self, id: ItemId) -> StorageResult<()> {
        let mut state = self.lock()?;
        if let Some(old) = state.table.remove(&id) {
            state.journal.push(StagedChange::Delete { old });
        }
        Ok(())
    }

    fn commit(&self) -> StorageResult<()> {
        let mut state = self.lock()?;
        if state.journal.is_empty() {
            return Ok(());
        }
        let summary = ChangeSummary::of(&state.journal);

        if let Some(manager) = &self.persistence {
            let snapshot = CatalogSnapshot::new(state.table.values().cloned().collect());
            if let Err(err) = manager.save(&snapshot) {
                warn!(error = %err, pending = summary.total(), "catalog commit failed, staged changes discarded");
                state.discard_staged();
                return Err(err);
            }
        }

        state.journal.clear();
        debug!(
            inserts = summary.inserts,
            updates = summary.updates,
            deletes = summary.deletes,
            "catalog commit"
        );
        Ok(())
    }

    fn rollback(&self) -> StorageResult<()> {
        let mut state = self.lock()?;
        if !state.journal.is_empty() {
            debug!(pending = state.journal.len(), "catalog rollback");
        }
        state.discard_staged();
        Ok(())
    }
}
