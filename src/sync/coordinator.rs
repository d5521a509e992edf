use super::merge::{merge_catalog, MergeReport};
use super::state::{CatalogView, SyncState};
use crate::core::{CatalogItem, ItemId, Result, StorageResult};
use crate::remote::RemoteSource;
use crate::storage::{CatalogStore, ItemQuery};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// What `delete` does when the physical delete fails after the item was
/// already removed from the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteFailurePolicy {
    /// Roll the store back, reload the canonical list from it, and keep the
    /// deleted id hidden (tracked in `unsynced_deletes`) until
    /// `retry_pending_deletes` succeeds.
    #[default]
    Reconcile,
    /// Leave the view as-is; the next `load_local` brings the item back.
    KeepOptimistic,
}

impl FromStr for DeleteFailurePolicy {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().as_str() {
            "reconcile" => Ok(Self::Reconcile),
            "keep-optimistic" | "keep_optimistic" | "optimistic" => Ok(Self::KeepOptimistic),
            other => Err(format!(
                "unknown delete policy '{}', expected one of: reconcile, keep-optimistic",
                other
            )),
        }
    }
}

impl fmt::Display for DeleteFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reconcile => write!(f, "reconcile"),
            Self::KeepOptimistic => write!(f, "keep-optimistic"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The canonical list already holds items
    NotEmpty,
    /// Another refresh is still in flight
    InFlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No fetch was made
    Skipped(SkipReason),
    /// A snapshot was fetched and merged
    Merged(MergeReport),
}

/// Owner of the catalog's observable state.
///
/// All state lives behind one mutex that is never held across an await.
/// The remote fetch is the only suspension point; its result is applied
/// after re-acquiring the lock. Every state change is published as a new
/// [`CatalogView`] on the watch channel returned by [`subscribe`].
///
/// [`subscribe`]: SyncCoordinator::subscribe
pub struct SyncCoordinator {
    store: Arc<dyn CatalogStore>,
    remote: Arc<dyn RemoteSource>,
    delete_policy: DeleteFailurePolicy,
    state: Mutex<CatalogView>,
    notifier: watch::Sender<CatalogView>,
}

impl SyncCoordinator {
    pub fn new(store: Arc<dyn CatalogStore>, remote: Arc<dyn RemoteSource>) -> Self {
        Self::builder(store, remote).build()
    }

    pub fn builder(
        store: Arc<dyn CatalogStore>,
        remote: Arc<dyn RemoteSource>,
    ) -> SyncCoordinatorBuilder {
        SyncCoordinatorBuilder {
            store,
            remote,
            delete_policy: DeleteFailurePolicy::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Observation
    // -----------------------------------------------------------------------

    /// Current state snapshot
    pub fn view(&self) -> CatalogView {
        self.lock_state().clone()
    }

    /// Receiver that is updated after every state change.
    ///
    /// Views are published while the coordinator's state lock is held. Do not
    /// keep a `borrow()` guard alive across a call back into the coordinator:
    /// clone the view out (or use `borrow_and_update().clone()`) first, or a
    /// concurrent publish and the pending call end up waiting on each other.
    pub fn subscribe(&self) -> watch::Receiver<CatalogView> {
        self.notifier.subscribe()
    }

    /// Look up an item in the canonical list
    pub fn item(&self, id: ItemId) -> Option<CatalogItem> {
        self.lock_state().items.iter().find(|item| item.id == id).cloned()
    }

    pub fn delete_policy(&self) -> DeleteFailurePolicy {
        self.delete_policy
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Load local items and, if there are none, fetch the remote catalog.
    pub async fn bootstrap(&self) -> Result<RefreshOutcome> {
        self.load_local()?;
        self.refresh_if_empty().await
    }

    /// Republish the store's contents as the canonical list and filtered view.
    pub fn load_local(&self) -> Result<()> {
        let mut view = self.lock_state();
        self.reload(&mut view)
    }

    /// Fetch and merge the remote catalog, but only when the canonical list
    /// is empty and no refresh is already in flight.
    pub async fn refresh_if_empty(&self) -> Result<RefreshOutcome> {
        self.refresh_with(true).await
    }

    /// Fetch and merge the remote catalog even if local items exist.
    ///
    /// Merge rules are unchanged: only unknown ids are added. A refresh
    /// already in flight still suppresses this one.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        self.refresh_with(false).await
    }

    /// Update the active search text and recompute the filtered view.
    pub fn set_search_text(&self, text: impl Into<String>) {
        let mut view = self.lock_state();
        view.search_text = text.into();
        view.refilter();
        self.publish(&view);
    }

    /// Persist a full overwrite of `item`, then mirror it in the view.
    pub fn save(&self, item: CatalogItem) -> Result<()> {
        let id = item.id;
        let mut view = self.lock_state();

        if let Err(err) = self
            .store
            .update(item.clone())
            .and_then(|()| self.store.commit())
        {
            self.discard_staged();
            warn!(id, error = %err, "failed to save catalog item");
            view.fail(format!("Failed to save game: {}", err));
            self.publish(&view);
            return Err(err.into());
        }

        if let Some(slot) = view.items.iter_mut().find(|current| current.id == id) {
            *slot = item;
        }
        view.refilter();
        view.succeed();
        self.publish(&view);
        info!(id, "catalog item saved");
        Ok(())
    }

    /// Remove `item` from the view immediately, then from the store.
    ///
    /// The item stays out of the view even if the physical delete fails;
    /// what happens next is governed by [`DeleteFailurePolicy`].
    pub fn delete(&self, item: &CatalogItem) -> Result<()> {
        let id = item.id;
        let mut view = self.lock_state();

        view.items.retain(|current| current.id != id);
        view.filtered.retain(|current| current.id != id);
        self.publish(&view);

        match self.store.delete(id).and_then(|()| self.store.commit()) {
            Ok(()) => {
                view.unsynced_deletes.remove(&id);
                view.succeed();
                self.publish(&view);
                info!(id, "catalog item deleted");
                Ok(())
            }
            Err(err) => {
                self.discard_staged();
                warn!(id, error = %err, policy = %self.delete_policy, "failed to delete catalog item");

                // Re-read without publishing; the next published view is the failure.
                if self.delete_policy == DeleteFailurePolicy::Reconcile {
                    view.unsynced_deletes.insert(id);
                    if let Err(reload_err) = self.read_store(&mut view) {
                        debug!(error = %reload_err, "reconcile reload after failed delete failed");
                    }
                }

                view.fail(format!("Failed to delete game: {}", err));
                self.publish(&view);
                Err(err.into())
            }
        }
    }

    /// Retry the physical delete of every id in `unsynced_deletes`.
    ///
    /// Returns how many ids were deleted.
    pub fn retry_pending_deletes(&self) -> Result<usize> {
        let mut view = self.lock_state();
        if view.unsynced_deletes.is_empty() {
            return Ok(0);
        }
        let ids: Vec<ItemId> = view.unsynced_deletes.iter().copied().collect();

        let result = ids
            .iter()
            .try_for_each(|&id| self.store.delete(id))
            .and_then(|()| self.store.commit());

        match result {
            Ok(()) => {
                view.unsynced_deletes.clear();
                view.succeed();
                self.publish(&view);
                info!(count = ids.len(), "pending catalog deletes applied");
                Ok(ids.len())
            }
            Err(err) => {
                self.discard_staged();
                warn!(count = ids.len(), error = %err, "retrying pending deletes failed");
                view.fail(format!("Failed to delete game: {}", err));
                self.publish(&view);
                Err(err.into())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn refresh_with(&self, require_empty: bool) -> Result<RefreshOutcome> {
        {
            let mut view = self.lock_state();
            if view.state.is_refreshing() {
                debug!("refresh already in flight, skipping");
                return Ok(RefreshOutcome::Skipped(SkipReason::InFlight));
            }
            if require_empty && !view.items.is_empty() {
                debug!(items = view.items.len(), "local catalog not empty, skipping refresh");
                return Ok(RefreshOutcome::Skipped(SkipReason::NotEmpty));
            }
            view.begin_refresh();
            self.publish(&view);
        }

        let mut in_flight = InFlight::new(self);
        let fetched = self.remote.fetch_catalog().await;
        in_flight.disarm();

        let mut view = self.lock_state();
        view.end_refresh();

        let items = match fetched {
            Ok(items) => items,
            Err(err) => {
                warn!(error = %err, "remote catalog fetch failed");
                view.fail(err.to_string());
                self.publish(&view);
                return Err(err.into());
            }
        };

        let report = match merge_catalog(self.store.as_ref(), items) {
            Ok(report) => report,
            Err(err) => {
                warn!(error = %err, "failed to merge remote catalog");
                view.fail(format!("Failed to save games to local storage: {}", err));
                self.publish(&view);
                return Err(err.into());
            }
        };

        self.reload(&mut view)?;
        Ok(RefreshOutcome::Merged(report))
    }

    fn reload(&self, view: &mut CatalogView) -> Result<()> {
        view.transition(SyncState::LoadingLocal);
        self.publish(view);

        match self.read_store(view) {
            Ok(()) => {
                view.succeed();
                self.publish(view);
                debug!(items = view.items.len(), "catalog loaded from local store");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "failed to load catalog from local store");
                view.fail(format!("Failed to fetch games from local storage: {}", err));
                self.publish(view);
                Err(err.into())
            }
        }
    }

    /// Replace the canonical list with the store's contents, minus ids whose
    /// delete is still pending. Leaves `state` and `error` alone.
    fn read_store(&self, view: &mut CatalogView) -> StorageResult<()> {
        let mut items = self.store.query(&ItemQuery::new())?;
        if !view.unsynced_deletes.is_empty() {
            items.retain(|item| !view.unsynced_deletes.contains(&item.id));
        }
        view.items = items;
        view.refilter();
        Ok(())
    }

    fn discard_staged(&self) {
        if let Err(err) = self.store.rollback() {
            warn!(error = %err, "rollback of staged catalog changes failed");
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, CatalogView> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, view: &CatalogView) {
        self.notifier.send_replace(view.clone());
    }
}

pub struct SyncCoordinatorBuilder {
    store: Arc<dyn CatalogStore>,
    remote: Arc<dyn RemoteSource>,
    delete_policy: DeleteFailurePolicy,
}

impl SyncCoordinatorBuilder {
    pub fn delete_policy(mut self, policy: DeleteFailurePolicy) -> Self {
        self.delete_policy = policy;
        self
    }

    pub fn build(self) -> SyncCoordinator {
        let (notifier, _) = watch::channel(CatalogView::default());
        SyncCoordinator {
            store: self.store,
            remote: self.remote,
            delete_policy: self.delete_policy,
            state: Mutex::new(CatalogView::default()),
            notifier,
        }
    }
}

/// Returns the coordinator to `Idle` if a refresh future is dropped before
/// its fetch completes, so the in-flight guard cannot stay closed forever.
struct InFlight<'a> {
    coordinator: &'a SyncCoordinator,
    armed: bool,
}

impl<'a> InFlight<'a> {
    fn new(coordinator: &'a SyncCoordinator) -> Self {
        Self { coordinator, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut view = self.coordinator.lock_state();
        if view.state.is_refreshing() {
            view.end_refresh();
            self.coordinator.publish(&view);
            debug!("refresh cancelled before the fetch completed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_policy_parses() {
        assert_eq!(
            "reconcile".parse::<DeleteFailurePolicy>(),
            Ok(DeleteFailurePolicy::Reconcile)
        );
        assert_eq!(
            "Keep-Optimistic".parse::<DeleteFailurePolicy>(),
            Ok(DeleteFailurePolicy::KeepOptimistic)
        );
        assert!("sometimes".parse::<DeleteFailurePolicy>().is_err());
    }

    #[test]
    fn test_delete_policy_display_round_trips() {
        for policy in [DeleteFailurePolicy::Reconcile, DeleteFailurePolicy::KeepOptimistic] {
            assert_eq!(policy.to_string().parse::<DeleteFailurePolicy>(), Ok(policy));
        }
    }
}
