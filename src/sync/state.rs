// ============================================================================
// Observable Catalog State
// ============================================================================
//
// State machine of the sync coordinator:
//
//   Idle ──load_local──> LoadingLocal ──ok──> Idle
//     │                       └──StorageError──> Error
//     └──refresh──> Refreshing ──fetch+merge ok──> LoadingLocal ──> Idle
//                        └──NetworkError / StorageError──> Error
//
// Error is not terminal: any later successful operation returns to Idle.
//
// ============================================================================

use crate::core::{same_records, CatalogItem, ItemId};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Idle,
    LoadingLocal,
    /// Remote fetch plus merge in flight
    Refreshing,
    Error,
}

impl SyncState {
    pub fn is_refreshing(&self) -> bool {
        matches!(self, SyncState::Refreshing)
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncState::Idle => write!(f, "IDLE"),
            SyncState::LoadingLocal => write!(f, "LOADING_LOCAL"),
            SyncState::Refreshing => write!(f, "REFRESHING"),
            SyncState::Error => write!(f, "ERROR"),
        }
    }
}

/// Snapshot of everything the presentation layer can observe.
///
/// Two views are equal only if every field of every item matches, so an
/// edit that keeps the id still counts as a change.
#[derive(Debug, Clone, Default)]
pub struct CatalogView {
    pub state: SyncState,
    /// Canonical list: the store's contents in default sort order
    pub items: Vec<CatalogItem>,
    /// `items` narrowed by `search_text`, same relative order
    pub filtered: Vec<CatalogItem>,
    pub loading: bool,
    /// Last surfaced error; cleared by the next successful store or network operation
    pub error: Option<String>,
    pub search_text: String,
    /// Ids deleted from the view whose physical delete failed
    pub unsynced_deletes: BTreeSet<ItemId>,
}

impl CatalogView {
    /// Recompute `filtered` from `items` and `search_text`.
    pub(crate) fn refilter(&mut self) {
        self.filtered = filter_items(&self.items, &self.search_text);
    }

    /// Move to `next` unless a refresh is in flight.
    ///
    /// Only `begin_refresh` / `end_refresh` enter or leave `Refreshing`, so
    /// local operations finishing mid-refresh cannot open the guard early.
    pub(crate) fn transition(&mut self, next: SyncState) {
        if !self.state.is_refreshing() {
            self.state = next;
            self.loading = false;
        }
    }

    pub(crate) fn begin_refresh(&mut self) {
        self.state = SyncState::Refreshing;
        self.loading = true;
    }

    pub(crate) fn end_refresh(&mut self) {
        if self.state.is_refreshing() {
            self.state = SyncState::Idle;
            self.loading = false;
        }
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.transition(SyncState::Error);
    }

    pub(crate) fn succeed(&mut self) {
        self.error = None;
        self.transition(SyncState::Idle);
    }

}

impl PartialEq for CatalogView {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state
            && self.loading == other.loading
            && self.error == other.error
            && self.search_text == other.search_text
            && self.unsynced_deletes == other.unsynced_deletes
            && same_records(&self.items, &other.items)
            && same_records(&self.filtered, &other.filtered)
    }
}

/// Case-insensitive substring match on title or genre, preserving order.
pub fn filter_items(items: &[CatalogItem], search_text: &str) -> Vec<CatalogItem> {
    if search_text.is_empty() {
        return items.to_vec();
    }
    let needle = search_text.to_lowercase();
    items
        .iter()
        .filter(|item| item.matches_search(&needle))
        .cloned()
        .collect()
}
