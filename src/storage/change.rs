// ============================================================================
// Staged Change Tracking
// ============================================================================
//
// Each mutation made against a store between two commits is journaled as a
// StagedChange holding what is needed to undo it. COMMIT drops the journal;
// ROLLBACK undoes it newest first.
//
// ============================================================================

use crate::core::{CatalogItem, ItemId};

/// A single uncommitted mutation.
#[derive(Debug, Clone)]
pub enum StagedChange {
    /// A new record; undone by removing `id`
    Insert { id: ItemId },

    /// Full overwrite; `old` is the record before the overwrite
    Update { old: CatalogItem },

    /// Removal; `old` is the removed record
    Delete { old: CatalogItem },
}

impl StagedChange {
    /// Id of the record affected by this change
    pub fn id(&self) -> ItemId {
        match self {
            StagedChange::Insert { id } => *id,
            StagedChange::Update { old } | StagedChange::Delete { old } => old.id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StagedChange::Insert { .. } => "insert",
            StagedChange::Update { .. } => "update",
            StagedChange::Delete { .. } => "delete",
        }
    }
}

/// Per-kind tally of a journal, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeSummary {
    pub inserts: usize,
    pub updates: usize,
    pub deletes: usize,
}

impl ChangeSummary {
    pub fn of(changes: &[StagedChange]) -> Self {
        changes.iter().fold(Self::default(), |mut summary, change| {
            match change {
                StagedChange::Insert { .. } => summary.inserts += 1,
                StagedChange::Update { .. } => summary.updates += 1,
                StagedChange::Delete { .. } => summary.deletes += 1,
            }
            summary
        })
    }

    pub fn total(&self) -> usize {
        self.inserts + self.updates + self.deletes
    }
}
