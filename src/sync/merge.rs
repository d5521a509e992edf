use crate::core::{CatalogItem, StorageResult};
use crate::storage::CatalogStore;
use tracing::{debug, info, warn};

/// Outcome of merging one remote snapshot into the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Items in the remote snapshot
    pub fetched: usize,
    /// Items that were new locally and got inserted
    pub inserted: usize,
    /// Items whose id already existed locally and were left untouched
    pub skipped: usize,
}

/// Additive-only merge of `fetched` into `store`.
///
/// Each item is inserted only if its id is absent; a stored record is never
/// overwritten and local records missing from the snapshot are never
/// removed. All inserts are committed as one batch. If any step fails the
/// batch is rolled back and the store keeps its previous contents.
pub fn merge_catalog(store: &dyn CatalogStore, fetched: Vec<CatalogItem>) -> StorageResult<MergeReport> {
    let mut report = MergeReport {
        fetched: fetched.len(),
        ..MergeReport::default()
    };

    if let Err(err) = stage_new_items(store, fetched, &mut report).and_then(|()| store.commit()) {
        if let Err(rollback_err) = store.rollback() {
            warn!(error = %rollback_err, "rollback after failed merge also failed");
        }
        return Err(err);
    }

    info!(
        fetched = report.fetched,
        inserted = report.inserted,
        skipped = report.skipped,
        "catalog merge committed"
    );
    Ok(report)
}

fn stage_new_items(
    store: &dyn CatalogStore,
    fetched: Vec<CatalogItem>,
    report: &mut MergeReport,
) -> StorageResult<()> {
    for item in fetched {
        if store.exists(item.id)? {
            debug!(id = item.id, "catalog item already stored, keeping local copy");
            report.skipped += 1;
            continue;
        }
        store.insert(item)?;
        report.inserted += 1;
    }
    Ok(())
}
