//! Integration tests for the snapshot-backed catalog store

mod common;

use common::{halo_and_chess, titles, ScriptedRemote};
use game_catalog::storage::{CatalogStore, InMemoryCatalogStore, ItemQuery, SNAPSHOT_FILE};
use game_catalog::{CatalogConfig, CatalogItem, SortDirection, SortField, StorageError, SyncCoordinator};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Swap the data directory for a plain file so the next snapshot write fails.
fn block_data_dir(dir: &Path) {
    fs::remove_dir_all(dir).unwrap();
    fs::write(dir, b"not a directory").unwrap();
}

#[test]
fn test_committed_items_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("catalog");

    {
        let store = InMemoryCatalogStore::open(&data_dir).unwrap();
        for item in halo_and_chess() {
            store.insert(item).unwrap();
        }
        store.commit().unwrap();
        store.delete(2).unwrap();
        store.update(CatalogItem::new(1, "Halo 2").with_genre("Shooter")).unwrap();
        store.commit().unwrap();
    }

    assert!(data_dir.join(SNAPSHOT_FILE).exists());

    let reopened = InMemoryCatalogStore::open(&data_dir).unwrap();
    let items = reopened.query(&ItemQuery::new()).unwrap();
    assert_eq!(titles(&items), vec!["Halo 2"]);
    assert_eq!(items[0].genre, "Shooter");
}

#[test]
fn test_failed_commit_keeps_previous_contents() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("catalog");
    let store = InMemoryCatalogStore::open(&data_dir).unwrap();
    store.insert(CatalogItem::new(1, "Halo")).unwrap();
    store.commit().unwrap();

    block_data_dir(&data_dir);

    store.insert(CatalogItem::new(2, "Chess")).unwrap();
    store.update(CatalogItem::new(1, "Halo Reach")).unwrap();
    let err = store.commit().unwrap_err();

    assert!(matches!(err, StorageError::Write(_)));
    assert_eq!(store.pending_changes().unwrap(), 0);
    assert_eq!(store.count().unwrap(), 1);
    assert_eq!(store.get(1).unwrap().unwrap().title, "Halo");
    assert!(!store.exists(2).unwrap());
}

#[test]
fn test_query_filters_sorts_and_limits_stored_rows() {
    let store = InMemoryCatalogStore::with_items(vec![
        CatalogItem::new(1, "Warframe").with_genre("Shooter").with_platform("PC (Windows)").with_release_date("2013-03-25"),
        CatalogItem::new(2, "Hearthstone").with_genre("Card Game").with_platform("PC (Windows)").with_release_date("2014-03-11"),
        CatalogItem::new(3, "Krunker").with_genre("Shooter").with_platform("Web Browser").with_release_date("2018-04-01"),
        CatalogItem::new(4, "Apex Legends").with_genre("Shooter").with_platform("PC (Windows)").with_release_date("2019-02-04"),
    ]);

    let shooters = store
        .query(
            &ItemQuery::new()
                .genre("shooter")
                .platform("pc (windows)")
                .sort_by(SortField::ReleaseDate, SortDirection::Descending),
        )
        .unwrap();
    assert_eq!(titles(&shooters), vec!["Apex Legends", "Warframe"]);

    let first_two = store.query(&ItemQuery::new().limit(2)).unwrap();
    assert_eq!(titles(&first_two), vec!["Apex Legends", "Hearthstone"]);

    let searched = store.query(&ItemQuery::new().search("KRUNK")).unwrap();
    assert_eq!(titles(&searched), vec!["Krunker"]);
}

#[test]
fn test_open_rejects_corrupt_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join(SNAPSHOT_FILE), b"\x00\x01garbage").unwrap();

    let err = InMemoryCatalogStore::open(temp_dir.path()).unwrap_err();
    assert!(matches!(err, StorageError::Corrupt(_)));
}

#[test]
fn test_config_opens_store_in_data_dir() {
    let temp_dir = TempDir::new().unwrap();
    let config = CatalogConfig::default().data_dir(temp_dir.path().join("nested"));

    let store = config.open_store().unwrap();
    assert_eq!(
        store.snapshot_path(),
        Some(temp_dir.path().join("nested").join(SNAPSHOT_FILE).as_path())
    );
    assert_eq!(store.count().unwrap(), 0);
}

#[tokio::test]
async fn test_coordinator_changes_persist_across_restart() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().to_path_buf();

    {
        let store = Arc::new(InMemoryCatalogStore::open(&data_dir).unwrap());
        let remote = Arc::new(ScriptedRemote::returning(halo_and_chess()));
        let catalog = SyncCoordinator::new(store, remote);
        catalog.bootstrap().await.unwrap();

        let mut halo = catalog.item(1).unwrap();
        halo.title = "Halo Infinite".to_string();
        catalog.save(halo).unwrap();
        let chess = catalog.item(2).unwrap();
        catalog.delete(&chess).unwrap();
    }

    let store = Arc::new(InMemoryCatalogStore::open(&data_dir).unwrap());
    let remote = Arc::new(ScriptedRemote::returning(vec![CatalogItem::new(3, "Unused")]));
    let catalog = SyncCoordinator::new(store, remote.clone());
    catalog.bootstrap().await.unwrap();

    assert_eq!(remote.calls(), 0);
    assert_eq!(titles(&catalog.view().items), vec!["Halo Infinite"]);
}

#[tokio::test]
async fn test_coordinator_save_failure_on_durable_store() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("catalog");
    let store = Arc::new(InMemoryCatalogStore::open(&data_dir).unwrap());
    let catalog = SyncCoordinator::new(store.clone(), Arc::new(ScriptedRemote::returning(halo_and_chess())));
    catalog.bootstrap().await.unwrap();

    block_data_dir(&data_dir);

    let mut halo = catalog.item(1).unwrap();
    halo.title = "Unsaved".to_string();
    assert!(catalog.save(halo).is_err());

    assert_eq!(catalog.item(1).unwrap().title, "Halo");
    assert_eq!(store.get(1).unwrap().unwrap().title, "Halo");
    assert!(catalog.view().error.is_some());
}
