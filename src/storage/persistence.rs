//! Snapshot persistence for the catalog store

use crate::core::{CatalogItem, StorageError, StorageResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const SNAPSHOT_FILE: &str = "catalog.snapshot";
pub const SNAPSHOT_VERSION: u32 = 1;

// ============================================================================
// Catalog Snapshot
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub version: u32,
    pub items: Vec<CatalogItem>,
    pub metadata: SnapshotMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub created_at: DateTime<Utc>,
    pub item_count: usize,
}

impl CatalogSnapshot {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        let item_count = items.len();
        Self {
            version: SNAPSHOT_VERSION,
            items,
            metadata: SnapshotMetadata { created_at: Utc::now(), item_count },
        }
    }
}

// ============================================================================
// Snapshot Manager
// ============================================================================

/// Reads and atomically replaces a single snapshot file.
///
/// A save writes to a temporary file next to the destination, syncs it and
/// renames it into place, so readers only ever observe the previous or the
/// new snapshot in full.
#[derive(Debug, Clone)]
pub struct SnapshotManager {
    snapshot_path: PathBuf,
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(snapshot_path: P) -> Self {
        Self {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
        }
    }

    /// Manager for the default snapshot file inside `data_dir`.
    pub fn in_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        Self::new(data_dir.as_ref().join(SNAPSHOT_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn save(&self, snapshot: &CatalogSnapshot) -> StorageResult<()> {
        let parent = match self.snapshot_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)
            .map_err(|e| StorageError::Write(format!("Failed to create snapshot directory: {}", e)))?;

        let serialized = rmp_serde::to_vec_named(snapshot)
            .map_err(|e| StorageError::Write(format!("Failed to serialize snapshot: {}", e)))?;

        let mut temp = NamedTempFile::new_in(parent)
            .map_err(|e| StorageError::Write(format!("Failed to create temp file: {}", e)))?;
        temp.write_all(&serialized)
            .map_err(|e| StorageError::Write(format!("Failed to write snapshot: {}", e)))?;
        temp.flush()
            .map_err(|e| StorageError::Write(format!("Failed to flush snapshot: {}", e)))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| StorageError::Write(format!("Failed to sync snapshot: {}", e)))?;
        temp.persist(&self.snapshot_path)
            .map_err(|e| StorageError::Write(format!("Failed to rename snapshot: {}", e.error)))?;
        Ok(())
    }

    pub fn load(&self) -> StorageResult<Option<CatalogSnapshot>> {
        if !self.snapshot_path.exists() {
            return Ok(None);
        }
        let data = fs::read(&self.snapshot_path)
            .map_err(|e| StorageError::Read(format!("Failed to read snapshot: {}", e)))?;
        let snapshot: CatalogSnapshot = rmp_serde::from_slice(&data)
            .map_err(|e| StorageError::Corrupt(format!("Failed to deserialize snapshot: {}", e)))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StorageError::Corrupt(format!(
                "Unsupported snapshot version {}",
                snapshot.version
            )));
        }
        Ok(Some(snapshot))
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_snapshot_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SnapshotManager::in_dir(temp_dir.path());
        assert!(!manager.path().exists());
        assert!(manager.load().unwrap().is_none());

        let snapshot = CatalogSnapshot::new(CatalogItem::preview_set(4));
        manager.save(&snapshot).unwrap();
        assert!(manager.path().exists());

        let loaded = manager.load().unwrap().unwrap();
        assert_eq!(loaded.metadata.item_count, 4);
        assert_eq!(loaded.items[3].title, "Game 3");
        assert_eq!(loaded.items[3].genre, "Genre 3");
    }

    #[test]
    fn test_save_replaces_previous_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SnapshotManager::in_dir(temp_dir.path());

        manager.save(&CatalogSnapshot::new(CatalogItem::preview_set(5))).unwrap();
        manager.save(&CatalogSnapshot::new(CatalogItem::preview_set(2))).unwrap();

        let loaded = manager.load().unwrap().unwrap();
        assert_eq!(loaded.items.len(), 2);

        // Only the snapshot itself remains; temp files were renamed away.
        let entries = fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_garbage_snapshot_is_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SnapshotManager::in_dir(temp_dir.path());
        fs::write(manager.path(), b"not a snapshot").unwrap();

        let err = manager.load().unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(_)));
    }

    #[test]
    fn test_save_into_unwritable_location_fails() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, b"file, not a directory").unwrap();

        let manager = SnapshotManager::in_dir(blocker.join("nested"));
        let err = manager.save(&CatalogSnapshot::new(Vec::new())).unwrap_err();
        assert!(matches!(err, StorageError::Write(_)));
    }
}
