pub mod error;
pub mod item;

pub use error::{
    CatalogError, NetworkError, NetworkResult, Result, StorageError, StorageResult,
};
pub use item::{same_records, CatalogItem, ItemId, RemoteCatalogItem};
