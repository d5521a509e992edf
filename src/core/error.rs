use thiserror::Error;

/// Failures of the local persistent store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Read failed: {0}")]
    Read(String),

    #[error("Write failed: {0}")]
    Write(String),

    #[error("Catalog item {0} not found")]
    NotFound(i64),

    #[error("Catalog item {0} already exists")]
    DuplicateId(i64),

    #[error("Corrupt snapshot: {0}")]
    Corrupt(String),

    #[error("Lock error: {0}")]
    Lock(String),
}

/// Failures of the remote catalog source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid catalog URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Catalog endpoint answered with HTTP {0}")]
    Status(u16),

    #[error("Failed to decode catalog payload: {0}")]
    Decode(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Network(#[from] NetworkError),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;
pub type NetworkResult<T> = std::result::Result<T, NetworkError>;
pub type Result<T> = std::result::Result<T, CatalogError>;

impl<T> From<std::sync::PoisonError<T>> for StorageError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Lock(err.to_string())
    }
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for NetworkError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
