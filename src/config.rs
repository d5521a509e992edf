use crate::core::{NetworkResult, StorageResult};
use crate::remote::{HttpCatalogFetcher, DEFAULT_CATALOG_URL};
use crate::storage::InMemoryCatalogStore;
use crate::sync::DeleteFailurePolicy;
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DATA_DIR: &str = "./data";

/// Runtime configuration of the catalog core
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Endpoint serving the full catalog as a JSON array
    pub catalog_url: String,

    /// Directory holding the local snapshot
    pub data_dir: PathBuf,

    /// Transport timeout for the catalog request
    pub request_timeout: Option<Duration>,

    /// How a failed physical delete is reconciled
    pub delete_policy: DeleteFailurePolicy,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            request_timeout: None,
            delete_policy: DeleteFailurePolicy::default(),
        }
    }
}

impl CatalogConfig {
    /// Read configuration from the process environment (and `.env`, if present).
    ///
    /// | variable                       | default                                 |
    /// |--------------------------------|-----------------------------------------|
    /// | `CATALOG_URL`                  | `https://www.freetogame.com/api/games`  |
    /// | `CATALOG_DATA_DIR`             | `./data`                                |
    /// | `CATALOG_REQUEST_TIMEOUT_SECS` | unset (no timeout)                      |
    /// | `CATALOG_DELETE_POLICY`        | `reconcile`                             |
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("CATALOG_URL") {
            config.catalog_url = url;
        }

        if let Some(dir) = lookup("CATALOG_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        if let Some(raw) = lookup("CATALOG_REQUEST_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .context("CATALOG_REQUEST_TIMEOUT_SECS must be a whole number of seconds")?;
            anyhow::ensure!(secs > 0, "CATALOG_REQUEST_TIMEOUT_SECS must be greater than zero");
            config.request_timeout = Some(Duration::from_secs(secs));
        }

        if let Some(raw) = lookup("CATALOG_DELETE_POLICY") {
            config.delete_policy = raw
                .parse::<DeleteFailurePolicy>()
                .map_err(anyhow::Error::msg)
                .context("CATALOG_DELETE_POLICY is invalid")?;
        }

        Ok(config)
    }

    /// Set the catalog URL
    pub fn catalog_url(mut self, url: impl Into<String>) -> Self {
        self.catalog_url = url.into();
        self
    }

    /// Set the data directory
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Set the request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the delete failure policy
    pub fn delete_policy(mut self, policy: DeleteFailurePolicy) -> Self {
        self.delete_policy = policy;
        self
    }

    pub fn fetcher(&self) -> NetworkResult<HttpCatalogFetcher> {
        let mut builder = HttpCatalogFetcher::builder(self.catalog_url.clone());
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }

    pub fn open_store(&self) -> StorageResult<InMemoryCatalogStore> {
        InMemoryCatalogStore::open(&self.data_dir)
    }
}
