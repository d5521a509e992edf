use super::RemoteSource;
use crate::core::{CatalogItem, NetworkError, NetworkResult, RemoteCatalogItem};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_CATALOG_URL: &str = "https://www.freetogame.com/api/games";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Fetches the catalog with a single GET against a fixed URL.
///
/// The URL is checked when a fetch starts, so a malformed URL surfaces as
/// `NetworkError::InvalidUrl` through the same path as any other fetch
/// failure.
#[derive(Debug, Clone)]
pub struct HttpCatalogFetcher {
    client: Client,
    url: String,
}

impl HttpCatalogFetcher {
    pub fn new(url: impl Into<String>) -> NetworkResult<Self> {
        Self::builder(url).build()
    }

    pub fn builder(url: impl Into<String>) -> HttpCatalogFetcherBuilder {
        HttpCatalogFetcherBuilder {
            url: url.into(),
            timeout: None,
        }
    }

    /// Parse and check the configured URL.
    pub fn parse_url(raw: &str) -> NetworkResult<Url> {
        let url = Url::parse(raw).map_err(|e| NetworkError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(NetworkError::InvalidUrl {
                url: raw.to_string(),
                reason: format!("unsupported scheme '{}'", scheme),
            }),
        }
    }
}

#[async_trait]
impl RemoteSource for HttpCatalogFetcher {
    async fn fetch_catalog(&self) -> NetworkResult<Vec<CatalogItem>> {
        let url = Self::parse_url(&self.url)?;
        debug!(url = %url, "fetching remote catalog");

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let wire: Vec<RemoteCatalogItem> = serde_json::from_slice(&body)?;
        let items = wire
            .into_iter()
            .map(RemoteCatalogItem::normalize)
            .collect::<NetworkResult<Vec<_>>>()?;

        info!(items = items.len(), bytes = body.len(), "remote catalog fetched");
        Ok(items)
    }
}

#[derive(Debug, Clone)]
pub struct HttpCatalogFetcherBuilder {
    url: String,
    timeout: Option<Duration>,
}

impl HttpCatalogFetcherBuilder {
    /// Transport-level limit for the whole request
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> NetworkResult<HttpCatalogFetcher> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(HttpCatalogFetcher {
            client,
            url: self.url,
        })
    }
}
