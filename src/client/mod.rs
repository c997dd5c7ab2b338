//! Typed client for the remote catalog API
//!
//! [`CatalogApi`] is the collaborator boundary: the rest of the crate
//! talks to the remote only through it, which keeps the transport
//! swappable and the orchestration layers testable without a network.
//! [`GiphyApiClient`] is the production implementation over `reqwest`.
//!
//! The client shapes requests and parses responses; it carries no retry,
//! caching or pagination logic.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::config::ApiConfig;
use crate::errors::{CatalogError, CatalogResult};
use crate::models::{CatalogItem, ItemResponse, SearchResponse};

/// Request/response contract of the remote catalog service
///
/// All three operations are remote calls keyed by the API key supplied at
/// construction time. `limit`/`offset` form the shared pagination pair of
/// the two listing endpoints.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Keyword search, server-ordered
    async fn search(&self, query: &str, limit: u32, offset: u64) -> CatalogResult<SearchResponse>;

    /// Currently-trending items, server-ordered
    async fn trending(&self, limit: u32, offset: u64) -> CatalogResult<SearchResponse>;

    /// Single-item lookup by identity
    async fn get_by_id(&self, id: &str) -> CatalogResult<CatalogItem>;
}

/// `reqwest`-backed [`CatalogApi`] implementation for the GIPHY-shaped API
#[derive(Debug)]
pub struct GiphyApiClient {
    client: Client,
    base_url: Url,
    api_key: String,
    rating: String,
    lang: String,
}

impl GiphyApiClient {
    /// Build a client from configuration
    ///
    /// Only a connection timeout is set; total request time stays with the
    /// transport so long transfers are not cut off by this layer.
    pub fn new(config: &ApiConfig) -> CatalogResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(CatalogError::configuration("api.api_key must be set"));
        }
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            CatalogError::configuration(format!("invalid base URL '{}': {e}", config.base_url))
        })?;
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| CatalogError::configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
            rating: config.rating.clone(),
            lang: config.lang.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> CatalogResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| CatalogError::configuration(format!("invalid endpoint '{path}': {e}")))
    }

    async fn get_json<T>(&self, url: Url, params: &[(&str, &str)]) -> CatalogResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self
            .client
            .get(url.clone())
            .query(params)
            .send()
            .await
            .map_err(CatalogError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::protocol_status(
                status.as_u16(),
                format!(
                    "{} for {}",
                    status.canonical_reason().unwrap_or("HTTP error"),
                    url.path()
                ),
            ));
        }

        response.json::<T>().await.map_err(CatalogError::from_reqwest)
    }
}

#[async_trait]
impl CatalogApi for GiphyApiClient {
    async fn search(&self, query: &str, limit: u32, offset: u64) -> CatalogResult<SearchResponse> {
        debug!(query, limit, offset, "fetching search page");
        let url = self.endpoint("v1/gifs/search")?;
        self.get_json(
            url,
            &[
                ("api_key", self.api_key.as_str()),
                ("q", query),
                ("limit", &limit.to_string()),
                ("offset", &offset.to_string()),
                ("rating", self.rating.as_str()),
                ("lang", self.lang.as_str()),
            ],
        )
        .await
    }

    async fn trending(&self, limit: u32, offset: u64) -> CatalogResult<SearchResponse> {
        debug!(limit, offset, "fetching trending page");
        let url = self.endpoint("v1/gifs/trending")?;
        self.get_json(
            url,
            &[
                ("api_key", self.api_key.as_str()),
                ("limit", &limit.to_string()),
                ("offset", &offset.to_string()),
                ("rating", self.rating.as_str()),
            ],
        )
        .await
    }

    async fn get_by_id(&self, id: &str) -> CatalogResult<CatalogItem> {
        debug!(item_id = %id, "fetching single item");
        let url = self.endpoint(&format!("v1/gifs/{id}"))?;
        let response: ItemResponse = self
            .get_json(url, &[("api_key", self.api_key.as_str())])
            .await?;
        Ok(response.data)
    }
}
