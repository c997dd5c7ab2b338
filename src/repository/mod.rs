//! Catalog repository: page streams and lookup-or-fetch over one cache
//!
//! Composes the page fetcher with the bounded cache. The repository is the
//! exclusive owner of the cache instance — everything that touches it goes
//! through this type, including the synchronous seed path. Caching is a
//! transparent side effect of the page stream: consumers just see pages.

use std::num::NonZeroU32;
use std::sync::Arc;

use async_stream::try_stream;
use futures::StreamExt;
use futures::stream::BoxStream;
use tracing::debug;

use crate::cache::{BoundedCache, CacheStats};
use crate::client::CatalogApi;
use crate::config::Config;
use crate::errors::{CatalogError, CatalogResult};
use crate::fetcher::PageFetcher;
use crate::models::{CatalogItem, PageRequest, PageResult};

/// Fetch-and-cache orchestration for one catalog service
pub struct CatalogRepository {
    api: Arc<dyn CatalogApi>,
    fetcher: PageFetcher,
    cache: Arc<BoundedCache>,
    page_size: NonZeroU32,
}

impl CatalogRepository {
    /// Build a repository owning a fresh cache sized from `config`
    pub fn new(api: Arc<dyn CatalogApi>, config: &Config) -> Result<Self, CatalogError> {
        let page_size = NonZeroU32::new(config.paging.page_size)
            .ok_or_else(|| CatalogError::configuration("paging.page_size must be > 0"))?;
        let cache = Arc::new(BoundedCache::from_config(&config.cache)?);
        Ok(Self {
            api: Arc::clone(&api),
            fetcher: PageFetcher::new(api),
            cache,
            page_size,
        })
    }

    /// Restartable page stream for one logical query
    ///
    /// Fetches page 0, 1, … on demand as the consumer polls; every item is
    /// inserted into the cache before its page is yielded. The stream ends
    /// after the first page with an absent `next_key`, or after yielding a
    /// single error. Calling again (same or different query) starts an
    /// independent sequence; ordering across two streams is unspecified.
    pub fn page_stream(&self, query: &str) -> BoxStream<'static, CatalogResult<PageResult>> {
        let fetcher = self.fetcher.clone();
        let cache = Arc::clone(&self.cache);
        let page_size = self.page_size;
        let query = query.to_string();

        try_stream! {
            let mut page_index = 0u32;
            loop {
                let request = PageRequest::new(query.clone(), page_index, page_size);
                let page = fetcher.fetch_page(&request).await?;
                for item in &page.items {
                    cache.put(item.clone());
                }
                let next_key = page.next_key;
                yield page;
                match next_key {
                    Some(next) => page_index = next,
                    None => break,
                }
            }
        }
        .boxed()
    }

    /// Return the cached item, or fetch, cache and return it
    ///
    /// A cache hit performs no network call. Fetch failures surface
    /// unchanged and leave the cache untouched; re-invoking with the same
    /// identity is always safe.
    pub async fn get_item(&self, id: &str) -> CatalogResult<CatalogItem> {
        if let Some(item) = self.cache.get(id) {
            debug!(item_id = %id, "item served from cache");
            return Ok(item);
        }

        let item = self.api.get_by_id(id).await?;
        self.cache.put(item.clone());
        Ok(item)
    }

    /// Synchronously seed the cache (e.g. "this item is about to be
    /// viewed"); same eviction and accounting path as the fetch side
    pub fn seed(&self, item: CatalogItem) {
        self.cache.put(item);
    }

    /// True when the identity is currently resident in the cache
    pub fn is_cached(&self, id: &str) -> bool {
        self.cache.contains(id)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
