//! Page fetcher: one remote call per page, filtered and cursor-annotated
//!
//! Turns a zero-based page request into a bounded offset query against the
//! trending or search endpoint, drops records no consumer could render,
//! deduplicates by identity, and computes the pagination cursors. Retry
//! policy stays with the caller; errors pass through untouched.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::client::CatalogApi;
use crate::errors::CatalogResult;
use crate::models::{PageRequest, PageResult};

/// Stateless fetch component over a [`CatalogApi`]
#[derive(Clone)]
pub struct PageFetcher {
    api: Arc<dyn CatalogApi>,
}

impl PageFetcher {
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        Self { api }
    }

    /// Fetch one page
    ///
    /// Routing: blank query → trending, anything else → search; both take
    /// the same `(limit, offset)` pair with `offset = page_index *
    /// page_size`. A filtered-empty page is not an error — its absent
    /// `next_key` is the termination signal for the scroll session, and
    /// the server's total count is deliberately ignored for termination.
    pub async fn fetch_page(&self, request: &PageRequest) -> CatalogResult<PageResult> {
        let limit = request.page_size.get();
        let offset = request.offset();

        let response = if request.is_trending() {
            self.api.trending(limit, offset).await?
        } else {
            self.api.search(&request.query, limit, offset).await?
        };

        let received = response.data.len();
        let mut seen = HashSet::with_capacity(received);
        let mut items = Vec::with_capacity(received);
        let mut unusable = 0usize;

        for item in response.data {
            if !item.images.has_renderable_url() {
                unusable += 1;
                continue;
            }
            // First occurrence wins, server order preserved
            if seen.insert(item.id.clone()) {
                items.push(item);
            }
        }

        let duplicates = received - unusable - items.len();
        if unusable > 0 || duplicates > 0 {
            debug!(
                page_index = request.page_index,
                unusable, duplicates, "dropped records from fetched page"
            );
        }

        let next_key = if items.is_empty() {
            None
        } else {
            Some(request.page_index + 1)
        };

        Ok(PageResult {
            items,
            prev_key: request.page_index.checked_sub(1),
            next_key,
        })
    }
}
