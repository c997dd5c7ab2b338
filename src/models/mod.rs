//! Data models for the catalog client
//!
//! Wire DTOs stay close to the remote API: the service transmits numeric
//! metadata (sizes, dimensions) as JSON strings, so the DTO fields keep
//! them as strings and typed accessors sit on top. Everything is an
//! immutable value type once parsed; components pass owned clones around
//! rather than sharing mutable state.

use std::num::NonZeroU32;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wire format for timestamps ("2013-08-01 12:00:00", UTC implied)
const API_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One renderable rendition of an item at a particular resolution
///
/// All metadata is optional; the remote regularly omits dimensions or
/// size, and sends the ones it does have as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageVariant {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub width: Option<String>,
    #[serde(default)]
    pub height: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

impl ImageVariant {
    /// The variant URL, treating an empty string as absent
    pub fn resolvable_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.is_empty())
    }

    /// Declared byte size, when transmitted and parseable
    pub fn size_bytes(&self) -> Option<u64> {
        self.size.as_deref().and_then(|s| s.parse().ok())
    }

    /// Declared (width, height), when both are transmitted and parseable
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        let width = self.width.as_deref()?.parse().ok()?;
        let height = self.height.as_deref()?.parse().ok()?;
        Some((width, height))
    }
}

/// The named renditions the remote publishes per item
///
/// Only the first five participate in the usability filter and size
/// estimation; `fixed_width_downsampled` and `preview_gif` are carried for
/// consumers that want them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageVariantSet {
    #[serde(default)]
    pub original: Option<ImageVariant>,
    #[serde(default)]
    pub downsized: Option<ImageVariant>,
    #[serde(default)]
    pub downsized_medium: Option<ImageVariant>,
    #[serde(default)]
    pub fixed_width: Option<ImageVariant>,
    #[serde(default)]
    pub fixed_width_small: Option<ImageVariant>,
    #[serde(default)]
    pub fixed_width_downsampled: Option<ImageVariant>,
    #[serde(default)]
    pub preview_gif: Option<ImageVariant>,
}

impl ImageVariantSet {
    /// Highest-fidelity resolvable URL: original, downsized,
    /// downsized_medium, fixed_width, fixed_width_small — first match wins.
    ///
    /// This order doubles as the usability filter: an item with no match
    /// here is dropped at the fetch boundary.
    pub fn best_display_url(&self) -> Option<&str> {
        [
            &self.original,
            &self.downsized,
            &self.downsized_medium,
            &self.fixed_width,
            &self.fixed_width_small,
        ]
        .into_iter()
        .flatten()
        .find_map(ImageVariant::resolvable_url)
    }

    /// Bandwidth-friendly URL for grid/preview surfaces: fixed_width,
    /// fixed_width_small, downsized, downsized_medium, original.
    pub fn thumbnail_url(&self) -> Option<&str> {
        [
            &self.fixed_width,
            &self.fixed_width_small,
            &self.downsized,
            &self.downsized_medium,
            &self.original,
        ]
        .into_iter()
        .flatten()
        .find_map(ImageVariant::resolvable_url)
    }

    /// True when at least one preference-ordered variant has a resolvable URL
    pub fn has_renderable_url(&self) -> bool {
        self.best_display_url().is_some()
    }

    /// Best-effort byte-size estimate for cache-pressure accounting
    ///
    /// Uses the declared size of the highest-priority variant that has one
    /// (original, downsized, downsized_medium); `fallback_bytes` otherwise.
    /// A resource-pressure proxy, not an accounting guarantee.
    pub fn estimated_size_bytes(&self, fallback_bytes: u64) -> u64 {
        [&self.original, &self.downsized, &self.downsized_medium]
            .into_iter()
            .flatten()
            .find_map(ImageVariant::size_bytes)
            .unwrap_or(fallback_bytes)
    }
}

/// One catalog item as served by the remote
///
/// `id` is the stable identity used as both API path segment and cache
/// key. Timestamps stay in wire format; [`CatalogItem::imported_at`] and
/// [`CatalogItem::trended_at`] parse on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub images: ImageVariantSet,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub import_datetime: Option<String>,
    #[serde(default)]
    pub trending_datetime: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl CatalogItem {
    /// When the item entered the catalog, if the remote sent a parseable
    /// timestamp (placeholder dates like "0000-00-00 00:00:00" yield None)
    pub fn imported_at(&self) -> Option<DateTime<Utc>> {
        parse_api_datetime(self.import_datetime.as_deref()?)
    }

    /// When the item last trended, same caveats as [`Self::imported_at`]
    pub fn trended_at(&self) -> Option<DateTime<Utc>> {
        parse_api_datetime(self.trending_datetime.as_deref()?)
    }

    /// Resolved URL handed to the image-loading collaborator, paired with
    /// `id` as its cache-key hint
    pub fn best_display_url(&self) -> Option<&str> {
        self.images.best_display_url()
    }

    /// Lower-resolution handoff URL for grid surfaces
    pub fn thumbnail_url(&self) -> Option<&str> {
        self.images.thumbnail_url()
    }
}

fn parse_api_datetime(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, API_DATETIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// One page request of a scroll session
///
/// `page_size` must stay constant across the pages of one session: the
/// remote offset is derived as `page_index * page_size`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Logical query; empty or all-whitespace means "trending"
    pub query: String,
    /// Zero-based page index
    pub page_index: u32,
    /// Items per page
    pub page_size: NonZeroU32,
}

impl PageRequest {
    pub fn new(query: impl Into<String>, page_index: u32, page_size: NonZeroU32) -> Self {
        Self {
            query: query.into(),
            page_index,
            page_size,
        }
    }

    /// Remote offset for this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page_index) * u64::from(self.page_size.get())
    }

    /// True when the request targets the trending endpoint
    pub fn is_trending(&self) -> bool {
        self.query.trim().is_empty()
    }
}

/// One filtered, deduplicated page in server order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult {
    pub items: Vec<CatalogItem>,
    /// Absent iff this is page 0
    pub prev_key: Option<u32>,
    /// Absent iff the filtered item list is empty — the sole
    /// pagination-termination signal
    pub next_key: Option<u32>,
}

/// Pagination metadata the remote reports alongside each page
///
/// Carried for observability only; termination is decided from the
/// filtered item list, never from `total_count`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub offset: u64,
}

/// Wire envelope of the search and trending endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Vec<CatalogItem>,
    #[serde(default)]
    pub pagination: PageInfo,
}

/// Wire envelope of the single-item endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemResponse {
    pub data: CatalogItem,
}
