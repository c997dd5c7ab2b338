//! Configuration for the catalog client
//!
//! One `Config` with per-concern sections. Every field has a serde
//! default so a partial TOML file (or none at all) yields a working
//! configuration; only the API key has no usable default and is caught by
//! [`Config::validate`].

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

pub mod duration_serde;

/// Remote API access configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Opaque credential attached to every request
    #[serde(default)]
    pub api_key: String,
    /// Base URL of the catalog service
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Content rating ceiling requested from the remote
    #[serde(default = "default_rating")]
    pub rating: String,
    /// Search language hint
    #[serde(default = "default_lang")]
    pub lang: String,
    /// Connection timeout; total request time is left to the transport
    #[serde(default = "default_connect_timeout", with = "duration_serde::duration")]
    pub connect_timeout: Duration,
}

/// Paging and query-pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagingConfig {
    /// Items per page; must stay constant within a scroll session because
    /// remote offsets are derived as page_index * page_size
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Quiet period a query change must survive before a fetch starts
    #[serde(default = "default_debounce", with = "duration_serde::duration")]
    pub debounce: Duration,
    /// Pages the pipeline may fetch ahead of the consumer
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

/// In-memory item cache bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum resident entries
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Maximum cumulative estimated size in bytes
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    /// Size assumed for items that declare no variant size
    #[serde(default = "default_fallback_item_bytes")]
    pub fallback_item_bytes: u64,
}

fn default_base_url() -> String {
    "https://api.giphy.com/".to_string()
}
fn default_rating() -> String {
    "g".to_string()
}
fn default_lang() -> String {
    "en".to_string()
}
fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}
fn default_page_size() -> u32 {
    20
}
fn default_debounce() -> Duration {
    Duration::from_millis(500)
}
fn default_event_buffer() -> usize {
    2
}
fn default_max_entries() -> usize {
    100
}
fn default_max_bytes() -> u64 {
    100 * 1024 * 1024
}
fn default_fallback_item_bytes() -> u64 {
    2_000_000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            rating: default_rating(),
            lang: default_lang(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            debounce: default_debounce(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            max_bytes: default_max_bytes(),
            fallback_item_bytes: default_fallback_item_bytes(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub paging: PagingConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "gif-catalog.toml".to_string());
        Self::load_from_file(&config_file)
    }

    pub fn load_from_file(config_file: &str) -> Result<Self> {
        if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            Ok(toml::from_str(&contents)?)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            Ok(default_config)
        }
    }

    /// Reject configurations the components cannot be constructed from
    pub fn validate(&self) -> Result<(), crate::errors::CatalogError> {
        use crate::errors::CatalogError;

        if self.api.api_key.trim().is_empty() {
            return Err(CatalogError::configuration("api.api_key must be set"));
        }
        if url::Url::parse(&self.api.base_url).is_err() {
            return Err(CatalogError::configuration(format!(
                "api.base_url is not a valid URL: {}",
                self.api.base_url
            )));
        }
        if self.paging.page_size == 0 {
            return Err(CatalogError::configuration("paging.page_size must be > 0"));
        }
        if self.paging.event_buffer == 0 {
            return Err(CatalogError::configuration(
                "paging.event_buffer must be > 0",
            ));
        }
        if self.cache.max_entries == 0 {
            return Err(CatalogError::configuration("cache.max_entries must be > 0"));
        }
        if self.cache.max_bytes == 0 {
            return Err(CatalogError::configuration("cache.max_bytes must be > 0"));
        }
        Ok(())
    }
}
