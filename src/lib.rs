//! Paginated fetch-and-cache orchestration for a remote GIF catalog
//!
//! Turns a scrolling consumer's page requests into bounded, offset-based
//! queries against a GIPHY-shaped API (trending or keyword search),
//! filters and deduplicates the results, keeps a bounded LRU cache of
//! items, and serializes a live-updating search string into a debounced,
//! cancelable stream of page events.
//!
//! Layering, leaf-first: [`client`] is the remote collaborator boundary,
//! [`fetcher`] turns page indexes into filtered pages, [`cache`] is the
//! bounded store, [`repository`] composes the two behind a page-stream
//! abstraction, and [`pipeline`] drives it all from a query string.
//! Rendering, image decoding and connectivity detection live outside this
//! crate; it only surfaces the failures the transport reports.

pub mod cache;
pub mod client;
pub mod config;
pub mod errors;
pub mod fetcher;
pub mod models;
pub mod pipeline;
pub mod repository;
