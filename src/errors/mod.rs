//! Centralized error handling for the catalog client
//!
//! This module unifies the failure modes of the fetch path so callers can
//! distinguish the cases that matter to them:
//!
//! - **Transport Errors**: connectivity, timeouts, request dispatch
//! - **Protocol Errors**: non-success HTTP status or undecodable bodies
//! - **Configuration Errors**: invalid construction input
//!
//! An empty (fully filtered) page is *not* an error — it is the
//! pagination-termination signal and is represented by an absent
//! `next_key` on the page itself.
//!
//! # Usage
//!
//! ```rust
//! use gif_catalog::errors::CatalogResult;
//!
//! async fn example_function() -> CatalogResult<String> {
//!     Ok("success".to_string())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using CatalogError
pub type CatalogResult<T> = Result<T, CatalogError>;
