//! Error type definitions for the catalog client
//!
//! The taxonomy mirrors what a scrolling consumer actually needs to
//! distinguish: transport failures it may retry, protocol failures it can
//! display (with status where available), and configuration mistakes that
//! should fail construction outright. Retry policy belongs to the caller;
//! nothing in this crate retries internally.

use thiserror::Error;

/// Top-level error type for all catalog operations
///
/// Uses `thiserror` to provide automatic error trait implementations and
/// proper error chaining. `reqwest` failures are classified once, in
/// [`CatalogError::from_reqwest`], so transport and protocol problems stay
/// distinguishable everywhere downstream.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Connectivity-level failures: DNS, connect, timeout, request dispatch
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Remote-protocol failures: non-2xx status or undecodable body
    #[error("Protocol error{}: {message}", .status.map_or(String::new(), |s| format!(" ({s})")))]
    Protocol { status: Option<u16>, message: String },

    /// Invalid construction input (empty API key, malformed base URL, ...)
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl CatalogError {
    /// Create a transport error with a custom message
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a protocol error carrying an HTTP status code
    pub fn protocol_status<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Protocol {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Create a protocol error with no usable status (e.g. a body that
    /// failed to decode)
    pub fn protocol<S: Into<String>>(message: S) -> Self {
        Self::Protocol {
            status: None,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Classify a `reqwest` failure into the transport/protocol taxonomy
    ///
    /// Timeouts, connect failures and request-dispatch failures are
    /// transport problems the caller may retry. Status and decode failures
    /// mean the remote answered but the exchange was not usable.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            Self::Transport {
                message: err.to_string(),
            }
        } else {
            Self::Protocol {
                status: err.status().map(|s| s.as_u16()),
                message: err.to_string(),
            }
        }
    }

    /// True when the failure happened before the remote produced a response
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// True when the remote answered but the exchange failed
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }
}
