//! Error types for the auth-usage crate.
//!
//! Malformed usage payloads are never errors: bad records are excluded during
//! collection and aggregation. The only failures that surface are transport
//! failures while fetching the usage document.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when fetching the usage document.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, TLS, read).
    #[error("Network error: {0}")]
    Network(String),

    /// No response arrived within the configured fetch timeout.
    #[error("Usage request timed out after {0:?}")]
    Timeout(Duration),

    /// Management key missing or rejected (401/403).
    #[error("Unauthorized: check the management key")]
    Unauthorized,

    /// The usage endpoint does not exist on this server (404).
    #[error("Usage endpoint not found")]
    NotFound,

    /// Too many requests (429).
    #[error("Rate limited{}", retry_after.as_ref().map(|r| format!(", retry after {r}")).unwrap_or_default())]
    RateLimited {
        /// Value of the `Retry-After` header, if present.
        retry_after: Option<String>,
    },

    /// Server-side failure (5xx).
    #[error("Server error: HTTP {0}")]
    Server(u16),

    /// Any other non-success status code.
    #[error("Unexpected response: HTTP {0}")]
    Unexpected(u16),

    /// The response body was not valid JSON.
    #[error("Failed to decode usage response: {0}")]
    Decode(String),
}
