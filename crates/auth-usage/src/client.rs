//! Transport for the usage-telemetry endpoint.
//!
//! [`UsageTransport`] is the only seam through which the store talks to the
//! outside world. [`HttpTransport`] is the production implementation; tests
//! and offline tools supply their own.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;

use crate::error::ApiError;

/// Path of the usage document, relative to the management base URL.
pub const USAGE_PATH: &str = "/usage";

/// Fetches the raw usage document.
pub trait UsageTransport: Send + Sync {
    /// Read the usage document once.
    ///
    /// The returned value may be wrapped in a `{ "usage": ... }` envelope;
    /// the store unwraps it.
    fn fetch_usage(&self) -> impl Future<Output = Result<Value, ApiError>> + Send;
}

/// HTTP transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    management_key: Option<String>,
}

impl HttpTransport {
    /// Creates a transport for the management API rooted at `base_url`.
    ///
    /// `request_timeout` bounds each request at the HTTP layer.
    pub fn new(
        base_url: &str,
        management_key: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self {
            client,
            url: usage_url(base_url),
            management_key: management_key.filter(|k| !k.trim().is_empty()),
        })
    }

    /// Full URL of the usage document.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl UsageTransport for HttpTransport {
    async fn fetch_usage(&self) -> Result<Value, ApiError> {
        let mut request = self.client.get(&self.url);
        if let Some(key) = &self.management_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Network(format!("request timed out: {e}"))
            } else {
                ApiError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        map_status(status, retry_after)?;

        response
            .json::<Value>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Join `base_url` and [`USAGE_PATH`] without doubling the slash.
pub fn usage_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), USAGE_PATH)
}

/// Map an HTTP status to success or the matching [`ApiError`].
pub fn map_status(status: u16, retry_after: Option<String>) -> Result<(), ApiError> {
    match status {
        200..=299 => Ok(()),
        401 | 403 => Err(ApiError::Unauthorized),
        404 => Err(ApiError::NotFound),
        429 => Err(ApiError::RateLimited { retry_after }),
        500..=599 => Err(ApiError::Server(status)),
        _ => Err(ApiError::Unexpected(status)),
    }
}
