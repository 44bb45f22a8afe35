//! Usage transports available to the binary.
//!
//! The live path goes through [`auth_usage::HttpTransport`]. [`FileTransport`]
//! replays a saved usage document, which is handy offline and in tests.

use std::path::{Path, PathBuf};

use auth_usage::{ApiError, HttpTransport, UsageTransport};
use serde_json::Value;

use crate::config::error::ConfigError;
use crate::config::schema::Config;

/// Reads the usage document from a JSON file on every fetch.
#[derive(Debug, Clone)]
pub struct FileTransport {
    path: PathBuf,
}

impl FileTransport {
    /// Transport for the document at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path being read.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl UsageTransport for FileTransport {
    async fn fetch_usage(&self) -> Result<Value, ApiError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| ApiError::Network(format!("{}: {e}", self.path.display())))?;
        serde_json::from_str(&content)
            .map_err(|e| ApiError::Decode(format!("{}: {e}", self.path.display())))
    }
}

/// Either transport, chosen at startup.
#[derive(Debug, Clone)]
pub enum UsageSource {
    /// Live management API.
    Http(HttpTransport),
    /// Saved document on disk.
    File(FileTransport),
}

impl UsageSource {
    /// Use `file` when given, else the HTTP endpoint from `config`.
    pub fn from_config(config: &Config, file: Option<&Path>) -> Result<Self, SourceError> {
        if let Some(path) = file {
            return Ok(Self::File(FileTransport::new(path)));
        }
        let timeout = config.server.request_timeout()?;
        let transport = HttpTransport::new(
            &config.server.base_url,
            config.server.management_key(),
            timeout,
        )?;
        tracing::debug!(url = transport.url(), "using http usage transport");
        Ok(Self::Http(transport))
    }
}

impl UsageTransport for UsageSource {
    async fn fetch_usage(&self) -> Result<Value, ApiError> {
        match self {
            Self::Http(transport) => transport.fetch_usage().await,
            Self::File(transport) => transport.fetch_usage().await,
        }
    }
}

/// Failure to set up a [`UsageSource`].
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// A config value needed by the transport is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client")]
    Client(#[from] ApiError),
}
