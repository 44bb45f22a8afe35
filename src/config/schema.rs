//! TOML configuration schema types.
//!
//! All structs derive `Deserialize` and `Serialize` with defaults via
//! `#[serde(default)]`, so any subset of keys is a valid file.
//!
//! Duration fields use human-readable strings (e.g. `"4m"`, `"30s"`) parsed
//! by the `humantime` crate at the call site.

use std::time::Duration;

use auth_usage::StoreSettings;
use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;

/// Environment variable that overrides `server.management_key`.
pub const MANAGEMENT_KEY_ENV: &str = "AUD_MANAGEMENT_KEY";

/// Root configuration encompassing all sections.
///
/// ```toml
/// [server]
/// [cache]
/// [logging]
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Management API connection.
    pub server: ServerConfig,
    /// Snapshot cache behavior.
    pub cache: CacheConfig,
    /// Log output.
    pub logging: LoggingConfig,
}

impl Config {
    /// Apply environment overrides on top of file values.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(MANAGEMENT_KEY_ENV) {
            if !key.trim().is_empty() {
                self.server.management_key = key;
            }
        }
        self
    }

    /// Check every derived value, reporting the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "server.base_url",
                message: "must not be empty".to_string(),
            });
        }
        self.server.request_timeout()?;
        self.store_settings()?;
        Ok(())
    }

    /// Cache settings for the usage store.
    pub fn store_settings(&self) -> Result<StoreSettings, ConfigError> {
        let ttl = parse_duration("cache.ttl", &self.cache.ttl)?;
        let fetch_timeout = if self.cache.fetch_timeout.trim().is_empty() {
            None
        } else {
            Some(parse_duration("cache.fetch_timeout", &self.cache.fetch_timeout)?)
        };
        Ok(StoreSettings { ttl, fetch_timeout })
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// Where and how to reach the usage endpoint.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Management API base URL; the usage document lives at `{base_url}/usage`.
    pub base_url: String,
    /// Bearer token sent with each request. Empty means no header.
    pub management_key: String,
    /// Per-request HTTP timeout as a human-readable duration.
    pub request_timeout: String,
}

impl ServerConfig {
    /// The management key, or `None` when unset.
    pub fn management_key(&self) -> Option<String> {
        let key = self.management_key.trim();
        (!key.is_empty()).then(|| key.to_string())
    }

    /// Parsed `request_timeout`.
    pub fn request_timeout(&self) -> Result<Duration, ConfigError> {
        parse_duration("server.request_timeout", &self.request_timeout)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8317/v0/management".to_string(),
            management_key: String::new(),
            request_timeout: "10s".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// Snapshot cache tuning.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a loaded snapshot is served before refetching.
    pub ttl: String,
    /// Upper bound on one fetch. Empty disables the bound.
    pub fetch_timeout: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: "4m".to_string(),
            fetch_timeout: "30s".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Logging configuration from the `[logging]` section.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Verbosity used when `AUD_LOG` is not set.
    pub level: LogLevel,
}

/// Log verbosity levels (kebab-case in TOML).
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LogLevel {
    /// Only errors.
    Error,
    /// Errors and warnings (default).
    #[default]
    Warn,
    /// Informational messages.
    Info,
    /// Debug-level detail.
    Debug,
    /// Full trace output.
    Trace,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

fn parse_duration(field: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(raw.trim()).map_err(|e| ConfigError::InvalidValue {
        field,
        message: format!("{raw:?}: {e}"),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
