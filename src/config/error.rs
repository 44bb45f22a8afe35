//! Errors raised while locating, reading, writing or checking `config.toml`.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Anything that stops `aud` from getting a usable [`Config`].
///
/// [`Config`]: crate::config::schema::Config
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("Cannot read config {path}")]
    Read {
        /// File that failed.
        path: PathBuf,
        /// I/O cause.
        #[source]
        source: io::Error,
    },

    /// Not valid TOML, or a key holds the wrong type.
    #[error("Invalid TOML in {path}:{line}:{column}: {message}")]
    Parse {
        /// File that failed.
        path: PathBuf,
        /// 1-based; 0 when the parser gave no position.
        line: usize,
        /// 1-based; 0 when the parser gave no position.
        column: usize,
        /// Parser message.
        message: String,
    },

    /// A path passed with `--config` does not exist.
    #[error("Config file {path} does not exist")]
    NotFound {
        /// Requested path.
        path: PathBuf,
    },

    /// `config init` without `--force` found a file in the way.
    #[error("Config file {path} already exists (use --force to replace it)")]
    AlreadyExists {
        /// Existing file.
        path: PathBuf,
    },

    /// Writing the template or its backup failed.
    #[error("Cannot write config {path}")]
    Write {
        /// File that failed.
        path: PathBuf,
        /// I/O cause.
        #[source]
        source: io::Error,
    },

    /// A value parsed but is not acceptable (bad duration, empty URL).
    #[error("Invalid value for `{field}`: {message}")]
    InvalidValue {
        /// Dotted key, e.g. `cache.ttl`.
        field: &'static str,
        /// What was wrong with it.
        message: String,
    },
}

impl ConfigError {
    /// Classify a read failure; a missing file becomes [`ConfigError::NotFound`].
    pub(crate) fn read(path: &Path, source: io::Error) -> Self {
        let path = path.to_path_buf();
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound { path }
        } else {
            ConfigError::Read { path, source }
        }
    }

    pub(crate) fn write(path: &Path, source: io::Error) -> Self {
        ConfigError::Write {
            path: path.to_path_buf(),
            source,
        }
    }
}
