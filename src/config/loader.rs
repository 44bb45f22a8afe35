//! Turns `config.toml` into a checked [`Config`].
//!
//! [`load`] is the only entry point the commands use: it picks the file,
//! parses it, layers `AUD_MANAGEMENT_KEY` on top and runs
//! [`Config::validate`], so every command sees the same accepted config.

use std::fs;
use std::path::Path;

use crate::config::error::ConfigError;
use crate::config::schema::Config;
use crate::config::xdg;

/// Load the config for one `aud` invocation.
///
/// An explicit `--config` path must exist. Without one, a missing default
/// file means built-in defaults. Values that parse but are unusable (a bad
/// duration, an empty `base_url`) fail here with
/// [`ConfigError::InvalidValue`].
pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let config = match explicit {
        Some(path) => read(path)?,
        None => {
            let path = xdg::config_path();
            if path.exists() {
                read(&path)?
            } else {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Config::default()
            }
        }
    };
    let config = config.with_env_overrides();
    config.validate()?;
    Ok(config)
}

fn read(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::read(path, e))?;
    parse(&content, path)
}

fn parse(content: &str, path: &Path) -> Result<Config, ConfigError> {
    toml::from_str(content).map_err(|e| {
        let (line, column) = e
            .span()
            .map(|span| line_column(content, span.start))
            .unwrap_or((0, 0));
        ConfigError::Parse {
            path: path.to_path_buf(),
            line,
            column,
            message: e.message().to_string(),
        }
    })
}

/// 1-based line and column of byte `offset`.
fn line_column(content: &str, offset: usize) -> (usize, usize) {
    let before = &content[..offset];
    let line_start = before.rfind('\n').map_or(0, |p| p + 1);
    (before.matches('\n').count() + 1, offset - line_start + 1)
}
