//! `aud config init`: the commented template and writing it to disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::error::ConfigError;
use crate::config::xdg;

/// A commented TOML template with all default values.
///
/// Every value here must match `Config::default()` from `schema.rs`.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Auth Usage Dashboard Configuration
#
# This file was generated with the built-in defaults.
# Location: $XDG_CONFIG_HOME/auth-usage-dashboard/config.toml

# ==============================================================================
# Management API
# ==============================================================================

[server]

# Base URL of the proxy management API.
# The usage document is fetched from "{base_url}/usage".
base_url = "http://localhost:8317/v0/management"

# Management key sent as "Authorization: Bearer <key>".
# Leave empty to send no header. The AUD_MANAGEMENT_KEY environment
# variable takes precedence when set.
management_key = ""

# Per-request HTTP timeout.
# Examples: "5s", "10s", "1m"
request_timeout = "10s"

# ==============================================================================
# Cache
# ==============================================================================

[cache]

# How long fetched usage data is reused before refetching.
# Examples: "1m", "4m", "15m"
ttl = "4m"

# Upper bound on a single fetch. Empty string disables the bound.
fetch_timeout = "30s"

# ==============================================================================
# Logging
# ==============================================================================

[logging]

# Verbosity when AUD_LOG is not set.
# Options: "error", "warn", "info", "debug", "trace"
level = "warn"
"#;

/// Where `config init` put things.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedConfig {
    /// The freshly written template.
    pub path: PathBuf,
    /// Previous file, moved aside by `--force`.
    pub backup: Option<PathBuf>,
}

/// Write the template to `target`, or the default location when `None`.
///
/// An existing file is an [`ConfigError::AlreadyExists`] error unless
/// `force` is set, in which case it is first renamed with a `.toml.backup`
/// extension.
pub fn create_default_config(
    target: Option<&Path>,
    force: bool,
) -> Result<CreatedConfig, ConfigError> {
    let path = target.map_or_else(xdg::config_path, Path::to_path_buf);

    let backup = if path.exists() {
        if !force {
            return Err(ConfigError::AlreadyExists { path });
        }
        let backup = path.with_extension("toml.backup");
        fs::rename(&path, &backup).map_err(|e| ConfigError::write(&backup, e))?;
        Some(backup)
    } else {
        None
    };

    write_template(&path)?;
    Ok(CreatedConfig { path, backup })
}

/// Template goes out 0600 since it may later hold a management key.
fn write_template(path: &Path) -> Result<(), ConfigError> {
    xdg::ensure_parent(path).map_err(|e| ConfigError::write(path, e))?;
    fs::write(path, DEFAULT_CONFIG_TEMPLATE).map_err(|e| ConfigError::write(path, e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .map_err(|e| ConfigError::write(path, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Config;
    use serial_test::serial;

    #[test]
    fn template_parses_to_defaults() {
        let from_template: Config =
            toml::from_str(DEFAULT_CONFIG_TEMPLATE).expect("template should parse");
        assert_eq!(from_template, Config::default());
        for section in ["[server]", "[cache]", "[logging]"] {
            assert!(DEFAULT_CONFIG_TEMPLATE.contains(section), "missing {section}");
        }
    }

    #[test]
    fn writes_to_explicit_target() {
        let tmp = tempfile::tempdir().expect("temp dir");
        let target = tmp.path().join("nested/aud.toml");
        let created = create_default_config(Some(&target), false).expect("should succeed");
        assert_eq!(created, CreatedConfig { path: target.clone(), backup: None });
        let content = fs::read_to_string(&target).expect("read");
        assert_eq!(content, DEFAULT_CONFIG_TEMPLATE);
    }

    #[test]
    fn existing_file_needs_force() {
        let tmp = tempfile::tempdir().expect("temp dir");
        let target = tmp.path().join("aud.toml");
        fs::write(&target, "# mine\n").expect("write");
        let err = create_default_config(Some(&target), false).expect_err("should refuse");
        assert!(matches!(err, ConfigError::AlreadyExists { .. }), "{err:?}");
        assert_eq!(fs::read_to_string(&target).expect("read"), "# mine\n");
    }

    #[test]
    fn force_moves_old_file_aside() {
        let tmp = tempfile::tempdir().expect("temp dir");
        let target = tmp.path().join("config.toml");
        fs::write(&target, "# custom content\n").expect("write");

        let created = create_default_config(Some(&target), true).expect("force should succeed");
        let backup = tmp.path().join("config.toml.backup");
        assert_eq!(created.backup.as_deref(), Some(backup.as_path()));
        assert_eq!(fs::read_to_string(&backup).expect("read backup"), "# custom content\n");
        assert_eq!(
            fs::read_to_string(&target).expect("read new"),
            DEFAULT_CONFIG_TEMPLATE
        );
    }

    #[test]
    #[serial]
    fn default_target_follows_xdg() {
        let tmp = tempfile::tempdir().expect("temp dir");
        let original = std::env::var("XDG_CONFIG_HOME").ok();
        std::env::set_var("XDG_CONFIG_HOME", tmp.path());
        let created = create_default_config(None, false);
        match original {
            Some(v) => std::env::set_var("XDG_CONFIG_HOME", v),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
        let created = created.expect("should succeed");
        assert_eq!(created.path, tmp.path().join("auth-usage-dashboard/config.toml"));
        assert!(created.path.is_file());
    }

    #[cfg(unix)]
    #[test]
    fn written_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = tempfile::tempdir().expect("temp dir");
        let target = tmp.path().join("aud.toml");
        create_default_config(Some(&target), false).expect("should succeed");
        let mode = fs::metadata(&target).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
