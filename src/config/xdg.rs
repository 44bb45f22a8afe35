//! Where `aud` looks for `config.toml` when `--config` is not given.
//!
//! `$XDG_CONFIG_HOME/auth-usage-dashboard/config.toml` when the variable is
//! set and non-empty. Otherwise `~/.config/auth-usage-dashboard` on Linux and
//! `~/Library/Application Support/auth-usage-dashboard` on macOS.

use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "auth-usage-dashboard";
const CONFIG_FILE: &str = "config.toml";

/// Directory holding the default config file.
pub fn config_dir() -> PathBuf {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(platform_config_dir);
    base.join(APP_NAME)
}

fn platform_config_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        dirs::config_dir().unwrap_or_else(|| PathBuf::from("."))
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::home_dir()
            .map(|home| home.join(".config"))
            .unwrap_or_else(|| PathBuf::from(".config"))
    }
}

/// Default config file path.
pub fn config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE)
}

/// Make sure the directory that will hold `file` exists.
///
/// Directories created here are owner-only (0700) since the config may carry
/// a management key. Existing directories are left as they are.
pub fn ensure_parent(file: &Path) -> std::io::Result<()> {
    match file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => create_private_dir(dir),
        _ => Ok(()),
    }
}

fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
    }
    Ok(())
}
