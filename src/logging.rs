//! Logging setup for the `aud` binary.
//!
//! Output goes to stderr so stdout stays clean JSON. The filter comes from
//! the `AUD_LOG` environment variable (standard `EnvFilter` directives, e.g.
//! `AUD_LOG=auth_usage=debug`); when unset or invalid the configured
//! `[logging] level` applies.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::schema::LogLevel;

/// Environment variable holding the filter directives.
pub const LOG_ENV: &str = "AUD_LOG";

/// Initialize the global tracing subscriber.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init(fallback: LogLevel) {
    let _ = fmt()
        .with_env_filter(filter(fallback))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn filter(fallback: LogLevel) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback.as_directive()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn env_filter_parses_level_directives() {
        for level in [
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ] {
            assert!(
                EnvFilter::try_new(level.as_directive()).is_ok(),
                "failed to parse directive: {}",
                level.as_directive()
            );
        }
    }

    #[test]
    fn env_filter_parses_module_directive() {
        assert!(EnvFilter::try_new("auth_usage=debug,warn").is_ok());
    }

    #[test]
    #[serial]
    fn fallback_used_without_env() {
        let original = std::env::var(LOG_ENV).ok();
        std::env::remove_var(LOG_ENV);
        let rendered = filter(LogLevel::Debug).to_string();
        if let Some(v) = original {
            std::env::set_var(LOG_ENV, v);
        }
        assert!(rendered.contains("debug"), "{rendered}");
    }

    #[test]
    #[serial]
    fn env_overrides_fallback() {
        let original = std::env::var(LOG_ENV).ok();
        std::env::set_var(LOG_ENV, "trace");
        let rendered = filter(LogLevel::Error).to_string();
        match original {
            Some(v) => std::env::set_var(LOG_ENV, v),
            None => std::env::remove_var(LOG_ENV),
        }
        assert!(rendered.contains("trace"), "{rendered}");
    }
}
