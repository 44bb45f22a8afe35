//! Auth Usage Dashboard library
//!
//! Configuration, logging and command plumbing for the `aud` binary. The
//! telemetry model itself (aggregation, histogram, cache) lives in the
//! `auth-usage` crate and is re-exported as [`usage`].

/// Subcommand implementations.
pub mod commands;

/// Configuration utilities including XDG path resolution.
pub mod config;

/// Tracing subscriber setup.
pub mod logging;

/// Usage transports (HTTP and saved file).
pub mod transport;

pub use auth_usage as usage;
