//! # auth-usage
//!
//! Aggregates request-level usage telemetry from a credential-proxy
//! management API into per-credential success/failure counters and a
//! 24-hour activity histogram.
//!
//! ## Features
//!
//! - Tolerant extraction of detail records from a nested usage document
//! - Windowed counters keyed by credential index, identifier and source
//! - A 48-slot "status bar" classifying each half hour as idle, success,
//!   mixed or failure
//! - A TTL cache with single-flight refresh that keeps the last good data
//!   when a fetch fails
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use auth_usage::{AuthStatsStore, HttpTransport};
//!
//! let transport = HttpTransport::new(
//!     "http://localhost:8317/v0/management",
//!     Some(key),
//!     Duration::from_secs(10),
//! )?;
//! let store = AuthStatsStore::new(transport);
//! store.refresh(false).await;
//!
//! let stats = store.stats_by_index(3);
//! println!("{} ok / {} failed", stats.success, stats.failure);
//! ```

pub mod aggregate;
pub mod client;
pub mod clock;
pub mod collect;
pub mod error;
pub mod histogram;
pub mod normalize;
pub mod store;
pub mod types;

pub use aggregate::compute_key_stats;
pub use client::{HttpTransport, UsageTransport, USAGE_PATH};
pub use clock::{Clock, ManualClock, SystemClock};
pub use collect::{collect_usage_details, unwrap_usage_envelope};
pub use error::ApiError;
pub use histogram::{
    build_status_bar, classify, HistogramFilter, STATUS_BLOCK_COUNT, STATUS_BLOCK_DURATION_MS,
    STATUS_WINDOW_MS,
};
pub use normalize::{normalize_id_key, normalize_index_key, strip_extension, RawKey};
pub use store::{
    AuthStatsStore, CacheStatus, RefreshOutcome, Snapshot, StoreSettings, DEFAULT_CACHE_TTL,
    DEFAULT_FETCH_TIMEOUT,
};
pub use types::{KeyStats, StatBucket, StatusBarData, StatusBlockState, UsageDetail};
