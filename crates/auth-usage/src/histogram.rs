//! Fixed-width activity histogram ("status bar") over the trailing window.
//!
//! The window is [`STATUS_BLOCK_COUNT`] slots of 30 minutes ending at "now".
//! Slot 0 is the oldest period, the last slot the most recent.

use chrono::{DateTime, TimeDelta, Utc};

use crate::normalize::{normalize_id_key, normalize_index_key, RawKey};
use crate::types::{success_rate, StatBucket, StatusBarData, StatusBlockState, UsageDetail};

/// Number of slots in the status bar.
pub const STATUS_BLOCK_COUNT: usize = 48;

/// Width of one slot: 30 minutes.
pub const STATUS_BLOCK_DURATION_MS: i64 = 30 * 60 * 1000;

/// Trailing window covered by the status bar and by key stats: 24 hours.
pub const STATUS_WINDOW_MS: i64 = STATUS_BLOCK_COUNT as i64 * STATUS_BLOCK_DURATION_MS;

/// Failure rate strictly above this marks a slot as [`StatusBlockState::Failure`].
const FAILURE_THRESHOLD: f64 = 0.5;

/// Failure rate at or above this marks a slot as [`StatusBlockState::Mixed`].
const MIXED_THRESHOLD: f64 = 0.2;

/// Restricts a histogram to one credential.
///
/// When both keys are set a record must match both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistogramFilter {
    /// Required canonical credential identifier.
    pub credential_id: Option<String>,
    /// Required canonical credential index.
    pub credential_index: Option<String>,
}

impl HistogramFilter {
    /// No restriction: every in-window record counts.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to one credential identifier. `None` if the key does not normalize.
    pub fn by_id<'a>(key: impl Into<RawKey<'a>>) -> Option<Self> {
        normalize_id_key(key).map(|id| Self {
            credential_id: Some(id),
            credential_index: None,
        })
    }

    /// Restrict to one credential index. `None` if the key does not normalize.
    pub fn by_index<'a>(key: impl Into<RawKey<'a>>) -> Option<Self> {
        normalize_index_key(key).map(|index| Self {
            credential_id: None,
            credential_index: Some(index),
        })
    }

    fn matches(&self, detail: &UsageDetail) -> bool {
        let id_ok = self
            .credential_id
            .as_ref()
            .map_or(true, |want| detail.credential_id.as_ref() == Some(want));
        let index_ok = self
            .credential_index
            .as_ref()
            .map_or(true, |want| detail.credential_index.as_ref() == Some(want));
        id_ok && index_ok
    }
}

/// Classify one slot from its own counts.
pub fn classify(bucket: &StatBucket) -> StatusBlockState {
    if bucket.is_empty() {
        return StatusBlockState::Idle;
    }
    let failure_rate = bucket.failure as f64 / bucket.total() as f64;
    if failure_rate > FAILURE_THRESHOLD {
        StatusBlockState::Failure
    } else if failure_rate >= MIXED_THRESHOLD {
        StatusBlockState::Mixed
    } else {
        StatusBlockState::Success
    }
}

/// An all-idle status bar with a 100% success rate.
pub fn idle_status_bar() -> StatusBarData {
    StatusBarData {
        blocks: vec![StatusBlockState::Idle; STATUS_BLOCK_COUNT],
        slots: vec![StatBucket::default(); STATUS_BLOCK_COUNT],
        success_rate: 100.0,
        total_success: 0,
        total_failure: 0,
    }
}

/// Bucket `details` into the window ending at `now`.
///
/// Records whose timestamp does not parse, falls outside
/// `[now - 24h, now]`, or fails `filter` are skipped. Slot indices are
/// clamped into range so records sitting exactly on either window edge are
/// still counted.
pub fn build_status_bar(
    details: &[UsageDetail],
    filter: &HistogramFilter,
    now: DateTime<Utc>,
) -> StatusBarData {
    if details.is_empty() {
        return idle_status_bar();
    }

    let window_start = now - TimeDelta::milliseconds(STATUS_WINDOW_MS);
    let mut slots = vec![StatBucket::default(); STATUS_BLOCK_COUNT];

    for detail in details.iter().filter(|d| filter.matches(d)) {
        let Some(ts) = detail.parsed_timestamp() else {
            continue;
        };
        if ts < window_start || ts > now {
            continue;
        }
        let offset = (ts - window_start).num_milliseconds() / STATUS_BLOCK_DURATION_MS;
        let index = offset.clamp(0, STATUS_BLOCK_COUNT as i64 - 1) as usize;
        slots[index].record(detail.failed);
    }

    let total_success: u64 = slots.iter().map(|s| s.success).sum();
    let total_failure: u64 = slots.iter().map(|s| s.failure).sum();

    StatusBarData {
        blocks: slots.iter().map(classify).collect(),
        slots,
        success_rate: success_rate(total_success, total_failure),
        total_success,
        total_failure,
    }
}
